use cfgml_core::{translate, translate_to_xml, translate_with, ParseOptions, Value};

#[test]
fn test_constant_expression() {
    let translation = translate("set X = 5; set Y = | X 3 + |", "test.conf").unwrap();
    assert_eq!(translation.constants.get("Y"), Some(&Value::Integer(8)));
}

#[test]
fn test_inline_mod_expression() {
    let translation = translate("(['A: 10, B: |2 3 mod()|])", "test.conf").unwrap();
    let keys: Vec<&str> = translation.document.keys().collect();
    assert_eq!(keys, vec!["A", "B"]);
    assert_eq!(translation.document.get("A"), Some(&Value::Integer(10)));
    assert_eq!(translation.document.get("B"), Some(&Value::Integer(2)));
}

#[test]
fn test_quoted_array_value() {
    let translation = translate("(['A: 'X 1 2 )])", "test.conf").unwrap();
    assert_eq!(
        translation.document.get("A"),
        Some(&Value::Array(vec![Value::Integer(1), Value::Integer(2)]))
    );
}

#[test]
fn test_second_block_wins() {
    let translation = translate("([ A: 1 ]) ([ A: 2 ])", "test.conf").unwrap();
    assert_eq!(translation.document.get("A"), Some(&Value::Integer(2)));
    assert_eq!(translation.document.len(), 1);
}

#[test]
fn test_lowercase_key_is_skipped() {
    let translation = translate("([ lowercase: 1, B: 2 ])", "test.conf").unwrap();
    assert_eq!(translation.document.keys().collect::<Vec<_>>(), vec!["B"]);
}

#[test]
fn test_strict_keys_reject_lowercase() {
    let options = ParseOptions::new().strict_keys(true);
    assert!(translate_with("([ lowercase: 1, B: 2 ])", "test.conf", options).is_err());
    assert!(translate_with("([ B: 2, C: 3 ])", "test.conf", options).is_ok());
}

#[test]
fn test_emitted_tree_matches_parsed_tree() {
    let source = "([ A: '( 1 ([ B: 2 ]) ), C: ([ D: x ]) ])";
    let translation = translate(source, "test.conf").unwrap();
    let xml = translation.to_xml();

    let expected = [
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
        "<config>",
        "  <A>",
        "    <item>1</item>",
        "    <item>",
        "      <B>2</B>",
        "    </item>",
        "  </A>",
        "  <C>",
        "    <D>x</D>",
        "  </C>",
        "</config>",
    ]
    .join("\n");
    assert_eq!(xml, expected);
}

#[test]
fn test_comments_are_ignored() {
    let source = "\\ heading\n=begin\n([ Hidden: 1 ])\n=cut\n([ Shown: 2 ])";
    let xml = translate_to_xml(source, "test.conf").unwrap();
    assert!(!xml.contains("Hidden"));
    assert!(xml.contains("<Shown>2</Shown>"));
}

#[test]
fn test_json_output() {
    let translation = translate("([ B: 1, R: 2.5, A: '( x 2 ) ])", "test.conf").unwrap();
    let json = translation.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, serde_json::json!({ "B": 1, "R": 2.5, "A": ["x", 2] }));
    // Key order follows the source.
    assert!(json.find("\"B\"").unwrap() < json.find("\"A\"").unwrap());
}

#[test]
fn test_float_elements_are_emitted_verbatim() {
    let xml = translate_to_xml("([ A: '( 1.50 6.0e3 ) ])", "test.conf").unwrap();
    assert!(xml.contains("    <item>1.50</item>\n    <item>6.0e3</item>"));
}

#[test]
fn test_quoted_value_is_raw_text() {
    let translation = translate("([ Name: 'bob', Port: 80 ])", "test.conf").unwrap();
    assert_eq!(translation.document.get("Name"), Some(&Value::String("'bob'".into())));
    assert_eq!(translation.document.get("Port"), Some(&Value::Integer(80)));
}

#[test]
fn test_nested_array_element_is_one_line() {
    let xml = translate_to_xml("([ M: '( '( 1 2 ) 3 ) ])", "test.conf").unwrap();
    let expected = [
        "  <M>",
        "    <item>[1, 2]</item>",
        "    <item>3</item>",
        "  </M>",
    ]
    .join("\n");
    assert!(xml.contains(&expected), "{xml}");
}
