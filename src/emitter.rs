use crate::ast::{Dict, Value};

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
/// Element wrapping the whole document.
pub const ROOT_ELEMENT: &str = "config";
/// Element emitted for each array element.
pub const ITEM_ELEMENT: &str = "item";
const INDENT: &str = "  ";

/// Renders `dict` as indented XML elements, starting at `level` indentation steps.
///
/// Keys are written as element names and scalars verbatim; nothing is escaped.
pub fn to_xml_body(dict: &Dict, level: usize) -> String {
    let mut lines = Vec::new();
    emit_dict(dict, level, &mut lines);
    lines.join("\n")
}

/// Renders a full document: declaration, `<config>` root and the body one level in.
pub fn to_xml_document(dict: &Dict) -> String {
    let body = to_xml_body(dict, 1);
    if body.is_empty() {
        format!("{XML_DECLARATION}\n<{ROOT_ELEMENT}>\n</{ROOT_ELEMENT}>")
    } else {
        format!("{XML_DECLARATION}\n<{ROOT_ELEMENT}>\n{body}\n</{ROOT_ELEMENT}>")
    }
}

fn emit_dict(dict: &Dict, level: usize, lines: &mut Vec<String>) {
    for (key, value) in dict.iter() {
        emit_element(key, value, level, lines);
    }
}

fn emit_element(name: &str, value: &Value, level: usize, lines: &mut Vec<String>) {
    let pad = INDENT.repeat(level);
    match value {
        Value::Dict(dict) => {
            lines.push(format!("{pad}<{name}>"));
            emit_dict(dict, level + 1, lines);
            lines.push(format!("{pad}</{name}>"));
        }
        Value::Array(items) => {
            lines.push(format!("{pad}<{name}>"));
            let item_pad = INDENT.repeat(level + 1);
            for item in items {
                match item {
                    Value::Dict(_) => emit_element(ITEM_ELEMENT, item, level + 1, lines),
                    _ => lines.push(format!("{item_pad}<{ITEM_ELEMENT}>{item}</{ITEM_ELEMENT}>")),
                }
            }
            lines.push(format!("{pad}</{name}>"));
        }
        Value::Integer(_) | Value::Float(_) | Value::String(_) => {
            lines.push(format!("{pad}<{name}>{value}</{name}>"));
        }
    }
}
