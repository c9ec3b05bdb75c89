use cfgml_core::translate;

fn main() {
    let source = r"
        \ Example configuration
        set PORT = 8080;
        ([
            Host: localhost,
            Port: PORT,
            Next: | PORT 1 + |,
            Tags: '( web api )
        ])
    ";

    match translate(source, "example.conf") {
        Ok(translation) => {
            println!("{}", translation.to_xml());
        }
        Err(e) => {
            eprintln!("Failed to translate: {e:?}");
        }
    }
}
