use crate::ast::{Constants, Dict};
use crate::emitter::to_xml_document;
use crate::error::CfgError;
use crate::parser::{ParseOptions, Parser};
use serde::{Serialize, Serializer};

/// The result of a successful translation.
///
/// Holds the merged top-level dictionary and the constants that were defined
/// while reading it, and renders the dictionary as XML, JSON or YAML.
#[derive(Debug)]
pub struct Translation {
    pub document: Dict,
    pub constants: Constants,
}

impl Serialize for Translation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.document.serialize(serializer)
    }
}

impl Translation {
    /// Renders the XML document: declaration, `<config>` root and indented body.
    #[must_use]
    pub fn to_xml(&self) -> String {
        to_xml_document(&self.document)
    }

    /// Serializes the document into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the document into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Translates configuration source with the default options.
///
/// `file_name` only labels diagnostics.
///
/// # Errors
///
/// Returns a `CfgError` if a directive, expression or dictionary is malformed.
pub fn translate(source: &str, file_name: &str) -> Result<Translation, CfgError> {
    translate_with(source, file_name, ParseOptions::default())
}

/// Translates configuration source: lexing, constant resolution and parsing.
///
/// # Errors
///
/// Returns a `CfgError` if a directive, expression or dictionary is malformed.
pub fn translate_with(
    source: &str,
    file_name: &str,
    options: ParseOptions,
) -> Result<Translation, CfgError> {
    let parser = Parser::new_with_name(source, file_name.to_string())?.with_options(options);
    let document = parser.parse_document()?;
    log::info!("{file_name}: translated {} top-level keys", document.len());

    Ok(Translation {
        document,
        constants: parser.into_constants(),
    })
}

/// Translates configuration source straight to an XML document string.
///
/// # Errors
///
/// Returns a `CfgError` if the source cannot be parsed.
pub fn translate_to_xml(source: &str, file_name: &str) -> Result<String, CfgError> {
    translate(source, file_name).map(|translation| translation.to_xml())
}
