pub mod api;
pub mod ast;
pub mod emitter;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod utils;
mod serialization;

pub use api::{translate, translate_to_xml, translate_with, Translation};
pub use ast::{Constants, Dict, Value};
pub use error::CfgError;
pub use parser::ParseOptions;
