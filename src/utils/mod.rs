pub mod introspect;
pub mod token_parser;

pub use token_parser::{bind_sql, GenericTokenParser, ParameterMappingTokenHandler, TokenHandler};
