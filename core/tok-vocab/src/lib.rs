//! Token domains and the global vocabulary built from them (C2/C3).
//!
//! [`TokenDomain`] enumerates a token type's legal values; [`Representation`]
//! composes an ordered list of them into one contiguous id space with
//! forward/backward maps and mask-construction helpers. [`default_spec`]
//! provides the "Expressive encoder" vocabulary this workspace tests
//! against.

pub mod default_spec;
pub mod error;
pub mod representation;
pub mod token_domain;
pub mod token_type;
pub mod token_value;

pub use default_spec::{build_default_representation, default_spec, DEFAULT_GENRES, DEFAULT_TIME_SIGNATURES};
pub use error::VocabError;
pub use representation::Representation;
pub use token_domain::TokenDomain;
pub use token_type::TokenType;
pub use token_value::TokenValue;
