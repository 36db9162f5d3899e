//! core/tok-vocab/src/token_value.rs
//! The three shapes a token's input value can take.

use std::fmt;

/// The value carried by one instance of a token type: an integer, a string,
/// or a (numerator, denominator) time signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenValue {
    /// Integer-valued token (pitch, duration class, velocity class, ...).
    Int(i64),
    /// String-valued token (used for e.g. genre labels).
    Str(String),
    /// Time-signature-valued token.
    TimeSig(u8, u8),
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
            Self::TimeSig(n, d) => write!(f, "{n}/{d}"),
        }
    }
}

impl From<i64> for TokenValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for TokenValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for TokenValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<(u8, u8)> for TokenValue {
    fn from(v: (u8, u8)) -> Self {
        Self::TimeSig(v.0, v.1)
    }
}
