//! core/tok-vocab/src/token_domain.rs
//! A `TokenDomain` enumerates the legal input values for one token type and
//! assigns each a contiguous output index.

use std::collections::HashMap;

use crate::error::VocabError;
use crate::token_type::TokenType;
use crate::token_value::TokenValue;

/// Domains larger than this are almost certainly a misconfiguration (e.g. a
/// per-instrument domain accidentally built from every MIDI program times
/// several octaves); carried over from the original implementation's same
/// sanity bound.
pub const MAX_DOMAIN_SIZE: usize = 512;

/// The domain of legal values for one token type, and their mapping to a
/// contiguous `[0, out_size)` output range.
///
/// Construct with one of the associated functions below rather than the
/// fields directly; they guarantee the output range stays contiguous and,
/// for the "repeat" form, that no local slice is allocated at all (the
/// repeated type's id slice is aliased by [`crate::Representation`] instead).
#[derive(Debug, Clone)]
pub struct TokenDomain {
    /// Values in declaration order, paired with their output index.
    entries: Vec<(TokenValue, u32)>,
    /// Fast value -> index lookup.
    mapping: HashMap<TokenValue, u32>,
    /// Number of distinct output indices.
    out_size: u32,
    /// Set when this domain aliases another token type's id slice rather
    /// than owning one.
    repeat_of: Option<TokenType>,
}

impl TokenDomain {
    fn from_values(values: Vec<TokenValue>) -> Result<Self, VocabError> {
        if values.len() > MAX_DOMAIN_SIZE {
            return Err(VocabError::TokenDomainTooLarge { requested: values.len() });
        }
        let mut mapping = HashMap::with_capacity(values.len());
        let mut entries = Vec::with_capacity(values.len());
        for (idx, value) in values.into_iter().enumerate() {
            let idx = idx as u32;
            mapping.insert(value.clone(), idx);
            entries.push((value, idx));
        }
        let out_size = entries.len() as u32;
        Ok(Self { entries, mapping, out_size, repeat_of: None })
    }

    /// Builds `[0, n)` as an integer domain.
    pub fn range(n: u32) -> Result<Self, VocabError> {
        Self::from_values((0..i64::from(n)).map(TokenValue::Int).collect())
    }

    /// Builds `[min, max)` as an integer domain.
    pub fn int_range(min: i64, max: i64) -> Result<Self, VocabError> {
        Self::from_values((min..max).map(TokenValue::Int).collect())
    }

    /// Builds a domain from an explicit, order-preserved list of integers.
    pub fn int_values(values: impl IntoIterator<Item = i64>) -> Result<Self, VocabError> {
        Self::from_values(values.into_iter().map(TokenValue::Int).collect())
    }

    /// Builds a domain from an explicit, order-preserved list of strings.
    pub fn string_values(values: impl IntoIterator<Item = String>) -> Result<Self, VocabError> {
        Self::from_values(values.into_iter().map(TokenValue::Str).collect())
    }

    /// Builds a domain from an explicit, order-preserved list of time
    /// signatures.
    pub fn timesig_values(values: impl IntoIterator<Item = (u8, u8)>) -> Result<Self, VocabError> {
        Self::from_values(values.into_iter().map(TokenValue::from).collect())
    }

    /// Builds a domain from a value -> user-chosen-index map, repacking the
    /// user indices into a contiguous range (the first distinct index seen,
    /// in iteration order, becomes `0`, the second `1`, and so on). This is
    /// how pretraining instrument groups collapse many source values onto
    /// one output id.
    pub fn mapped(pairs: impl IntoIterator<Item = (TokenValue, i64)>) -> Result<Self, VocabError> {
        let pairs: Vec<(TokenValue, i64)> = pairs.into_iter().collect();
        if pairs.len() > MAX_DOMAIN_SIZE {
            return Err(VocabError::TokenDomainTooLarge { requested: pairs.len() });
        }
        let mut contiguous: HashMap<i64, u32> = HashMap::new();
        let mut mapping = HashMap::with_capacity(pairs.len());
        let mut entries = Vec::with_capacity(pairs.len());
        for (value, user_index) in pairs {
            let next = contiguous.len() as u32;
            let packed = *contiguous.entry(user_index).or_insert(next);
            mapping.insert(value.clone(), packed);
            entries.push((value, packed));
        }
        let out_size = contiguous.len() as u32;
        Ok(Self { entries, mapping, out_size, repeat_of: None })
    }

    /// Builds a "repeat" domain of size `n` that aliases `of`'s id slice.
    /// [`crate::Representation`] recognizes `repeat_of` and skips allocating
    /// a new slice, pointing every `(tt, value)` at the `of` type's existing
    /// ids instead.
    pub fn repeat(n: u32, of: TokenType) -> Result<Self, VocabError> {
        let mut domain = Self::range(n)?;
        domain.repeat_of = Some(of);
        Ok(domain)
    }

    /// Encodes `value` to its output index.
    pub fn encode(&self, value: &TokenValue) -> Option<u32> {
        self.mapping.get(value).copied()
    }

    /// Number of distinct output indices this domain owns (or aliases).
    #[must_use]
    pub fn out_size(&self) -> u32 {
        self.out_size
    }

    /// The token type this domain's ids are aliased from, if any.
    #[must_use]
    pub fn repeat_of(&self) -> Option<TokenType> {
        self.repeat_of
    }

    /// Iterates `(value, output_index)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &(TokenValue, u32)> {
        self.entries.iter()
    }

    /// Iterates every legal input value, in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &TokenValue> {
        self.entries.iter().map(|(v, _)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_domain_is_contiguous() {
        let domain = TokenDomain::range(4).unwrap();
        assert_eq!(domain.out_size(), 4);
        assert_eq!(domain.encode(&TokenValue::Int(2)), Some(2));
        assert_eq!(domain.encode(&TokenValue::Int(4)), None);
    }

    #[test]
    fn mapped_domain_repacks_contiguously() {
        // five source instruments collapse onto two pretrain groups: 10 and 20
        let domain = TokenDomain::mapped([
            (TokenValue::Int(0), 10),
            (TokenValue::Int(1), 10),
            (TokenValue::Int(2), 20),
            (TokenValue::Int(3), 20),
            (TokenValue::Int(4), 10),
        ])
        .unwrap();
        assert_eq!(domain.out_size(), 2);
        assert_eq!(domain.encode(&TokenValue::Int(0)), Some(0));
        assert_eq!(domain.encode(&TokenValue::Int(2)), Some(1));
        assert_eq!(domain.encode(&TokenValue::Int(4)), Some(0));
    }

    #[test]
    fn repeat_domain_has_no_owned_slice_but_same_size() {
        let domain = TokenDomain::repeat(8, TokenType::NoteOnset).unwrap();
        assert_eq!(domain.out_size(), 8);
        assert_eq!(domain.repeat_of(), Some(TokenType::NoteOnset));
    }

    #[test]
    fn oversized_domain_is_rejected() {
        let err = TokenDomain::range(600).unwrap_err();
        assert!(matches!(err, VocabError::TokenDomainTooLarge { requested: 600 }));
    }

    #[test]
    fn timesig_domain_round_trips() {
        let domain = TokenDomain::timesig_values([(4, 4), (3, 4), (6, 8)]).unwrap();
        assert_eq!(domain.encode(&TokenValue::TimeSig(3, 4)), Some(1));
    }
}
