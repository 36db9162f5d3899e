//! core/tok-vocab/src/representation.rs
//! Composes an ordered list of `(TokenType, TokenDomain)` pairs into one
//! global vocabulary: the forward/backward encoding maps and mask helpers
//! that `tok-controls`, `tok-grammar`, `tok-codec` and `tok-sample` all build
//! on.

use std::collections::HashMap;

use crate::error::VocabError;
use crate::token_domain::TokenDomain;
use crate::token_type::TokenType;
use crate::token_value::TokenValue;

/// The full token vocabulary: every token type's contiguous id slice, and
/// the forward/backward maps between `(type, value)` and a flat id.
///
/// Immutable after construction; cheap to share behind an `Arc` across
/// attribute controls and `SampleControl` instances (§9 design note).
#[derive(Debug, Clone)]
pub struct Representation {
    vocab_size: u32,
    forward: HashMap<(TokenType, TokenValue), u32>,
    backward: HashMap<u32, (TokenType, TokenValue)>,
    domain_sizes: HashMap<TokenType, u32>,
    slice_start: HashMap<TokenType, u32>,
    token_domains: HashMap<TokenType, TokenDomain>,
    order: Vec<TokenType>,
}

impl Representation {
    /// Builds a representation from an ordered spec. Token types are
    /// assigned contiguous id slices in spec order; a domain built with
    /// [`TokenDomain::repeat`] aliases its target's slice instead of
    /// consuming a new one, and owns no `backward` entries of its own.
    pub fn build(spec: Vec<(TokenType, TokenDomain)>) -> Result<Self, VocabError> {
        let mut vocab_size = 0u32;
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        let mut domain_sizes = HashMap::new();
        let mut slice_start = HashMap::new();
        let mut token_domains = HashMap::new();
        let mut order = Vec::with_capacity(spec.len());

        for (tt, domain) in spec {
            order.push(tt);
            if let Some(of) = domain.repeat_of() {
                let base = *slice_start
                    .get(&of)
                    .expect("repeat() domain must reference a type declared earlier in spec");
                slice_start.insert(tt, base);
                for (value, _local) in domain.entries() {
                    let aliased = *forward
                        .get(&(of, value.clone()))
                        .expect("repeated type must share its target's value domain");
                    forward.insert((tt, value.clone()), aliased);
                }
            } else {
                slice_start.insert(tt, vocab_size);
                for (value, local) in domain.entries() {
                    let id = vocab_size + local;
                    forward.insert((tt, value.clone()), id);
                    backward.insert(id, (tt, value.clone()));
                }
                vocab_size += domain.out_size();
            }
            domain_sizes.insert(tt, domain.out_size());
            token_domains.insert(tt, domain);
        }

        Ok(Self { vocab_size, forward, backward, domain_sizes, slice_start, token_domains, order })
    }

    /// Total vocabulary size.
    #[must_use]
    pub fn vocab_size(&self) -> u32 {
        self.vocab_size
    }

    /// Token types in their declaration order.
    #[must_use]
    pub fn order(&self) -> &[TokenType] {
        &self.order
    }

    /// Encodes `(tt, value)` to its flat id.
    pub fn encode(&self, tt: TokenType, value: impl Into<TokenValue>) -> Result<u32, VocabError> {
        let value = value.into();
        self.forward
            .get(&(tt, value.clone()))
            .copied()
            .ok_or_else(|| VocabError::value_not_in_domain(tt, &value))
    }

    /// Decodes a flat id back to its `(type, value)` pair.
    pub fn decode(&self, id: u32) -> Result<(TokenType, TokenValue), VocabError> {
        self.backward
            .get(&id)
            .cloned()
            .ok_or(VocabError::InvalidToken { id, vocab_size: self.vocab_size })
    }

    /// Decodes `id` as an integer value.
    pub fn decode_int(&self, id: u32) -> Result<i64, VocabError> {
        match self.decode(id)?.1 {
            TokenValue::Int(v) => Ok(v),
            _ => Err(VocabError::WrongDecodeKind { id }),
        }
    }

    /// Decodes `id` as a string value.
    pub fn decode_string(&self, id: u32) -> Result<String, VocabError> {
        match self.decode(id)?.1 {
            TokenValue::Str(v) => Ok(v),
            _ => Err(VocabError::WrongDecodeKind { id }),
        }
    }

    /// Decodes `id` as a time signature value.
    pub fn decode_timesig(&self, id: u32) -> Result<(u8, u8), VocabError> {
        match self.decode(id)?.1 {
            TokenValue::TimeSig(n, d) => Ok((n, d)),
            _ => Err(VocabError::WrongDecodeKind { id }),
        }
    }

    /// The token type of a previously-decoded id, without the value.
    pub fn token_type_of(&self, id: u32) -> Result<TokenType, VocabError> {
        self.decode(id).map(|(tt, _)| tt)
    }

    /// Output domain size for `tt`, or `0` if it is not in this
    /// representation.
    #[must_use]
    pub fn domain_size(&self, tt: TokenType) -> u32 {
        self.domain_sizes.get(&tt).copied().unwrap_or(0)
    }

    /// `true` if `tt` is part of this representation.
    #[must_use]
    pub fn has_token_type(&self, tt: TokenType) -> bool {
        self.domain_sizes.contains_key(&tt)
    }

    /// `true` if every type in `tts` is part of this representation.
    #[must_use]
    pub fn has_token_types(&self, tts: &[TokenType]) -> bool {
        tts.iter().all(|&tt| self.has_token_type(tt))
    }

    /// Sets `mask[slice_start(tt) + idx] = value` for each `idx` in
    /// `indices`, where `idx == -1` means "every index in the domain".
    /// Silently a no-op when `tt` is not part of this representation.
    pub fn set_mask<T: Copy>(&self, tt: TokenType, indices: &[i32], mask: &mut [T], value: T) {
        let (Some(&start), Some(&size)) = (self.slice_start.get(&tt), self.domain_sizes.get(&tt)) else {
            return;
        };
        for &idx in indices {
            if idx == -1 {
                for offset in 0..size {
                    mask[(start + offset) as usize] = value;
                }
            } else {
                let offset = start + idx as u32;
                if offset < start + size {
                    mask[offset as usize] = value;
                }
            }
        }
    }

    /// Builds a fresh mask of `vocab_size` entries, all set to `value`.
    #[must_use]
    pub fn mask_of<T: Copy>(&self, value: T) -> Vec<T> {
        vec![value; self.vocab_size as usize]
    }

    /// A mask with `1` on every id whose token type is in `types`, `0`
    /// elsewhere. Only owned (non-repeat) ids participate, matching
    /// `token_type_of`'s coverage.
    #[must_use]
    pub fn type_mask(&self, types: &[TokenType]) -> Vec<i32> {
        let mut mask = vec![0i32; self.vocab_size as usize];
        for &tt in types {
            let (Some(&start), Some(&size)) = (self.slice_start.get(&tt), self.domain_sizes.get(&tt))
            else {
                continue;
            };
            // repeat-aliased types share another type's slice; only mark it
            // when this type actually owns the backward entries there.
            if self.token_domains.get(&tt).is_some_and(|d| d.repeat_of().is_none()) {
                for offset in 0..size {
                    mask[(start + offset) as usize] = 1;
                }
            }
        }
        mask
    }

    /// `true` when the `INSTRUMENT` domain groups more than one source
    /// program per output id (fewer than 128 distinct outputs).
    #[must_use]
    pub fn has_pretrain_instrument_mapping(&self) -> bool {
        self.domain_size(TokenType::Instrument) > 0 && self.domain_size(TokenType::Instrument) < 128
    }

    /// Raw input values of the `NUM_BARS` domain, if present.
    #[must_use]
    pub fn num_bars_domain(&self) -> Vec<i64> {
        self.token_domains
            .get(&TokenType::NumBars)
            .map(|d| d.values().filter_map(|v| if let TokenValue::Int(i) = v { Some(*i) } else { None }).collect())
            .unwrap_or_default()
    }

    /// Raw input values of the `TIME_SIGNATURE` domain; falls back to a
    /// single implicit `4/4` when no such token type is registered (models
    /// trained without variable time signatures).
    #[must_use]
    pub fn time_signature_domain(&self) -> Vec<(u8, u8)> {
        match self.token_domains.get(&TokenType::TimeSignature) {
            Some(d) => d
                .values()
                .filter_map(|v| if let TokenValue::TimeSig(n, de) = v { Some((*n, *de)) } else { None })
                .collect(),
            None => vec![(4, 4)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_rep() -> Representation {
        Representation::build(vec![
            (TokenType::PieceStart, TokenDomain::range(2).unwrap()),
            (TokenType::NoteOnset, TokenDomain::range(4).unwrap()),
            (TokenType::NoteDuration, TokenDomain::repeat(4, TokenType::NoteOnset).unwrap()),
        ])
        .unwrap()
    }

    #[test]
    fn vocab_size_excludes_repeat_slice() {
        let rep = small_rep();
        assert_eq!(rep.vocab_size(), 6); // 2 (piece_start) + 4 (note_onset), duration aliases
    }

    #[test]
    fn bijection_holds_for_owned_types() {
        let rep = small_rep();
        for v in 0..4i64 {
            let id = rep.encode(TokenType::NoteOnset, v).unwrap();
            assert_eq!(rep.decode_int(id).unwrap(), v);
        }
    }

    #[test]
    fn repeat_alias_decodes_to_canonical_type() {
        let rep = small_rep();
        let onset_id = rep.encode(TokenType::NoteOnset, 2).unwrap();
        let duration_id = rep.encode(TokenType::NoteDuration, 2).unwrap();
        assert_eq!(onset_id, duration_id);
        assert_eq!(rep.token_type_of(duration_id).unwrap(), TokenType::NoteOnset);
    }

    #[test]
    fn encode_unknown_value_fails() {
        let rep = small_rep();
        assert!(rep.encode(TokenType::NoteOnset, 99).is_err());
    }

    #[test]
    fn set_mask_minus_one_unmasks_whole_domain() {
        let rep = small_rep();
        let mut mask = rep.mask_of(0i32);
        rep.set_mask(TokenType::NoteOnset, &[-1], &mut mask, 1);
        let start = rep.encode(TokenType::NoteOnset, 0).unwrap() as usize;
        for offset in 0..4 {
            assert_eq!(mask[start + offset], 1);
        }
    }

    #[test]
    fn set_mask_unknown_type_is_silent_noop() {
        let rep = small_rep();
        let mut mask = rep.mask_of(0i32);
        rep.set_mask(TokenType::Genre, &[-1], &mut mask, 1);
        assert!(mask.iter().all(|&v| v == 0));
    }
}
