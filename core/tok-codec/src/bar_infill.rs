//! core/tok-codec/src/bar_infill.rs
//! Splices trailing fill-in blocks back into their `FILL_IN_PLACEHOLDER`
//! slots (§4.4 "Bar-infill resolution").

use tok_vocab::{Representation, TokenType};

use crate::error::CodecError;

/// Replaces each `FILL_IN_PLACEHOLDER`, in order of appearance, with the
/// contents of the next `FILL_IN_START..FILL_IN_END` block (exclusive of
/// the delimiters themselves). Trailing fill blocks with no matching
/// placeholder are dropped. Linear in `tokens.len()`.
pub fn resolve_bar_infill_tokens(tokens: &[u32], rep: &Representation) -> Result<Vec<u32>, CodecError> {
    let types: Vec<TokenType> = tokens.iter().map(|&id| rep.token_type_of(id)).collect::<Result<_, _>>()?;

    let fill_blocks: Vec<&[u32]> = {
        let mut blocks = Vec::new();
        let mut i = 0;
        while i < types.len() {
            if types[i] == TokenType::FillInStart {
                let start = i + 1;
                let mut end = start;
                while end < types.len() && types[end] != TokenType::FillInEnd {
                    end += 1;
                }
                blocks.push(&tokens[start..end]);
                i = end + 1;
            } else {
                i += 1;
            }
        }
        blocks
    };

    let mut out = Vec::new();
    let mut next_block = 0usize;
    for (i, &tt) in types.iter().enumerate() {
        match tt {
            TokenType::FillInPlaceholder => {
                if let Some(block) = fill_blocks.get(next_block) {
                    out.extend_from_slice(block);
                    next_block += 1;
                }
            }
            TokenType::FillInStart => break,
            _ => out.push(tokens[i]),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tok_vocab::build_default_representation;

    #[test]
    fn splices_single_fill_block_into_its_placeholder() {
        let rep = build_default_representation().unwrap();
        let placeholder = rep.encode(TokenType::FillInPlaceholder, 0i64).unwrap();
        let onset = rep.encode(TokenType::NoteOnset, 60i64).unwrap();
        let fill_start = rep.encode(TokenType::FillInStart, 0i64).unwrap();
        let fill_end = rep.encode(TokenType::FillInEnd, 0i64).unwrap();

        let tokens = vec![placeholder, fill_start, onset, fill_end];
        let resolved = resolve_bar_infill_tokens(&tokens, &rep).unwrap();
        assert_eq!(resolved, vec![onset]);
    }

    #[test]
    fn drops_unmatched_trailing_fill_blocks() {
        let rep = build_default_representation().unwrap();
        let piece_start = rep.encode(TokenType::PieceStart, 0i64).unwrap();
        let onset = rep.encode(TokenType::NoteOnset, 60i64).unwrap();
        let fill_start = rep.encode(TokenType::FillInStart, 0i64).unwrap();
        let fill_end = rep.encode(TokenType::FillInEnd, 0i64).unwrap();

        let tokens = vec![piece_start, fill_start, onset, fill_end];
        let resolved = resolve_bar_infill_tokens(&tokens, &rep).unwrap();
        assert_eq!(resolved, vec![piece_start]);
    }
}
