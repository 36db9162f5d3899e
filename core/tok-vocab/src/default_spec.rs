//! core/tok-vocab/src/default_spec.rs
//! The ordered `(TokenType, TokenDomain)` spec for the "Expressive encoder"
//! vocabulary named in §6, used by default across the workspace's tests and
//! by any caller that has not trained a custom pretrain-remapped instrument
//! domain.

use crate::error::VocabError;
use crate::representation::Representation;
use crate::token_domain::TokenDomain;
use crate::token_type::TokenType;

/// Common time signatures covering the 19-entry domain named in §6.
pub const DEFAULT_TIME_SIGNATURES: [(u8, u8); 19] = [
    (4, 4),
    (3, 4),
    (2, 4),
    (6, 8),
    (9, 8),
    (12, 8),
    (5, 4),
    (7, 8),
    (2, 2),
    (3, 8),
    (4, 8),
    (6, 4),
    (5, 8),
    (7, 4),
    (8, 8),
    (11, 8),
    (3, 2),
    (9, 4),
    (1, 4),
];

/// Genre labels for the `Genre` attribute control's token domain.
pub const DEFAULT_GENRES: [&str; 8] =
    ["rock", "jazz", "classical", "pop", "electronic", "folk", "blues", "metal"];

/// Builds the ordered spec described in §6: structural tokens first, then
/// every attribute-control token from §4.3, in the table's declaration
/// order. `TRACK` covers the two non-auxiliary kinds named in §6;
/// `INSTRUMENT` defaults to a plain 128-value range (no pretrain grouping).
pub fn default_spec() -> Result<Vec<(TokenType, TokenDomain)>, VocabError> {
    Ok(vec![
        (TokenType::PieceStart, TokenDomain::range(2)?),
        (TokenType::NumBars, TokenDomain::int_values([4, 8])?),
        (TokenType::Bar, TokenDomain::range(1)?),
        (TokenType::BarEnd, TokenDomain::range(1)?),
        (TokenType::TimeSignature, TokenDomain::timesig_values(DEFAULT_TIME_SIGNATURES)?),
        (TokenType::Track, TokenDomain::range(2)?),
        (TokenType::TrackEnd, TokenDomain::range(1)?),
        (TokenType::Instrument, TokenDomain::range(128)?),
        (TokenType::NoteOnset, TokenDomain::range(128)?),
        (TokenType::NoteDuration, TokenDomain::range(96)?),
        (TokenType::TimeAbsolutePos, TokenDomain::range(192)?),
        (TokenType::FillInPlaceholder, TokenDomain::range(1)?),
        (TokenType::FillInStart, TokenDomain::range(1)?),
        (TokenType::FillInEnd, TokenDomain::range(1)?),
        (TokenType::Delta, TokenDomain::range(96)?),
        (TokenType::DeltaDirection, TokenDomain::range(1)?),
        (TokenType::VelocityLevel, TokenDomain::range(128)?),
        (TokenType::MinNoteDuration, TokenDomain::range(6)?),
        (TokenType::MaxNoteDuration, TokenDomain::range(6)?),
        (TokenType::MinPolyphony, TokenDomain::range(10)?),
        (TokenType::MaxPolyphony, TokenDomain::range(10)?),
        (TokenType::DensityLevel, TokenDomain::range(10)?),
        (TokenType::TrackMinOnsetPolyphony, TokenDomain::range(6)?),
        (TokenType::TrackMaxOnsetPolyphony, TokenDomain::range(6)?),
        (TokenType::TrackMinOnsetDensity, TokenDomain::range(18)?),
        (TokenType::TrackMaxOnsetDensity, TokenDomain::range(18)?),
        (TokenType::NoteDurationClass0, TokenDomain::range(2)?),
        (TokenType::NoteDurationClass1, TokenDomain::range(2)?),
        (TokenType::NoteDurationClass2, TokenDomain::range(2)?),
        (TokenType::NoteDurationClass3, TokenDomain::range(2)?),
        (TokenType::NoteDurationClass4, TokenDomain::range(2)?),
        (TokenType::NoteDurationClass5, TokenDomain::range(2)?),
        (TokenType::TrackMinPitch, TokenDomain::range(128)?),
        (TokenType::TrackMaxPitch, TokenDomain::range(128)?),
        (
            TokenType::Genre,
            TokenDomain::string_values(DEFAULT_GENRES.iter().map(|s| (*s).to_string()))?,
        ),
        (TokenType::BarMinOnsetPolyphony, TokenDomain::range(6)?),
        (TokenType::BarMaxOnsetPolyphony, TokenDomain::range(6)?),
        (TokenType::BarOnsetDensity, TokenDomain::range(18)?),
    ])
}

/// Builds the default [`Representation`] from [`default_spec`].
pub fn build_default_representation() -> Result<Representation, VocabError> {
    Representation::build(default_spec()?)
}
