//! core/tok-controls/src/control.rs
//! The closed set of attribute controls (C4) and the fixed-order registry
//! built from it. Dispatch is a `match` on the variant rather than runtime
//! reflection (§9 design note).

use tok_vocab::TokenType;

use crate::applicability::{ControlLevel, TrackApplicability};

/// One musical attribute, expressible as a conditioning token and a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeControl {
    /// Min/max concurrent onsets across bars (6 classes each).
    TrackLevelOnsetPolyphony,
    /// Min/max unique-onset count per bar (18 classes each).
    TrackLevelOnsetDensity,
    /// Six "contains duration class X" booleans.
    TrackLevelNoteDuration,
    /// 15/85 quantiles of instantaneous polyphony on the flat roll (10 classes each).
    PolyphonyQuantile,
    /// 15/85 quantiles of per-note duration class (6 classes each).
    NoteDurationQuantile,
    /// Average notes/bar, binned (10 classes).
    NoteDensity,
    /// Observed min/max pitch (128 classes each).
    PitchRange,
    /// Genre label, read from piece metadata.
    Genre,
    /// Per-bar min/max concurrent onsets (6 classes each).
    BarLevelOnsetPolyphony,
    /// Per-bar unique-onset count (18 classes).
    BarLevelOnsetDensity,
}

/// Every control, in fixed declaration order. Token emission and edge
/// generation both walk this list in order so the token stream and grammar
/// stay in sync automatically.
pub const REGISTRY: [AttributeControl; 10] = [
    AttributeControl::TrackLevelOnsetPolyphony,
    AttributeControl::TrackLevelOnsetDensity,
    AttributeControl::TrackLevelNoteDuration,
    AttributeControl::PolyphonyQuantile,
    AttributeControl::NoteDurationQuantile,
    AttributeControl::NoteDensity,
    AttributeControl::PitchRange,
    AttributeControl::Genre,
    AttributeControl::BarLevelOnsetPolyphony,
    AttributeControl::BarLevelOnsetDensity,
];

impl AttributeControl {
    /// Where this control's tokens are emitted in the per-track/bar stream.
    #[must_use]
    pub fn level(self) -> ControlLevel {
        match self {
            Self::Genre => ControlLevel::TrackPreInstrument,
            Self::BarLevelOnsetPolyphony | Self::BarLevelOnsetDensity => ControlLevel::Bar,
            _ => ControlLevel::Track,
        }
    }

    /// Which track kinds this control attaches to. Every control in the
    /// default registry applies to both; kept as a per-control query point
    /// so a caller adding a drum-only or instrument-only control does not
    /// need to touch the registry-walking helpers.
    #[must_use]
    pub fn applies_to(self) -> TrackApplicability {
        TrackApplicability::BOTH
    }

    /// The `(token type, domain size)` pairs this control owns, in the
    /// order its tokens are appended to the stream.
    #[must_use]
    pub fn tokens(self) -> &'static [(TokenType, u32)] {
        match self {
            Self::TrackLevelOnsetPolyphony => {
                &[(TokenType::TrackMinOnsetPolyphony, 6), (TokenType::TrackMaxOnsetPolyphony, 6)]
            }
            Self::TrackLevelOnsetDensity => {
                &[(TokenType::TrackMinOnsetDensity, 18), (TokenType::TrackMaxOnsetDensity, 18)]
            }
            Self::TrackLevelNoteDuration => &[
                (TokenType::NoteDurationClass0, 2),
                (TokenType::NoteDurationClass1, 2),
                (TokenType::NoteDurationClass2, 2),
                (TokenType::NoteDurationClass3, 2),
                (TokenType::NoteDurationClass4, 2),
                (TokenType::NoteDurationClass5, 2),
            ],
            Self::PolyphonyQuantile => &[(TokenType::MinPolyphony, 10), (TokenType::MaxPolyphony, 10)],
            Self::NoteDurationQuantile => {
                &[(TokenType::MinNoteDuration, 6), (TokenType::MaxNoteDuration, 6)]
            }
            Self::NoteDensity => &[(TokenType::DensityLevel, 10)],
            Self::PitchRange => &[(TokenType::TrackMinPitch, 128), (TokenType::TrackMaxPitch, 128)],
            Self::Genre => &[(TokenType::Genre, 0)],
            Self::BarLevelOnsetPolyphony => {
                &[(TokenType::BarMinOnsetPolyphony, 6), (TokenType::BarMaxOnsetPolyphony, 6)]
            }
            Self::BarLevelOnsetDensity => &[(TokenType::BarOnsetDensity, 18)],
        }
    }
}

/// Every control whose [`ControlLevel`] is `TrackPreInstrument`, in registry order.
#[must_use]
pub fn track_pre_instrument_controls() -> impl Iterator<Item = AttributeControl> {
    REGISTRY.into_iter().filter(|c| c.level() == ControlLevel::TrackPreInstrument)
}

/// Every control whose [`ControlLevel`] is `Track`, in registry order.
#[must_use]
pub fn track_controls() -> impl Iterator<Item = AttributeControl> {
    REGISTRY.into_iter().filter(|c| c.level() == ControlLevel::Track)
}

/// Every control whose [`ControlLevel`] is `Bar`, in registry order.
#[must_use]
pub fn bar_controls() -> impl Iterator<Item = AttributeControl> {
    REGISTRY.into_iter().filter(|c| c.level() == ControlLevel::Bar)
}

/// The token type -> control lookup, built once per query. Cheap enough
/// (10 entries, linear scan) that no cache is warranted; kept as a free
/// function so callers needing "which control owns this token type" (the
/// grammar builder, the mask builder) share one definition.
#[must_use]
pub fn control_for_token_type(tt: TokenType) -> Option<AttributeControl> {
    REGISTRY.into_iter().find(|c| c.tokens().iter().any(|(t, _)| *t == tt))
}
