//! Attribute controls (C4): one entry per musical attribute, each computing
//! features from a piece, emitting conditioning tokens, and unmasking the
//! values a [`tok_model::Status`] request allows.
//!
//! [`control::AttributeControl`] is a closed sum type dispatched by `match`,
//! not runtime polymorphism (§9 design note); [`control::REGISTRY`] fixes
//! the declaration order that both token emission (`tokens`) and grammar
//! edge generation (`tok-grammar`) walk.

pub mod applicability;
pub mod compute;
pub mod control;
pub mod evaluate;
pub mod features;
pub mod mask;
pub mod tokens;

pub use applicability::{ControlLevel, TrackApplicability};
pub use control::{bar_controls, control_for_token_type, track_controls, track_pre_instrument_controls, AttributeControl, REGISTRY};
pub use evaluate::{evaluate_onset_density, evaluate_track};
pub use features::{compute_all_features, compute_bar_features, compute_track_features};
pub use mask::{override_bar_features, override_track_features, set_bar_masks, set_track_masks};
pub use tokens::{append_bar_tokens, append_track_pre_instrument_tokens, append_track_tokens};
