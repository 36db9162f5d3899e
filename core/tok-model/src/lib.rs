//! Piece/track/bar/event data model, feature records, generation requests,
//! hyperparameters, and pre-planning validation.
//!
//! This crate owns no encoding logic: `tok-codec` turns a [`Piece`] into
//! tokens and back, `tok-controls` fills [`TrackFeatures`]/[`BarFeatures`],
//! and `tok-sample`/`tok-plan` consume [`Status`]/[`HyperParam`]. Everything
//! here is a plain, serde-round-trippable value type.

pub mod bar;
pub mod error;
pub mod event;
pub mod features;
pub mod hyperparam;
pub mod piece;
pub mod status;
pub mod track;
pub mod validate;

pub use bar::Bar;
pub use error::PieceError;
pub use event::Event;
pub use features::{BarFeatures, PieceFeatures, TrackFeatures};
pub use hyperparam::{HyperParam, Verbosity};
pub use piece::Piece;
pub use status::{SelectionClass, Status, StatusBar, StatusTrack};
pub use track::{Track, TrackType};
