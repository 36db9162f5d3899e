//! Multi-step generation planner (C8): splits a selection matrix into
//! bounded, overlapping autoregressive-then-infill steps a [`tok_sample`]
//! sequence can be driven over one bar window at a time.
//!
//! [`BoolMatrix`] is the planner's dense working type for selection/resample/
//! ignore/covered state; [`plan`] is the one entry point, returning an
//! ordered list of [`Step`]s.

pub mod error;
pub mod matrix;
pub mod plan;

pub use error::PlanError;
pub use matrix::BoolMatrix;
pub use plan::{plan, BarMapping, Step};
