//! Declarative load profiles and the concurrency/rate curves they describe.
mod curve;
mod types;


pub use curve::ProfileSamples;
pub use types::{ProfileKind, ScenarioProfile, Stage};
