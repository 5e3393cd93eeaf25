//! Trading decisions.
//!
//! This crate turns a market snapshot and a held quantity into a bounded
//! BUY/SELL/HOLD instruction. The signal that drives the decision comes from
//! one of several interchangeable sources:
//! - Position heuristic (exposure-based rule)
//! - Seeded random source for exploratory runs
//! - Trained policy artifact
//! - Fixed signal for demos and tests

mod engine;
mod fixed;
mod heuristic;
mod policy;
mod random;
mod registry;

pub use engine::{DecisionConfig, DecisionEngine};
pub use fixed::FixedSignal;
pub use heuristic::{HeuristicConfig, PositionHeuristic};
pub use policy::{build_observation, LinearPolicy, PolicySignal, OBSERVATION_DIM};
pub use random::RandomSignal;
pub use registry::{SignalSettings, SignalSourceInfo, SignalSourceKind, SignalSourceRegistry};
