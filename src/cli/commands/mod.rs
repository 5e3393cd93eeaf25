//! CLI command implementations.

pub mod decide;
pub mod market_status;
pub mod run;
pub mod sources;
pub mod validate;
