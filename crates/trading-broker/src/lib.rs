//! Broker integrations.

mod alpaca;
mod paper;

pub use alpaca::{AlpacaBroker, AlpacaConfig};
pub use paper::{MarkingProvider, PaperBroker};
