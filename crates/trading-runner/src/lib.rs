//! Trading loop controller.
//!
//! Drives the market-hours gate, data collection, per-symbol decisions and
//! order submission as an explicit state machine.

mod clock;
mod controller;
mod market_hours;
mod report;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{LoopConfig, LoopState, TradingLoop, TradingLoopParts};
pub use market_hours::{MarketHours, MarketHoursConfig};
pub use report::{CycleReport, OrderOutcome, RunSummary, SymbolReport};
