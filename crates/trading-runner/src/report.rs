//! Per-cycle and per-run reports.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_core::types::{Decision, Side};
use trading_risk::GateOutcome;

/// Result of an order submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderOutcome {
    Submitted {
        order_id: String,
        client_order_id: String,
        side: Side,
        quantity: Decimal,
    },
    Failed {
        error: String,
    },
}

/// What happened to one symbol during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    /// Held quantity, `None` if the lookup failed
    pub position: Option<f64>,
    pub decision: Option<Decision>,
    pub gate: Option<GateOutcome>,
    pub order: Option<OrderOutcome>,
    /// Errors raised for this symbol, in stage order
    pub errors: Vec<String>,
}

impl SymbolReport {
    pub(crate) fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: None,
            volume: None,
            position: None,
            decision: None,
            gate: None,
            order: None,
            errors: Vec::new(),
        }
    }
}

/// Outcome of one pass over the symbol universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cash: Decimal,
    pub equity: Decimal,
    pub symbols: Vec<SymbolReport>,
    /// Shutdown was requested before the cycle finished
    pub interrupted: bool,
}

impl CycleReport {
    pub fn decisions(&self) -> impl Iterator<Item = (&str, &Decision)> {
        self.symbols
            .iter()
            .filter_map(|s| s.decision.as_ref().map(|d| (s.symbol.as_str(), d)))
    }

    pub fn orders_submitted(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| matches!(s.order, Some(OrderOutcome::Submitted { .. })))
            .count()
    }

    pub fn orders_failed(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| matches!(s.order, Some(OrderOutcome::Failed { .. })))
            .count()
    }

    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str(&format!("                     CYCLE {} REPORT\n", self.cycle));
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("ACCOUNT\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Cash:                ${:.2}\n", self.cash));
        s.push_str(&format!("  Equity:              ${:.2}\n", self.equity));
        s.push_str(&format!(
            "  Duration:            {}s\n",
            (self.finished_at - self.started_at).num_seconds()
        ));
        if self.interrupted {
            s.push_str("  Interrupted by shutdown\n");
        }
        s.push('\n');

        s.push_str("SYMBOLS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        for report in &self.symbols {
            let price = report
                .price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".to_string());
            let position = report
                .position
                .map(|p| format!("{}", p))
                .unwrap_or_else(|| "-".to_string());
            let decision = report
                .decision
                .map(|d| {
                    format!(
                        "{} conf={:.2} target={}",
                        d.action, d.confidence, d.target_quantity
                    )
                })
                .unwrap_or_else(|| "skipped".to_string());
            let order = match &report.order {
                Some(OrderOutcome::Submitted { side, quantity, .. }) => {
                    format!(" -> {} {}", side, quantity)
                }
                Some(OrderOutcome::Failed { error }) => format!(" -> order failed: {}", error),
                None => String::new(),
            };
            s.push_str(&format!(
                "  {:<6} price={:<10} pos={:<6} {}{}\n",
                report.symbol, price, position, decision, order
            ));
            for error in &report.errors {
                s.push_str(&format!("         ! {}\n", error));
            }
        }
        s.push('\n');

        s.push_str(&format!(
            "  Orders submitted: {}   failed: {}\n",
            self.orders_submitted(),
            self.orders_failed()
        ));

        s
    }
}

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Cycles that completed
    pub cycles: u64,
    /// Cycles abandoned after a fault
    pub faulted_cycles: u64,
    /// Cycles cut short by shutdown
    pub interrupted_cycles: u64,
    /// Market-hours checks that found the market closed
    pub closed_checks: u64,
    pub orders_submitted: u64,
    pub orders_failed: u64,
}

impl RunSummary {
    pub(crate) fn record_cycle(&mut self, report: &CycleReport) {
        if report.interrupted {
            self.interrupted_cycles += 1;
        } else {
            self.cycles += 1;
        }
        self.orders_submitted += report.orders_submitted() as u64;
        self.orders_failed += report.orders_failed() as u64;
    }
}
