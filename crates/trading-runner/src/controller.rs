//! Trading loop state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use trading_core::error::TradingError;
use trading_core::traits::{MarketDataProvider, OrderRouter, PositionTracker};
use trading_core::types::MarketSnapshot;
use trading_data::SymbolUniverse;
use trading_risk::{FailureBreaker, OrderGate};
use trading_strategies::DecisionEngine;

use crate::clock::Clock;
use crate::market_hours::MarketHours;
use crate::report::{CycleReport, OrderOutcome, RunSummary, SymbolReport};

/// Loop timing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Wait between market-hours checks while closed
    pub market_closed_poll_secs: u64,
    /// Delay after a completed cycle
    pub cycle_interval_secs: u64,
    /// Delay after a faulted cycle
    pub fault_backoff_secs: u64,
    /// Delay after every snapshot or position call
    pub pacing_secs: u64,
    /// Stop after this many cycles (0 = run until shutdown)
    pub max_cycles: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            market_closed_poll_secs: 180,
            cycle_interval_secs: 15,
            fault_backoff_secs: 15,
            pacing_secs: 15,
            max_cycles: 0,
        }
    }
}

impl LoopConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), TradingError> {
        if self.market_closed_poll_secs == 0 {
            return Err(TradingError::Validation(
                "market_closed_poll_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopState {
    WaitingForMarketOpen,
    CollectingData,
    Deciding,
    Executing,
    Sleeping,
    Faulted,
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::WaitingForMarketOpen => "WAITING_FOR_MARKET_OPEN",
            LoopState::CollectingData => "COLLECTING_DATA",
            LoopState::Deciding => "DECIDING",
            LoopState::Executing => "EXECUTING",
            LoopState::Sleeping => "SLEEPING",
            LoopState::Faulted => "FAULTED",
            LoopState::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}

/// Collaborators and settings for a [`TradingLoop`].
pub struct TradingLoopParts {
    pub universe: SymbolUniverse,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub positions: Arc<dyn PositionTracker>,
    pub router: Arc<dyn OrderRouter>,
    pub engine: DecisionEngine,
    pub gate: OrderGate,
    pub market_hours: MarketHours,
    pub clock: Arc<dyn Clock>,
    pub config: LoopConfig,
    /// Halt after this many consecutive faulted cycles (0 = never)
    pub max_consecutive_faults: u32,
}

/// The trading loop controller.
///
/// Each cycle collects snapshots, then positions, then decides for every
/// usable symbol, then submits gated orders. Per-symbol failures are logged
/// and skipped. A failure of the cycle itself moves to `FAULTED` and the loop
/// resumes after a backoff.
pub struct TradingLoop {
    universe: SymbolUniverse,
    market_data: Arc<dyn MarketDataProvider>,
    positions: Arc<dyn PositionTracker>,
    router: Arc<dyn OrderRouter>,
    engine: DecisionEngine,
    gate: OrderGate,
    market_hours: MarketHours,
    clock: Arc<dyn Clock>,
    config: LoopConfig,
    breaker: FailureBreaker,
    state: LoopState,
    cycle: u64,
    shutdown: Option<watch::Receiver<bool>>,
}

impl TradingLoop {
    /// Create a new trading loop.
    pub fn new(parts: TradingLoopParts) -> Self {
        Self {
            universe: parts.universe,
            market_data: parts.market_data,
            positions: parts.positions,
            router: parts.router,
            engine: parts.engine,
            gate: parts.gate,
            market_hours: parts.market_hours,
            clock: parts.clock,
            config: parts.config,
            breaker: FailureBreaker::new(parts.max_consecutive_faults),
            state: LoopState::WaitingForMarketOpen,
            cycle: 0,
            shutdown: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn universe(&self) -> &SymbolUniverse {
        &self.universe
    }

    fn transition(&mut self, next: LoopState) {
        debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
    }

    fn stop_requested(&self) -> bool {
        self.shutdown.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Sleep, returning early if shutdown is requested.
    async fn pause(&mut self, secs: u64) {
        if secs == 0 {
            return;
        }
        let duration = Duration::from_secs(secs);
        let clock = Arc::clone(&self.clock);

        let mut sender_gone = false;
        match self.shutdown.as_mut() {
            Some(rx) => {
                if *rx.borrow() {
                    return;
                }
                tokio::select! {
                    _ = clock.sleep(duration) => {}
                    changed = rx.changed() => sender_gone = changed.is_err(),
                }
            }
            None => clock.sleep(duration).await,
        }

        if sender_gone {
            self.shutdown = None;
            clock.sleep(duration).await;
        }
    }

    /// Drive the state machine until shutdown, `max_cycles`, or the
    /// failure breaker trips.
    pub async fn run(&mut self, shutdown: watch::Receiver<bool>) -> Result<RunSummary, TradingError> {
        self.shutdown = Some(shutdown);
        let mut summary = RunSummary::default();

        info!(
            symbols = self.universe.len(),
            source = self.engine.source_name(),
            data = self.market_data.name(),
            broker = self.router.name(),
            "Trading loop started"
        );
        self.transition(LoopState::WaitingForMarketOpen);

        loop {
            if self.stop_requested() {
                info!("Shutdown requested");
                break;
            }

            match self.state {
                LoopState::WaitingForMarketOpen => {
                    if self.market_hours.is_open(self.clock.now()) {
                        self.transition(LoopState::CollectingData);
                    } else {
                        summary.closed_checks += 1;
                        info!(
                            wait_secs = self.config.market_closed_poll_secs,
                            "Market is closed, waiting"
                        );
                        self.pause(self.config.market_closed_poll_secs).await;
                    }
                }
                LoopState::CollectingData | LoopState::Deciding | LoopState::Executing => {
                    match self.run_cycle().await {
                        Ok(report) => {
                            if !report.interrupted {
                                self.breaker.record_success();
                            }
                            summary.record_cycle(&report);
                            info!(
                                cycle = report.cycle,
                                decisions = report.decisions().count(),
                                orders = report.orders_submitted(),
                                failed = report.orders_failed(),
                                "Cycle complete"
                            );
                            self.transition(LoopState::Sleeping);
                        }
                        Err(e) => {
                            error!(cycle = self.cycle, error = %e, "Cycle faulted");
                            summary.faulted_cycles += 1;
                            self.transition(LoopState::Faulted);
                            if self.breaker.record_failure() {
                                self.transition(LoopState::Stopped);
                                return Err(TradingError::Halted {
                                    consecutive_faults: self.breaker.consecutive(),
                                });
                            }
                        }
                    }

                    let attempted =
                        summary.cycles + summary.faulted_cycles + summary.interrupted_cycles;
                    if self.config.max_cycles > 0 && attempted >= self.config.max_cycles {
                        info!(cycles = attempted, "Cycle limit reached");
                        break;
                    }
                }
                LoopState::Sleeping => {
                    self.pause(self.config.cycle_interval_secs).await;
                    self.transition(LoopState::WaitingForMarketOpen);
                }
                LoopState::Faulted => {
                    warn!(backoff_secs = self.config.fault_backoff_secs, "Backing off after fault");
                    self.pause(self.config.fault_backoff_secs).await;
                    self.transition(LoopState::WaitingForMarketOpen);
                }
                LoopState::Stopped => break,
            }
        }

        self.transition(LoopState::Stopped);
        info!(
            cycles = summary.cycles,
            faulted = summary.faulted_cycles,
            orders = summary.orders_submitted,
            "Trading loop stopped"
        );
        Ok(summary)
    }

    /// Run one cycle, ignoring market hours.
    ///
    /// Returns an error only for cycle-level faults; per-symbol failures are
    /// recorded in the report.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, TradingError> {
        self.cycle += 1;
        let cycle = self.cycle;
        let started_at = self.clock.now();
        self.transition(LoopState::CollectingData);

        let account = self.positions.get_account().await?;
        info!(cycle, cash = %account.cash, equity = %account.equity, "Account");

        let symbols: Vec<String> = self.universe.symbols().to_vec();
        let mut reports: Vec<SymbolReport> = symbols.iter().map(|s| SymbolReport::new(s)).collect();
        let mut snapshots: Vec<MarketSnapshot> = Vec::with_capacity(symbols.len());
        let mut interrupted = false;

        for report in reports.iter_mut() {
            if self.stop_requested() {
                interrupted = true;
                break;
            }
            let snapshot = match self.market_data.get_snapshot(&report.symbol).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!(symbol = %report.symbol, error = %e, "Failed to get snapshot");
                    report.errors.push(format!("snapshot: {}", e));
                    MarketSnapshot::empty(&report.symbol)
                }
            };
            debug!(symbol = %report.symbol, price = ?snapshot.price, volume = ?snapshot.volume, "Snapshot");
            report.price = snapshot.price;
            report.volume = snapshot.volume;
            snapshots.push(snapshot);
            self.pause(self.config.pacing_secs).await;
        }

        if !interrupted {
            for report in reports.iter_mut() {
                if self.stop_requested() {
                    interrupted = true;
                    break;
                }
                match self.positions.get_position(&report.symbol).await {
                    Ok(position) => {
                        report.position = Some(position.map(|p| p.quantity_f64()).unwrap_or(0.0));
                    }
                    Err(e) => {
                        error!(symbol = %report.symbol, error = %e, "Failed to get position");
                        report.errors.push(format!("position: {}", e));
                    }
                }
                self.pause(self.config.pacing_secs).await;
            }
        }

        if !interrupted && !self.stop_requested() {
            self.transition(LoopState::Deciding);
            for (report, snapshot) in reports.iter_mut().zip(&snapshots) {
                if !snapshot.is_usable() {
                    warn!(symbol = %report.symbol, "Skipping symbol due to missing market data");
                    continue;
                }
                let Some(position) = report.position else {
                    warn!(symbol = %report.symbol, "Skipping symbol due to unknown position");
                    continue;
                };

                let decision = self.engine.decide(&report.symbol, snapshot, position);
                info!(
                    symbol = %report.symbol,
                    action = %decision.action,
                    confidence = decision.confidence,
                    target_quantity = decision.target_quantity,
                    "Decision"
                );
                report.decision = Some(decision);
            }
        } else {
            interrupted = true;
        }

        if !interrupted && !self.stop_requested() {
            self.transition(LoopState::Executing);
            for report in reports.iter_mut() {
                let (Some(decision), Some(position)) = (report.decision, report.position) else {
                    continue;
                };

                let outcome = self.gate.evaluate(&report.symbol, &decision, position);
                if let Some(intent) = outcome.intent() {
                    let submitted = match intent.to_market_request() {
                        Ok(request) => self
                            .router
                            .submit_order(request)
                            .await
                            .map_err(TradingError::from),
                        Err(e) => Err(e),
                    };

                    report.order = Some(match submitted {
                        Ok(order) => {
                            info!(
                                symbol = %order.symbol,
                                side = %order.side,
                                quantity = %order.quantity,
                                order_id = %order.id,
                                "Order submitted"
                            );
                            OrderOutcome::Submitted {
                                order_id: order.id,
                                client_order_id: order.client_order_id,
                                side: order.side,
                                quantity: order.quantity,
                            }
                        }
                        Err(e) => {
                            error!(symbol = %report.symbol, error = %e, "Order submission failed");
                            report.errors.push(format!("order: {}", e));
                            OrderOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    });
                }
                report.gate = Some(outcome);
            }
        } else {
            interrupted = true;
        }

        Ok(CycleReport {
            cycle,
            started_at,
            finished_at: self.clock.now(),
            cash: account.cash,
            equity: account.equity,
            symbols: reports,
            interrupted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use trading_broker::PaperBroker;
    use trading_core::error::{BrokerError, DataError};
    use trading_core::types::{Account, Position};
    use trading_risk::RiskConfig;
    use trading_strategies::{DecisionConfig, FixedSignal};

    struct PricedProvider;

    #[async_trait]
    impl MarketDataProvider for PricedProvider {
        async fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, DataError> {
            Ok(MarketSnapshot::new(symbol, Some(100.0), Some(1e6)))
        }

        fn name(&self) -> &str {
            "priced"
        }
    }

    struct BrokenAccount;

    #[async_trait]
    impl PositionTracker for BrokenAccount {
        async fn get_account(&self) -> Result<Account, BrokerError> {
            Err(BrokerError::Connection("account endpoint down".into()))
        }

        async fn get_position(&self, _symbol: &str) -> Result<Option<Position>, BrokerError> {
            Ok(None)
        }

        async fn get_positions(&self) -> Result<Vec<Position>, BrokerError> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn monday_open() -> DateTime<Utc> {
        // 2024-01-08 10:00 EST
        Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap()
    }

    fn build(
        positions: Arc<dyn PositionTracker>,
        clock: Arc<ManualClock>,
        config: LoopConfig,
        max_consecutive_faults: u32,
    ) -> TradingLoop {
        let broker = PaperBroker::new(dec!(10000));
        TradingLoop::new(TradingLoopParts {
            universe: SymbolUniverse::from_symbols(["AAPL"]),
            market_data: Arc::new(PricedProvider),
            positions,
            router: Arc::new(broker),
            engine: DecisionEngine::new(
                DecisionConfig::default(),
                Arc::new(FixedSignal::new(0.0).unwrap()),
            ),
            gate: OrderGate::new(&RiskConfig::default()),
            market_hours: MarketHours::us_equities(),
            clock,
            config,
            max_consecutive_faults,
        })
    }

    #[tokio::test]
    async fn test_faulted_cycles_back_off() {
        let clock = Arc::new(ManualClock::new(monday_open()));
        let config = LoopConfig {
            max_cycles: 2,
            ..Default::default()
        };
        let mut trading_loop = build(Arc::new(BrokenAccount), clock.clone(), config, 0);

        let (_tx, rx) = watch::channel(false);
        let summary = trading_loop.run(rx).await.unwrap();

        assert_eq!(summary.cycles, 0);
        assert_eq!(summary.faulted_cycles, 2);
        // Only the first fault's backoff runs before the cycle limit stops the loop
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(15)]);
        assert_eq!(trading_loop.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn test_breaker_halts_loop() {
        let clock = Arc::new(ManualClock::new(monday_open()));
        let mut trading_loop = build(Arc::new(BrokenAccount), clock, LoopConfig::default(), 3);

        let (_tx, rx) = watch::channel(false);
        let result = trading_loop.run(rx).await;

        assert!(matches!(
            result,
            Err(TradingError::Halted { consecutive_faults: 3 })
        ));
        assert_eq!(trading_loop.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let clock = Arc::new(ManualClock::new(monday_open()));
        let broker = PaperBroker::new(dec!(1000));
        let mut trading_loop = build(Arc::new(broker), clock.clone(), LoopConfig::default(), 0);

        let (_tx, rx) = watch::channel(true);
        let summary = trading_loop.run(rx).await.unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_waits_for_market_open() {
        // Saturday 2024-01-06 10:00 EST
        let start = Utc.with_ymd_and_hms(2024, 1, 6, 15, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let config = LoopConfig {
            max_cycles: 1,
            ..Default::default()
        };
        let broker = PaperBroker::new(dec!(1000));
        let mut trading_loop = build(Arc::new(broker), clock.clone(), config, 0);

        let (_tx, rx) = watch::channel(false);
        let summary = trading_loop.run(rx).await.unwrap();

        assert_eq!(summary.cycles, 1);
        assert!(summary.closed_checks > 0);
        assert_eq!(clock.sleeps()[0], Duration::from_secs(180));
        assert!(MarketHours::us_equities().is_open(clock.now()));
    }

    #[tokio::test]
    async fn test_run_cycle_paces_every_call() {
        let clock = Arc::new(ManualClock::new(monday_open()));
        let broker = PaperBroker::new(dec!(1000));
        let mut trading_loop = build(Arc::new(broker), clock.clone(), LoopConfig::default(), 0);

        let report = trading_loop.run_cycle().await.unwrap();

        // one snapshot call and one position call
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(15); 2]);
        assert_eq!(report.cycle, 1);
        assert_eq!(report.symbols[0].position, Some(0.0));
        assert!(report.symbols[0].decision.unwrap().is_hold());
        assert_eq!(trading_loop.state(), LoopState::Executing);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LoopState::WaitingForMarketOpen.to_string(), "WAITING_FOR_MARKET_OPEN");
        assert_eq!(LoopState::Faulted.to_string(), "FAULTED");
    }
}
