//! Validate configuration command.

use anyhow::Result;
use trading_config::AppConfig;

pub async fn run(config: &AppConfig) -> Result<()> {
    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Data provider: {}", config.data.provider);
    println!("Alpaca paper mode: {}", config.alpaca.paper);
    println!("Signal source: {}", config.signal.kind);
    println!("Min confidence: {}", config.risk.min_confidence);
    println!(
        "Thresholds: buy > {}, sell < {}",
        config.decision.buy_threshold, config.decision.sell_threshold
    );
    println!("Size multiplier: {}", config.decision.size_multiplier);
    println!(
        "Market hours: {} {}-{}",
        config.market_hours.timezone, config.market_hours.open, config.market_hours.close
    );
    println!("Universe: {}", config.universe.symbols.join(", "));

    Ok(())
}
