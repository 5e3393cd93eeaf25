//! Market status command.

use anyhow::Result;
use chrono::Utc;
use trading_config::AppConfig;
use trading_runner::MarketHours;

pub async fn run(config: &AppConfig) -> Result<()> {
    let hours = MarketHours::from_config(&config.market_hours)?;
    let now = Utc::now();
    let local = now.with_timezone(&hours.timezone());

    println!("Market Status");
    println!("═══════════════════════════════════════════════════════════");
    println!("  Timezone:    {}", hours.timezone().name());
    println!("  Session:     {} - {}", hours.open().format("%H:%M"), hours.close().format("%H:%M"));
    println!("  Local time:  {}", local.format("%a %Y-%m-%d %H:%M:%S %Z"));
    println!(
        "  Status:      {}",
        if hours.is_open(now) { "OPEN" } else { "CLOSED" }
    );

    Ok(())
}
