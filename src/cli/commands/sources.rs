//! List signal sources command.

use anyhow::Result;
use trading_strategies::SignalSourceRegistry;

pub async fn run() -> Result<()> {
    let registry = SignalSourceRegistry::new();

    println!("Available Signal Sources");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        println!("  {} ", info.kind);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!();
    }

    println!("Use --signal-source <name> or [signal] kind in the config to select one.");

    Ok(())
}
