//! `rxbus config`: show the effective bus configuration.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Print the configuration the demos will run with.
pub fn show_config(state: &AppState, json: bool) -> Result<()> {
    let exists = state.config_path.exists();

    if json {
        let out = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "config_path": state.config_path.display().to_string(),
            "config_file_exists": exists,
            "config": state.config,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} rxbus v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("  {}", style("── Config ──").dim());
    println!("  Data dir:         {}", state.data_dir.display());
    println!(
        "  Config file:      {} {}",
        state.config_path.display(),
        if exists {
            style("(loaded)").green()
        } else {
            style("(not found, defaults)").yellow()
        }
    );
    println!(
        "  Channel capacity: {}",
        style(state.config.effective_capacity()).bold()
    );
    println!("  Log events:       {}", state.config.log_events);
    println!();
    Ok(())
}
