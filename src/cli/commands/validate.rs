//! Validate configuration command.

use anyhow::Result;
use lolmarket_config::load_config;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("API: {}", config.api.base_url);
            println!(
                "User: {}",
                config.session.user_id.as_deref().unwrap_or("(signed out)")
            );
            match config.cache.stale_after_secs {
                Some(secs) => println!("Revalidate after: {}s", secs),
                None => println!("Revalidate after: every view"),
            }
            match config.cache.poll_interval() {
                Some(interval) => println!("Poll interval: {}s", interval.as_secs()),
                None => println!("Poll interval: off"),
            }
            println!("Refresh delay: {}ms", config.cache.refresh_delay_ms);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
