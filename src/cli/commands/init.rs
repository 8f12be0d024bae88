//! Write a default configuration file.

use anyhow::{bail, Context, Result};
use lolmarket_config::default_config_toml;
use std::path::Path;

use crate::cli::InitConfigArgs;

pub async fn run(args: &InitConfigArgs, config_path: &Path) -> Result<()> {
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to overwrite it",
            config_path.display()
        );
    }

    let content = default_config_toml()?;
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Wrote default configuration to {}", config_path.display());
    Ok(())
}
