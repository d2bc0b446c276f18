use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::Config;

/// Creates the `.taskdeck` directory and records the backend base URL.
/// Running it again just repoints the existing checkout.
pub fn run(cwd: &Path, server: &str) -> Result<()> {
    let dir = cwd.join(".taskdeck");
    let existed = dir.exists();
    if !existed {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let config = Config {
        server: server.trim_end_matches('/').to_string(),
    };
    config.save(&dir)?;

    if existed {
        println!("Updated backend to {}", config.server);
    } else {
        println!("Initialized taskdeck in {}", dir.display());
        println!("Backend: {}", config.server);
        println!("Next: taskdeck login <username>");
    }

    Ok(())
}
