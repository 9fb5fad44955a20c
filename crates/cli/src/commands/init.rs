//! `sfbridge init`: write a starter configuration file.

use std::path::Path;

use crate::config::BridgeConfig;
use crate::error::{Error, Result};

pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::Config(format!(
            "{} already exists; remove it first to reinitialize",
            path.display()
        )));
    }
    // Offline until credentials are filled in, so the file loads as-is.
    let template = BridgeConfig::offline();
    template.save(path)?;
    println!("wrote {}", path.display());
    println!("fill in the credentials and set `offline = false` to go live");
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
