//! `seomagic config` — Print the default or effective configuration.

use seomagic_config::AppConfig;
use std::path::Path;

pub fn run(config_path: Option<&Path>, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !show {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = super::load_config(config_path)?;
    println!("{config:#?}");

    let mut warnings = Vec::new();
    if !config.has_model_key() {
        warnings.push("ANTHROPIC_API_KEY not set: chat is disabled");
    }
    if !config.has_remote_key() {
        warnings.push("JUSTMAGIC_API_KEY not set: tools and task commands are disabled");
    }
    for w in &warnings {
        eprintln!("   warning: {w}");
    }
    Ok(())
}
