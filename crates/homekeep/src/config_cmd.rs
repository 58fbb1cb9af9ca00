use std::path::Path;

use anyhow::Result;
use hk_config::HomeConfig;
use hk_core::OutputFormat;

pub(crate) fn handle_config_init(path: Option<&Path>) -> Result<()> {
    let written = HomeConfig::save_default_template(path)?;
    eprintln!("Generated config template at: {}", written.display());
    Ok(())
}

pub(crate) fn handle_config_show(config: &HomeConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json_str = serde_json::to_string_pretty(config)?;
            println!("{json_str}");
        }
        OutputFormat::Text => {
            let toml_str = toml::to_string_pretty(config)?;
            print!("{toml_str}");
        }
    }
    Ok(())
}
