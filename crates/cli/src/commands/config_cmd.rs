//! `fieldstate config` — Configuration management commands.

use fieldstate_config::FieldConfig;

pub async fn default() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", FieldConfig::default_toml());
    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    println!("# data dir: {}", config.storage.resolved_data_dir().display());
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = FieldConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match FieldConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            if !config.drift.enabled {
                warnings.push("Drift disabled: resonance starts at base and never replays");
            }
            if config.drift.max_catchup_hours == 0 {
                warnings.push("drift.max_catchup_hours = 0: missed hours are never applied");
            }
            if config.session.reconnect_threshold_minutes == 0 {
                warnings.push("Every load of an active field counts as a reconnection");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Key prefix:  {}", config.storage.key_prefix);
            println!("   Data dir:    {}", config.storage.resolved_data_dir().display());
            println!("   Base:        {}", config.resonance.base);
            println!(
                "   Initial:     {}..={}",
                config.resonance.initial_min, config.resonance.initial_max
            );
            println!("   Catch-up:    {}h", config.drift.max_catchup_hours);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = fieldstate_config::FieldConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains("config.toml"));
    }

    #[test]
    fn default_toml_parses_back() {
        let rendered = fieldstate_config::FieldConfig::default_toml();
        let parsed: fieldstate_config::FieldConfig = toml::from_str(&rendered).unwrap();
        parsed.validate().unwrap();
    }
}
