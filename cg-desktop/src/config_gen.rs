use std::fs;
use std::path::Path;

use cg_core::config::{PlayerConfig, SystemConfig};
use serde::Serialize;

#[derive(Serialize)]
struct FullConfig {
    system: SystemConfig,
    player: PlayerConfig,
}

fn default_toml() -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&FullConfig {
        system: SystemConfig::default(),
        player: PlayerConfig::default(),
    })
}

pub fn ensure_config_exists(path: &str) {
    if Path::new(path).exists() {
        return;
    }

    println!("Creating default configuration at '{}'...", path);

    let toml_str = match default_toml() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to serialize default config: {}", e);
            return;
        }
    };

    if let Err(e) = fs::write(path, toml_str) {
        eprintln!("Failed to write config file: {}", e);
    } else {
        println!("Config file created successfully.");
    }
}
