//! Process-wide configuration store.
//!
//! The whole `config.toml` is kept as a raw table; each crate pulls out and
//! deserialises only the section it owns with [`get`].

use std::fs;
use std::path::Path;
use std::sync::RwLock;

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use toml::Table;

static GLOBAL_CONFIG: OnceCell<RwLock<Table>> = OnceCell::new();

/// Loads `path`. A missing file or a syntax error leaves an empty table so
/// every section falls back to its defaults.
pub fn init<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();

    let content = if path.exists() {
        log::info!("Loading config from {:?}", path);
        fs::read_to_string(path)?
    } else {
        log::warn!("Config file not found at {:?}, using defaults.", path);
        String::new()
    };

    let table: Table = toml::from_str(&content).unwrap_or_else(|e| {
        log::error!("Config syntax error: {}, using empty config.", e);
        Table::new()
    });

    install(table);
    Ok(())
}

/// Installs configuration from a TOML string, replacing any previous one.
pub fn init_from_str(content: &str) -> anyhow::Result<()> {
    let table: Table = toml::from_str(content)?;
    install(table);
    Ok(())
}

pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

/// Section `key` deserialised as `T`, or `T::default()` when the section is
/// absent, malformed, or nothing was loaded yet.
pub fn get<T: DeserializeOwned + Default>(key: &str) -> T {
    let Some(store) = GLOBAL_CONFIG.get() else {
        log::debug!("Config not initialized, section '[{}]' uses defaults.", key);
        return T::default();
    };
    let read_guard = store.read().unwrap_or_else(|e| e.into_inner());

    match read_guard.get(key) {
        Some(value) => value.clone().try_into().unwrap_or_else(|e| {
            log::warn!("Config section '[{}]' mismatch: {}. Using default.", key, e);
            T::default()
        }),
        None => T::default(),
    }
}

fn install(table: Table) {
    let store = GLOBAL_CONFIG.get_or_init(|| RwLock::new(Table::new()));
    let mut guard = store.write().unwrap_or_else(|e| e.into_inner());
    *guard = table;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct Section {
        speed: f32,
        name: String,
    }

    impl Default for Section {
        fn default() -> Self {
            Self { speed: 1.0, name: "default".into() }
        }
    }

    #[test]
    fn sections_fall_back_to_defaults() {
        init_from_str("[present]\nspeed = 2.5\n\n[broken]\nspeed = \"fast\"\n").unwrap();

        let present: Section = get("present");
        assert_eq!(present.speed, 2.5);
        assert_eq!(present.name, "default");

        let broken: Section = get("broken");
        assert_eq!(broken, Section::default());

        let missing: Section = get("missing");
        assert_eq!(missing, Section::default());
        assert!(is_initialized());
    }
}
