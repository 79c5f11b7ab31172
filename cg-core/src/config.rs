use std::time::Duration;

use cg_script::Language;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub chapters_path: String,
    pub log_path:      String,
    pub log_level:     String,
}

/// Pacing of the cutscene player. Speeds are per second of unpaused time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Length of one animation tick in milliseconds.
    pub tick_ms: u64,
    /// Wait after an `Interval` line that names no interval.
    pub default_interval: f32,
    /// Wait after a click/gesture line while auto-play is on.
    pub auto_play_delay: f32,
    /// Opacity gained or lost per second.
    pub fade_speed: f32,
    /// Characters revealed per second.
    pub type_speed: f32,
    pub fast_forward_type_speed: f32,
    /// Frame rate used by scenes that do not set their own.
    pub frame_rate: u32,
    pub default_language: Language,
}

impl PlayerConfig {
    /// The `[player]` section of the global config.
    pub fn load() -> Self {
        cg_shared::config::get("player")
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            chapters_path: "chapters/".into(),
            log_path:      "logs/".into(),
            log_level:     "info".into(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            default_interval: 1.0,
            auto_play_delay: 1.5,
            fade_speed: 1.0,
            type_speed: 10.0,
            fast_forward_type_speed: 50.0,
            frame_rate: 8,
            default_language: Language::Chinese,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: PlayerConfig = toml::from_str("type_speed = 20.0\ndefault_language = \"English\"").unwrap();
        assert_eq!(cfg.type_speed, 20.0);
        assert_eq!(cfg.default_language, Language::English);
        assert_eq!(cfg.tick_ms, 16);
        assert_eq!(cfg.frame_rate, 8);
    }

    #[test]
    fn zero_tick_is_clamped() {
        let cfg = PlayerConfig { tick_ms: 0, ..PlayerConfig::default() };
        assert_eq!(cfg.tick(), Duration::from_millis(1));
    }
}
