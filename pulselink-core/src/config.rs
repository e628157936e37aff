use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    waves: WavesConfig,
    #[serde(default)]
    events: EventsConfig,
}

#[derive(Deserialize, Default)]
struct EngineConfig {
    settle_delay_ms: Option<u64>,
    send_rate_hz: Option<u32>,
    default_strength_a: Option<u8>,
    default_strength_b: Option<u8>,
}

#[derive(Deserialize, Default)]
struct WavesConfig {
    directory: Option<String>,
}

#[derive(Deserialize, Default)]
struct EventsConfig {
    hurt_duration_ms: Option<u64>,
    hurt_wave: Option<String>,
    death_duration_ms: Option<u64>,
    death_wave: Option<String>,
    damage_debounce_ms: Option<u64>,
}

pub struct Config {
    engine: EngineConfig,
    waves: WavesConfig,
    events: EventsConfig,
}

impl Config {
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_engine(&mut base.engine, user.engine);
                            merge_waves(&mut base.waves, user.waves);
                            merge_events(&mut base.events, user.events);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            engine: base.engine,
            waves: base.waves,
            events: base.events,
        }
    }

    /// Delay between an endpoint binding and its strength reconciliation
    /// (clamped to 0..10s).
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.engine.settle_delay_ms.unwrap_or(500).min(10_000))
    }

    /// Repeat-send cadence for event-triggered waves (clamped to 1..100 Hz).
    pub fn send_rate_hz(&self) -> u32 {
        self.engine.send_rate_hz.unwrap_or(1).clamp(1, 100)
    }

    /// Initial per-channel strength targets at engine start.
    pub fn default_strengths(&self) -> (u8, u8) {
        (
            self.engine.default_strength_a.unwrap_or(0).min(100),
            self.engine.default_strength_b.unwrap_or(0).min(100),
        )
    }

    /// Directory of user wave files. Relative paths resolve against the
    /// platform data dir.
    pub fn wave_dir(&self) -> PathBuf {
        let raw = PathBuf::from(self.waves.directory.as_deref().unwrap_or("waves"));
        if raw.is_absolute() {
            return raw;
        }
        match dirs::data_dir() {
            Some(data) => data.join("pulselink").join(raw),
            None => raw,
        }
    }

    /// Duration of the hurt-triggered wave (clamped to 250ms..10s).
    pub fn hurt_duration_ms(&self) -> u64 {
        self.events.hurt_duration_ms.unwrap_or(1000).clamp(250, 10_000)
    }

    /// Wave name for hurt events; `None` selects the built-in default.
    pub fn hurt_wave(&self) -> Option<&str> {
        self.events.hurt_wave.as_deref().filter(|s| !s.is_empty())
    }

    /// Duration of the death-triggered wave (clamped to 250ms..10s).
    pub fn death_duration_ms(&self) -> u64 {
        self.events.death_duration_ms.unwrap_or(3000).clamp(250, 10_000)
    }

    /// Wave name for death events; `None` selects the built-in default.
    pub fn death_wave(&self) -> Option<&str> {
        self.events.death_wave.as_deref().filter(|s| !s.is_empty())
    }

    /// Minimum gap between two damage-triggered dispatches.
    pub fn damage_debounce(&self) -> Duration {
        Duration::from_millis(self.events.damage_debounce_ms.unwrap_or(1000).min(60_000))
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pulselink").join("config.toml"))
}

fn merge_engine(base: &mut EngineConfig, user: EngineConfig) {
    if user.settle_delay_ms.is_some() {
        base.settle_delay_ms = user.settle_delay_ms;
    }
    if user.send_rate_hz.is_some() {
        base.send_rate_hz = user.send_rate_hz;
    }
    if user.default_strength_a.is_some() {
        base.default_strength_a = user.default_strength_a;
    }
    if user.default_strength_b.is_some() {
        base.default_strength_b = user.default_strength_b;
    }
}

fn merge_waves(base: &mut WavesConfig, user: WavesConfig) {
    if user.directory.is_some() {
        base.directory = user.directory;
    }
}

fn merge_events(base: &mut EventsConfig, user: EventsConfig) {
    if user.hurt_duration_ms.is_some() {
        base.hurt_duration_ms = user.hurt_duration_ms;
    }
    if user.hurt_wave.is_some() {
        base.hurt_wave = user.hurt_wave;
    }
    if user.death_duration_ms.is_some() {
        base.death_duration_ms = user.death_duration_ms;
    }
    if user.death_wave.is_some() {
        base.death_wave = user.death_wave;
    }
    if user.damage_debounce_ms.is_some() {
        base.damage_debounce_ms = user.damage_debounce_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults() {
        let base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap();
        let config = Config {
            engine: base.engine,
            waves: base.waves,
            events: base.events,
        };
        assert_eq!(config.settle_delay(), Duration::from_millis(500));
        assert_eq!(config.send_rate_hz(), 1);
        assert_eq!(config.default_strengths(), (0, 0));
        assert_eq!(config.hurt_duration_ms(), 1000);
        assert_eq!(config.hurt_wave(), None);
        assert_eq!(config.death_duration_ms(), 3000);
        assert_eq!(config.death_wave(), None);
        assert_eq!(config.damage_debounce(), Duration::from_millis(1000));
    }

    #[test]
    fn user_values_merge_over_defaults() {
        let mut base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap();
        let user: ConfigFile = toml::from_str(
            r#"
            [engine]
            send_rate_hz = 4
            [events]
            hurt_wave = "surge"
            "#,
        )
        .unwrap();
        merge_engine(&mut base.engine, user.engine);
        merge_events(&mut base.events, user.events);

        let config = Config {
            engine: base.engine,
            waves: base.waves,
            events: base.events,
        };
        assert_eq!(config.send_rate_hz(), 4);
        assert_eq!(config.hurt_wave(), Some("surge"));
        // Untouched values keep the embedded defaults.
        assert_eq!(config.death_duration_ms(), 3000);
    }

    #[test]
    fn getters_clamp_out_of_range_values() {
        let user: ConfigFile = toml::from_str(
            r#"
            [engine]
            send_rate_hz = 10000
            settle_delay_ms = 999999
            [events]
            hurt_duration_ms = 1
            "#,
        )
        .unwrap();
        let config = Config {
            engine: user.engine,
            waves: user.waves,
            events: user.events,
        };
        assert_eq!(config.send_rate_hz(), 100);
        assert_eq!(config.settle_delay(), Duration::from_millis(10_000));
        assert_eq!(config.hurt_duration_ms(), 250);
    }
}
