//! Maps game events onto engine dispatches.
//!
//! This is a thin adapter: a host wires its hurt/death callbacks into it and
//! everything else (wave choice, duration, cadence, debounce) comes from
//! configuration. Dispatch failures are already logged by the engine; the
//! adapter only decides whether to trigger at all.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use crate::config::Config;
use crate::engine::Engine;
use crate::waves::DEFAULT_WAVE;

pub struct GameEvents {
    engine: Arc<Engine>,
    active: bool,
    hurt_wave: String,
    hurt_duration_ms: u64,
    death_wave: String,
    death_duration_ms: u64,
    debounce: Duration,
    send_rate_hz: u32,
    last_damage: Option<Instant>,
}

impl GameEvents {
    pub fn new(engine: Arc<Engine>, config: &Config) -> Self {
        Self {
            engine,
            active: true,
            hurt_wave: config.hurt_wave().unwrap_or(DEFAULT_WAVE).to_string(),
            hurt_duration_ms: config.hurt_duration_ms(),
            death_wave: config.death_wave().unwrap_or(DEFAULT_WAVE).to_string(),
            death_duration_ms: config.death_duration_ms(),
            debounce: config.damage_debounce(),
            send_rate_hz: config.send_rate_hz(),
            last_damage: None,
        }
    }

    /// Master toggle; an inactive adapter drops every event.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Player took damage. Debounced: hits landing inside the configured
    /// window after the last trigger are dropped.
    pub fn on_player_hurt(&mut self, damage: f32) -> bool {
        if !self.active || damage <= 0.0 {
            return false;
        }
        let now = Instant::now();
        if let Some(last) = self.last_damage {
            if now.duration_since(last) < self.debounce {
                debug!("hurt event dropped: inside debounce window");
                return false;
            }
        }
        self.last_damage = Some(now);
        self.engine
            .send_wave_named_both(&self.hurt_wave, self.hurt_duration_ms, self.send_rate_hz)
    }

    /// Player died. Not debounced, but it arms the debounce window so the
    /// death wave is not immediately trampled by a trailing hurt event.
    pub fn on_player_death(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.last_damage = Some(Instant::now());
        self.engine
            .send_wave_named_both(&self.death_wave, self.death_duration_ms, self.send_rate_hz)
    }
}
