//! # pulselink-core
//!
//! Engine library for driving an external electro-stimulation device from
//! in-game events. The engine repeat-sends waveform patterns to every bound
//! device endpoint over a message transport, tracks and cancels in-flight
//! dispatches (emergency stop), and keeps each endpoint's intensity in sync
//! with a globally held target — independent of any UI framework.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pulselink_core::config::Config;
//! use pulselink_core::engine::Engine;
//! use pulselink_core::events::GameEvents;
//! use pulselink_core::waves::WaveCatalog;
//! use pulselink_types::{Channel, EndpointId};
//!
//! // 1. Bring up a transport (any `pulselink_net::Transport` impl) and the
//! //    wave catalog, then the engine.
//! let config = Config::load();
//! let catalog = Arc::new(WaveCatalog::load(&config));
//! let engine = Arc::new(Engine::new(transport, catalog, controller_id));
//! engine.initialize();
//!
//! // 2. Dispatch waves and adjust strength from UI or game callbacks.
//! engine.send_wave_named("pulse", Channel::A, 3000, 1);
//! engine.set_strength(Channel::B, 40);
//!
//! // 3. Wire game events through the adapter.
//! let mut events = GameEvents::new(engine.clone(), &config);
//! events.on_player_hurt(12.5);
//!
//! // 4. Emergency stop cancels every running dispatch, then neutralizes
//! //    all bound endpoints.
//! engine.emergency_stop();
//! ```
//!
//! ## Module Overview
//!
//! - [`engine`] — the `Engine`: dispatch scheduler, emergency stop,
//!   bind reconciliation, strength accessor, status
//! - [`waves`] — `WaveCatalog`: built-in and user-defined waveform sets,
//!   load-time validation, wholesale reload
//! - [`config`] — TOML configuration (embedded defaults + user override)
//! - [`events`] — `GameEvents`: hurt/death events mapped to dispatches

pub mod config;
pub mod engine;
pub mod events;
pub mod waves;
