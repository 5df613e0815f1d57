//! Game settings and tuning
//!
//! Stored as a flat JSON object next to the binary. Each field is applied on
//! its own: unknown keys and badly typed values are skipped with a warning and
//! the compiled-in default stays in place.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::consts::ORIGIN_SHIFT_THRESHOLD;
use crate::error::SettingsError;
use crate::platform::Key;

/// Default settings file name
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Game settings/tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // === Keys ===
    pub key_thrust: Key,
    pub key_turn_left: Key,
    pub key_turn_right: Key,
    pub key_pause: Key,
    pub key_reset: Key,
    pub key_save_capture: Key,

    // === View ===
    /// Fixed view size in world units
    pub screen_size: f32,
    /// Camera distance that triggers an origin shift
    pub origin_shift_threshold: f32,

    // === Asteroids ===
    pub asteroid_radius: f32,
    /// Minimum squared spacing, in multiples of the squared radius
    pub asteroid_spacing: f32,
    /// Log-scale spread of asteroid radii
    pub asteroid_size_variety: f32,
    pub asteroid_initial_vel: f32,
    pub asteroid_initial_rot: f32,
    pub asteroid_min_verts: u32,
    pub asteroid_max_verts: u32,
    pub object_restitution: f32,

    // === Ship ===
    pub ship_size: f32,
    pub ship_shape_angle: f32,
    pub ship_health: f32,
    pub ship_angular_damping: f32,
    pub ship_thrust: f32,
    pub ship_torque: f32,
    /// Seconds of velocity the trail tracers project ahead
    pub future_prediction: f32,

    /// Fixed RNG seed (random when unset)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_thrust: Key::W,
            key_turn_left: Key::A,
            key_turn_right: Key::D,
            key_pause: Key::Escape,
            key_reset: Key::Space,
            key_save_capture: Key::F5,

            screen_size: 150.0,
            origin_shift_threshold: ORIGIN_SHIFT_THRESHOLD,

            asteroid_radius: 20.0,
            asteroid_spacing: 3.0,
            asteroid_size_variety: 0.5,
            asteroid_initial_vel: 0.0,
            asteroid_initial_rot: 0.0,
            asteroid_min_verts: 4,
            asteroid_max_verts: 8,
            object_restitution: 0.2,

            ship_size: 2.0,
            ship_shape_angle: 0.5,
            ship_health: 20000.0,
            ship_angular_damping: 8.0,
            ship_thrust: 75.0,
            ship_torque: 120.0,
            future_prediction: 0.0,

            seed: None,
        }
    }
}

/// Overwrite `slot` with `value` if it has the right type
fn apply<T: DeserializeOwned>(slot: &mut T, key: &str, value: Value) {
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => *slot = parsed,
        Err(_) => log::warn!("Bad value for setting {key}: {value} - keeping default"),
    }
}

impl Settings {
    /// Build settings from a flat key/value map, falling back per field
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut s = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "key_thrust" => apply(&mut s.key_thrust, &key, value),
                "key_turn_left" => apply(&mut s.key_turn_left, &key, value),
                "key_turn_right" => apply(&mut s.key_turn_right, &key, value),
                "key_pause" => apply(&mut s.key_pause, &key, value),
                "key_reset" => apply(&mut s.key_reset, &key, value),
                "key_save_capture" => apply(&mut s.key_save_capture, &key, value),
                "screen_size" => apply(&mut s.screen_size, &key, value),
                "origin_shift_threshold" => apply(&mut s.origin_shift_threshold, &key, value),
                "asteroid_radius" => apply(&mut s.asteroid_radius, &key, value),
                "asteroid_spacing" => apply(&mut s.asteroid_spacing, &key, value),
                "asteroid_size_variety" => apply(&mut s.asteroid_size_variety, &key, value),
                "asteroid_initial_vel" => apply(&mut s.asteroid_initial_vel, &key, value),
                "asteroid_initial_rot" => apply(&mut s.asteroid_initial_rot, &key, value),
                "asteroid_min_verts" => apply(&mut s.asteroid_min_verts, &key, value),
                "asteroid_max_verts" => apply(&mut s.asteroid_max_verts, &key, value),
                "object_restitution" => apply(&mut s.object_restitution, &key, value),
                "ship_size" => apply(&mut s.ship_size, &key, value),
                "ship_shape_angle" => apply(&mut s.ship_shape_angle, &key, value),
                "ship_health" => apply(&mut s.ship_health, &key, value),
                "ship_angular_damping" => apply(&mut s.ship_angular_damping, &key, value),
                "ship_thrust" => apply(&mut s.ship_thrust, &key, value),
                "ship_torque" => apply(&mut s.ship_torque, &key, value),
                "future_prediction" => apply(&mut s.future_prediction, &key, value),
                "seed" => apply(&mut s.seed, &key, value),
                _ => log::warn!("Unknown setting {key} - ignoring"),
            }
        }
        s.sanitize();
        s
    }

    /// Parse a settings document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Ok(Self::from_map(map)),
            _ => Err(SettingsError::NotAnObject),
        }
    }

    /// Load settings from `path`, writing the defaults out if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            let settings = Self::default();
            settings.save(path)?;
            log::info!("Wrote default settings to {}", path.display());
            return Ok(settings);
        }
        let json = std::fs::read_to_string(path)?;
        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) => {
                log::warn!("Ignoring {}: {e} - using defaults", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Repair values that would break the simulation
    fn sanitize(&mut self) {
        let defaults = Self::default();
        if !(self.screen_size > 0.0) {
            log::warn!("screen_size must be positive - keeping default");
            self.screen_size = defaults.screen_size;
        }
        if !(self.origin_shift_threshold > 0.0) {
            log::warn!("origin_shift_threshold must be positive - keeping default");
            self.origin_shift_threshold = defaults.origin_shift_threshold;
        }
        if !(self.ship_health > 0.0) {
            log::warn!("ship_health must be positive - keeping default");
            self.ship_health = defaults.ship_health;
        }
        if self.asteroid_min_verts < 3 || self.asteroid_max_verts <= self.asteroid_min_verts {
            log::warn!("asteroid vertex range is invalid - keeping defaults");
            self.asteroid_min_verts = defaults.asteroid_min_verts;
            self.asteroid_max_verts = defaults.asteroid_max_verts;
        }
    }
}
