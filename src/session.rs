//! Per-frame glue between the simulation and the draw recorder
//!
//! A `Session` owns a scene and a recording `Graphics`. The host feeds it key
//! events and calls `frame` once per display refresh.

use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;

use crate::capture::{Canvas, Graphics};
use crate::consts::{BACKGROUND, SPINNER_WRAP};
use crate::error::{CaptureError, SimError};
use crate::platform::{Key, Rgb, Surface};
use crate::settings::Settings;
use crate::sim::Scene;
use crate::sim::entities::DistanceTracker;

/// A running game bound to one output surface
#[derive(Debug)]
pub struct Session<S> {
    scene: Scene,
    graphics: Graphics<S>,
    paused: bool,
    /// HUD spinner position, advances once per frame
    spinner: u32,
    capture_dir: PathBuf,
}

impl<S: Surface> Session<S> {
    /// Build a scene from `settings` and reset it into a fresh run
    pub fn new(settings: Settings, surface: S) -> Result<Self, SimError> {
        let mut scene = Scene::new(settings);
        scene.reset()?;
        Ok(Self {
            scene,
            graphics: Graphics::recorder(surface),
            paused: false,
            spinner: 0,
            capture_dir: PathBuf::from("."),
        })
    }

    /// Directory saved captures are written to
    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = dir.into();
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn graphics(&self) -> &Graphics<S> {
        &self.graphics
    }

    pub fn into_graphics(self) -> Graphics<S> {
        self.graphics
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Simulate `dt` seconds (unless paused) and draw one frame
    pub fn frame(&mut self, dt: f32) -> Result<(), SimError> {
        let (width, height) = self.graphics.surface().size();
        self.scene.camera.screen_scale = Vec2::new(width as f32, height as f32);

        if !self.paused {
            self.scene.tick(dt)?;
        }

        self.graphics.clear(Rgb::from(BACKGROUND));
        for drawable in self.scene.registry.drawables() {
            drawable.draw(&self.scene, &mut self.graphics);
        }

        self.spinner = (self.spinner + 1) % SPINNER_WRAP;
        self.graphics.arc(
            Vec2::new(width as f32 - 50.0, 50.0),
            48.0,
            0.0,
            self.spinner as f32 * TAU / SPINNER_WRAP as f32,
            Rgb::ORANGE,
        );
        if self.spinner == 0 {
            log::debug!(
                "{}{} - {} entities",
                self.score(),
                if self.paused { " - PAUSED" } else { "" },
                self.scene.registry.len()
            );
        }

        self.graphics.mark_end_of_frame();
        self.graphics.present();
        Ok(())
    }

    /// Handle a key press: session actions first, then the held-key set
    pub fn key_down(&mut self, key: Key) -> Result<(), SimError> {
        let settings = &self.scene.settings;
        let (reset, pause, save) = (
            settings.key_reset,
            settings.key_pause,
            settings.key_save_capture,
        );

        if key == reset {
            self.scene.reset()?;
            self.graphics.reset();
            log::info!("Session reset");
        }
        if key == pause {
            self.paused = !self.paused;
            log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
        }
        if key == save {
            if let Err(e) = self.save_capture() {
                log::error!("Failed to save capture: {e}");
            }
        }

        self.scene.input.press(key);
        Ok(())
    }

    pub fn key_up(&mut self, key: Key) {
        self.scene.input.release(key);
    }

    /// Save the capture as `<unix seconds>_<distance>@<speed>` in the capture
    /// directory
    pub fn save_capture(&self) -> Result<PathBuf, CaptureError> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.save_capture_as(&self.capture_dir.join(format!("{secs}_{}", self.score())))
    }

    /// Save the capture under an explicit base name
    pub fn save_capture_as(&self, base: &Path) -> Result<PathBuf, CaptureError> {
        self.graphics.save(base)
    }

    /// `distance@speed` of the current run
    pub fn score(&self) -> String {
        self.scene
            .registry
            .first::<DistanceTracker>()
            .map(|(_, tracker)| tracker.describe())
            .unwrap_or_else(|| DistanceTracker::new().describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::record::RECORD_LEN;
    use crate::platform::{MemorySurface, SurfaceCall};
    use crate::sim::entities::Player;

    fn session() -> Session<MemorySurface> {
        let settings = Settings {
            seed: Some(21),
            ..Settings::default()
        };
        Session::new(settings, MemorySurface::new(400, 300)).unwrap()
    }

    #[test]
    fn test_frame_clears_draws_and_presents() {
        let mut session = session();
        session.frame(1.0 / 60.0).unwrap();

        let calls = &session.graphics().surface().calls;
        assert_eq!(calls[0], SurfaceCall::Clear(Rgb::new(40, 79, 79)));
        assert_eq!(calls.last(), Some(&SurfaceCall::Present));
        // Ship hull, health arc and spinner at least
        assert!(session.graphics().surface().lines() > 3);
        assert_eq!(session.graphics().recorded().len() % RECORD_LEN, 0);
    }

    #[test]
    fn test_camera_screen_scale_follows_surface() {
        let mut session = session();
        session.frame(0.0).unwrap();
        assert_eq!(session.scene().camera.screen_scale, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_pause_stops_the_simulation() {
        let mut session = session();
        session.key_down(Key::W).unwrap();
        session.key_down(Key::Escape).unwrap();
        session.key_up(Key::Escape);
        assert!(session.is_paused());

        for _ in 0..10 {
            session.frame(1.0 / 60.0).unwrap();
        }
        let scene = session.scene();
        let (_, player) = scene.registry.first::<Player>().unwrap();
        let body = scene.physics.body(player.body_handle()).unwrap();
        assert_eq!(body.linear_velocity, Vec2::ZERO);
        // Still drawing while paused
        assert_eq!(session.graphics().surface().frames(), 10);
    }

    #[test]
    fn test_reset_key_restarts_run_and_capture() {
        let mut session = session();
        session.key_down(Key::W).unwrap();
        for _ in 0..30 {
            session.frame(1.0 / 60.0).unwrap();
        }
        assert!(!session.graphics().recorded().is_empty());

        session.key_up(Key::W);
        session.key_down(Key::Space).unwrap();
        assert!(session.graphics().recorded().is_empty());
        let scene = session.scene();
        let (_, player) = scene.registry.first::<Player>().unwrap();
        assert_eq!(
            scene.physics.body(player.body_handle()).unwrap().position,
            Vec2::ZERO
        );
        assert_eq!(scene.camera.center, Vec2::ZERO);
    }

    #[test]
    fn test_score_before_any_time() {
        assert_eq!(session().score(), "0.00@0.00");
    }
}
