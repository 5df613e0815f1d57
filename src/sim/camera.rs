//! Floating-origin camera
//!
//! Holds the view centre and scale, maps world points to screen pixels, and
//! re-centres the world on the origin when the view drifts too far from it.
//! Anything that caches a world-space point subscribes to the shift broadcast
//! and subtracts the payload from each cached point.

use std::fmt;

use glam::Vec2;

/// Handle returned by `Camera::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ShiftListener = Box<dyn FnMut(Vec2)>;

/// The coordinate manager. One per simulation.
pub struct Camera {
    /// View centre in world space
    pub center: Vec2,
    /// Rate of change of `center` over the last tracking update
    pub center_velocity: Vec2,
    /// Multiplier applied to the fixed view size (zoom)
    pub size_multiplier: f32,
    /// Output size in pixels
    pub screen_scale: Vec2,
    fixed_size: f32,
    threshold: f32,
    listeners: Vec<(SubscriptionId, ShiftListener)>,
    next_subscription: u64,
}

impl fmt::Debug for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("center", &self.center)
            .field("center_velocity", &self.center_velocity)
            .field("size_multiplier", &self.size_multiplier)
            .field("screen_scale", &self.screen_scale)
            .field("fixed_size", &self.fixed_size)
            .field("threshold", &self.threshold)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Camera {
    pub fn new(fixed_size: f32, threshold: f32) -> Self {
        Self {
            center: Vec2::ZERO,
            center_velocity: Vec2::ZERO,
            size_multiplier: 1.0,
            screen_scale: Vec2::ONE,
            fixed_size,
            threshold,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn fixed_size(&self) -> f32 {
        self.fixed_size
    }

    /// Visible world extent across the screen width (half-width, really)
    pub fn view_size(&self) -> f32 {
        self.fixed_size * self.size_multiplier
    }

    /// World point to screen pixels
    pub fn world_to_screen(&self, point: Vec2) -> Vec2 {
        let sx = self.screen_scale.x;
        let normalized = (point - self.center) / self.view_size();
        (normalized * 0.5 + Vec2::new(0.5, self.screen_scale.y / (2.0 * sx))) * sx
    }

    /// World length to pixels
    pub fn scale(&self, value: f32) -> f32 {
        value / self.view_size() * self.screen_scale.x / 2.0
    }

    /// Exponentially smooth the centre toward `target`.
    ///
    /// The time constant scales with `dt`. Also updates `center_velocity`.
    pub fn track(&mut self, target: Vec2, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let damp = 1.0 / dt;
        let old = self.center;
        self.center = (old * damp + target) / (damp + 1.0);
        self.center_velocity = (self.center - old) / dt;
    }

    /// Register a listener for origin shifts
    pub fn subscribe(&mut self, listener: impl FnMut(Vec2) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Re-centre on the origin if the view has drifted past the threshold.
    ///
    /// Every listener receives the old centre, then the centre becomes zero.
    /// Returns the shift that was broadcast, if any.
    pub fn maybe_shift_origin(&mut self) -> Option<Vec2> {
        if self.center.length_squared() <= self.threshold * self.threshold {
            return None;
        }
        let shift = self.center;
        for (_, listener) in self.listeners.iter_mut() {
            listener(shift);
        }
        self.center = Vec2::ZERO;
        log::debug!("Origin shift by ({:.2}, {:.2})", shift.x, shift.y);
        Some(shift)
    }

    /// Full-session reset: centre to zero, forget every listener
    pub fn reset_session(&mut self) {
        self.center = Vec2::ZERO;
        self.center_velocity = Vec2::ZERO;
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_shift_broadcasts_old_center() {
        let mut camera = Camera::new(150.0, 100.0);
        camera.center = Vec2::new(150.0, 0.0);

        let cached = Rc::new(Cell::new(Vec2::new(200.0, 0.0)));
        let c = cached.clone();
        camera.subscribe(move |shift| c.set(c.get() - shift));

        assert_eq!(camera.maybe_shift_origin(), Some(Vec2::new(150.0, 0.0)));
        assert_eq!(camera.center, Vec2::ZERO);
        assert_eq!(cached.get(), Vec2::new(50.0, 0.0));
    }

    #[test]
    fn test_no_shift_inside_threshold() {
        let mut camera = Camera::new(150.0, 100.0);
        camera.center = Vec2::new(60.0, 79.0); // |c| < 100
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        camera.subscribe(move |_| c.set(c.get() + 1));
        assert_eq!(camera.maybe_shift_origin(), None);
        assert_eq!(calls.get(), 0);
        assert_eq!(camera.center, Vec2::new(60.0, 79.0));
    }

    #[test]
    fn test_screen_position_invariant_under_shift() {
        let mut camera = Camera::new(150.0, 100.0);
        camera.screen_scale = Vec2::new(1000.0, 800.0);
        camera.center = Vec2::new(123.0, -77.0);

        let cached = Rc::new(Cell::new(Vec2::new(140.0, -60.0)));
        let c = cached.clone();
        camera.subscribe(move |shift| c.set(c.get() - shift));

        let before = camera.world_to_screen(cached.get());
        camera.maybe_shift_origin().unwrap();
        let after = camera.world_to_screen(cached.get());
        assert!((before - after).length() < 1e-3);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut camera = Camera::new(150.0, 100.0);
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let id = camera.subscribe(move |_| c.set(c.get() + 1));
        assert!(camera.unsubscribe(id));
        assert!(!camera.unsubscribe(id));

        camera.center = Vec2::new(500.0, 0.0);
        camera.maybe_shift_origin();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_reset_session_forgets_listeners() {
        let mut camera = Camera::new(150.0, 100.0);
        camera.subscribe(|_| {});
        camera.subscribe(|_| {});
        camera.center = Vec2::new(10.0, 10.0);
        camera.reset_session();
        assert_eq!(camera.listener_count(), 0);
        assert_eq!(camera.center, Vec2::ZERO);
    }

    #[test]
    fn test_track_converges_and_reports_velocity() {
        let mut camera = Camera::new(150.0, 1000.0);
        let target = Vec2::new(10.0, 0.0);
        let dt = 0.5;
        camera.track(target, dt);
        // (0 * 2 + 10) / 3
        assert!((camera.center.x - 10.0 / 3.0).abs() < 1e-5);
        assert!((camera.center_velocity.x - 20.0 / 3.0).abs() < 1e-4);
        for _ in 0..100 {
            camera.track(target, dt);
        }
        assert!((camera.center - target).length() < 1e-3);
    }

    #[test]
    fn test_world_to_screen_center_maps_to_screen_middle() {
        let mut camera = Camera::new(150.0, 100.0);
        camera.screen_scale = Vec2::new(1000.0, 800.0);
        camera.center = Vec2::new(5.0, 5.0);
        let p = camera.world_to_screen(Vec2::new(5.0, 5.0));
        assert!((p - Vec2::new(500.0, 400.0)).length() < 1e-3);
        assert!((camera.scale(150.0) - 500.0).abs() < 1e-3);
    }
}
