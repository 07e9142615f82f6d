//! First-person fly camera driven by keyboard, mouse and scroll input.

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

use crate::config::CameraConfig;

const PITCH_LIMIT: f64 = 89.0;
const SPEED_STEP: f32 = 0.1;
const MAX_SPEED: f32 = 2.0;
const MIN_SPEED: f32 = 0.1;

/// A single step of keyboard movement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Camera and cursor state owned by the application.
///
/// Every mutator recomputes [`CameraState::view`] before returning, so the
/// render step always reads a view matrix consistent with the latest input.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraState {
    pub position: Vector3<f32>,
    pub front: Vector3<f32>,
    pub up: Vector3<f32>,
    pub speed: f32,
    pub yaw: f64,
    pub pitch: f64,
    pub sensitivity: f64,
    last_cursor: (f64, f64),
    first_cursor: bool,
    view: Matrix4<f32>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

impl CameraState {
    pub fn new(config: &CameraConfig) -> Self {
        let mut camera = Self {
            position: config.position,
            front: config.front,
            up: config.up,
            speed: config.speed,
            yaw: config.yaw,
            pitch: config.pitch,
            sensitivity: config.sensitivity,
            last_cursor: config.initial_cursor,
            first_cursor: true,
            view: Matrix4::from_scale(1.0),
        };
        camera.update_view();
        camera
    }

    /// The current view matrix.
    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn apply_movement(&mut self, movement: Movement) {
        // Strafing normalizes after scaling, so it always moves one unit
        let right = (self.front.cross(self.up) * self.speed).normalize();

        match movement {
            Movement::Forward => self.position += self.front * self.speed,
            Movement::Backward => self.position -= self.front * self.speed,
            Movement::Left => self.position -= right,
            Movement::Right => self.position += right,
            Movement::Up => self.position += self.up * self.speed,
            Movement::Down => self.position -= self.up * self.speed,
        }
        self.update_view();
    }

    /// Feeds an absolute cursor position. The first call only records the
    /// position so the camera does not jump when the cursor first appears.
    pub fn apply_cursor_position(&mut self, x: f64, y: f64) {
        if self.first_cursor {
            self.last_cursor = (x, y);
            self.first_cursor = false;
        }

        let (last_x, last_y) = self.last_cursor;
        self.last_cursor = (x, y);
        self.apply_mouse_delta(x - last_x, y - last_y);
    }

    /// Feeds relative mouse motion in screen pixels (y grows downward).
    pub fn apply_mouse_delta(&mut self, dx: f64, dy: f64) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let direction = Vector3::new(
            (yaw.cos() * pitch.cos()) as f32,
            pitch.sin() as f32,
            (yaw.sin() * pitch.cos()) as f32,
        );
        self.front = direction.normalize();
        self.update_view();
    }

    /// Adjusts movement speed. Only whole wheel notches (exactly `1.0` or
    /// `-1.0`) have an effect.
    pub fn apply_scroll(&mut self, y: f64) {
        if y == 1.0 && self.speed < MAX_SPEED {
            self.speed += SPEED_STEP;
        }
        if y == -1.0 && self.speed > MIN_SPEED {
            self.speed -= SPEED_STEP;
        }
        self.update_view();
    }

    fn update_view(&mut self) {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        self.view = Matrix4::look_at_rh(eye, eye + self.front, self.up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn test_default_view_looks_down_negative_z() {
        let camera = CameraState::default();
        let expected = Matrix4::look_at_rh(
            Point3::new(0.0, 3.0, 20.0),
            Point3::new(0.0, 3.0, 19.0),
            Vector3::unit_y(),
        );
        assert_eq!(camera.view(), expected);
    }

    #[test]
    fn test_strafe_ignores_speed() {
        let mut rng = rand::rng();
        for _ in 0..20 {
            let mut camera = CameraState::default();
            camera.speed = rng.random_range(0.1..2.0);
            let start = camera.position;

            camera.apply_movement(Movement::Right);
            assert_close((camera.position - start).magnitude() as f64, 1.0);
        }
    }

    #[test]
    fn test_forward_and_back_cancel() {
        let mut camera = CameraState::default();
        camera.apply_movement(Movement::Forward);
        assert_close(camera.position.z as f64, 19.7);
        camera.apply_movement(Movement::Backward);
        assert_close(camera.position.z as f64, 20.0);

        camera.apply_movement(Movement::Down);
        assert_close(camera.position.y as f64, 2.7);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = CameraState::default();
        camera.apply_mouse_delta(0.0, -10_000.0);
        assert_eq!(camera.pitch, 89.0);
        camera.apply_mouse_delta(0.0, 10_000.0);
        assert_eq!(camera.pitch, -89.0);
        assert_close(camera.front.magnitude() as f64, 1.0);
    }

    #[test]
    fn test_first_cursor_event_does_not_turn() {
        let mut camera = CameraState::default();
        let front = camera.front;

        camera.apply_cursor_position(900.0, 100.0);
        assert_eq!(camera.yaw, -90.0);
        assert_close((camera.front - front).magnitude() as f64, 0.0);

        camera.apply_cursor_position(910.0, 100.0);
        assert_close(camera.yaw, -89.0);
    }

    #[test]
    fn test_scroll_only_reacts_to_whole_notches() {
        let mut camera = CameraState::default();
        camera.apply_scroll(0.5);
        assert_eq!(camera.speed, 0.3);

        camera.apply_scroll(1.0);
        assert_close(camera.speed as f64, 0.4);

        for _ in 0..50 {
            camera.apply_scroll(-1.0);
        }
        assert!(camera.speed > -1e-6 && camera.speed <= 0.1 + 1e-6);
    }
}
