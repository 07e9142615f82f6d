//! Translation of window input into camera and application actions.

use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::fly_camera::{CameraState, Movement};

/// Something the application should do in response to a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputAction {
    Move(Movement),
    Quit,
    /// `true` switches to line rasterization, `false` back to fill.
    Wireframe(bool),
}

/// Maps a physical key to an action.
///
/// Movement keys react to presses and auto-repeat; every other binding
/// fires on the initial press only.
pub fn map_key(key: KeyCode, state: ElementState, repeat: bool) -> Option<InputAction> {
    if state != ElementState::Pressed {
        return None;
    }

    let movement = match key {
        KeyCode::KeyW => Some(Movement::Forward),
        KeyCode::KeyS => Some(Movement::Backward),
        KeyCode::KeyA => Some(Movement::Left),
        KeyCode::KeyD => Some(Movement::Right),
        KeyCode::KeyQ => Some(Movement::Up),
        KeyCode::KeyE => Some(Movement::Down),
        _ => None,
    };
    if let Some(movement) = movement {
        return Some(InputAction::Move(movement));
    }

    if repeat {
        return None;
    }

    match key {
        KeyCode::Escape => Some(InputAction::Quit),
        KeyCode::KeyZ => Some(InputAction::Wireframe(true)),
        KeyCode::KeyX => Some(InputAction::Wireframe(false)),
        _ => None,
    }
}

/// Routes window and device events into a [`CameraState`].
///
/// Actions the camera cannot handle itself (quit, wireframe) are handed
/// back to the caller.
#[derive(Debug, Default)]
pub struct CameraController;

impl CameraController {
    pub fn new() -> Self {
        Self
    }

    pub fn process_keyed_events(
        &mut self,
        event: &KeyEvent,
        camera: &mut CameraState,
    ) -> Option<InputAction> {
        let PhysicalKey::Code(key) = event.physical_key else {
            return None;
        };

        match map_key(key, event.state, event.repeat)? {
            InputAction::Move(movement) => {
                camera.apply_movement(movement);
                None
            }
            action => Some(action),
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, camera: &mut CameraState) {
        if let DeviceEvent::MouseMotion { delta } = event {
            camera.apply_mouse_delta(delta.0, delta.1);
        }
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta, camera: &mut CameraState) {
        let notches = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y as f64,
            // Trackpads report pixels; treat any movement as one notch
            MouseScrollDelta::PixelDelta(position) if position.y == 0.0 => 0.0,
            MouseScrollDelta::PixelDelta(position) => position.y.signum(),
        };
        camera.apply_scroll(notches);
    }
}
