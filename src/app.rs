use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowAttributes, WindowId},
};

use crate::{
    config::ViewerConfig,
    gfx::{
        backend::{PolygonMode, RenderBackend},
        camera::{camera_utils, CameraController, CameraState, InputAction},
        rendering::RenderEngine,
        scene::{render_clear_frame, Scene},
    },
    tabletop,
};

/// The interactive viewer: one window, one scene, a fly camera.
pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    /// `None` when the scene failed to build; frames are then clear-only.
    scene: Option<Scene<RenderEngine>>,
    camera: CameraState,
    controller: CameraController,
    startup_error: Option<anyhow::Error>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create the event loop")?;
        let camera = CameraState::new(&config.camera);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                scene: None,
                camera,
                controller: CameraController::new(),
                startup_error: None,
            },
        })
    }

    /// Runs until the window is closed or Escape is pressed.
    ///
    /// Fails only when the window or graphics device cannot be created.
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated with an error")?;

        match self.app_state.startup_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_config = &self.config.window;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(window_config.title.clone())
                    .with_inner_size(PhysicalSize::new(window_config.width, window_config.height)),
            )
            .context("failed to create the window")?;
        let window = Arc::new(window);

        window.set_cursor_visible(false);
        if let Err(err) = window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
        {
            log::warn!("could not capture the cursor: {err}");
        }

        let (width, height) = window.inner_size().into();
        let mut renderer = pollster::block_on(RenderEngine::new(window.clone(), width, height))?;

        let aspect = camera_utils::aspect_ratio(width, height);
        self.scene = match tabletop::build_scene(&mut renderer, &self.config, aspect) {
            Ok(scene) => {
                scene.apply_static_uniforms(&mut renderer, &self.camera);
                Some(scene)
            }
            Err(err) => {
                log::error!("scene could not be built, rendering empty frames: {err}");
                None
            }
        };

        self.window = Some(window);
        self.render_engine = Some(renderer);
        Ok(())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            log::error!("{err:#}");
            self.startup_error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                match self.controller.process_keyed_events(&event, &mut self.camera) {
                    Some(InputAction::Quit) => event_loop.exit(),
                    Some(InputAction::Wireframe(on)) => {
                        let mode = if on { PolygonMode::Line } else { PolygonMode::Fill };
                        render_engine.set_polygon_mode(mode);
                    }
                    Some(InputAction::Move(_)) | None => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.controller.process_scroll(&delta, &mut self.camera);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if width == 0 || height == 0 {
                    return;
                }
                render_engine.resize(width, height);
                if let Some(scene) = self.scene.as_mut() {
                    let aspect = camera_utils::aspect_ratio(width, height);
                    scene.set_projection(render_engine, self.config.projection.matrix(aspect));
                }
            }
            WindowEvent::RedrawRequested => match &self.scene {
                Some(scene) => scene.render_frame(render_engine, &self.camera),
                None => render_clear_frame(render_engine, self.config.clear_color),
            },
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if self.window.is_none() {
            return;
        }
        self.controller.process_events(&event, &mut self.camera);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
