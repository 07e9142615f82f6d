//! Viewer configuration.
//!
//! Every value has a built-in default; there is no file or environment
//! driven configuration. Builder-style `with_*` setters adjust a default
//! config in code.

use std::path::{Path, PathBuf};

use cgmath::{Matrix4, Vector3};

use crate::gfx::{
    camera::camera_utils,
    color::{self, Color},
    scene::light::PointLight,
};

/// Top-level configuration for [`ViewerApp`](crate::app::ViewerApp).
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub assets: AssetPaths,
    pub projection: ProjectionConfig,
    pub camera: CameraConfig,
    pub light: PointLight,
    pub clear_color: Color,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets: AssetPaths::default(),
            projection: ProjectionConfig::default(),
            camera: CameraConfig::default(),
            light: PointLight::default(),
            clear_color: color::GREY,
        }
    }
}

impl ViewerConfig {
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_assets(mut self, assets: AssetPaths) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_light(mut self, light: PointLight) -> Self {
        self.light = light;
        self
    }

    pub fn with_clear_color(mut self, clear_color: Color) -> Self {
        self.clear_color = clear_color;
        self
    }
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            title: "Tabletop".to_string(),
        }
    }
}

/// Asset directories. Relative paths resolve against the working directory.
#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub shader_dir: PathBuf,
    pub texture_dir: PathBuf,
    pub model_dir: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("shader_source"),
            texture_dir: PathBuf::from("textures"),
            model_dir: PathBuf::from("models"),
        }
    }
}

impl AssetPaths {
    /// Places all three directories under `root`.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let defaults = Self::default();
        Self {
            shader_dir: root.join(defaults.shader_dir),
            texture_dir: root.join(defaults.texture_dir),
            model_dir: root.join(defaults.model_dir),
        }
    }

    pub fn shader(&self, file: &str) -> PathBuf {
        self.shader_dir.join(file)
    }

    pub fn texture(&self, file: &str) -> PathBuf {
        self.texture_dir.join(file)
    }

    pub fn model(&self, file: &str) -> PathBuf {
        self.model_dir.join(file)
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_y: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl ProjectionConfig {
    /// Projection matrix for a surface of the given aspect ratio.
    pub fn matrix(&self, aspect: f32) -> Matrix4<f32> {
        camera_utils::projection_matrix(self.fov_y, aspect, self.near, self.far)
    }
}

/// Starting state of the fly camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub position: Vector3<f32>,
    pub front: Vector3<f32>,
    pub up: Vector3<f32>,
    pub speed: f32,
    pub sensitivity: f64,
    /// Degrees; -90 faces down -z.
    pub yaw: f64,
    pub pitch: f64,
    /// Cursor position assumed before the first cursor event (window centre).
    pub initial_cursor: (f64, f64),
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 3.0, 20.0),
            front: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            speed: 0.3,
            sensitivity: 0.1,
            yaw: -90.0,
            pitch: 0.0,
            initial_cursor: (480.0, 270.0),
        }
    }
}

impl CameraConfig {
    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}
