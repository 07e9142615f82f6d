//! Texture images and shared texture handles.
//!
//! Images are decoded with the `image` crate, expanded to RGBA8 and given a
//! full CPU-generated mip chain before upload.

use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
    rc::Rc,
};

use image::{imageops::FilterType, RgbaImage};

use crate::{error::TextureError, gfx::backend::RenderBackend};

/// Role of a texture within a material.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

impl TextureKind {
    /// Sampler uniform prefix used by imported meshes
    /// (`material.texture_diffuse1`, `material.texture_specular1`, ...).
    pub fn uniform_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
        }
    }
}

/// Decoded RGBA8 pixels with every mip level down to 1x1.
#[derive(Clone)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    /// Level 0 first; each level is tightly packed RGBA8.
    pub levels: Vec<Vec<u8>>,
}

impl fmt::Debug for TextureImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("levels", &self.levels.len())
            .finish()
    }
}

impl TextureImage {
    /// Decodes an image file. Grey, RGB and RGBA sources all end up as RGBA8.
    pub fn load(path: &Path) -> Result<Self, TextureError> {
        let decoded = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_rgba(decoded.to_rgba8()))
    }

    pub fn from_rgba(base: RgbaImage) -> Self {
        let (width, height) = base.dimensions();
        let mut levels = Vec::with_capacity(mip_level_count(width, height) as usize);
        let mut level = base;

        loop {
            let (w, h) = level.dimensions();
            let (next_w, next_h) = ((w / 2).max(1), (h / 2).max(1));
            let next = (w > 1 || h > 1)
                .then(|| image::imageops::resize(&level, next_w, next_h, FilterType::Triangle));
            levels.push(level.into_raw());
            match next {
                Some(smaller) => level = smaller,
                None => break,
            }
        }

        Self {
            width,
            height,
            levels,
        }
    }

    /// A single opaque white texel, sampled when a slot has no texture.
    pub fn white() -> Self {
        Self::from_rgba(RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255])))
    }

    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Returns the image with no side longer than `max_dimension`.
    ///
    /// An oversized image drops its largest mip levels until the first
    /// remaining level fits, so no resampling is needed.
    pub fn fitted_to(&self, max_dimension: u32) -> Cow<'_, Self> {
        let max_dimension = max_dimension.max(1);
        let level_size =
            |level: usize| ((self.width >> level).max(1), (self.height >> level).max(1));

        let skipped = (0..self.levels.len())
            .take_while(|&level| {
                let (w, h) = level_size(level);
                w > max_dimension || h > max_dimension
            })
            .count();
        if skipped == 0 {
            return Cow::Borrowed(self);
        }

        let (width, height) = level_size(skipped);
        Cow::Owned(Self {
            width,
            height,
            levels: self.levels[skipped..].to_vec(),
        })
    }
}

pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// A GPU texture shared between meshes, tagged with its role and source.
pub struct Texture<B: RenderBackend> {
    handle: Rc<B::Texture>,
    kind: TextureKind,
    path: PathBuf,
}

impl<B: RenderBackend> Clone for Texture<B> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            kind: self.kind,
            path: self.path.clone(),
        }
    }
}

impl<B: RenderBackend> fmt::Debug for Texture<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .finish()
    }
}

impl<B: RenderBackend> Texture<B> {
    pub fn new(handle: Rc<B::Texture>, kind: TextureKind, path: impl Into<PathBuf>) -> Self {
        Self {
            handle,
            kind,
            path: path.into(),
        }
    }

    /// Decodes `path` and uploads it. Failures are logged and yield `None`.
    pub fn load(backend: &mut B, path: &Path, kind: TextureKind) -> Option<Self> {
        match TextureImage::load(path) {
            Ok(image) => {
                let label = path.display().to_string();
                let handle = Rc::new(backend.create_texture(&label, &image));
                Some(Self::new(handle, kind, path))
            }
            Err(err) => {
                log::error!("texture failed to load: {err}");
                None
            }
        }
    }

    pub fn handle(&self) -> &B::Texture {
        &self.handle
    }

    pub fn shared_handle(&self) -> &Rc<B::Texture> {
        &self.handle
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when both textures point at the same GPU resource.
    pub fn same_resource(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }
}
