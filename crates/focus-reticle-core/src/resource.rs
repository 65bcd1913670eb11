//! Host-loaded render resources: colors, textures, meshes and materials.
//!
//! Loading is the host's job. By the time a resource reaches the reticle it
//! must be complete; [`MeshResource::validate`] and
//! [`TextureResource::validate`] reject anything that is not.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Linear RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const CLEAR: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    pub const YELLOW: Self = Self::new(1.0, 1.0, 0.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    /// Default bracket color of the classic style.
    pub const FOCUS_YELLOW: Self = Self::new(1.0, 0.8, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Errors raised when a host hands over an incomplete resource.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("mesh `{name}` has no geometry")]
    EmptyMesh { name: String },
    #[error("mesh `{name}` has {count} indices, not a multiple of 3")]
    IndexCountNotTriangles { name: String, count: usize },
    #[error("mesh `{name}` references vertex {index} but has {vertex_count}")]
    IndexOutOfRange {
        name: String,
        index: u32,
        vertex_count: usize,
    },
    #[error("mesh `{name}` has non-finite vertex positions")]
    NonFinitePosition { name: String },
    #[error("texture `{name}` has zero size")]
    EmptyTexture { name: String },
}

/// Texture descriptor; pixel data stays with the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureResource {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl TextureResource {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.width == 0 || self.height == 0 {
            return Err(ResourceError::EmptyTexture {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// A color parameter: either a flat color or a texture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialColor {
    Color(Rgba),
    Texture(TextureResource),
}

impl MaterialColor {
    pub fn validate(&self) -> Result<(), ResourceError> {
        match self {
            MaterialColor::Color(_) => Ok(()),
            MaterialColor::Texture(tex) => tex.validate(),
        }
    }
}

impl From<Rgba> for MaterialColor {
    fn from(color: Rgba) -> Self {
        MaterialColor::Color(color)
    }
}

/// Fully built material value, swapped into a node in one assignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub base_color: Rgba,
    #[serde(default)]
    pub base_texture: Option<TextureResource>,
    pub emissive: Rgba,
    pub emissive_intensity: f32,
    #[serde(default)]
    pub unlit: bool,
}

impl Material {
    /// Flat unlit material in `color`.
    pub fn unlit(color: Rgba) -> Self {
        Self {
            base_color: color,
            base_texture: None,
            emissive: Rgba::CLEAR,
            emissive_intensity: 0.0,
            unlit: true,
        }
    }
}

/// Triangle mesh in the reticle's local frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshResource {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshResource {
    pub fn new(name: impl Into<String>, positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Footprint on the local XZ plane (width along X, depth along Z).
    pub fn footprint(&self) -> Vector2<f32> {
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        for p in &self.positions {
            min[0] = min[0].min(p[0]);
            min[1] = min[1].min(p[2]);
            max[0] = max[0].max(p[0]);
            max[1] = max[1].max(p[2]);
        }
        if self.positions.is_empty() {
            return Vector2::zeros();
        }
        Vector2::new(max[0] - min[0], max[1] - min[1])
    }

    /// Check that the mesh is complete and renderable.
    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.positions.is_empty() || self.indices.is_empty() {
            return Err(ResourceError::EmptyMesh {
                name: self.name.clone(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(ResourceError::IndexCountNotTriangles {
                name: self.name.clone(),
                count: self.indices.len(),
            });
        }
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            return Err(ResourceError::IndexOutOfRange {
                name: self.name.clone(),
                index,
                vertex_count: self.positions.len(),
            });
        }
        if self.positions.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ResourceError::NonFinitePosition {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}
