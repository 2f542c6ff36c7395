use glam::Vec3;
use roadscene_common::{Color, TextureId};
use serde::{Deserialize, Serialize};

/// Shading model of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Unlit: color times texture, no lighting.
    Basic,
    /// Lit by the scene's directional light.
    Standard,
}

/// Surface appearance. Mutable through the scene graph only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub color: Color,
    pub map: Option<TextureId>,
    /// Both faces are drawn and pickable.
    #[serde(default)]
    pub double_sided: bool,
}

impl Material {
    pub fn basic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Basic,
            color: Color::WHITE,
            map: None,
            double_sided: false,
        }
    }

    pub fn standard(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Standard,
            color,
            map: None,
            double_sided: false,
        }
    }

    pub fn with_map(mut self, texture: TextureId) -> Self {
        self.map = Some(texture);
        self
    }

    pub fn double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }
}

/// Decoded RGBA8 image.
#[derive(Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Texture {
    /// 1x1 opaque white, bound when a material has no map.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        }
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Directional light. Shines from `position` towards the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl Light {
    pub fn directional(color: Color, intensity: f32, position: Vec3) -> Self {
        Self {
            color,
            intensity,
            position,
        }
    }

    /// Unit vector pointing from the surface towards the light.
    pub fn direction(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }
}
