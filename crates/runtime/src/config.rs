use std::path::{Path, PathBuf};

use glam::Vec3;
use roadscene_render::{BloomSettings, OrbitSettings};
use serde::{Deserialize, Serialize};

/// Errors from loading a scene configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(0.0, 0.0, 10.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// 0xRRGGBB.
    pub color: u32,
    pub intensity: f32,
    pub position: Vec3,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            intensity: 1.5,
            position: Vec3::new(2.0, 2.0, 2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    pub size: f32,
    /// 0xRRGGBB.
    pub color: u32,
    /// Radians added to the X and Y rotation every frame.
    pub spin_per_frame: f32,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            size: 1.0,
            color: 0xff0000,
            spin_per_frame: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub width: f32,
    pub length: f32,
    /// Ground height; slightly below zero so the road never covers the cube.
    pub elevation: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            length: 50.0,
            elevation: -0.1,
        }
    }
}

/// Everything needed to build the scene. Defaults reproduce the demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub controls: OrbitSettings,
    pub bloom: BloomSettings,
    pub light: LightConfig,
    pub cube: CubeConfig,
    pub road: RoadConfig,
    pub model_path: PathBuf,
    pub texture_path: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            controls: OrbitSettings::default(),
            bloom: BloomSettings::default(),
            light: LightConfig::default(),
            cube: CubeConfig::default(),
            road: RoadConfig::default(),
            model_path: PathBuf::from("./mesh/scene.gltf"),
            texture_path: PathBuf::from("R3.jpg"),
        }
    }
}

impl SceneConfig {
    /// Parse YAML; missing keys fall back to defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!("loaded scene config from {}", path.as_ref().display());
        Ok(config)
    }
}
