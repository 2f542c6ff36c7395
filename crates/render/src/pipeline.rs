use serde::{Deserialize, Serialize};

/// Parameters of the bloom post-process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Weight of the blurred glow added back onto the image.
    pub strength: f32,
    /// Blur spread in `[0, 1]`.
    pub radius: f32,
    /// Luminance above which pixels contribute to the glow.
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            strength: 0.5,
            radius: 0.4,
            threshold: 0.85,
        }
    }
}

/// One stage of the frame pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassDescriptor {
    /// Rasterise the scene from the camera.
    Base,
    /// Glow post-process over the base pass output.
    Bloom(BloomSettings),
}

impl PassDescriptor {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Bloom(_) => "bloom",
        }
    }
}

/// Ordered list of passes, fixed once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPipeline {
    passes: Vec<PassDescriptor>,
}

impl RenderPipeline {
    /// Base pass followed by bloom.
    pub fn with_bloom(bloom: BloomSettings) -> Self {
        Self {
            passes: vec![PassDescriptor::Base, PassDescriptor::Bloom(bloom)],
        }
    }

    /// Base pass only.
    pub fn base_only() -> Self {
        Self {
            passes: vec![PassDescriptor::Base],
        }
    }

    pub fn passes(&self) -> &[PassDescriptor] {
        &self.passes
    }

    pub fn bloom(&self) -> Option<BloomSettings> {
        self.passes.iter().find_map(|p| match p {
            PassDescriptor::Bloom(b) => Some(*b),
            PassDescriptor::Base => None,
        })
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::with_bloom(BloomSettings::default())
    }
}
