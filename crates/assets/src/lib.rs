//! Asset loading: glTF models and ground textures.
//!
//! Loaders return plain scene data (`TriangleMesh`, `Texture`); inserting it
//! into a scene is the caller's job. Model loads can run on a worker thread
//! and report back through a completion callback.

mod model;
mod texture;

pub use model::{LoadedModel, ModelMaterial, ModelPart, load_model, spawn_model_load};
pub use texture::load_texture;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("model {0} contains no triangle meshes")]
    EmptyModel(String),
    #[error("{part} references vertex {index} but has only {vertices}")]
    InvalidIndex {
        part: String,
        index: u32,
        vertices: usize,
    },
}
