use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use glam::{Mat3, Mat4, Vec3};
use roadscene_common::Color;
use roadscene_scene::{Texture, TriangleMesh};

use crate::AssetError;

/// Surface properties of one glTF material. Parts that name the same
/// material index share it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMaterial {
    pub name: String,
    pub base_color: Color,
    pub double_sided: bool,
    /// Index into [`LoadedModel::images`].
    pub base_color_image: Option<usize>,
}

impl Default for ModelMaterial {
    /// The glTF default material: opaque white, single-sided, untextured.
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: Color::WHITE,
            double_sided: false,
            base_color_image: None,
        }
    }
}

/// One triangle primitive of a model, already in model space.
#[derive(Debug, Clone)]
pub struct ModelPart {
    pub name: String,
    pub mesh: TriangleMesh,
    /// Index into [`LoadedModel::materials`]; `None` selects the default material.
    pub material: Option<usize>,
}

/// A model flattened into independent parts.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub source: PathBuf,
    pub parts: Vec<ModelPart>,
    /// Indexed like the file's `materials` array.
    pub materials: Vec<ModelMaterial>,
    /// Indexed like the file's `images` array; `None` where the pixel format
    /// could not be converted to RGBA8.
    pub images: Vec<Option<Texture>>,
}

impl LoadedModel {
    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.triangle_count()).sum()
    }

    /// Material of `part`, falling back to the glTF default.
    pub fn material_of(&self, part: &ModelPart) -> ModelMaterial {
        part.material
            .and_then(|i| self.materials.get(i))
            .cloned()
            .unwrap_or_default()
    }
}

/// Import a glTF file, flattening the node hierarchy.
///
/// Node transforms are baked into vertex positions and normals so each part
/// can be placed with an identity transform.
pub fn load_model(path: impl AsRef<Path>) -> Result<LoadedModel, AssetError> {
    let path = path.as_ref();
    let (document, buffers, images) = gltf::import(path)?;

    let mut parts = Vec::new();
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            collect_node(&node, Mat4::IDENTITY, &buffers, &mut parts)?;
        }
    }

    if parts.is_empty() {
        return Err(AssetError::EmptyModel(path.display().to_string()));
    }

    let materials = document.materials().map(|m| read_material(&m)).collect();
    let images = images.iter().map(image_to_texture).collect();

    let model = LoadedModel {
        source: path.to_path_buf(),
        parts,
        materials,
        images,
    };
    tracing::info!(
        "loaded model {} ({} parts, {} materials, {} triangles)",
        path.display(),
        model.parts.len(),
        model.materials.len(),
        model.triangle_count()
    );
    Ok(model)
}

/// Load a model on a worker thread and hand the result to `on_done` there.
///
/// The callback is expected to forward the result to the thread that owns
/// the scene (for example through an event-loop proxy).
pub fn spawn_model_load<F>(path: impl Into<PathBuf>, on_done: F) -> JoinHandle<()>
where
    F: FnOnce(Result<LoadedModel, AssetError>) + Send + 'static,
{
    let path = path.into();
    std::thread::spawn(move || {
        let _span = tracing::info_span!("model_load", path = %path.display()).entered();
        on_done(load_model(&path));
    })
}

fn read_material(material: &gltf::Material<'_>) -> ModelMaterial {
    let pbr = material.pbr_metallic_roughness();
    ModelMaterial {
        name: material
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or_default())),
        base_color: linear_to_srgb(pbr.base_color_factor()),
        double_sided: material.double_sided(),
        base_color_image: pbr
            .base_color_texture()
            .map(|info| info.texture().source().index()),
    }
}

fn image_to_texture(data: &gltf::image::Data) -> Option<Texture> {
    use gltf::image::Format;

    let rgba: Vec<u8> = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        other => {
            tracing::warn!("skipping embedded image with unsupported format {other:?}");
            return None;
        }
    };
    if rgba.len() != data.width as usize * data.height as usize * 4 {
        tracing::warn!("embedded image size does not match {}x{}", data.width, data.height);
        return None;
    }
    Some(Texture {
        width: data.width,
        height: data.height,
        rgba,
    })
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    parts: &mut Vec<ModelPart>,
) -> Result<(), AssetError> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("mesh");
        for (i, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::debug!("skipping non-triangle primitive {i} of {mesh_name}");
                continue;
            }
            let name = format!("{mesh_name}_{i}");
            match read_primitive(&primitive, buffers, world, &name)? {
                Some(mesh) => parts.push(ModelPart {
                    name,
                    mesh,
                    material: primitive.material().index(),
                }),
                None => tracing::warn!("primitive {i} of {mesh_name} has no positions"),
            }
        }
    }

    for child in node.children() {
        collect_node(&child, world, buffers, parts)?;
    }
    Ok(())
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    world: Mat4,
    name: &str,
) -> Result<Option<TriangleMesh>, AssetError> {
    let reader = primitive.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));

    let Some(positions) = reader.read_positions() else {
        return Ok(None);
    };
    let positions: Vec<[f32; 3]> = positions
        .map(|p| world.transform_point3(Vec3::from(p)).to_array())
        .collect();

    let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| {
            iter.map(|n| (normal_matrix * Vec3::from(n)).normalize_or(Vec3::Y).to_array())
                .collect()
        })
        .unwrap_or_default();

    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|tc| tc.into_f32().collect())
        .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

    let mut indices: Vec<u32> = reader
        .read_indices()
        .map(|idx| idx.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(AssetError::InvalidIndex {
            part: name.to_owned(),
            index,
            vertices: positions.len(),
        });
    }

    // A mirroring transform flips winding; restore counter-clockwise fronts.
    if world.determinant() < 0.0 {
        for tri in indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    let mut mesh = TriangleMesh {
        positions,
        normals,
        uvs,
        indices,
    };
    mesh.ensure_normals();
    Ok(Some(mesh))
}

fn linear_to_srgb(c: [f32; 4]) -> Color {
    let enc = |v: f32| {
        if v >= 1.0 {
            1.0
        } else if v <= 0.003_130_8 {
            v.max(0.0) * 12.92
        } else {
            1.055 * v.powf(1.0 / 2.4) - 0.055
        }
    };
    Color::rgb(enc(c[0]), enc(c[1]), enc(c[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    // One red triangle, translated two units down -Z by its node.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "mesh": 0, "translation": [0.0, 0.0, -2.0] } ],
        "meshes": [ {
            "name": "tri",
            "primitives": [ { "attributes": { "POSITION": 0 }, "material": 0 } ]
        } ],
        "materials": [ { "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } } ],
        "accessors": [ {
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        } ],
        "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
        "buffers": [ {
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        } ]
    }"#;

    fn write_triangle() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.gltf"), TRIANGLE_GLTF).unwrap();
        dir
    }

    #[test]
    fn loads_and_bakes_node_transform() {
        let dir = write_triangle();
        let model = load_model(dir.path().join("tri.gltf")).unwrap();

        assert_eq!(model.parts.len(), 1);
        let part = &model.parts[0];
        assert_eq!(part.name, "tri_0");
        assert_eq!(part.mesh.indices, vec![0, 1, 2]);
        assert_eq!(part.mesh.positions[1], [1.0, 0.0, -2.0]);
        assert_eq!(part.mesh.normals[0], [0.0, 0.0, 1.0]);
        assert_eq!(part.material, Some(0));
        assert_eq!(model.material_of(part).base_color, Color::RED);
        assert!(!model.material_of(part).double_sided);
        assert_eq!(model.triangle_count(), 1);
    }

    // Two meshes sharing double-sided material 0, a third on material 1.
    const SHARED_MATERIAL_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0, 1, 2] } ],
        "nodes": [ { "mesh": 0 }, { "mesh": 1 }, { "mesh": 2 } ],
        "meshes": [
            { "name": "a", "primitives": [ { "attributes": { "POSITION": 0 }, "material": 0 } ] },
            { "name": "b", "primitives": [ { "attributes": { "POSITION": 0 }, "material": 0 } ] },
            { "name": "c", "primitives": [ { "attributes": { "POSITION": 0 }, "material": 1 } ] }
        ],
        "materials": [
            { "name": "paint", "doubleSided": true },
            { "name": "trim", "pbrMetallicRoughness": { "baseColorFactor": [0.0, 0.0, 1.0, 1.0] } }
        ],
        "accessors": [ {
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        } ],
        "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
        "buffers": [ {
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        } ]
    }"#;

    // Three vertices, indices [0, 1, 5], no normals.
    const BAD_INDEX_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "mesh": 0 } ],
        "meshes": [ {
            "name": "broken",
            "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1 } ]
        } ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "buffers": [ {
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAUAAAA="
        } ]
    }"#;

    #[test]
    fn parts_keep_their_material_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.gltf");
        std::fs::write(&path, SHARED_MATERIAL_GLTF).unwrap();
        let model = load_model(&path).unwrap();

        let indices: Vec<Option<usize>> = model.parts.iter().map(|p| p.material).collect();
        assert_eq!(indices, vec![Some(0), Some(0), Some(1)]);
        assert_eq!(model.materials.len(), 2);

        let paint = model.material_of(&model.parts[0]);
        assert_eq!(paint.name, "paint");
        assert!(paint.double_sided);
        assert_eq!(paint.base_color, Color::WHITE);
        assert_eq!(
            model.material_of(&model.parts[2]).base_color,
            Color::rgb(0.0, 0.0, 1.0)
        );
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gltf");
        std::fs::write(&path, BAD_INDEX_GLTF).unwrap();
        let err = load_model(&path).unwrap_err();
        assert!(matches!(
            err,
            AssetError::InvalidIndex {
                index: 5,
                vertices: 3,
                ..
            }
        ));
    }

    #[test]
    fn primitive_without_material_uses_default() {
        let model = LoadedModel {
            source: PathBuf::from("m.gltf"),
            parts: vec![ModelPart {
                name: "p".into(),
                mesh: TriangleMesh::default(),
                material: None,
            }],
            materials: Vec::new(),
            images: Vec::new(),
        };
        assert_eq!(model.material_of(&model.parts[0]), ModelMaterial::default());
    }

    #[test]
    fn rgb_images_are_expanded_to_rgba() {
        let data = gltf::image::Data {
            pixels: vec![1, 2, 3, 4, 5, 6],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let texture = image_to_texture(&data).unwrap();
        assert_eq!(texture.rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_model(dir.path().join("nope.gltf")).unwrap_err();
        assert!(matches!(err, AssetError::Gltf(_)));
    }

    #[test]
    fn background_load_reports_through_callback() {
        let dir = write_triangle();
        let (tx, rx) = mpsc::channel();
        let handle = spawn_model_load(dir.path().join("tri.gltf"), move |result| {
            tx.send(result.map(|m| m.parts.len())).unwrap();
        });
        handle.join().unwrap();
        assert_eq!(rx.recv().unwrap().unwrap(), 1);
    }

    #[test]
    fn linear_base_color_is_encoded() {
        let c = linear_to_srgb([0.2158605, 0.0, 1.0, 1.0]);
        assert!((c.r - 0.5).abs() < 1e-3);
        assert_eq!(c.b, 1.0);
    }
}
