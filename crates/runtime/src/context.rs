use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;
use roadscene_assets::{AssetError, LoadedModel};
use roadscene_common::{Color, MaterialId, ObjectId, TextureId, Transform};
use roadscene_input::{Action, Viewport};
use roadscene_render::{CameraController, PerspectiveCamera, Renderer};
use roadscene_scene::{Geometry, Light, Material, SceneGraph, SceneObject, Texture};

use crate::config::SceneConfig;
use crate::picking::{PickOutcome, PickingController};

/// All session state, built once at startup and passed by reference to the
/// frame driver and the picking controller.
pub struct SceneContext<C, R> {
    pub scene: SceneGraph,
    pub camera: PerspectiveCamera,
    pub controls: C,
    pub renderer: R,
    pub viewport: Viewport,
    /// The spinning test cube.
    pub cube: ObjectId,
    pub road: ObjectId,
    /// Material shared by the road; the cube receives it when clicked.
    pub road_material: MaterialId,
    /// Objects inserted from the loaded model, if it arrived.
    pub model_parts: Vec<ObjectId>,
    picking: PickingController,
}

impl<C: CameraController, R: Renderer> SceneContext<C, R> {
    /// Populate the scene with the road, the light and the cube, and set up
    /// the camera for `viewport`. The model is added later by `on_model_loaded`.
    pub fn build(
        config: &SceneConfig,
        viewport: Viewport,
        controls: C,
        renderer: R,
        road_texture: Option<Texture>,
    ) -> Self {
        let mut scene = SceneGraph::new();

        let mut road_mat = Material::basic("road");
        if let Some(texture) = road_texture {
            road_mat = road_mat.with_map(scene.add_texture(texture));
        }
        let road_material = scene.add_material(road_mat);
        let road = scene.insert(
            SceneObject::new(
                "road",
                Geometry::Plane {
                    width: config.road.width,
                    height: config.road.length,
                },
                road_material,
            )
            .with_transform(Transform {
                position: Vec3::new(0.0, config.road.elevation, 0.0),
                rotation: Vec3::new(-FRAC_PI_2, 0.0, 0.0),
                ..Transform::default()
            }),
        );

        scene.set_light(Light::directional(
            Color::from_hex(config.light.color),
            config.light.intensity,
            config.light.position,
        ));

        let cube_material =
            scene.add_material(Material::standard("cube", Color::from_hex(config.cube.color)));
        let cube = scene.insert(SceneObject::new(
            "cube",
            Geometry::cube(config.cube.size),
            cube_material,
        ));

        let mut camera = PerspectiveCamera::new(
            config.camera.fov_degrees,
            viewport.aspect(),
            config.camera.near,
            config.camera.far,
        );
        camera.position = config.camera.position;

        tracing::info!(
            "scene built: {} objects, viewport {}x{}",
            scene.len(),
            viewport.width,
            viewport.height
        );

        Self {
            scene,
            camera,
            controls,
            renderer,
            viewport,
            cube,
            road,
            road_material,
            model_parts: Vec::new(),
            picking: PickingController::default(),
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.set_aspect(viewport.aspect());
    }

    /// Completion of the background model load. A failure only logs; the
    /// scene carries on without the model.
    pub fn on_model_loaded(&mut self, result: Result<LoadedModel, AssetError>) {
        match result {
            Ok(model) => {
                let ids = self.insert_model(model);
                tracing::info!("model added to scene as {} objects", ids.len());
            }
            Err(e) => tracing::error!("failed to load model: {e}"),
        }
    }

    /// Insert every part of a model. Parts naming the same glTF material
    /// share one scene material, so tinting one tints them all.
    pub fn insert_model(&mut self, model: LoadedModel) -> Vec<ObjectId> {
        let mut materials: HashMap<Option<usize>, MaterialId> = HashMap::new();
        let mut textures: HashMap<usize, TextureId> = HashMap::new();

        let resolved: Vec<MaterialId> = model
            .parts
            .iter()
            .map(|part| {
                if let Some(id) = materials.get(&part.material).copied() {
                    return id;
                }
                let source = model.material_of(part);
                let mut material = Material::standard(source.name, source.base_color);
                if source.double_sided {
                    material = material.double_sided();
                }
                if let Some(image) = source.base_color_image {
                    let texture = match textures.get(&image).copied() {
                        Some(id) => Some(id),
                        None => model.images.get(image).cloned().flatten().map(|t| {
                            let id = self.scene.add_texture(t);
                            textures.insert(image, id);
                            id
                        }),
                    };
                    if let Some(texture) = texture {
                        material = material.with_map(texture);
                    }
                }
                let id = self.scene.add_material(material);
                materials.insert(part.material, id);
                id
            })
            .collect();
        tracing::debug!(
            "model {} uses {} materials, {} textures",
            model.source.display(),
            materials.len(),
            textures.len()
        );

        let ids: Vec<ObjectId> = model
            .parts
            .into_iter()
            .zip(resolved)
            .map(|(part, material)| {
                self.scene.insert(SceneObject::new(
                    part.name,
                    Geometry::Mesh(Arc::new(part.mesh)),
                    material,
                ))
            })
            .collect();
        self.model_parts.extend(&ids);
        ids
    }

    /// Route one input action: clicks pick, resizes reshape the camera,
    /// everything else goes to the camera controls.
    pub fn apply(&mut self, action: &Action) -> Option<PickOutcome> {
        match action {
            Action::Click(point) => {
                let picking = self.picking;
                let viewport = self.viewport;
                Some(picking.on_click(self, *point, viewport))
            }
            Action::Resize(viewport) => {
                self.resize(*viewport);
                None
            }
            Action::Noop => None,
            other => {
                self.controls.handle(other, &self.camera, self.viewport);
                None
            }
        }
    }
}

/// Decode the road texture, or log and return `None` so the road is drawn
/// untextured.
pub fn load_road_texture(config: &SceneConfig) -> Option<Texture> {
    match roadscene_assets::load_texture(&config.texture_path) {
        Ok(texture) => Some(texture),
        Err(e) => {
            tracing::warn!(
                "road texture {} unavailable: {e}",
                config.texture_path.display()
            );
            None
        }
    }
}
