use std::collections::BTreeMap;

use roadscene_common::{Color, MaterialId, ObjectId, TextureId, Transform};
use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;
use crate::material::{Light, Material, Texture};
use crate::ray::{Intersection, Ray};

/// A visual entity: geometry, a shared material handle and a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub geometry: Geometry,
    pub material: Option<MaterialId>,
    pub transform: Transform,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: MaterialId) -> Self {
        Self {
            name: name.into(),
            geometry,
            material: Some(material),
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// A record produced by every structural or material mutation.
///
/// Per-frame transform updates are not recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    Inserted { id: ObjectId, name: String },
    MaterialTinted {
        object: ObjectId,
        material: MaterialId,
        old: Color,
        new: Color,
    },
    MaterialReplaced {
        object: ObjectId,
        old: Option<MaterialId>,
        new: MaterialId,
    },
}

/// Material mutation capability used by picking.
///
/// Both operations are no-ops (returning `false`) for unknown objects and for
/// objects without a material.
pub trait Paintable {
    /// Set the color of the material currently held by `object`.
    fn set_tint_color(&mut self, object: ObjectId, color: Color) -> bool;
    /// Make `object` hold `material` instead of its current one.
    fn replace_material(&mut self, object: ObjectId, material: MaterialId) -> bool;
}

/// Insertion-ordered object store with material and texture libraries.
#[derive(Debug, Default)]
pub struct SceneGraph {
    objects: Vec<(ObjectId, SceneObject)>,
    index: BTreeMap<ObjectId, usize>,
    materials: BTreeMap<MaterialId, Material>,
    textures: BTreeMap<TextureId, Texture>,
    light: Option<Light>,
    next_material: u64,
    next_texture: u64,
    event_log: Vec<SceneEvent>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object and return its id. Equal objects inserted twice get two ids.
    pub fn insert(&mut self, object: SceneObject) -> ObjectId {
        let id = ObjectId::new();
        tracing::debug!(
            "inserted {} '{}' as {}",
            object.geometry.kind(),
            object.name,
            id.short()
        );
        self.event_log.push(SceneEvent::Inserted {
            id,
            name: object.name.clone(),
        });
        self.index.insert(id, self.objects.len());
        self.objects.push((id, object));
        id
    }

    /// Objects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().map(|(id, obj)| (*id, obj))
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.index.get(&id).map(|&i| &self.objects[i].1)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        let i = *self.index.get(&id)?;
        Some(&mut self.objects[i].1)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.next_material);
        self.next_material += 1;
        self.materials.insert(id, material);
        id
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn materials(&self) -> &BTreeMap<MaterialId, Material> {
        &self.materials
    }

    /// The material currently held by an object.
    pub fn material_of(&self, object: ObjectId) -> Option<&Material> {
        self.get(object)?.material.and_then(|m| self.material(m))
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, texture);
        id
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    /// Install the scene light. The light is fixed once set; returns `false`
    /// if one is already present.
    pub fn set_light(&mut self, light: Light) -> bool {
        if self.light.is_some() {
            tracing::warn!("scene light already set; ignoring replacement");
            return false;
        }
        self.light = Some(light);
        true
    }

    pub fn light(&self) -> Option<&Light> {
        self.light.as_ref()
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// All hits of `ray` against every object, nearest first. Ties keep
    /// insertion order.
    pub fn intersect(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits: Vec<Intersection> = self
            .iter()
            .filter_map(|(id, obj)| {
                let mesh = obj.geometry.tessellate();
                let double_sided = obj
                    .material
                    .and_then(|m| self.materials.get(&m))
                    .is_some_and(|m| m.double_sided);
                ray.intersect_mesh(&mesh, obj.transform.matrix(), !double_sided)
                    .map(|(distance, point)| Intersection {
                        object: id,
                        distance,
                        point,
                    })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl Paintable for SceneGraph {
    fn set_tint_color(&mut self, object: ObjectId, color: Color) -> bool {
        let Some(material_id) = self.get(object).and_then(|o| o.material) else {
            return false;
        };
        let Some(material) = self.materials.get_mut(&material_id) else {
            return false;
        };
        let old = material.color;
        material.color = color;
        self.event_log.push(SceneEvent::MaterialTinted {
            object,
            material: material_id,
            old,
            new: color,
        });
        true
    }

    fn replace_material(&mut self, object: ObjectId, material: MaterialId) -> bool {
        if !self.materials.contains_key(&material) {
            return false;
        }
        let Some(obj) = self.get_mut(object) else {
            return false;
        };
        if obj.material.is_none() {
            return false;
        }
        let old = obj.material.replace(material);
        self.event_log.push(SceneEvent::MaterialReplaced {
            object,
            old,
            new: material,
        });
        true
    }
}
