use roadscene_common::{Color, MaterialId, ObjectId};
use roadscene_input::{ScreenPoint, Viewport};
use roadscene_scene::Paintable;

use crate::context::SceneContext;

/// Result of one click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickOutcome {
    /// The ray hit nothing; the scene is untouched.
    Miss,
    /// The nearest object was tinted, and for the test cube also given the
    /// road material.
    Hit {
        object: ObjectId,
        distance: f32,
        swapped: bool,
    },
}

/// Click-driven material mutation of the nearest object under the cursor.
#[derive(Debug, Clone, Copy)]
pub struct PickingController {
    pub tint: Color,
}

impl Default for PickingController {
    fn default() -> Self {
        Self { tint: Color::GREEN }
    }
}

impl PickingController {
    pub fn on_click<C, R>(
        &self,
        ctx: &mut SceneContext<C, R>,
        click: ScreenPoint,
        viewport: Viewport,
    ) -> PickOutcome {
        let ndc = viewport.to_ndc(click);
        let ray = ctx.camera.ray_from_ndc(ndc);
        let hits = ctx.scene.intersect(&ray);

        let Some(nearest) = hits.first() else {
            tracing::debug!("click at ({:.0}, {:.0}) hit nothing", click.x, click.y);
            return PickOutcome::Miss;
        };

        let swapped = self.paint(&mut ctx.scene, nearest.object, ctx.cube, ctx.road_material);
        tracing::info!(
            "picked {} at distance {:.2}{}",
            nearest.object.short(),
            nearest.distance,
            if swapped { " (cube -> road material)" } else { "" }
        );
        PickOutcome::Hit {
            object: nearest.object,
            distance: nearest.distance,
            swapped,
        }
    }

    /// Tint the hit object's material, then, only for the cube, replace its
    /// material with the road's. The tint lands on the cube's previous
    /// material, so the cube ends up showing the road material unchanged.
    /// Returns whether the swap happened.
    pub fn paint<S: Paintable>(
        &self,
        target: &mut S,
        hit: ObjectId,
        cube: ObjectId,
        road_material: MaterialId,
    ) -> bool {
        target.set_tint_color(hit, self.tint);
        hit == cube && target.replace_material(hit, road_material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use glam::Vec3;
    use roadscene_common::Transform;
    use roadscene_render::{DebugTextRenderer, OrbitControls};
    use roadscene_scene::{Geometry, Material, SceneObject};

    type Ctx = SceneContext<OrbitControls, DebugTextRenderer>;

    fn context() -> Ctx {
        SceneContext::build(
            &SceneConfig::default(),
            Viewport::new(800, 600),
            OrbitControls::default(),
            DebugTextRenderer::default(),
            None,
        )
    }

    fn snapshot(ctx: &Ctx) -> Vec<(Option<MaterialId>, Option<Color>)> {
        ctx.scene
            .iter()
            .map(|(id, obj)| (obj.material, ctx.scene.material_of(id).map(|m| m.color)))
            .collect()
    }

    #[test]
    fn miss_leaves_every_material_unchanged() {
        let mut ctx = context();
        let before = snapshot(&ctx);
        let vp = ctx.viewport;
        let outcome = PickingController::default().on_click(&mut ctx, ScreenPoint::new(0.0, 0.0), vp);
        assert_eq!(outcome, PickOutcome::Miss);
        assert_eq!(snapshot(&ctx), before);
    }

    #[test]
    fn clicking_cube_ends_with_road_material() {
        let mut ctx = context();
        let old_cube_material = ctx.scene.get(ctx.cube).unwrap().material.unwrap();
        let vp = ctx.viewport;

        let outcome = PickingController::default().on_click(&mut ctx, vp.center(), vp);

        assert!(matches!(outcome, PickOutcome::Hit { object, swapped: true, .. } if object == ctx.cube));
        assert_eq!(ctx.scene.get(ctx.cube).unwrap().material, Some(ctx.road_material));
        // Road material itself was not tinted.
        assert_eq!(ctx.scene.material(ctx.road_material).unwrap().color, Color::WHITE);
        // The tint went to the cube's former material before the swap.
        assert_eq!(ctx.scene.material(old_cube_material).unwrap().color, Color::GREEN);
    }

    #[test]
    fn clicking_road_tints_without_swap() {
        let mut ctx = context();
        let vp = ctx.viewport;
        let below_center = ScreenPoint::new(vp.width as f32 * 0.5, vp.height as f32 * 0.9);

        let outcome = PickingController::default().on_click(&mut ctx, below_center, vp);

        assert!(matches!(outcome, PickOutcome::Hit { object, swapped: false, .. } if object == ctx.road));
        let road = ctx.scene.get(ctx.road).unwrap();
        assert_eq!(road.material, Some(ctx.road_material));
        assert_eq!(ctx.scene.material_of(ctx.road).unwrap().color, Color::GREEN);
        assert_eq!(ctx.scene.material_of(ctx.cube).unwrap().color, Color::RED);
    }

    #[test]
    fn nearest_of_two_overlapping_objects_is_mutated() {
        let mut ctx = context();
        let blocker_mat = ctx.scene.add_material(Material::standard("blocker", Color::WHITE));
        let blocker = ctx.scene.insert(
            SceneObject::new("blocker", Geometry::cube(1.0), blocker_mat)
                .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, 3.0))),
        );
        let vp = ctx.viewport;

        let outcome = PickingController::default().on_click(&mut ctx, vp.center(), vp);

        assert!(matches!(outcome, PickOutcome::Hit { object, swapped: false, .. } if object == blocker));
        assert_eq!(ctx.scene.material(blocker_mat).unwrap().color, Color::GREEN);
        let cube = ctx.scene.get(ctx.cube).unwrap();
        assert_ne!(cube.material, Some(ctx.road_material));
        assert_eq!(ctx.scene.material_of(ctx.cube).unwrap().color, Color::RED);
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
    }

    impl Paintable for Recorder {
        fn set_tint_color(&mut self, _object: ObjectId, _color: Color) -> bool {
            self.calls.push("tint");
            true
        }

        fn replace_material(&mut self, _object: ObjectId, _material: MaterialId) -> bool {
            self.calls.push("replace");
            true
        }
    }

    #[test]
    fn tint_happens_before_swap() {
        let cube = ObjectId::new();
        let mut rec = Recorder::default();
        assert!(PickingController::default().paint(&mut rec, cube, cube, MaterialId(0)));
        assert_eq!(rec.calls, ["tint", "replace"]);
    }

    #[test]
    fn non_cube_is_only_tinted() {
        let mut rec = Recorder::default();
        let swapped =
            PickingController::default().paint(&mut rec, ObjectId::new(), ObjectId::new(), MaterialId(0));
        assert!(!swapped);
        assert_eq!(rec.calls, ["tint"]);
    }
}
