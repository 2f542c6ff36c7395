use std::fmt::Write as _;

use roadscene_scene::SceneGraph;

use crate::camera::PerspectiveCamera;
use crate::pipeline::RenderPipeline;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and camera, then produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Self::Output;
}

/// Headless renderer producing a text description of each frame.
///
/// Used by the CLI, in logs, and to exercise the frame path in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    pipeline: RenderPipeline,
    frames: u64,
    last: String,
}

impl DebugTextRenderer {
    pub fn new(pipeline: RenderPipeline) -> Self {
        Self {
            pipeline,
            frames: 0,
            last: String::new(),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    /// Text of the most recent frame, empty before the first one.
    pub fn last_frame(&self) -> &str {
        &self.last
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame {} ===", self.frames);

        let passes: Vec<&str> = self.pipeline.passes().iter().map(|p| p.name()).collect();
        let _ = write!(out, "Passes: {}", passes.join(" -> "));
        if let Some(b) = self.pipeline.bloom() {
            let _ = write!(
                out,
                " (strength={:.2} radius={:.2} threshold={:.2})",
                b.strength, b.radius, b.threshold
            );
        }
        out.push('\n');

        let p = camera.position;
        let t = camera.target;
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0}",
            p.x, p.y, p.z, t.x, t.y, t.z, camera.fov_degrees
        );
        if let Some(light) = scene.light() {
            let _ = writeln!(
                out,
                "Light: #{:06x} x{:.1} from ({:.1}, {:.1}, {:.1})",
                light.color.to_hex(),
                light.intensity,
                light.position.x,
                light.position.y,
                light.position.z
            );
        }
        let _ = writeln!(out, "Objects: {}", scene.len());

        for (id, obj) in scene.iter() {
            let pos = obj.transform.position;
            let rot = obj.transform.rotation;
            let material = match obj.material.and_then(|m| scene.material(m).map(|mat| (m, mat))) {
                Some((m, mat)) => format!("{}#{} #{:06x}", mat.name, m.0, mat.color.to_hex()),
                None => "none".to_string(),
            };
            let _ = writeln!(
                out,
                "  [{}] {} ({}) pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2}) material={}",
                id.short(),
                obj.name,
                obj.geometry.kind(),
                pos.x,
                pos.y,
                pos.z,
                rot.x,
                rot.y,
                rot.z,
                material
            );
        }

        self.last.clone_from(&out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use roadscene_common::{Color, Transform};
    use roadscene_scene::{Geometry, Light, Material, SceneObject};

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = SceneGraph::new();
        let mut renderer = DebugTextRenderer::default();
        let output = renderer.render(&scene, &PerspectiveCamera::default());

        assert!(output.contains("Frame 1"));
        assert!(output.contains("Objects: 0"));
        assert!(output.contains("base -> bloom"));
    }

    #[test]
    fn debug_renderer_with_objects() {
        let mut scene = SceneGraph::new();
        scene.set_light(Light::directional(Color::WHITE, 1.5, Vec3::splat(2.0)));
        let mat = scene.add_material(Material::standard("red", Color::RED));
        scene.insert(
            SceneObject::new("cube", Geometry::cube(1.0), mat)
                .with_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0))),
        );

        let mut renderer = DebugTextRenderer::new(RenderPipeline::base_only());
        renderer.render(&scene, &PerspectiveCamera::default());
        let output = renderer.render(&scene, &PerspectiveCamera::default());

        assert_eq!(renderer.frames(), 2);
        assert_eq!(renderer.last_frame(), output);
        assert!(output.contains("Objects: 1"));
        assert!(output.contains("pos=(1.00, 2.00, 3.00)"));
        assert!(output.contains("#ff0000"));
        assert!(output.contains("Light: #ffffff"));
        assert!(!output.contains("bloom"));
    }
}
