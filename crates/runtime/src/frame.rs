use std::f32::consts::TAU;

use roadscene_render::{CameraController, Renderer};

use crate::config::SceneConfig;
use crate::context::SceneContext;

/// Lifetime of the render loop. Ending it is the only way out of
/// [`FrameDriver::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    active: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self { active: true }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn end(&mut self) {
        if self.active {
            tracing::info!("session ended");
        }
        self.active = false;
    }
}

/// Per-frame update: spin the cube, settle the camera, draw.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    spin_per_frame: f32,
    frames: u64,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}

impl FrameDriver {
    pub fn new(spin_per_frame: f32) -> Self {
        Self {
            spin_per_frame,
            frames: 0,
        }
    }

    pub fn from_config(config: &SceneConfig) -> Self {
        Self::new(config.cube.spin_per_frame)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance one frame. Rotation is applied before the controls update so
    /// the rendered frame shows both.
    pub fn tick<C: CameraController, R: Renderer>(&mut self, ctx: &mut SceneContext<C, R>) {
        if let Some(cube) = ctx.scene.get_mut(ctx.cube) {
            let r = &mut cube.transform.rotation;
            r.x = (r.x + self.spin_per_frame).rem_euclid(TAU);
            r.y = (r.y + self.spin_per_frame).rem_euclid(TAU);
        }

        let moved = ctx.controls.update(&mut ctx.camera);
        ctx.renderer.render(&ctx.scene, &ctx.camera);

        self.frames += 1;
        tracing::trace!(frame = self.frames, camera_moved = moved, "frame");
    }

    /// Tick until the session ends. `yield_fn` runs after every frame and is
    /// where a host polls input or ends the session.
    pub fn run<C, R, F>(&mut self, ctx: &mut SceneContext<C, R>, session: &mut Session, mut yield_fn: F)
    where
        C: CameraController,
        R: Renderer,
        F: FnMut(&mut SceneContext<C, R>, &mut Session),
    {
        tracing::debug!("run loop started");
        while session.is_active() {
            self.tick(ctx);
            yield_fn(ctx, session);
        }
        tracing::debug!("run loop stopped after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadscene_input::Viewport;
    use roadscene_render::{DebugTextRenderer, OrbitControls, PerspectiveCamera};
    use roadscene_scene::SceneGraph;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct MockControls {
        log: Log,
    }

    impl CameraController for MockControls {
        fn update(&mut self, _camera: &mut PerspectiveCamera) -> bool {
            self.log.borrow_mut().push("update".into());
            false
        }
    }

    struct MockSink {
        log: Log,
        cube: Option<roadscene_common::ObjectId>,
    }

    impl Renderer for MockSink {
        type Output = ();

        fn render(&mut self, scene: &SceneGraph, _camera: &PerspectiveCamera) -> Self::Output {
            let spin = self
                .cube
                .and_then(|id| scene.get(id))
                .map(|c| c.transform.rotation.x)
                .unwrap_or_default();
            self.log.borrow_mut().push(format!("render {spin:.2}"));
        }
    }

    fn mock_context(log: &Log) -> SceneContext<MockControls, MockSink> {
        let mut ctx = SceneContext::build(
            &SceneConfig::default(),
            Viewport::new(800, 600),
            MockControls { log: log.clone() },
            MockSink {
                log: log.clone(),
                cube: None,
            },
            None,
        );
        ctx.renderer.cube = Some(ctx.cube);
        ctx
    }

    #[test]
    fn tick_rotates_then_updates_then_renders() {
        let log = Log::default();
        let mut ctx = mock_context(&log);
        let mut driver = FrameDriver::default();

        driver.tick(&mut ctx);
        driver.tick(&mut ctx);

        assert_eq!(*log.borrow(), ["update", "render 0.01", "update", "render 0.02"]);
        assert_eq!(driver.frames(), 2);
    }

    #[test]
    fn rotation_wraps_into_full_turn() {
        let log = Log::default();
        let mut ctx = mock_context(&log);
        let mut driver = FrameDriver::default();

        let n = 700;
        for _ in 0..n {
            driver.tick(&mut ctx);
        }

        let expected = (0.01 * n as f32).rem_euclid(TAU);
        let rot = ctx.scene.get(ctx.cube).unwrap().transform.rotation;
        assert!((rot.x - expected).abs() < 1e-3, "x = {}", rot.x);
        assert!((rot.y - expected).abs() < 1e-3, "y = {}", rot.y);
        assert!(rot.x < TAU && rot.x >= 0.0);
        assert_eq!(rot.z, 0.0);
    }

    #[test]
    fn only_the_cube_spins() {
        let log = Log::default();
        let mut ctx = mock_context(&log);
        FrameDriver::default().tick(&mut ctx);
        let road = ctx.scene.get(ctx.road).unwrap();
        assert_eq!(road.transform.rotation.y, 0.0);
    }

    #[test]
    fn ending_session_stops_run_loop() {
        let log = Log::default();
        let mut ctx = mock_context(&log);
        let mut driver = FrameDriver::default();
        let mut session = Session::new();

        let mut yields = 0;
        driver.run(&mut ctx, &mut session, |_, session| {
            yields += 1;
            if yields == 5 {
                session.end();
            }
        });

        assert_eq!(driver.frames(), 5);
        assert!(!session.is_active());
        assert_eq!(log.borrow().len(), 10);
    }

    #[test]
    fn ended_session_never_ticks() {
        let log = Log::default();
        let mut ctx = mock_context(&log);
        let mut session = Session::new();
        session.end();
        let mut driver = FrameDriver::default();
        driver.run(&mut ctx, &mut session, |_, _| unreachable!());
        assert_eq!(driver.frames(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn run_loop_with_debug_renderer_settles_camera() {
        let mut ctx = SceneContext::build(
            &SceneConfig::default(),
            Viewport::new(800, 600),
            OrbitControls::default(),
            DebugTextRenderer::default(),
            None,
        );
        ctx.apply(&roadscene_input::Action::Orbit { dx: 80.0, dy: 0.0 });
        let start = ctx.camera.position;
        let mut session = Session::new();
        let mut driver = FrameDriver::default();

        driver.run(&mut ctx, &mut session, |ctx, session| {
            if ctx.controls.is_settled() {
                session.end();
            }
        });

        assert_ne!(ctx.camera.position, start);
        assert!(ctx.renderer.frames() > 1);
        assert_eq!(ctx.renderer.frames(), driver.frames());
        assert!(ctx.renderer.last_frame().contains("Objects: 2"));
    }
}
