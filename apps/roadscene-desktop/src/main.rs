use anyhow::Result;
use clap::Parser;
use roadscene_assets::{AssetError, LoadedModel};
use roadscene_input::{Action, PointerButton, PointerTracker, ScreenPoint, Viewport};
use roadscene_render::{OrbitControls, RenderPipeline};
use roadscene_render_wgpu::SurfaceRenderer;
use roadscene_runtime::{FrameDriver, SceneConfig, SceneContext, Session, load_road_texture};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "roadscene-desktop", about = "Road scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// glTF model to load in the background
    #[arg(long)]
    model: Option<PathBuf>,

    /// Image used as the road texture
    #[arg(long)]
    texture: Option<PathBuf>,

    /// YAML file overriding scene defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

enum UserEvent {
    ModelLoaded(Result<LoadedModel, AssetError>),
}

type DesktopContext = SceneContext<OrbitControls, SurfaceRenderer>;

struct DesktopApp {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    ctx: Option<DesktopContext>,
    driver: FrameDriver,
    session: Session,
    pointer: PointerTracker,
    /// A model that finished loading before the window existed.
    pending_model: Option<Result<LoadedModel, AssetError>>,
    error: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(config: SceneConfig) -> Self {
        Self {
            driver: FrameDriver::from_config(&config),
            config,
            window: None,
            ctx: None,
            session: Session::new(),
            pointer: PointerTracker::new(),
            pending_model: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Road Scene")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let size = window.inner_size();
        let viewport = Viewport::new(size.width, size.height);
        let pipeline = RenderPipeline::with_bloom(self.config.bloom);
        let renderer =
            SurfaceRenderer::new(&instance, surface, viewport.width, viewport.height, &pipeline)?;

        let mut ctx = SceneContext::build(
            &self.config,
            viewport,
            OrbitControls::new(self.config.controls),
            renderer,
            load_road_texture(&self.config),
        );
        if let Some(result) = self.pending_model.take() {
            ctx.on_model_loaded(result);
        }

        self.ctx = Some(ctx);
        self.window = Some(window);
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        if action == Action::Noop {
            return;
        }
        if let Some(ctx) = &mut self.ctx {
            ctx.apply(&action);
        }
    }
}

impl ApplicationHandler<UserEvent> for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.error = Some(e);
            self.session.end();
            event_loop.exit();
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::ModelLoaded(result) => match &mut self.ctx {
                Some(ctx) => ctx.on_model_loaded(result),
                None => self.pending_model = Some(result),
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.session.end();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(ctx) = &mut self.ctx {
                    ctx.renderer.resize(new_size.width, new_size.height);
                    let (w, h) = ctx.renderer.size();
                    ctx.apply(&Action::Resize(Viewport::new(w, h)));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let action = self
                    .pointer
                    .cursor_moved(ScreenPoint::new(position.x as f32, position.y as f32));
                self.apply(action);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    _ => PointerButton::Other,
                };
                let action = self.pointer.button(button, state == ElementState::Pressed);
                self.apply(action);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y as f32).signum(),
                };
                let action = self.pointer.wheel(lines);
                self.apply(action);
            }
            WindowEvent::RedrawRequested => {
                if !self.session.is_active() {
                    return;
                }
                if let Some(ctx) = &mut self.ctx {
                    self.driver.tick(ctx);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if let Some(texture) = cli.texture {
        config.texture_path = texture;
    }

    tracing::info!("roadscene-desktop starting");

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let proxy: EventLoopProxy<UserEvent> = event_loop.create_proxy();
    roadscene_assets::spawn_model_load(config.model_path.clone(), move |result| {
        if proxy.send_event(UserEvent::ModelLoaded(result)).is_err() {
            tracing::debug!("event loop closed before the model finished loading");
        }
    });

    let mut app = DesktopApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => {
            tracing::info!("rendered {} frames", app.driver.frames());
            Ok(())
        }
    }
}
