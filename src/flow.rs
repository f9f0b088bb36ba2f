//! Application event loop.
//!
//! [`run`] opens a window (or attaches to the page canvas on wasm), initialises a
//! [`Renderer`] over a wgpu [`Context`], and drives it from winit's redraw requests until
//! the window closes or a [`StopHandle`] asks it to stop.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and runs the async initialisation to completion
//!    (blocking on tokio natively, `spawn_local` on wasm)
//! 2. every `RedrawRequested` advances the camera controller, updates and draws the scene,
//!    and requests the next redraw
//! 3. window resizes are coalesced and applied once they have been quiet for
//!    [`SceneConfig::resize_debounce`]
//! 4. a double click toggles borderless fullscreen

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window},
};

use crate::{
    camera::{Camera, CameraController},
    config::SceneConfig,
    context::Context,
    data_structures::object::Object3d,
    render::{Presentation, Renderer},
    resources::Assets,
    time::Debouncer,
};

/// Builds the objects of a scene once the GPU is ready.
pub type SceneBuilder = Box<dyn FnOnce(&SceneConfig) -> Vec<Object3d>>;

/// Asks a running event loop to exit. Clones share the same flag and may be sent to
/// other threads.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Whether two clicks are close enough to count as a double click.
#[derive(Debug, Clone)]
pub struct DoubleClick {
    window: instant::Duration,
    last: Option<Instant>,
}

impl DoubleClick {
    pub fn new(window: instant::Duration) -> Self {
        Self { window, last: None }
    }

    /// Registers a click at `now`; true when it completes a double click.
    pub fn click(&mut self, now: Instant) -> bool {
        match self.last.take() {
            Some(last) if now >= last && now - last <= self.window => true,
            _ => {
                self.last = Some(now);
                false
            }
        }
    }
}

pub(crate) struct AppState {
    renderer: Renderer<Context>,
    controller: CameraController,
    resize: Debouncer<PhysicalSize<u32>>,
    double_click: DoubleClick,
}

impl AppState {
    fn window(&self) -> &Arc<Window> {
        self.renderer.backend().window()
    }

    fn redraw(&mut self) {
        let dt = self.renderer.tick();
        self.controller.update(self.renderer.camera_mut(), dt);
        match self.renderer.frame_with(dt) {
            Ok(report) => {
                if !report.is_clean() {
                    log::debug!(
                        "frame drew {} objects, skipped {}",
                        report.drawn,
                        report.skipped.len()
                    );
                }
                if report.presentation == Presentation::SurfaceLost {
                    let size = self.window().inner_size();
                    log::info!("reconfiguring surface at {}x{}", size.width, size.height);
                    self.renderer.resize(size.width, size.height);
                }
            }
            Err(e) => log::error!("Unable to render {}", e),
        }
    }

    fn toggle_fullscreen(&self) {
        let window = self.window();
        let fullscreen = match window.fullscreen() {
            Some(_) => None,
            None => Some(Fullscreen::Borderless(None)),
        };
        log::info!("fullscreen: {}", fullscreen.is_some());
        window.set_fullscreen(fullscreen);
    }
}

pub(crate) enum SceneEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    #[allow(dead_code)]
    Failed(String),
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<SceneEvent>,
    config: SceneConfig,
    scene: Option<SceneBuilder>,
    state: Option<AppState>,
    stop: StopHandle,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(
        event_loop: &EventLoop<SceneEvent>,
        config: SceneConfig,
        scene: SceneBuilder,
        stop: StopHandle,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            config,
            scene: Some(scene),
            state: None,
            stop,
            failure: None,
        })
    }

    fn start(&mut self, mut state: AppState) {
        let size = state.window().inner_size();
        state.renderer.resize(size.width, size.height);
        state.window().request_redraw();
        self.state = Some(state);
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("scene initialisation failed: {error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }
}

async fn init_state(
    window: Arc<Window>,
    config: SceneConfig,
    scene: SceneBuilder,
) -> crate::error::Result<AppState> {
    let size = window.inner_size();
    let context = Context::new(window, &config).await?;
    let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
    let camera = Camera::new(&config.camera, aspect);

    let mut renderer = Renderer::new(context, camera, Assets::new(config.asset_root.clone()));
    renderer.add_objects(scene(&config))?;
    renderer.initialize().await?;

    for failure in renderer.load_failures() {
        log::warn!("{failure}");
    }

    Ok(AppState {
        renderer,
        controller: CameraController::new(&config.input),
        resize: Debouncer::new(config.resize_debounce),
        double_click: DoubleClick::new(config.double_click),
    })
}

impl ApplicationHandler<SceneEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(scene) = self.scene.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(&self.config.title);

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            match crate::context::find_canvas(&self.config.canvas_id) {
                Ok(canvas) => window_attributes = window_attributes.with_canvas(Some(canvas)),
                Err(e) => return self.fail(event_loop, e.into()),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let init_future = init_state(window, self.config.clone(), scene);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(state) => self.start(state),
                Err(e) => self.fail(event_loop, e.into()),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(state) => SceneEvent::Initialized(Box::new(state)),
                    Err(e) => SceneEvent::Failed(e.to_string()),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("event loop closed before the scene was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            SceneEvent::Initialized(state) => self.start(*state),
            SceneEvent::Failed(message) => self.fail(event_loop, anyhow::anyhow!(message)),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.controller.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize.push(size, Instant::now()),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if state.double_click.click(Instant::now()) {
                    state.toggle_fullscreen();
                }
            }
            WindowEvent::RedrawRequested => {
                if self.stop.is_stopped() {
                    log::info!("stop requested, leaving the frame loop");
                    event_loop.exit();
                    return;
                }
                state.redraw();
                state.window().request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.stop.is_stopped() {
            event_loop.exit();
            return;
        }
        if let Some(state) = &mut self.state {
            if let Some(size) = state.resize.poll(Instant::now()) {
                log::info!("resizing to {}x{}", size.width, size.height);
                state.renderer.resize(size.width, size.height);
            }
        }
    }
}

/// Runs `scene` until the window is closed.
pub fn run(
    config: SceneConfig,
    scene: impl FnOnce(&SceneConfig) -> Vec<Object3d> + 'static,
) -> anyhow::Result<()> {
    run_until_stopped(config, scene, StopHandle::new())
}

/// Runs `scene` until the window is closed or `stop` is triggered.
pub fn run_until_stopped(
    config: SceneConfig,
    scene: impl FnOnce(&SceneConfig) -> Vec<Object3d> + 'static,
    stop: StopHandle,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)?;
    }

    let event_loop: EventLoop<SceneEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, Box::new(scene), stop)?;

    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
