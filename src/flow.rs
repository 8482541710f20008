//! Application shell and event loop.
//!
//! The shell owns the window, the [`Renderer`] and the
//! [`UnhandledErrorPolicy`]. An [`Application`] is built asynchronously once
//! the GPU context exists, started once, and then driven every frame.
//!
//! # Lifecycle Flow
//!
//! 1. `resumed` creates the window and the GPU context, then awaits the
//!    application constructor
//! 2. [`Application::start`] runs once with the renderer as its [`Host`]
//! 3. Every frame:
//!    1. [`Application::on_update`]
//!    2. physics step, body to node sync and spatial index refresh
//!    3. [`Application::on_post_render_update`]
//!    4. render every viewport and present
//!    5. the scene's debug geometry is cleared
//!
//! Errors and panics escaping steps 2 and 3.1 to 3.3 are logged and marked
//! handled; the loop keeps running.

use std::{
    pin::Pin,
    sync::{Arc, Once},
};

use cgmath::Vector2;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::SampleConfig,
    context::Context,
    data_structures::scene_graph::{NodeId, Scene},
    debug::hud::DebugHud,
    error::{UnhandledErrorPolicy, install_panic_hook},
    host::Host,
    physics::{
        self,
        touch::{MOUSE_POINTER, pointer_to_world, touch_begin, touch_end, touch_move},
    },
    render::Renderer,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// An application driven by the shell.
///
/// # Lifecycle
///
/// 1. `start()` is called once, after the GPU context exists
/// 2. `on_update()` is called every frame before the scene update
/// 3. `on_post_render_update()` is called every frame after the scene update
///    and before rendering; this is where per-frame debug geometry is
///    requested
/// 4. `on_resize()` is called when the window changes to a non zero size
pub trait Application {
    fn start(&mut self, host: &mut dyn Host) -> anyhow::Result<()>;

    fn on_update(&mut self, dt: Duration) -> anyhow::Result<()>;

    fn on_post_render_update(&mut self, host: &mut dyn Host) -> anyhow::Result<()>;

    fn on_resize(&mut self, _width: u32, _height: u32) {}

    /// The scene the shell updates and renders.
    fn scene_mut(&mut self) -> Option<&mut Scene>;

    /// Camera used to map pointer positions into the world.
    fn camera_node(&self) -> Option<NodeId>;

    fn hud(&mut self) -> Option<&mut DebugHud> {
        None
    }
}

/// Builds the application once the GPU context is ready. Asset loading
/// happens here so that it can be awaited on the web.
pub type AppConstructor<A> = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = anyhow::Result<A>>>>>;

/// Start `app` behind the error boundary. Returns whether start succeeded.
pub fn start_app<A: Application + ?Sized>(
    app: &mut A,
    host: &mut dyn Host,
    policy: &mut UnhandledErrorPolicy,
) -> bool {
    policy.guard("start", || app.start(host)).is_some()
}

/// Everything a frame does before rendering, each step behind the error
/// boundary.
pub fn run_frame<A: Application + ?Sized>(
    app: &mut A,
    host: &mut dyn Host,
    policy: &mut UnhandledErrorPolicy,
    dt: Duration,
) {
    policy.guard("update", || app.on_update(dt));
    policy.guard("scene update", || {
        if let Some(scene) = app.scene_mut() {
            physics::update_scene(scene, dt.as_secs_f32());
        }
        Ok(())
    });
    policy.guard("post render update", || app.on_post_render_update(host));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Forward a pointer event to the scene's touch bridge.
pub fn handle_pointer<A: Application + ?Sized>(
    app: &mut A,
    display_size: (u32, u32),
    pointer: u64,
    phase: PointerPhase,
    position: PhysicalPosition<f64>,
) {
    let camera = app.camera_node();
    let Some(scene) = app.scene_mut() else {
        return;
    };
    if phase == PointerPhase::Up {
        touch_end(scene, pointer);
        return;
    }
    let Some(point) = camera.and_then(|camera| {
        pointer_to_world(
            scene,
            camera,
            Vector2::new(position.x as f32, position.y as f32),
            display_size,
        )
    }) else {
        return;
    };
    if phase == PointerPhase::Down {
        touch_begin(scene, pointer, point);
    } else {
        touch_move(scene, pointer, point);
    }
}

pub struct App<A: Application + 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<A>>,
    config: SampleConfig,
    renderer: Option<Renderer>,
    app: Option<A>,
    constructor: Option<AppConstructor<A>>,
    policy: UnhandledErrorPolicy,
    last_time: Instant,
    cursor: Option<PhysicalPosition<f64>>,
    mouse_down: bool,
}

impl<A: Application + 'static> App<A> {
    fn new(
        event_loop: &EventLoop<FlowEvent<A>>,
        config: SampleConfig,
        constructor: AppConstructor<A>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            config,
            renderer: None,
            app: None,
            constructor: Some(constructor),
            policy: UnhandledErrorPolicy::new(),
            last_time: Instant::now(),
            cursor: None,
            mouse_down: false,
        })
    }

    fn initialized(&mut self, event_loop: &ActiveEventLoop, mut renderer: Renderer, app: anyhow::Result<A>) {
        let mut app = match app {
            Ok(app) => app,
            Err(e) => {
                log::error!("Could not build the application: {:#}", e);
                event_loop.exit();
                return;
            }
        };
        let size = renderer.context().window().inner_size();
        if renderer.resize(size.width, size.height) {
            app.on_resize(size.width, size.height);
        }
        start_app(&mut app, &mut renderer, &mut self.policy);
        self.last_time = Instant::now();
        renderer.request_redraw();
        self.renderer = Some(renderer);
        self.app = Some(app);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(app)) = (self.renderer.as_mut(), self.app.as_mut()) else {
            return;
        };
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();

        run_frame(app, renderer, &mut self.policy, dt);

        if let Some(scene) = app.scene_mut() {
            match renderer.render(scene) {
                Ok(()) => {}
                // Reconfigure the surface if it's lost or outdated
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = renderer.context().window().inner_size();
                    renderer.resize(size.width, size.height);
                }
                Err(e) => log::error!("Unable to render {}", e),
            }
        }

        if let Some(stats) = app.hud().and_then(|hud| hud.frame(dt)) {
            log::debug!("{}", stats);
            renderer
                .context()
                .window()
                .set_title(&format!("{} - {}", self.config.title, stats));
        }

        if self.policy.should_terminate() {
            event_loop.exit();
            return;
        }
        renderer.request_redraw();
    }

    fn pointer(&mut self, pointer: u64, phase: PointerPhase, position: PhysicalPosition<f64>) {
        let (Some(renderer), Some(app)) = (self.renderer.as_ref(), self.app.as_mut()) else {
            return;
        };
        handle_pointer(app, renderer.display_size(), pointer, phase, position);
    }
}

pub enum FlowEvent<A: 'static> {
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    Initialized {
        renderer: Renderer,
        app: anyhow::Result<A>,
    },
}

impl<A: Application + 'static> ApplicationHandler<FlowEvent<A>> for App<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructor) = self.constructor.take() else {
            return;
        };
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(self.config.title.clone());

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let clear_colour = self.config.clear_colour();
        let init_future = async move {
            let ctx = Context::new(window, clear_colour).await?;
            let renderer = Renderer::new(ctx);
            let app = constructor().await;
            anyhow::Ok((renderer, app))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((renderer, app)) => self.initialized(event_loop, renderer, app),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((renderer, app)) => {
                        if proxy
                            .send_event(FlowEvent::Initialized { renderer, app })
                            .is_err()
                        {
                            log::error!("Event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("App initialization failed: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<A>) {
        match event {
            FlowEvent::Initialized { renderer, app } => self.initialized(event_loop, renderer, app),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let (Some(renderer), Some(app)) = (self.renderer.as_mut(), self.app.as_mut()) {
                    if renderer.resize(size.width, size.height) {
                        app.on_resize(size.width, size.height);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
                if self.mouse_down {
                    self.pointer(MOUSE_POINTER, PointerPhase::Move, position);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let Some(position) = self.cursor else {
                    return;
                };
                self.mouse_down = state == ElementState::Pressed;
                let phase = if self.mouse_down {
                    PointerPhase::Down
                } else {
                    PointerPhase::Up
                };
                self.pointer(MOUSE_POINTER, phase, position);
            }
            WindowEvent::Touch(touch) => {
                let phase = match touch.phase {
                    TouchPhase::Started => PointerPhase::Down,
                    TouchPhase::Moved => PointerPhase::Move,
                    TouchPhase::Ended | TouchPhase::Cancelled => PointerPhase::Up,
                };
                self.pointer(touch.id, phase, touch.location);
            }
            _ => {}
        }
    }
}

static LOGGING: Once = Once::new();

/// Set up logging and the panic hook. Later calls do nothing.
pub fn init_logging() {
    LOGGING.call_once(|| {
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::io::Write;

            let result =
                env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                    .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
                    .try_init();
            if let Err(e) = result {
                println!("Warning: Could not initialize logger: {}", e);
            };
        }

        #[cfg(target_arch = "wasm32")]
        {
            if let Err(e) = console_log::init_with_level(log::Level::Info) {
                web_sys::console::warn_1(&format!("Could not initialize logger: {}", e).into());
            }
        }

        install_panic_hook();
    });
}

/// Run `constructor`'s application until the window closes.
pub fn run<A: Application + 'static>(
    config: SampleConfig,
    constructor: AppConstructor<A>,
) -> anyhow::Result<()> {
    init_logging();

    let event_loop: EventLoop<FlowEvent<A>> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, constructor)?;

    event_loop.run_app(&mut app)?;

    if app.policy.handled_count() > 0 {
        log::warn!("{} errors were handled during the run", app.policy.handled_count());
    }
    Ok(())
}
