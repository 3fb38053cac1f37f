//! Flow control and application event loop.
//!
//! A "flow" is a self-contained part of the application that handles input,
//! updates its state and provides renderable objects each frame. The engine
//! owns the window, the GPU [`Context`] and the shared state, and passes both
//! to every flow.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is the trait for flows that handle events and rendering
//! - [`Out<S, E>`] is the output type for async event handling and context configuration
//! - [`FlowProxy<S, E>`] posts custom events into a running loop from outside
//!
//! # Lifecycle Flow
//!
//! The event loop follows this pattern each frame:
//! 1. Collect window/device events
//! 2. Call `on_<device/window/custom>_event` on all flows for event distribution
//! 3. Update flow state (via `on_update` / `on_tick`)
//! 4. Call flows' `on_render()` to collect renderable objects
//! 5. Render to the frame buffer with the garment pipeline
//! 6. Present frame

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext},
    render::{self, Render},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

///
/// This is the Output Type for every lifecycle hook where the user can pass async events that are
/// handled according to the platform you're running on.
///
/// `Out::FutEvent` can be used to resolve a future of an Event that is put in the Event Queue after
/// being resolved. The caller is responsible for handling the event later on and it will have no
/// side effects unless handled.
///
/// `Out::FutFn` can be used to directly modify the state and the mutation is handled internally with
/// no further action required by the callee.
///
/// `Out::Configure` can be used to modify the Context during runtime for instance to change the tick
/// speed or the clear colour.
///
/// `Empty` is the default output used when no eventing/futures need to be handled.
///
pub enum Out<S, E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    FutFn(Vec<Box<dyn Future<Output = Box<dyn FnOnce(&mut S)>>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl<S, E> Default for Out<S, E> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<S, E> Debug for Out<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Out::FutEvent(futures) => write!(f, "FutEvent({} futures)", futures.len()),
            Out::FutFn(futures) => write!(f, "FutFn({} futures)", futures.len()),
            Out::Configure(_) => f.write_str("Configure(|&mut Context| {...})"),
            Out::Empty => f.write_str("Empty"),
        }
    }
}

/// Trait for implementing a renderable part of the application.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created; configure context (camera, clear color, etc.)
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_update()` is called every frame
/// 4. `on_tick()` is called every `tick_duration_millis`
/// 5. `on_custom_events()` is called for custom application events
/// 6. `on_render()` is called each frame and specifies how to render `self`
///
pub trait GraphicsFlow<S, E> {
    /// Initialize the flow and configure the context.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<S, E>;

    /// Update state every frame.
    ///
    /// Called every frame with the elapsed time `dt`. Use for animations and
    /// other per-frame logic.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out<S, E>;

    /// Update state periodically.
    ///
    /// Called every `tick_duration_millis` milliseconds (configurable via context).
    fn on_tick(&mut self, ctx: &Context, state: &mut S) -> Out<S, E>;

    /// Handle raw device events.
    fn on_device_events(&mut self, ctx: &Context, state: &mut S, event: &DeviceEvent) -> Out<S, E>;

    /// Handle window events (keyboard, mouse, dropped files, resizing, etc.).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<S, E>;

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed. The
    /// second element is async work the event triggered.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> (Option<E>, Out<S, E>);

    /// Return renderable objects for this flow.
    fn on_render(&self) -> Render<'_>;
}

// Dummy impl to make wasm work
impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`. This allows lazy initialization and resource loading.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// Application state bundle: GPU context, app state, and surface status.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render<Event>(
        &mut self,
        graphics_flows: &mut [Box<dyn GraphicsFlow<State, Event>>],
    ) -> Result<(), wgpu::SurfaceError> {
        let (Some(window), Some(surface)) = (&self.ctx.window, &self.ctx.surface) else {
            return Ok(());
        };
        // invoke main render loop
        window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            let mut draws = Vec::new();
            graphics_flows
                .iter()
                .for_each(|flow| flow.on_render().flatten_into(&mut draws));
            render::draw(
                &self.ctx,
                &mut render_pass,
                &self.ctx.pipelines.garment,
                &self.ctx.camera.bind_group,
                &draws,
            );
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    state: Option<AppState<State>>,
    // This will hold the fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    // This holds the constructors at the start.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<FlowConstructor<State, Event>>>,
    last_time: Instant,
    time_since_tick: Duration,
}

impl<State, Event> App<State, Event>
where
    State: 'static,
    Event: 'static,
{
    fn new(
        event_loop: &EventLoop<FlowEvent<State, Event>>,
        constructors: Vec<FlowConstructor<State, Event>>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
        })
    }

    fn dispatch(&mut self, out: Out<State, Event>) {
        if let Some(state) = &mut self.state {
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &mut state.state,
                &mut state.ctx,
                self.proxy.clone(),
                out,
            );
        }
    }
}

pub(crate) enum FlowEvent<State: 'static, Event: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    },
    #[allow(dead_code)]
    Mut(Box<dyn FnOnce(&mut State)>),
    Custom(Event),
    #[allow(dead_code)]
    Exit,
}

impl<State, Event> Debug for FlowEvent<State, Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, flows } => {
                f.debug_struct("Initialized").field("flows", flows).finish()
            }
            Self::Mut(_) => f.write_str("Mut(|&mut State| -> {...})"),
            Self::Custom(_) => f.write_str("Custom(E)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

/// Sends custom events into a running event loop.
pub struct FlowProxy<State: 'static, Event: 'static> {
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
}

impl<State, Event> Clone for FlowProxy<State, Event> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
        }
    }
}

impl<State, Event> FlowProxy<State, Event> {
    /// Returns `false` when the loop has already exited.
    pub fn send(&self, event: Event) -> bool {
        self.proxy.send_event(FlowEvent::Custom(event)).is_ok()
    }

    pub fn exit(&self) -> bool {
        self.proxy.send_event(FlowEvent::Exit).is_ok()
    }
}

impl<State: 'static + Default, Event: 'static> ApplicationHandler<FlowEvent<State, Event>>
    for App<State, Event>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructors) = self.constructors.take() else {
            // resumed again after a suspend, everything is in place
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("drape");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = wgpu::web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            match canvas {
                Some(canvas) => {
                    window_attributes =
                        window_attributes.with_canvas(Some(canvas.unchecked_into()));
                }
                None => log::warn!("No #{CANVAS_ID} element, winit creates its own canvas"),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let init_future = async move {
            let app_state = AppState::new(window).await?;

            let flow_futures: Vec<_> = constructors
                .into_iter()
                // The clone in into() leverages the internal Arcs of Device and Queue and thus only clones the ref
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows: Vec<_> = futures::future::join_all(flow_futures).await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((app_state, flows)) => self.initialize(app_state, flows),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((state, flows)) => {
                        if proxy
                            .send_event(FlowEvent::Initialized { state, flows })
                            .is_err()
                        {
                            log::error!("Event loop closed before initialization finished");
                        }
                    }
                    Err(e) => {
                        log::error!("App initialization failed. Cannot create the main context: {e:#}");
                    }
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<State, Event>) {
        match event {
            FlowEvent::Initialized { state, flows } => {
                // This is the message from our wasm `spawn_local`
                self.initialize(state, flows);
            }
            FlowEvent::Custom(custom_event) => {
                let Some(state) = &mut self.state else {
                    log::warn!("Custom event arrived before initialization and was dropped");
                    return;
                };
                let mut outputs = Vec::new();
                let mut event = Some(custom_event);
                for flow in self.graphics_flows.iter_mut() {
                    let Some(current) = event.take() else {
                        break;
                    };
                    let (rest, out) = flow.on_custom_events(&state.ctx, &mut state.state, current);
                    outputs.push(out);
                    event = rest;
                }
                if event.is_some() {
                    log::warn!("Warning! Custom event was not consumed this cycle");
                }
                outputs.into_iter().for_each(|out| self.dispatch(out));
            }
            FlowEvent::Mut(fn_once) => {
                if let Some(state) = &mut self.state {
                    fn_once(&mut state.state);
                }
            }
            FlowEvent::Exit => {
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        let outputs: Vec<_> = self
            .graphics_flows
            .iter_mut()
            .map(|f| f.on_device_events(&state.ctx, &mut state.state, &event))
            .collect();
        outputs.into_iter().for_each(|out| self.dispatch(out));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        // general stuff
        state.ctx.camera.controller.handle_window_events(&event);

        let outputs: Vec<_> = self
            .graphics_flows
            .iter_mut()
            .map(|f| f.on_window_events(&state.ctx, &mut state.state, &event))
            .collect();
        outputs.into_iter().for_each(|out| self.dispatch(out));

        let Some(state) = &mut self.state else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.time_since_tick += dt;

                let mut outputs = Vec::new();
                // Flows update before drawing so the frame shows this frame's state
                state.ctx.camera.update(&state.ctx.queue, dt);
                for flow in self.graphics_flows.iter_mut() {
                    outputs.push(flow.on_update(&state.ctx, &mut state.state, dt));
                }
                if self.time_since_tick >= Duration::from_millis(state.ctx.tick_duration_millis) {
                    for flow in self.graphics_flows.iter_mut() {
                        outputs.push(flow.on_tick(&state.ctx, &mut state.state));
                    }
                    self.time_since_tick = Duration::from_millis(0);
                }

                match state.render(&mut self.graphics_flows) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(window) = state.ctx.window.clone() {
                            let size = window.inner_size();
                            state.resize(size.width, size.height);
                        }
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
                outputs.into_iter().for_each(|out| self.dispatch(out));
            }
            _ => {}
        }
    }
}

impl<State: 'static + Default, Event: 'static> App<State, Event> {
    fn initialize(
        &mut self,
        mut app_state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    ) {
        if let Some(window) = app_state.ctx.window.clone() {
            let size = window.inner_size();
            app_state.resize(size.width, size.height);
        }
        self.graphics_flows = flows;
        let outputs: Vec<_> = self
            .graphics_flows
            .iter_mut()
            .map(|flow| flow.on_init(&mut app_state.ctx, &mut app_state.state))
            .collect();
        if let Some(window) = app_state.ctx.window.clone() {
            window.request_redraw();
        }
        self.state = Some(app_state);
        outputs.into_iter().for_each(|out| self.dispatch(out));
    }
}

fn handle_flow_output<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    state: &mut State,
    ctx: &mut Context,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    out: Out<State, Event>,
) {
    match out {
        // Send the events passed by the user to winit
        Out::FutEvent(futures) => {
            let fut =
                async move { futures::future::join_all(futures.into_iter().map(Pin::from)).await };
            #[cfg(not(target_arch = "wasm32"))]
            {
                let resolved = async_runtime.block_on(fut);
                resolved.into_iter().for_each(|event| {
                    if let Err(err) = proxy.send_event(FlowEvent::Custom(event)) {
                        log::error!("Event loop was closed before all events could be processed: {}", err);
                    }
                });
            }

            #[cfg(target_arch = "wasm32")]
            {
                wasm_bindgen_futures::spawn_local(async move {
                    let resolved = fut.await;
                    for event in resolved {
                        if proxy.send_event(FlowEvent::Custom(event)).is_err() {
                            log::error!("Event loop was closed before all events could be processed");
                        }
                    }
                });
            }
        }
        // Mutate the state if the arch supports async, create an event otherwise
        Out::FutFn(futures) => {
            let events: Vec<Pin<Box<dyn Future<Output = Box<dyn FnOnce(&mut State)>>>>> =
                futures.into_iter().map(Pin::from).collect();
            let fut = async move { futures::future::join_all(events.into_iter()).await };
            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = &proxy;
                let resolved: Vec<Box<dyn FnOnce(&mut State)>> = async_runtime.block_on(fut);
                resolved.into_iter().for_each(|mutation| {
                    mutation(state);
                });
            }

            #[cfg(target_arch = "wasm32")]
            {
                let _ = state;
                wasm_bindgen_futures::spawn_local(async move {
                    let resolved = fut.await;
                    for mutation in resolved {
                        if proxy.send_event(FlowEvent::Mut(mutation)).is_err() {
                            log::error!("Event loop was closed before a state mutation could be applied");
                        }
                    }
                });
            }
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::warn!("Could not initialize logger: {}", e);
        }
    }
}

/// Run the flows until the window is closed.
#[cfg(not(target_arch = "wasm32"))]
pub fn run<State: 'static + Default, Event: 'static>(
    constructors: Vec<FlowConstructor<State, Event>>,
) -> anyhow::Result<()> {
    init_logging();

    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event().build()?;
    let mut app: App<State, Event> = App::new(&event_loop, constructors)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Start the flows on the browser's event loop and return immediately.
///
/// The returned proxy posts custom events into the loop, e.g. from
/// JavaScript callbacks.
#[cfg(target_arch = "wasm32")]
pub fn spawn<State: 'static + Default, Event: 'static>(
    constructors: Vec<FlowConstructor<State, Event>>,
) -> Result<FlowProxy<State, Event>, JsValue> {
    use winit::platform::web::EventLoopExtWebSys;

    init_logging();

    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event()
        .build()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let app: App<State, Event> =
        App::new(&event_loop, constructors).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let proxy = FlowProxy {
        proxy: app.proxy.clone(),
    };
    event_loop.spawn_app(app);
    Ok(proxy)
}
