//! GPU context shared by all flows.
//!
//! [`Context`] owns the device, queue, surface and the resources every draw
//! needs (camera, light, pipelines). A window-less variant created with
//! [`Context::headless`] renders offscreen only and is what exports and the
//! GPU tests run on.

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::CameraResources,
    data_structures::{model::material_layout, texture},
    pipelines::{
        garment::mk_garment_pipeline,
        light::{LightResources, LightUniform},
    },
};

/// Format of offscreen captures. Exports are read back as RGBA8.
pub const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[derive(Debug)]
pub struct Pipelines {
    /// Draws into the window surface.
    pub garment: wgpu::RenderPipeline,
    /// Draws into [`CAPTURE_FORMAT`] targets.
    pub capture: wgpu::RenderPipeline,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Option<Arc<Window>>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: Option<wgpu::Surface<'static>>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub light: LightResources,
    pub material_layout: wgpu::BindGroupLayout,
    pub pipelines: Pipelines,
    pub clear_colour: wgpu::Color,
    pub tick_duration_millis: u64,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&instance_descriptor());
        let surface = instance
            .create_surface(window.clone())
            .context("could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader writes linear colour and relies on an sRGB target.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;
        // Premultiplied alpha lets the AR presentation show the page behind
        // the canvas; fall back to whatever the surface offers.
        let alpha_mode = surface_caps
            .alpha_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::CompositeAlphaMode::PreMultiplied)
            .or_else(|| surface_caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Ok(Self::assemble(
            Some(window),
            Some(surface),
            device,
            queue,
            config,
        ))
    }

    /// A context without window or surface. Everything is drawn into
    /// offscreen targets of `CAPTURE_FORMAT`.
    pub async fn headless(width: u32, height: u32) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&instance_descriptor());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        let (device, queue) = request_device(&adapter).await?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: CAPTURE_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        Ok(Self::assemble(None, None, device, queue, config))
    }

    fn assemble(
        window: Option<Arc<Window>>,
        surface: Option<wgpu::Surface<'static>>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
    ) -> Self {
        let camera = CameraResources::new(&device, config.width as f32 / config.height as f32);
        let light = LightResources::new(&device, LightUniform::studio());
        let material_layout = material_layout(&device);

        let pipelines = Pipelines {
            garment: mk_garment_pipeline(
                &device,
                config.format,
                &material_layout,
                &camera.bind_group_layout,
                &light.bind_group_layout,
            ),
            capture: mk_garment_pipeline(
                &device,
                CAPTURE_FORMAT,
                &material_layout,
                &camera.bind_group_layout,
                &light.bind_group_layout,
            ),
        };

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            light,
            material_layout,
            pipelines,
            clear_colour: wgpu::Color::WHITE,
            tick_duration_millis: 250,
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    /// Largest texture edge the device accepts.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.camera.camera.resize(width, height);
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
        self.depth_texture =
            texture::Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        true
    }
}

fn instance_descriptor() -> wgpu::InstanceDescriptor {
    wgpu::InstanceDescriptor {
        #[cfg(not(target_arch = "wasm32"))]
        backends: wgpu::Backends::PRIMARY,
        #[cfg(target_arch = "wasm32")]
        backends: wgpu::Backends::GL,
        ..Default::default()
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            // Texture size is raised to what the adapter reports so large
            // exports are not capped at WebGL2's 2048px minimum.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
            } else {
                wgpu::Limits::default()
            },
            ..Default::default()
        })
        .await
        .context("could not open the GPU device")?;
    Ok((device, queue))
}

/// The subset of the context handed to flow constructors.
///
/// Cloning device and queue only clones their internal handles.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub material_layout: wgpu::BindGroupLayout,
    pub format: wgpu::TextureFormat,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            material_layout: ctx.material_layout.clone(),
            format: ctx.config.format,
        }
    }
}
