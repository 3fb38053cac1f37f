//! The customizer flow.
//!
//! [`CustomizerFlow`] is the only flow of the application. It keeps the
//! [`SceneRenderer`] in line with the [`Coordinator`]'s design, turns window
//! input into commands, executes the effects the coordinator returns, and
//! mirrors the interesting parts of the state into the host's text slots.

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use instant::Duration;
use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::{
    context::{Context, InitContext},
    coordinator::{ActiveView, Command, Coordinator, Effect, Env, GETTING_STARTED},
    design::{DesignChange, DesignConfig, ModelSource},
    embed::EmbedConfig,
    error::EmbedError,
    export::{self, Resolution},
    flow::{FlowConstructor, GraphicsFlow, Out},
    material::MaterialPreset,
    panel::{self, UploadKind},
    platform::{Platform, Slot},
    render::Render,
    resources::{self, ParsedScene},
    settings::Settings,
    viewport::{SceneRenderer, garment::GpuScene, tracker::LoadTicket},
};

/// Events flowing back into the customizer, either posted by the host or
/// produced by finished futures.
#[derive(Debug)]
pub enum CustomizerEvent {
    Command(Command),
    ModelLoaded {
        ticket: LoadTicket,
        result: Result<ParsedScene, String>,
    },
    TextureDecoded {
        ticket: LoadTicket,
        result: Result<image::DynamicImage, String>,
    },
    ExportFinished {
        resolution: Resolution,
        result: Result<Vec<u8>, String>,
    },
}

impl From<Command> for CustomizerEvent {
    fn from(command: Command) -> Self {
        CustomizerEvent::Command(command)
    }
}

pub struct CustomizerFlow {
    settings: Settings,
    scene: SceneRenderer,
    gpu: GpuScene,
    platform: Box<dyn Platform>,
    synced_revision: Option<u64>,
    shown: HashMap<Slot, Option<String>>,
}

impl CustomizerFlow {
    pub fn new(init: &InitContext, settings: Settings, platform: Box<dyn Platform>) -> Self {
        let scene = SceneRenderer::new();
        let gpu = GpuScene::new(&init.device, &init.queue, &init.material_layout, &scene);
        Self {
            settings,
            scene,
            gpu,
            platform,
            synced_revision: None,
            shown: HashMap::new(),
        }
    }

    pub fn scene(&self) -> &SceneRenderer {
        &self.scene
    }

    fn env(&self) -> Env {
        Env {
            page_url: self.platform.page_url(),
            origin: self.platform.origin(),
            now: Utc::now(),
            native_share: self.platform.has_native_share(),
            ar_support: self.platform.ar_support(),
        }
    }

    /// Start the loads a design change requires. Does nothing while the
    /// scene already reflects the current revision.
    fn sync(&mut self, state: &Coordinator) -> Out<Coordinator, CustomizerEvent> {
        if self.synced_revision == Some(state.revision()) {
            return Out::Empty;
        }
        self.synced_revision = Some(state.revision());

        let outcome = self.scene.sync(state.design());
        log::debug!("Painted {} primitives", outcome.painted);

        let mut futures: Vec<Box<dyn Future<Output = CustomizerEvent>>> = Vec::new();
        if let Some(request) = outcome.load_model {
            let asset_root = self.settings.asset_root.clone();
            futures.push(Box::new(async move {
                let result = resources::load_model(&request.source, &asset_root)
                    .await
                    .map_err(|e| format!("{e:#}"));
                CustomizerEvent::ModelLoaded {
                    ticket: request.ticket,
                    result,
                }
            }));
        }
        if let Some(request) = outcome.decode_texture {
            futures.push(Box::new(async move {
                let result = resources::decode_texture(&request.source).map_err(|e| format!("{e:#}"));
                CustomizerEvent::TextureDecoded {
                    ticket: request.ticket,
                    result,
                }
            }));
        }

        if futures.is_empty() {
            Out::Empty
        } else {
            Out::FutEvent(futures)
        }
    }

    fn execute(
        &mut self,
        ctx: &Context,
        state: &mut Coordinator,
        command: Command,
    ) -> Out<Coordinator, CustomizerEvent> {
        let env = self.env();
        let effects = state.apply(command, &env);
        let out = effects
            .into_iter()
            .map(|effect| self.perform(ctx, state, &env, effect))
            .fold(Out::Empty, merge);
        self.refresh(state);
        out
    }

    fn perform(
        &mut self,
        ctx: &Context,
        state: &mut Coordinator,
        env: &Env,
        effect: Effect,
    ) -> Out<Coordinator, CustomizerEvent> {
        match effect {
            Effect::CopyToClipboard(text) => self.platform.copy_to_clipboard(&text),
            Effect::OpenUrl(url) => self.platform.open_url(&url),
            Effect::Notify(message) => self.platform.notify(&message),
            Effect::NativeShare { title, text, url } => {
                self.platform.native_share(&title, &text, &url)
            }
            Effect::StartExport(resolution) => {
                let render = self.gpu.render(&self.scene);
                match export::capture(
                    ctx,
                    render,
                    resolution.target(),
                    self.settings.export_background,
                ) {
                    Ok(pending) => {
                        let finished: Box<dyn Future<Output = CustomizerEvent>> =
                            Box::new(async move {
                                let result = match pending.read().await {
                                    Ok(image) => export::encode_png(&image),
                                    Err(e) => Err(e),
                                };
                                CustomizerEvent::ExportFinished {
                                    resolution,
                                    result: result.map_err(|e| format!("{e:#}")),
                                }
                            });
                        return Out::FutEvent(vec![finished]);
                    }
                    Err(e) => {
                        log::error!("Export failed: {e:#}");
                        state.apply(Command::ExportFinished, env);
                    }
                }
            }
            Effect::PresentationChanged => {
                let presentation = state.ar.presentation(self.settings.studio_clear_colour);
                return Out::Configure(Box::new(move |ctx: &mut Context| presentation.apply(ctx)));
            }
        }
        Out::Empty
    }

    /// Turn a file from disk into a design change.
    fn upload_path(&self, path: &Path) -> Option<Command> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let upload = match UploadKind::from_file_name(&file_name) {
            Some(UploadKind::Model) => std::fs::metadata(path)
                .map_err(|e| e.to_string())
                .and_then(|metadata| {
                    panel::model_upload(
                        &file_name,
                        metadata.len(),
                        self.settings.max_model_bytes,
                        ModelSource::new(path.to_string_lossy()),
                    )
                    .map_err(|e| e.to_string())
                }),
            Some(UploadKind::Texture) => std::fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    panel::texture_upload(&file_name, None, &bytes, self.settings.max_texture_bytes)
                        .map_err(|e| e.to_string())
                }),
            None => {
                log::warn!("Ignoring {file_name}: neither a model nor an image");
                return None;
            }
        };
        match upload {
            Ok(change) => Some(Command::Design(change)),
            Err(e) => {
                log::warn!("Upload rejected: {e}");
                self.platform.notify(&e);
                None
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn pick_file(&self, kind: UploadKind) -> Option<Command> {
        let dialog = match kind {
            UploadKind::Model => rfd::FileDialog::new().add_filter("glTF", &["glb", "gltf"]),
            UploadKind::Texture => rfd::FileDialog::new().add_filter(
                "Image",
                &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff", "tga"],
            ),
        };
        let path = dialog.pick_file()?;
        self.upload_path(&path)
    }

    #[cfg(target_arch = "wasm32")]
    fn pick_file(&self, _kind: UploadKind) -> Option<Command> {
        log::warn!("File pickers are provided by the page, not the canvas");
        None
    }

    fn shortcut(&self, state: &Coordinator, key: KeyCode) -> Option<Command> {
        let material = |preset: MaterialPreset| Some(Command::Design(DesignChange::SetMaterial(preset)));
        match key {
            KeyCode::Digit1 => material(MaterialPreset::Cotton),
            KeyCode::Digit2 => material(MaterialPreset::Denim),
            KeyCode::Digit3 => material(MaterialPreset::Silk),
            KeyCode::Digit4 => material(MaterialPreset::Leather),
            KeyCode::KeyC => Some(Command::NextSwatch),
            KeyCode::KeyT => Some(Command::Design(DesignChange::ClearTexture)),
            KeyCode::KeyX => Some(Command::Design(DesignChange::ClearModel)),
            KeyCode::KeyE => Some(Command::Export(Resolution::Standard)),
            KeyCode::KeyH => Some(Command::Export(Resolution::Hd)),
            KeyCode::KeyK => Some(Command::Export(Resolution::UltraHd)),
            KeyCode::KeyS => Some(Command::GenerateShareLink),
            KeyCode::KeyV => Some(Command::ToggleView),
            KeyCode::KeyA => Some(Command::ToggleAr),
            KeyCode::Escape if state.ar.is_active() => Some(Command::ExitAr),
            KeyCode::KeyM => self.pick_file(UploadKind::Model),
            KeyCode::KeyL => self.pick_file(UploadKind::Texture),
            _ => None,
        }
    }

    fn show(&mut self, slot: Slot, text: Option<String>) {
        if self.shown.get(&slot) == Some(&text) {
            return;
        }
        self.platform.show(slot, text.as_deref());
        self.shown.insert(slot, text);
    }

    /// Mirror the state into the host's text slots.
    fn refresh(&mut self, state: &Coordinator) {
        self.show(Slot::ViewportOverlay, self.scene.overlay().map(str::to_string));
        self.show(Slot::ShareUrl, state.share_url.clone());

        let (html, component) = match state.view {
            ActiveView::Embed => {
                let html = state
                    .embed
                    .iframe_snippet(&self.platform.origin(), state.design())
                    .map_err(|e| log::error!("Could not build the embed snippet: {e}"))
                    .ok();
                (html, Some(state.embed.component_snippet(state.design())))
            }
            ActiveView::Customizer => (None, None),
        };
        self.show(Slot::EmbedHtml, html);
        self.show(Slot::EmbedComponent, component);

        self.show(Slot::Status, Some(status_line(state, Utc::now())));
        let getting_started = state.getting_started_visible().then(|| {
            GETTING_STARTED
                .iter()
                .enumerate()
                .map(|(idx, step)| format!("{}. {step}", idx + 1))
                .collect::<Vec<_>>()
                .join("\n")
        });
        self.show(Slot::GettingStarted, getting_started);
    }
}

fn status_line(state: &Coordinator, now: chrono::DateTime<Utc>) -> String {
    let design = state.design();
    let mut parts = vec![
        state.view.to_string(),
        design.material().display_name().to_string(),
        design.color().to_string(),
    ];
    if design.texture().is_some() {
        parts.push("texture".to_string());
    }
    if state.ar.is_active() {
        parts.push("AR".to_string());
    }
    if state.is_exporting {
        parts.push("exporting".to_string());
    }
    if state.embed_copied(now) {
        parts.push("copied".to_string());
    }
    parts.join(" | ")
}

/// Combine the outputs of several effects. Futures are joined; anything
/// else keeps the first non-empty output.
fn merge(
    acc: Out<Coordinator, CustomizerEvent>,
    next: Out<Coordinator, CustomizerEvent>,
) -> Out<Coordinator, CustomizerEvent> {
    match (acc, next) {
        (Out::Empty, next) => next,
        (acc, Out::Empty) => acc,
        (Out::FutEvent(mut first), Out::FutEvent(second)) => {
            first.extend(second);
            Out::FutEvent(first)
        }
        (acc, next) => {
            log::warn!("Dropping {next:?}, {acc:?} is already pending");
            acc
        }
    }
}

/// Seed the state from the settings and, when the page was opened from an
/// embed link, from its config.
fn initial_state(settings: &Settings, query: Option<&str>) -> Coordinator {
    let mut state = Coordinator::new(DesignConfig::new(
        settings.default_color.clone(),
        settings.default_material,
    ));
    if let Some(query) = query {
        match EmbedConfig::from_query(query) {
            Ok(config) => {
                log::info!("Starting from embed config {config:?}");
                let design = config.apply_to(state.design());
                let mut seeded = Coordinator::new(design);
                seeded.embed.size = config.size();
                state = seeded;
            }
            Err(EmbedError::MissingConfig) => {}
            Err(e) => log::warn!("Ignoring embed config: {e}"),
        }
    }
    state
}

impl GraphicsFlow<Coordinator, CustomizerEvent> for CustomizerFlow {
    fn on_init(&mut self, ctx: &mut Context, state: &mut Coordinator) -> Out<Coordinator, CustomizerEvent> {
        *state = initial_state(&self.settings, self.platform.query().as_deref());
        state
            .ar
            .presentation(self.settings.studio_clear_colour)
            .apply(ctx);
        let out = self.sync(state);
        self.refresh(state);
        out
    }

    fn on_update(&mut self, ctx: &Context, state: &mut Coordinator, dt: Duration) -> Out<Coordinator, CustomizerEvent> {
        let out = self.sync(state);
        self.scene.animate(dt);
        self.gpu
            .update(&ctx.device, &ctx.queue, &ctx.material_layout, &mut self.scene);
        out
    }

    fn on_tick(&mut self, _ctx: &Context, state: &mut Coordinator) -> Out<Coordinator, CustomizerEvent> {
        self.refresh(state);
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _ctx: &Context,
        _state: &mut Coordinator,
        _event: &DeviceEvent,
    ) -> Out<Coordinator, CustomizerEvent> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut Coordinator,
        event: &WindowEvent,
    ) -> Out<Coordinator, CustomizerEvent> {
        let command = match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.shortcut(state, *key_code),
            WindowEvent::DroppedFile(path) => self.upload_path(path),
            _ => None,
        };
        match command {
            Some(command) => self.execute(ctx, state, command),
            None => Out::Empty,
        }
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        state: &mut Coordinator,
        event: CustomizerEvent,
    ) -> (Option<CustomizerEvent>, Out<Coordinator, CustomizerEvent>) {
        match event {
            CustomizerEvent::Command(command) => return (None, self.execute(ctx, state, command)),
            CustomizerEvent::ModelLoaded { ticket, result } => {
                if let Some(meshes) = self.scene.finish_model_load(ticket, result) {
                    self.gpu
                        .upload_model(&ctx.device, &ctx.material_layout, &self.scene, &meshes);
                }
            }
            CustomizerEvent::TextureDecoded { ticket, result } => {
                match result {
                    Ok(image) => {
                        if let Some(id) = self.scene.finish_texture_decode(ticket, Ok(())) {
                            self.gpu.upload_map(&ctx.device, &ctx.queue, id, &image);
                        }
                    }
                    Err(e) => {
                        self.scene.finish_texture_decode(ticket, Err(e));
                        if self.scene.texture_failed(ticket) {
                            self.platform.notify("The texture could not be loaded");
                        }
                    }
                }
            }
            CustomizerEvent::ExportFinished { resolution, result } => {
                match result {
                    Ok(bytes) => {
                        let file_name =
                            export::export_file_name(resolution, Utc::now().timestamp_millis());
                        self.platform.download(&file_name, &bytes);
                    }
                    Err(e) => log::error!("Export failed: {e}"),
                }
                state.apply(Command::ExportFinished, &self.env());
            }
        }
        self.refresh(state);
        (None, Out::Empty)
    }

    fn on_render(&self) -> Render<'_> {
        self.gpu.render(&self.scene)
    }
}

/// Flow constructor for [`crate::flow::run`] and [`crate::flow::spawn`].
pub fn customizer(
    settings: Settings,
    platform: Box<dyn Platform>,
) -> FlowConstructor<Coordinator, CustomizerEvent> {
    Box::new(move |init| {
        Box::pin(async move {
            Box::new(CustomizerFlow::new(&init, settings, platform))
                as Box<dyn GraphicsFlow<Coordinator, CustomizerEvent>>
        })
    })
}

/// Open the customizer in a native window and block until it is closed.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_customizer(settings: Settings) -> anyhow::Result<()> {
    let platform = Box::new(crate::platform::DesktopPlatform::new(&settings));
    crate::flow::run(vec![customizer(settings, platform)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{embed::EmbedSize, share::encode_component};

    #[test]
    fn initial_state_uses_the_settings() {
        let settings = Settings {
            default_material: MaterialPreset::Denim,
            ..Settings::default()
        };
        let state = initial_state(&settings, None);
        assert_eq!(state.design().material(), MaterialPreset::Denim);
        assert_eq!(state.design().color().as_str(), "#3B82F6");
    }

    #[test]
    fn embed_query_seeds_design_and_size() {
        let config = EmbedConfig {
            model_url: "shirt.glb".to_string(),
            default_color: "#ff0000".to_string(),
            default_material: MaterialPreset::Leather,
            width: 400,
            height: 300,
        };
        let query = format!("?config={}", encode_component(&config.to_json().unwrap()));
        let state = initial_state(&Settings::default(), Some(&query));
        assert_eq!(state.design().color().as_str(), "#ff0000");
        assert_eq!(state.design().model().map(ModelSource::as_str), Some("shirt.glb"));
        assert_eq!(state.embed.size, EmbedSize::SMALL);
    }

    #[test]
    fn broken_embed_query_falls_back_to_defaults() {
        let state = initial_state(&Settings::default(), Some("?config=%7Bnope"));
        assert_eq!(state.design(), &DesignConfig::default());
    }

    #[test]
    fn status_line_lists_the_design() {
        let state = Coordinator::default();
        assert_eq!(status_line(&state, Utc::now()), "customizer | Cotton | #3B82F6");
    }
}
