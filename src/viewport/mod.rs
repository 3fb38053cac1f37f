//! The 3D viewport.
//!
//! [`SceneRenderer`] is the CPU half: it follows a [`DesignConfig`], decides
//! which loads have to start, accepts their results, and paints every
//! primitive of the active scene graph. The GPU half in [`garment`] mirrors
//! whatever the scene renderer holds into buffers and bind groups.
//!
//! Painting is a full pass over the graph on every synchronization. Nothing
//! is diffed; a sync after any change leaves every primitive with exactly
//! the colour, surface and map of the current design.

use cgmath::Rotation3;
use instant::Duration;

use crate::{
    data_structures::{
        instance::Instance,
        scene_graph::{Paint, SceneGraph, SceneNode, SurfaceMaterial, TextureId},
    },
    design::{Color, DesignConfig, ModelSource, TextureData},
    material::{MaterialPreset, SurfaceProperties},
    resources::{ParsedScene, mesh::MeshData},
};

pub mod garment;
pub mod tracker;

use tracker::{LoadSlot, LoadTicket};

pub const PLACEHOLDER_PROMPT: &str = "Upload a GLB model to begin";
pub const LOADING_MESSAGE: &str = "Loading model...";
pub const ERROR_MESSAGE: &str = "Error loading model";

/// Width, height and depth of the stand-in box shown without a model.
pub const PLACEHOLDER_SIZE: [f32; 3] = [2.0, 3.0, 0.5];
/// Loaded garments are drawn at this uniform scale.
pub const MODEL_SCALE: f32 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportStatus {
    Placeholder,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub source: ModelSource,
    pub graph: SceneGraph,
}

/// A load the host has to run and report back with the same ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest<T> {
    pub ticket: LoadTicket,
    pub source: T,
}

#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub load_model: Option<LoadRequest<ModelSource>>,
    pub decode_texture: Option<LoadRequest<TextureData>>,
    /// Primitives painted by this pass.
    pub painted: usize,
}

#[derive(Debug)]
pub struct SceneRenderer {
    placeholder: SceneGraph,
    model_source: Option<ModelSource>,
    model: LoadSlot<LoadedModel>,
    texture_source: Option<TextureData>,
    map: LoadSlot<TextureId>,
    base_color: [f32; 4],
    surface: SurfaceProperties,
    elapsed: f32,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer {
    pub fn new() -> Self {
        let placeholder = SceneGraph::new(
            SceneNode::new("placeholder").with_primitive(0, SurfaceMaterial::default()),
        );
        let base_color = Color::default()
            .to_linear_rgba()
            .unwrap_or([1.0, 1.0, 1.0, 1.0]);
        Self {
            placeholder,
            model_source: None,
            model: LoadSlot::new(),
            texture_source: None,
            map: LoadSlot::new(),
            base_color,
            surface: MaterialPreset::default().surface(),
            elapsed: 0.0,
        }
    }

    /// Meshes backing the placeholder graph.
    pub fn placeholder_meshes() -> Vec<MeshData> {
        let [w, h, d] = PLACEHOLDER_SIZE;
        vec![crate::resources::mesh::cuboid("placeholder", w, h, d)]
    }

    /// Bring the scene in line with `design`.
    ///
    /// Starts a model load or texture decode when the respective reference
    /// changed, drops the map or model when it was removed, then repaints
    /// every primitive.
    pub fn sync(&mut self, design: &DesignConfig) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();

        if design.model() != self.model_source.as_ref() {
            self.model_source = design.model().cloned();
            match &self.model_source {
                Some(source) => {
                    let ticket = self.model.begin();
                    log::info!("Loading model {source} ({})", ticket.generation());
                    outcome.load_model = Some(LoadRequest {
                        ticket,
                        source: source.clone(),
                    });
                }
                None => self.model.clear(),
            }
        }

        if design.texture() != self.texture_source.as_ref() {
            self.texture_source = design.texture().cloned();
            match &self.texture_source {
                Some(texture) => {
                    let ticket = self.map.begin();
                    outcome.decode_texture = Some(LoadRequest {
                        ticket,
                        source: texture.clone(),
                    });
                }
                None => self.map.clear(),
            }
        }

        match design.color().to_linear_rgba() {
            Ok(rgba) => self.base_color = rgba,
            Err(e) => log::warn!("{e}, keeping the previous colour"),
        }
        self.surface = design.material().surface();

        outcome.painted = self.repaint();
        outcome
    }

    /// Accept the result of a model load.
    ///
    /// Returns the meshes to upload when `ticket` is current and the load
    /// succeeded. The new graph is painted before it is returned.
    pub fn finish_model_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<ParsedScene, String>,
    ) -> Option<Vec<MeshData>> {
        let source = self.model_source.clone()?;
        let (result, meshes) = match result {
            Ok(parsed) => (
                Ok(LoadedModel {
                    source,
                    graph: parsed.graph,
                }),
                Some(parsed.meshes),
            ),
            Err(message) => (Err(message), None),
        };
        if !self.model.complete(ticket, result) {
            return None;
        }
        if let Some(message) = self.model.error() {
            log::error!("Error loading model: {message}");
            return None;
        }
        self.repaint();
        meshes
    }

    /// Accept the result of a texture decode. Returns the id under which the
    /// decoded image has to be uploaded.
    pub fn finish_texture_decode(
        &mut self,
        ticket: LoadTicket,
        result: Result<(), String>,
    ) -> Option<TextureId> {
        let id = TextureId(ticket.generation());
        if !self.map.complete(ticket, result.map(|_| id)) {
            return None;
        }
        if let Some(message) = self.map.error() {
            log::warn!("Texture could not be decoded: {message}");
            return None;
        }
        self.repaint();
        Some(id)
    }

    fn repaint(&mut self) -> usize {
        let paint = self.current_paint();
        let mut painted = self.placeholder.apply_paint(&paint);
        if let Some(model) = self.model.ready_mut() {
            painted += model.graph.apply_paint(&paint);
        }
        painted
    }

    pub fn current_paint(&self) -> Paint {
        Paint {
            base_color: self.base_color,
            surface: self.surface,
            map: self.map(),
        }
    }

    pub fn map(&self) -> Option<TextureId> {
        self.map.ready().copied()
    }

    /// Whether the decode identified by `ticket` is the one that failed.
    pub fn texture_failed(&self, ticket: LoadTicket) -> bool {
        matches!(self.map.state(), tracker::LoadState::Failed { ticket: failed, .. } if *failed == ticket)
    }

    pub fn status(&self) -> ViewportStatus {
        if self.model_source.is_none() {
            return ViewportStatus::Placeholder;
        }
        match self.model.state() {
            tracker::LoadState::Ready { .. } => ViewportStatus::Ready,
            tracker::LoadState::Failed { message, .. } => ViewportStatus::Failed(message.clone()),
            tracker::LoadState::Loading(_) | tracker::LoadState::Idle => ViewportStatus::Loading,
        }
    }

    /// Message drawn over the viewport, if any.
    pub fn overlay(&self) -> Option<&'static str> {
        match self.status() {
            ViewportStatus::Placeholder => Some(PLACEHOLDER_PROMPT),
            ViewportStatus::Loading => Some(LOADING_MESSAGE),
            ViewportStatus::Failed(_) => Some(ERROR_MESSAGE),
            ViewportStatus::Ready => None,
        }
    }

    pub fn animate(&mut self, dt: Duration) {
        self.elapsed += dt.as_secs_f32();
    }

    /// Gentle sway around the vertical axis, in radians.
    pub fn yaw(&self) -> f32 {
        (self.elapsed * 0.2).sin() * 0.1
    }

    pub fn root_transform(&self) -> Instance {
        let scale = if self.shows_model() { MODEL_SCALE } else { 1.0 };
        Instance {
            rotation: cgmath::Quaternion::from_angle_y(cgmath::Rad(self.yaw())),
            ..Instance::uniform_scale(scale)
        }
    }

    pub fn shows_model(&self) -> bool {
        self.model.ready().is_some()
    }

    /// Ticket of the model currently on screen.
    pub fn model_ticket(&self) -> Option<LoadTicket> {
        self.model.ready_ticket()
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.ready()
    }

    /// The graph that is drawn: the loaded model, the placeholder when no
    /// model is set, or nothing while a model is loading or failed.
    pub fn active_graph(&self) -> Option<&SceneGraph> {
        match self.status() {
            ViewportStatus::Placeholder => Some(&self.placeholder),
            ViewportStatus::Ready => self.model.ready().map(|model| &model.graph),
            _ => None,
        }
    }

    pub fn active_graph_mut(&mut self) -> Option<&mut SceneGraph> {
        match self.status() {
            ViewportStatus::Placeholder => Some(&mut self.placeholder),
            ViewportStatus::Ready => self.model.ready_mut().map(|model| &mut model.graph),
            _ => None,
        }
    }
}
