//! The AR preview.
//!
//! Entering AR keeps the design and the scene renderer untouched and only
//! swaps the presentation: a transparent clear colour so the host's camera
//! feed (or page) shows through, and a closer camera framing.

use crate::camera::DEFAULT_DISTANCE;

/// Camera distance while the AR presentation is shown.
pub const AR_DISTANCE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArSupport {
    /// The host can start an immersive session.
    Immersive,
    /// No immersive session; the preview is drawn in place.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArViewer {
    #[default]
    Inactive,
    Active { support: ArSupport },
}

/// How the viewport is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    pub clear_colour: wgpu::Color,
    pub camera_distance: f32,
}

impl Presentation {
    pub fn studio(clear_colour: wgpu::Color) -> Self {
        Self {
            clear_colour,
            camera_distance: DEFAULT_DISTANCE,
        }
    }

    pub fn immersive() -> Self {
        Self {
            clear_colour: wgpu::Color::TRANSPARENT,
            camera_distance: AR_DISTANCE,
        }
    }

    pub fn apply(&self, ctx: &mut crate::context::Context) {
        ctx.clear_colour = self.clear_colour;
        ctx.camera.camera.reset(self.camera_distance);
    }
}

impl ArViewer {
    pub fn enter(&mut self, support: ArSupport) {
        if support == ArSupport::Unsupported {
            log::warn!("Immersive AR is not available, showing the in-place preview");
        }
        *self = ArViewer::Active { support };
    }

    pub fn exit(&mut self) {
        *self = ArViewer::Inactive;
    }

    pub fn toggle(&mut self, support: ArSupport) {
        if self.is_active() {
            self.exit();
        } else {
            self.enter(support);
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ArViewer::Active { .. })
    }

    pub fn presentation(&self, studio_clear_colour: wgpu::Color) -> Presentation {
        match self {
            ArViewer::Inactive => Presentation::studio(studio_clear_colour),
            ArViewer::Active { .. } => Presentation::immersive(),
        }
    }
}

/// Ask the browser whether it exposes WebXR.
#[cfg(target_arch = "wasm32")]
pub fn detect_support() -> ArSupport {
    let xr = web_sys::window()
        .map(|window| window.navigator())
        .and_then(|navigator| js_sys::Reflect::get(&navigator, &"xr".into()).ok())
        .filter(|xr| !xr.is_undefined() && !xr.is_null());
    match xr {
        Some(_) => ArSupport::Immersive,
        None => ArSupport::Unsupported,
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn detect_support() -> ArSupport {
    ArSupport::Unsupported
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_round_trips() {
        let mut viewer = ArViewer::default();
        viewer.toggle(ArSupport::Unsupported);
        assert_eq!(
            viewer,
            ArViewer::Active {
                support: ArSupport::Unsupported
            }
        );
        viewer.toggle(ArSupport::Unsupported);
        assert!(!viewer.is_active());
    }

    #[test]
    fn immersive_presentation_is_transparent_and_closer() {
        let studio = wgpu::Color::WHITE;
        let mut viewer = ArViewer::default();
        assert_eq!(viewer.presentation(studio), Presentation::studio(studio));
        viewer.enter(ArSupport::Immersive);
        let presentation = viewer.presentation(studio);
        assert_eq!(presentation.clear_colour, wgpu::Color::TRANSPARENT);
        assert!(presentation.camera_distance < DEFAULT_DISTANCE);
    }
}
