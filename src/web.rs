//! JavaScript entry point.
//!
//! The page owns the panel controls and calls into a [`CustomizerHandle`];
//! every call is posted into the event loop as a [`Command`].

use wasm_bindgen::prelude::*;

use crate::{
    app::{self, CustomizerEvent},
    coordinator::{ActiveView, Command, Coordinator},
    design::{Color, DesignChange, ModelSource},
    embed::{EmbedOption, EmbedSize},
    export::Resolution,
    flow::{self, FlowProxy},
    material::MaterialPreset,
    panel::{self, Tab},
    platform::WebPlatform,
    settings::Settings,
    share::SocialPlatform,
};

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct CustomizerHandle {
    proxy: FlowProxy<Coordinator, CustomizerEvent>,
    max_model_bytes: u64,
    max_texture_bytes: u64,
}

/// Start the customizer on the `#canvas` element.
#[wasm_bindgen]
pub fn start() -> Result<CustomizerHandle, JsValue> {
    let settings = Settings::default();
    let max_model_bytes = settings.max_model_bytes;
    let max_texture_bytes = settings.max_texture_bytes;
    let proxy = flow::spawn(vec![app::customizer(settings, Box::new(WebPlatform))])?;
    Ok(CustomizerHandle {
        proxy,
        max_model_bytes,
        max_texture_bytes,
    })
}

impl CustomizerHandle {
    fn post(&self, command: Command) {
        if !self.proxy.send(command.into()) {
            log::warn!("Customizer is no longer running");
        }
    }
}

#[wasm_bindgen]
impl CustomizerHandle {
    pub fn set_color(&self, color: String) {
        self.post(Command::Design(DesignChange::SetColor(Color::new(color))));
    }

    pub fn next_swatch(&self) {
        self.post(Command::NextSwatch);
    }

    pub fn set_material(&self, id: &str) -> Result<(), JsValue> {
        let preset: MaterialPreset = id.parse().map_err(js_error)?;
        self.post(Command::Design(DesignChange::SetMaterial(preset)));
        Ok(())
    }

    /// `url` is usually an object URL created for the picked file.
    pub fn upload_model(&self, file_name: &str, size: f64, url: String) -> Result<(), JsValue> {
        let change = panel::model_upload(
            file_name,
            size as u64,
            self.max_model_bytes,
            ModelSource::new(url),
        )
        .map_err(js_error)?;
        self.post(Command::Design(change));
        Ok(())
    }

    pub fn clear_model(&self) {
        self.post(Command::Design(DesignChange::ClearModel));
    }

    pub fn upload_texture(&self, file_name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<(), JsValue> {
        let change = panel::texture_upload(file_name, Some(mime_type), &bytes, self.max_texture_bytes)
            .map_err(js_error)?;
        self.post(Command::Design(change));
        Ok(())
    }

    pub fn clear_texture(&self) {
        self.post(Command::Design(DesignChange::ClearTexture));
    }

    pub fn select_tab(&self, tab: &str) -> Result<(), JsValue> {
        let tab = Tab::ALL
            .into_iter()
            .find(|candidate| candidate.label().eq_ignore_ascii_case(tab))
            .ok_or_else(|| js_error(format!("unknown tab `{tab}`")))?;
        self.post(Command::SelectTab(tab));
        Ok(())
    }

    pub fn toggle_color_picker(&self) {
        self.post(Command::ToggleColorPicker);
    }

    pub fn set_view(&self, view: &str) -> Result<(), JsValue> {
        let view: ActiveView = view.parse().map_err(js_error)?;
        self.post(Command::SetView(view));
        Ok(())
    }

    pub fn open_export(&self) {
        self.post(Command::OpenExport);
    }

    pub fn close_export(&self) {
        self.post(Command::CloseExport);
    }

    /// `resolution` is one of `standard`, `hd` or `4k`.
    pub fn export(&self, resolution: &str) -> Result<(), JsValue> {
        let resolution: Resolution = resolution.parse().map_err(js_error)?;
        self.post(Command::Export(resolution));
        Ok(())
    }

    pub fn generate_share_link(&self) {
        self.post(Command::GenerateShareLink);
    }

    pub fn share_social(&self, platform: &str) -> Result<(), JsValue> {
        let platform = SocialPlatform::ALL
            .into_iter()
            .find(|candidate| candidate.label().eq_ignore_ascii_case(platform))
            .ok_or_else(|| js_error(format!("unknown platform `{platform}`")))?;
        self.post(Command::ShareSocial(platform));
        Ok(())
    }

    pub fn share(&self) {
        self.post(Command::Share);
    }

    pub fn enter_ar(&self) {
        self.post(Command::EnterAr);
    }

    pub fn exit_ar(&self) {
        self.post(Command::ExitAr);
    }

    pub fn set_embed_size(&self, width: u32, height: u32) {
        self.post(Command::SetEmbedSize(EmbedSize::new(width, height)));
    }

    /// Free-form width entry next to the size presets.
    pub fn set_embed_width(&self, width: u32) {
        self.post(Command::SetEmbedWidth(width));
    }

    pub fn set_embed_height(&self, height: u32) {
        self.post(Command::SetEmbedHeight(height));
    }

    pub fn toggle_advanced(&self) {
        self.post(Command::ToggleAdvanced);
    }

    pub fn toggle_embed_option(&self, option: &str) -> Result<(), JsValue> {
        let option = match option {
            "ar" => EmbedOption::EnableAr,
            "export" => EmbedOption::ShowExport,
            "upload" => EmbedOption::AllowUpload,
            other => return Err(js_error(format!("unknown embed option `{other}`"))),
        };
        self.post(Command::ToggleEmbedOption(option));
        Ok(())
    }

    pub fn copy_embed_html(&self) {
        self.post(Command::CopyEmbedHtml);
    }

    pub fn copy_embed_component(&self) {
        self.post(Command::CopyEmbedComponent);
    }
}
