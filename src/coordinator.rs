//! Shared application state.
//!
//! The [`Coordinator`] holds everything the views share and is the only
//! place it changes. Commands go in through [`Coordinator::apply`]; what has
//! to happen outside the state (clipboard, new tabs, downloads, GPU work)
//! comes back as [`Effect`]s for the host to execute.

use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    ar::{ArSupport, ArViewer},
    design::{DesignChange, DesignConfig},
    embed::{EmbedConfig, EmbedGenerator, EmbedOption, EmbedSize},
    error::DesignError,
    export::Resolution,
    panel::{self, PanelState, Tab},
    share::{self, COPIED_NOTICE, SHARE_TEXT, SHARE_TITLE, SocialPlatform},
};

pub const GETTING_STARTED: [&str; 4] = [
    "Upload your GLB model in the Model tab",
    "Customize colors and materials",
    "Add textures or logos",
    "Export or share your design",
];

/// How long a "Copied!" confirmation stays up.
pub const COPIED_FEEDBACK_MILLIS: i64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Customizer,
    Embed,
}

impl ActiveView {
    pub fn id(self) -> &'static str {
        match self {
            ActiveView::Customizer => "customizer",
            ActiveView::Embed => "embed",
        }
    }

    pub fn other(self) -> Self {
        match self {
            ActiveView::Customizer => ActiveView::Embed,
            ActiveView::Embed => ActiveView::Customizer,
        }
    }
}

impl FromStr for ActiveView {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customizer" => Ok(ActiveView::Customizer),
            "embed" => Ok(ActiveView::Embed),
            other => Err(DesignError::UnknownView(other.to_string())),
        }
    }
}

impl fmt::Display for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Everything a user can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Design(DesignChange),
    NextSwatch,
    SelectTab(Tab),
    ToggleColorPicker,
    SetView(ActiveView),
    ToggleView,
    OpenExport,
    CloseExport,
    Export(Resolution),
    /// The running export ended, successfully or not.
    ExportFinished,
    GenerateShareLink,
    ShareSocial(SocialPlatform),
    /// The share button in the header.
    Share,
    EnterAr,
    ExitAr,
    ToggleAr,
    SetEmbedSize(EmbedSize),
    SetEmbedWidth(u32),
    SetEmbedHeight(u32),
    ToggleAdvanced,
    ToggleEmbedOption(EmbedOption),
    CopyEmbedHtml,
    CopyEmbedComponent,
    LoadEmbedConfig(EmbedConfig),
}

/// Work the host performs on behalf of the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CopyToClipboard(String),
    /// Open in a new tab or the default handler.
    OpenUrl(String),
    Notify(String),
    StartExport(Resolution),
    NativeShare {
        title: String,
        text: String,
        url: String,
    },
    /// The AR flag changed; the viewport presentation has to follow.
    PresentationChanged,
}

/// What the coordinator needs to know about the host for one command.
#[derive(Debug, Clone)]
pub struct Env {
    pub page_url: String,
    pub origin: String,
    pub now: DateTime<Utc>,
    pub native_share: bool,
    pub ar_support: ArSupport,
}

#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    design: DesignConfig,
    revision: u64,
    pub view: ActiveView,
    pub ar: ArViewer,
    pub show_export: bool,
    pub panel: PanelState,
    pub embed: EmbedGenerator,
    pub is_exporting: bool,
    pub share_url: Option<String>,
    embed_copied_at: Option<DateTime<Utc>>,
}

impl Coordinator {
    pub fn new(design: DesignConfig) -> Self {
        Self {
            design,
            ..Default::default()
        }
    }

    pub fn design(&self) -> &DesignConfig {
        &self.design
    }

    /// Increases with every design change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn getting_started_visible(&self) -> bool {
        self.design.model().is_none()
    }

    pub fn embed_copied(&self, now: DateTime<Utc>) -> bool {
        self.embed_copied_at
            .is_some_and(|at| now - at < TimeDelta::milliseconds(COPIED_FEEDBACK_MILLIS))
    }

    fn change(&mut self, change: DesignChange) {
        self.design = self.design.apply(change);
        self.revision += 1;
    }

    pub fn apply(&mut self, command: Command, env: &Env) -> Vec<Effect> {
        match command {
            Command::Design(change) => self.change(change),
            Command::NextSwatch => {
                let next = panel::next_swatch(self.design.color());
                self.change(DesignChange::SetColor(next));
            }
            Command::SelectTab(tab) => self.panel.select(tab),
            Command::ToggleColorPicker => self.panel.toggle_color_picker(),
            Command::SetView(view) => self.view = view,
            Command::ToggleView => self.view = self.view.other(),
            Command::OpenExport => self.show_export = true,
            Command::CloseExport => self.show_export = false,
            Command::Export(resolution) => {
                if self.is_exporting {
                    log::info!("Export already running, ignoring {resolution}");
                    return Vec::new();
                }
                self.is_exporting = true;
                return vec![Effect::StartExport(resolution)];
            }
            Command::ExportFinished => self.is_exporting = false,
            Command::GenerateShareLink => match share::share_link(&env.page_url, env.now) {
                Ok(url) => {
                    self.share_url = Some(url.clone());
                    return vec![Effect::CopyToClipboard(url)];
                }
                Err(e) => log::error!("Could not build a share link from {}: {e}", env.page_url),
            },
            Command::ShareSocial(platform) => {
                let url = self.share_url.as_deref().unwrap_or(&env.page_url);
                return vec![Effect::OpenUrl(platform.intent_url(url))];
            }
            Command::Share => {
                if env.native_share {
                    return vec![Effect::NativeShare {
                        title: SHARE_TITLE.to_string(),
                        text: SHARE_TEXT.to_string(),
                        url: env.page_url.clone(),
                    }];
                }
                return vec![
                    Effect::CopyToClipboard(env.page_url.clone()),
                    Effect::Notify(COPIED_NOTICE.to_string()),
                ];
            }
            Command::EnterAr => {
                self.ar.enter(env.ar_support);
                return vec![Effect::PresentationChanged];
            }
            Command::ExitAr => {
                self.ar.exit();
                return vec![Effect::PresentationChanged];
            }
            Command::ToggleAr => {
                self.ar.toggle(env.ar_support);
                return vec![Effect::PresentationChanged];
            }
            Command::SetEmbedSize(size) => self.embed.size = size,
            Command::SetEmbedWidth(width) => self.embed.set_width(width),
            Command::SetEmbedHeight(height) => self.embed.set_height(height),
            Command::ToggleAdvanced => self.embed.show_advanced = !self.embed.show_advanced,
            Command::ToggleEmbedOption(option) => self.embed.options.toggle(option),
            Command::CopyEmbedHtml => {
                match self.embed.iframe_snippet(&env.origin, &self.design) {
                    Ok(snippet) => {
                        self.embed_copied_at = Some(env.now);
                        return vec![Effect::CopyToClipboard(snippet)];
                    }
                    Err(e) => log::error!("Could not build the embed snippet: {e}"),
                }
            }
            Command::CopyEmbedComponent => {
                self.embed_copied_at = Some(env.now);
                return vec![Effect::CopyToClipboard(
                    self.embed.component_snippet(&self.design),
                )];
            }
            Command::LoadEmbedConfig(config) => {
                self.design = config.apply_to(&self.design);
                self.revision += 1;
                self.embed.size = config.size();
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::design::Color;

    fn env() -> Env {
        Env {
            page_url: "https://shop.test/".to_string(),
            origin: "https://shop.test".to_string(),
            now: Utc.timestamp_millis_opt(1_000).unwrap(),
            native_share: false,
            ar_support: ArSupport::Unsupported,
        }
    }

    #[test]
    fn design_commands_bump_the_revision() {
        let mut coordinator = Coordinator::default();
        coordinator.apply(Command::SelectTab(Tab::Model), &env());
        assert_eq!(coordinator.revision(), 0);
        coordinator.apply(
            Command::Design(DesignChange::SetColor(Color::new("#123456"))),
            &env(),
        );
        assert_eq!(coordinator.revision(), 1);
        assert_eq!(coordinator.design().color().as_str(), "#123456");
    }

    #[test]
    fn second_export_is_ignored_while_running() {
        let mut coordinator = Coordinator::default();
        let env = env();
        assert_eq!(
            coordinator.apply(Command::Export(Resolution::Hd), &env),
            vec![Effect::StartExport(Resolution::Hd)]
        );
        assert!(coordinator.apply(Command::Export(Resolution::Hd), &env).is_empty());
        coordinator.apply(Command::ExportFinished, &env);
        assert!(!coordinator.is_exporting);
    }

    #[test]
    fn header_share_falls_back_to_the_clipboard() {
        let mut coordinator = Coordinator::default();
        let mut env = env();
        assert_eq!(
            coordinator.apply(Command::Share, &env),
            vec![
                Effect::CopyToClipboard("https://shop.test/".to_string()),
                Effect::Notify("Link copied to clipboard!".to_string()),
            ]
        );
        env.native_share = true;
        assert!(matches!(
            coordinator.apply(Command::Share, &env).as_slice(),
            [Effect::NativeShare { .. }]
        ));
    }

    #[test]
    fn social_share_prefers_the_generated_link() {
        let mut coordinator = Coordinator::default();
        let env = env();
        let [Effect::OpenUrl(before)]: [Effect; 1] = coordinator
            .apply(Command::ShareSocial(SocialPlatform::Facebook), &env)
            .try_into()
            .unwrap()
        else {
            panic!("expected one url");
        };
        assert!(before.ends_with("u=https%3A%2F%2Fshop.test%2F"));

        coordinator.apply(Command::GenerateShareLink, &env);
        let share_url = coordinator.share_url.clone().unwrap();
        let [Effect::OpenUrl(after)]: [Effect; 1] = coordinator
            .apply(Command::ShareSocial(SocialPlatform::Facebook), &env)
            .try_into()
            .unwrap()
        else {
            panic!("expected one url");
        };
        assert!(after.ends_with(&share::encode_component(&share_url)));
    }

    #[test]
    fn copied_feedback_expires() {
        let mut coordinator = Coordinator::default();
        let env = env();
        coordinator.apply(Command::CopyEmbedComponent, &env);
        assert!(coordinator.embed_copied(env.now + TimeDelta::milliseconds(1_999)));
        assert!(!coordinator.embed_copied(env.now + TimeDelta::seconds(2)));
    }

    #[test]
    fn views_parse() {
        assert_eq!("embed".parse::<ActiveView>(), Ok(ActiveView::Embed));
        assert!("ar".parse::<ActiveView>().is_err());
    }
}
