//! Host integration.
//!
//! Everything the customizer does outside its window goes through
//! [`Platform`]: clipboard, new tabs, downloads, notifications and the text
//! slots of the host page. [`DesktopPlatform`] backs it with the file system
//! and the log; `WebPlatform` with the browser.

use std::path::PathBuf;

use crate::{ar::ArSupport, settings::Settings};

/// Text areas of the host page, addressed by element id on the web.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    ViewportOverlay,
    ShareUrl,
    EmbedHtml,
    EmbedComponent,
    Status,
    GettingStarted,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::ViewportOverlay,
        Slot::ShareUrl,
        Slot::EmbedHtml,
        Slot::EmbedComponent,
        Slot::Status,
        Slot::GettingStarted,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Slot::ViewportOverlay => "viewport-overlay",
            Slot::ShareUrl => "share-url",
            Slot::EmbedHtml => "embed-html",
            Slot::EmbedComponent => "embed-component",
            Slot::Status => "status",
            Slot::GettingStarted => "getting-started",
        }
    }
}

/// Side effects the customizer asks its host for. All of them are fire and
/// forget; implementations log their own failures.
pub trait Platform {
    fn page_url(&self) -> String;

    fn origin(&self) -> String;

    /// Query string of the page the customizer was opened from, if any.
    fn query(&self) -> Option<String>;

    fn copy_to_clipboard(&self, text: &str);

    fn open_url(&self, url: &str);

    fn notify(&self, message: &str);

    fn download(&self, file_name: &str, bytes: &[u8]);

    /// Replace the text of `slot`. `None` hides it.
    fn show(&self, slot: Slot, text: Option<&str>);

    fn has_native_share(&self) -> bool;

    fn native_share(&self, title: &str, text: &str, url: &str);

    fn ar_support(&self) -> ArSupport;
}

/// Native host. Downloads land in the export directory, everything else is
/// logged.
#[derive(Debug, Clone)]
pub struct DesktopPlatform {
    page_url: String,
    origin: String,
    export_dir: PathBuf,
}

impl DesktopPlatform {
    pub fn new(settings: &Settings) -> Self {
        Self {
            page_url: settings.page_url.clone(),
            origin: settings.origin.clone(),
            export_dir: settings.export_dir.clone(),
        }
    }
}

impl Platform for DesktopPlatform {
    fn page_url(&self) -> String {
        self.page_url.clone()
    }

    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn query(&self) -> Option<String> {
        url::Url::parse(&self.page_url)
            .ok()?
            .query()
            .map(str::to_string)
    }

    fn copy_to_clipboard(&self, text: &str) {
        log::info!("Copied: {text}");
    }

    fn open_url(&self, url: &str) {
        log::info!("Open {url}");
    }

    fn notify(&self, message: &str) {
        log::info!("{message}");
    }

    fn download(&self, file_name: &str, bytes: &[u8]) {
        let path = self.export_dir.join(file_name);
        let written = std::fs::create_dir_all(&self.export_dir).and_then(|_| std::fs::write(&path, bytes));
        match written {
            Ok(()) => log::info!("Exported {}", path.display()),
            Err(e) => log::error!("Export failed: could not write {}: {e}", path.display()),
        }
    }

    fn show(&self, slot: Slot, text: Option<&str>) {
        if let Some(text) = text {
            log::debug!("[{}] {text}", slot.id());
        }
    }

    fn has_native_share(&self) -> bool {
        false
    }

    fn native_share(&self, _title: &str, _text: &str, url: &str) {
        self.copy_to_clipboard(url);
    }

    fn ar_support(&self) -> ArSupport {
        crate::ar::detect_support()
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebPlatform;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    use super::{Platform, Slot};
    use crate::ar::ArSupport;

    /// Browser host. Reads the location, writes into elements by id.
    #[derive(Debug, Clone, Default)]
    pub struct WebPlatform;

    fn window() -> Option<web_sys::Window> {
        let window = web_sys::window();
        if window.is_none() {
            log::error!("No browser window");
        }
        window
    }

    /// Call `target[name](...args)` and log the outcome of the returned
    /// promise.
    fn call_async(target: &JsValue, name: &str, args: &js_sys::Array, what: &'static str) {
        let promise = js_sys::Reflect::get(target, &name.into())
            .and_then(|function| function.dyn_into::<js_sys::Function>().map_err(JsValue::from))
            .and_then(|function| function.apply(target, args))
            .and_then(|promise| promise.dyn_into::<js_sys::Promise>().map_err(JsValue::from));
        match promise {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::error!("{what} failed: {e:?}");
                }
            }),
            Err(e) => log::error!("{what} failed: {e:?}"),
        }
    }

    fn download_blob(file_name: &str, bytes: &[u8]) -> Result<(), JsValue> {
        let document = window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type("image/png");
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
        let href = web_sys::Url::create_object_url_with_blob(&blob)?;
        let link: web_sys::HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
        link.set_href(&href);
        link.set_download(file_name);
        link.click();
        web_sys::Url::revoke_object_url(&href)
    }

    impl Platform for WebPlatform {
        fn page_url(&self) -> String {
            window()
                .and_then(|window| window.location().href().ok())
                .unwrap_or_default()
        }

        fn origin(&self) -> String {
            window()
                .and_then(|window| window.location().origin().ok())
                .unwrap_or_default()
        }

        fn query(&self) -> Option<String> {
            window()
                .and_then(|window| window.location().search().ok())
                .filter(|search| !search.is_empty())
        }

        fn copy_to_clipboard(&self, text: &str) {
            let Some(window) = window() else {
                return;
            };
            match js_sys::Reflect::get(&window.navigator(), &"clipboard".into()) {
                Ok(clipboard) => call_async(
                    &clipboard,
                    "writeText",
                    &js_sys::Array::of1(&text.into()),
                    "Clipboard write",
                ),
                Err(e) => log::error!("No clipboard: {e:?}"),
            }
        }

        fn open_url(&self, url: &str) {
            if let Some(window) = window() {
                if let Err(e) = window.open_with_url_and_target(url, "_blank") {
                    log::error!("Could not open {url}: {e:?}");
                }
            }
        }

        fn notify(&self, message: &str) {
            if let Some(window) = window() {
                if let Err(e) = window.alert_with_message(message) {
                    log::warn!("Could not show `{message}`: {e:?}");
                }
            }
        }

        fn download(&self, file_name: &str, bytes: &[u8]) {
            if let Err(e) = download_blob(file_name, bytes) {
                log::error!("Export failed: {e:?}");
            }
        }

        fn show(&self, slot: Slot, text: Option<&str>) {
            let Some(element) = window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(slot.id()))
            else {
                return;
            };
            element.set_text_content(text);
            let hidden = match text {
                Some(_) => element.remove_attribute("hidden"),
                None => element.set_attribute("hidden", ""),
            };
            if let Err(e) = hidden {
                log::warn!("Could not toggle #{}: {e:?}", slot.id());
            }
        }

        fn has_native_share(&self) -> bool {
            window()
                .map(|window| window.navigator())
                .and_then(|navigator| js_sys::Reflect::has(&navigator, &"share".into()).ok())
                .unwrap_or(false)
        }

        fn native_share(&self, title: &str, text: &str, url: &str) {
            let Some(window) = window() else {
                return;
            };
            let data = js_sys::Object::new();
            for (key, value) in [("title", title), ("text", text), ("url", url)] {
                if let Err(e) = js_sys::Reflect::set(&data, &key.into(), &value.into()) {
                    log::error!("Share failed: {e:?}");
                    return;
                }
            }
            call_async(
                &window.navigator(),
                "share",
                &js_sys::Array::of1(&data),
                "Share",
            );
        }

        fn ar_support(&self) -> ArSupport {
            crate::ar::detect_support()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_query_comes_from_the_page_url() {
        let settings = Settings {
            page_url: "http://localhost:5173/?config=abc".to_string(),
            ..Settings::default()
        };
        let platform = DesktopPlatform::new(&settings);
        assert_eq!(platform.query().as_deref(), Some("config=abc"));
        assert_eq!(DesktopPlatform::new(&Settings::default()).query(), None);
    }

    #[test]
    fn downloads_are_written_to_the_export_dir() {
        let dir = std::env::temp_dir().join(format!("drape-export-{}", std::process::id()));
        let settings = Settings {
            export_dir: dir.clone(),
            ..Settings::default()
        };
        DesktopPlatform::new(&settings).download("a.png", b"png");
        assert_eq!(std::fs::read(dir.join("a.png")).unwrap(), b"png");
        std::fs::remove_dir_all(dir).unwrap();
    }
}
