use std::{cell::RefCell, rc::Rc};

use drape_ngin::{
    ar::ArSupport,
    design::ModelSource,
    platform::{Platform, Slot},
    resources::data_url,
};

/// Everything the customizer asked its host to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clipboard(String),
    Open(String),
    Notify(String),
    Download { file_name: String, bytes: Vec<u8> },
    Show(Slot, Option<String>),
    Share { title: String, text: String, url: String },
}

/// A host that records calls instead of performing them. Clones share the
/// same log, so a test can keep one while the flow owns another.
#[derive(Debug, Clone)]
pub struct RecordingPlatform {
    pub page_url: String,
    pub query: Option<String>,
    pub native_share: bool,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self {
            page_url: "https://shop.example/customize".to_string(),
            query: None,
            native_share: false,
            calls: Rc::default(),
        }
    }
}

impl RecordingPlatform {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn downloads(&self) -> Vec<(String, Vec<u8>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Download { file_name, bytes } => Some((file_name, bytes)),
                _ => None,
            })
            .collect()
    }

    /// The last text shown in `slot`.
    pub fn shown(&self, slot: Slot) -> Option<String> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                Call::Show(shown, text) if shown == slot => Some(text),
                _ => None,
            })
            .flatten()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Platform for RecordingPlatform {
    fn page_url(&self) -> String {
        self.page_url.clone()
    }

    fn origin(&self) -> String {
        "https://shop.example".to_string()
    }

    fn query(&self) -> Option<String> {
        self.query.clone()
    }

    fn copy_to_clipboard(&self, text: &str) {
        self.record(Call::Clipboard(text.to_string()));
    }

    fn open_url(&self, url: &str) {
        self.record(Call::Open(url.to_string()));
    }

    fn notify(&self, message: &str) {
        self.record(Call::Notify(message.to_string()));
    }

    fn download(&self, file_name: &str, bytes: &[u8]) {
        self.record(Call::Download {
            file_name: file_name.to_string(),
            bytes: bytes.to_vec(),
        });
    }

    fn show(&self, slot: Slot, text: Option<&str>) {
        self.record(Call::Show(slot, text.map(str::to_string)));
    }

    fn has_native_share(&self) -> bool {
        self.native_share
    }

    fn native_share(&self, title: &str, text: &str, url: &str) {
        self.record(Call::Share {
            title: title.to_string(),
            text: text.to_string(),
            url: url.to_string(),
        });
    }

    fn ar_support(&self) -> ArSupport {
        ArSupport::Unsupported
    }
}

/// A self-contained glTF asset: a single-triangle mesh (no indices, no
/// normals) referenced by a root node and by `children` translated child
/// nodes. The whole asset is inlined as a `data:` URL.
pub fn triangle_garment(children: usize) -> ModelSource {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let buffer: Vec<u8> = bytemuck::cast_slice(&positions).to_vec();

    let child_nodes: Vec<serde_json::Value> = (0..children)
        .map(|idx| {
            serde_json::json!({
                "name": format!("panel{idx}"),
                "mesh": 0,
                "translation": [idx as f32 + 1.0, 0.0, 0.0],
            })
        })
        .collect();
    let mut root = serde_json::json!({ "name": "body", "mesh": 0 });
    if children > 0 {
        root["children"] = serde_json::json!((1..=children).collect::<Vec<_>>());
    }
    let mut nodes = vec![root];
    nodes.extend(child_nodes);

    let gltf = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": nodes,
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0],
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": buffer.len() }],
        "buffers": [{
            "byteLength": buffer.len(),
            "uri": data_url::encode("application/octet-stream", &buffer),
        }],
    });
    ModelSource::new(data_url::encode(
        "model/gltf+json",
        gltf.to_string().as_bytes(),
    ))
}

/// A `width` x `height` PNG filled with one colour.
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .expect("PNG encoding");
    bytes.into_inner()
}
