//! Loading garments and textures from external sources.
//!
//! Model sources are fetched with [`load_binary`] (file system natively,
//! `fetch` in the browser; `data:` URLs everywhere) and parsed into a
//! [`ParsedScene`] by [`parse_gltf`]. Parsing is CPU only: GPU resources are
//! created later from the parsed meshes.

use std::path::Path;

use anyhow::{Context as _, bail};

use crate::{
    data_structures::{
        instance::Instance,
        model::ModelVertex,
        scene_graph::{SceneGraph, SceneNode, SurfaceMaterial},
    },
    design::{ModelSource, TextureData},
    resources::mesh::MeshData,
};

pub mod data_url;
pub mod mesh;

/// A garment scene ready to be uploaded.
#[derive(Debug, Clone)]
pub struct ParsedScene {
    pub graph: SceneGraph,
    /// Indexed by [`crate::data_structures::scene_graph::Primitive::mesh`].
    pub meshes: Vec<MeshData>,
}

#[cfg(target_arch = "wasm32")]
fn format_url(location: &str) -> anyhow::Result<reqwest::Url> {
    if let Ok(url) = reqwest::Url::parse(location) {
        return Ok(url);
    }
    let window = web_sys::window().context("no window")?;
    let href = window
        .location()
        .href()
        .map_err(|e| anyhow::anyhow!("could not read location: {e:?}"))?;
    let base = reqwest::Url::parse(&href)?;
    Ok(base.join(location)?)
}

/// Fetch the raw bytes behind `source`.
///
/// `data:` URLs are decoded in place. In the browser everything else goes
/// through `fetch` (which also resolves `blob:` URLs); natively relative
/// paths are read from `asset_root`.
pub async fn load_binary(source: &ModelSource, asset_root: &Path) -> anyhow::Result<Vec<u8>> {
    if source.as_str().starts_with("data:") {
        let decoded = data_url::decode(source.as_str())?;
        return Ok(decoded.bytes);
    }

    #[cfg(target_arch = "wasm32")]
    let data = {
        let _ = asset_root;
        let url = format_url(source.as_str())?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        if source.is_remote() {
            bail!("remote model sources are only supported in the browser: {source}");
        }
        let path = asset_root.join(source.as_str());
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?
    };

    Ok(data)
}

/// Fetch and parse a glTF/GLB asset.
pub async fn load_model(source: &ModelSource, asset_root: &Path) -> anyhow::Result<ParsedScene> {
    let bytes = load_binary(source, asset_root).await?;
    parse_gltf(&bytes, source, asset_root).await
}

/// Parse glTF JSON or a GLB container.
///
/// Buffers are resolved from the GLB blob, `data:` URIs, or files next to
/// `source`. Only triangle primitives are imported.
pub async fn parse_gltf(
    bytes: &[u8],
    source: &ModelSource,
    asset_root: &Path,
) -> anyhow::Result<ParsedScene> {
    let gltf = gltf::Gltf::from_slice(bytes)
        .with_context(|| format!("{source} is not a glTF asset"))?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.into()),
                None => bail!("{source} references a binary chunk it does not contain"),
            },
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(&source.join(uri), asset_root).await?;
                buffer_data.push(bin);
            }
        }
    }

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .with_context(|| format!("{source} contains no scene"))?;

    let mut meshes = Vec::new();
    let nodes = scene
        .nodes()
        .map(|node| to_scene_node(&node, &buffer_data, &mut meshes))
        .collect();
    let graph = SceneGraph::from_nodes(nodes);

    if meshes.is_empty() {
        log::warn!("{source} contains no triangle meshes");
    }
    log::info!(
        "Parsed {source}: {} mesh nodes, {} primitives",
        graph.mesh_node_count(),
        meshes.len()
    );

    Ok(ParsedScene { graph, meshes })
}

fn to_scene_node(
    node: &gltf::Node,
    buffers: &[Vec<u8>],
    meshes: &mut Vec<MeshData>,
) -> SceneNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let local = Instance {
        position: translation.into(),
        rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    };
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()));
    let mut scene_node = SceneNode::new(name.clone()).with_transform(local);

    if let Some(mesh) = node.mesh() {
        for (idx, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("Skipping primitive {idx} of {name}: {:?} is not supported", primitive.mode());
                continue;
            }
            let Some(data) = read_primitive(&primitive, buffers, &format!("{name}/{idx}")) else {
                log::warn!("Skipping primitive {idx} of {name}: no positions");
                continue;
            };
            let pbr = primitive.material().pbr_metallic_roughness();
            let material = SurfaceMaterial {
                base_color: pbr.base_color_factor(),
                roughness: pbr.roughness_factor(),
                metalness: pbr.metallic_factor(),
                ..Default::default()
            };
            scene_node = scene_node.with_primitive(meshes.len(), material);
            meshes.push(data);
        }
    }

    for child in node.children() {
        scene_node.add_child(to_scene_node(&child, buffers, meshes));
    }
    scene_node
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    name: &str,
) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let mut vertices: Vec<ModelVertex> = reader
        .read_positions()?
        .map(|position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();

    if let Some(tex_coords) = reader.read_tex_coords(0) {
        for (vertex, uv) in vertices.iter_mut().zip(tex_coords.into_f32()) {
            vertex.tex_coords = uv;
        }
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };

    match reader.read_normals() {
        Some(normals) => {
            for (vertex, normal) in vertices.iter_mut().zip(normals) {
                vertex.normal = normal;
            }
        }
        None => mesh::compute_normals(&mut vertices, &indices),
    }

    Some(MeshData {
        name: name.to_string(),
        vertices,
        indices,
    })
}

/// Decode an uploaded texture into an image.
pub fn decode_texture(texture: &TextureData) -> anyhow::Result<image::DynamicImage> {
    let data = texture.decode()?;
    let img = image::load_from_memory(&data.bytes)
        .with_context(|| format!("could not decode {} texture", data.mime_type))?;
    Ok(img)
}
