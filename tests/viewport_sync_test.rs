use std::path::Path;

use drape_ngin::{
    design::{Color, DesignChange, DesignConfig, TextureData},
    material::MaterialPreset,
    resources::{self, ParsedScene},
    viewport::{ERROR_MESSAGE, LOADING_MESSAGE, PLACEHOLDER_PROMPT, SceneRenderer, ViewportStatus},
};

use crate::common::test_utils::{solid_png, triangle_garment};

mod common;

fn parse(source: &drape_ngin::design::ModelSource) -> ParsedScene {
    futures::executor::block_on(resources::load_model(source, Path::new(".")))
        .expect("fixture parses")
}

fn assert_all_painted(scene: &SceneRenderer, design: &DesignConfig) {
    let graph = scene.active_graph().expect("a graph is on screen");
    let color = design.color().to_linear_rgba().unwrap();
    let surface = design.material().surface();
    assert!(!graph.primitives().is_empty());
    for primitive in graph.primitives() {
        assert_eq!(primitive.material.base_color, color);
        assert_eq!(primitive.material.roughness, surface.roughness);
        assert_eq!(primitive.material.metalness, surface.metalness);
        assert_eq!(primitive.material.map, scene.map());
    }
}

#[test]
fn fixture_keeps_its_hierarchy() {
    let parsed = parse(&triangle_garment(2));
    assert_eq!(parsed.graph.mesh_node_count(), 3);
    assert_eq!(parsed.meshes.len(), 3);
    let mesh = &parsed.meshes[0];
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
}

#[test]
fn placeholder_follows_the_design() {
    let mut scene = SceneRenderer::new();
    let design = DesignConfig::default()
        .apply(DesignChange::SetColor(Color::new("#ff0000")))
        .apply(DesignChange::SetMaterial(MaterialPreset::Silk));

    let outcome = scene.sync(&design);
    assert!(outcome.load_model.is_none());
    assert_eq!(outcome.painted, 1);
    assert_eq!(scene.status(), ViewportStatus::Placeholder);
    assert_eq!(scene.overlay(), Some(PLACEHOLDER_PROMPT));
    assert_all_painted(&scene, &design);
}

#[test]
fn every_primitive_of_a_loaded_model_is_painted() {
    let mut scene = SceneRenderer::new();
    let source = triangle_garment(2);
    let design = DesignConfig::new(Color::new("#10b981"), MaterialPreset::Denim)
        .apply(DesignChange::SetModel(source.clone()));

    let request = scene.sync(&design).load_model.expect("model load starts");
    assert_eq!(request.source, source);
    assert_eq!(scene.overlay(), Some(LOADING_MESSAGE));
    assert!(scene.active_graph().is_none());

    let meshes = scene
        .finish_model_load(request.ticket, Ok(parse(&source)))
        .expect("current load is accepted");
    assert_eq!(meshes.len(), 3);
    assert_eq!(scene.status(), ViewportStatus::Ready);
    assert_eq!(scene.overlay(), None);
    assert_all_painted(&scene, &design);

    let leather = design.apply(DesignChange::SetMaterial(MaterialPreset::Leather));
    assert_eq!(scene.sync(&leather).painted, 1 + 3);
    assert_all_painted(&scene, &leather);
}

#[test]
fn invalid_colour_keeps_the_last_paint() {
    let mut scene = SceneRenderer::new();
    let red = DesignConfig::default().apply(DesignChange::SetColor(Color::new("#ff0000")));
    scene.sync(&red);

    let broken = red.apply(DesignChange::SetColor(Color::new("crimson")));
    scene.sync(&broken);
    assert_eq!(broken.color().as_str(), "crimson");
    assert_all_painted(&scene, &red);
}

#[test]
fn texture_is_applied_and_removed() {
    let mut scene = SceneRenderer::new();
    let texture = TextureData::from_bytes("image/png", &solid_png(2, 2, [255, 0, 0, 255]));
    let design = DesignConfig::default().apply(DesignChange::SetTexture(texture));

    let request = scene.sync(&design).decode_texture.expect("decode starts");
    let decoded = resources::decode_texture(&request.source).map(|_| ());
    let id = scene
        .finish_texture_decode(request.ticket, decoded.map_err(|e| e.to_string()))
        .expect("decode accepted");
    assert_eq!(scene.map(), Some(id));
    assert_all_painted(&scene, &design);

    let plain = design.apply(DesignChange::ClearTexture);
    scene.sync(&plain);
    assert_eq!(scene.map(), None);
    assert_all_painted(&scene, &plain);
}

#[test]
fn undecodable_texture_leaves_the_map_empty() {
    let mut scene = SceneRenderer::new();
    let texture = TextureData::from_bytes("image/png", b"not a png");
    let design = DesignConfig::default().apply(DesignChange::SetTexture(texture));

    let request = scene.sync(&design).decode_texture.expect("decode starts");
    let decoded = resources::decode_texture(&request.source).map(|_| ());
    assert!(decoded.is_err());
    assert_eq!(
        scene.finish_texture_decode(request.ticket, decoded.map_err(|e| e.to_string())),
        None
    );
    assert!(scene.texture_failed(request.ticket));
    assert_eq!(scene.map(), None);
}

#[test]
fn stale_model_loads_are_discarded() {
    let mut scene = SceneRenderer::new();
    let first = triangle_garment(0);
    let second = triangle_garment(1);

    let a = scene
        .sync(&DesignConfig::default().apply(DesignChange::SetModel(first.clone())))
        .load_model
        .unwrap();
    let b = scene
        .sync(&DesignConfig::default().apply(DesignChange::SetModel(second.clone())))
        .load_model
        .unwrap();

    assert!(scene.finish_model_load(b.ticket, Ok(parse(&second))).is_some());
    assert!(scene.finish_model_load(a.ticket, Ok(parse(&first))).is_none());

    let model = scene.model().expect("second model is shown");
    assert_eq!(model.source, second);
    assert_eq!(model.graph.mesh_node_count(), 2);
}

#[test]
fn failed_loads_show_an_error_and_clearing_restores_the_placeholder() {
    let mut scene = SceneRenderer::new();
    let design = DesignConfig::default()
        .apply(DesignChange::SetModel(drape_ngin::design::ModelSource::new("data:model/gltf-binary;base64,AAAA")));
    let request = scene.sync(&design).load_model.unwrap();

    let result = futures::executor::block_on(resources::load_model(&request.source, Path::new(".")))
        .map_err(|e| e.to_string());
    assert!(result.is_err());
    assert!(scene.finish_model_load(request.ticket, result).is_none());
    assert!(matches!(scene.status(), ViewportStatus::Failed(_)));
    assert_eq!(scene.overlay(), Some(ERROR_MESSAGE));

    scene.sync(&design.apply(DesignChange::ClearModel));
    assert_eq!(scene.status(), ViewportStatus::Placeholder);
}
