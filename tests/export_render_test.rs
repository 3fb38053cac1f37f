#[cfg(feature = "integration-tests")]
use crate::common::test_utils::RecordingPlatform;

#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn headless() -> drape_ngin::context::Context {
    futures::executor::block_on(drape_ngin::context::Context::headless(640, 480))
        .expect("a GPU adapter is available")
}

#[test]
#[cfg(feature = "integration-tests")]
fn capture_draws_the_placeholder_over_the_background() {
    use drape_ngin::{
        design::DesignConfig,
        export::{self, Resolution},
        viewport::{SceneRenderer, garment::GpuScene},
    };

    let ctx = headless();
    let mut scene = SceneRenderer::new();
    scene.sync(&DesignConfig::default());
    let mut gpu = GpuScene::new(&ctx.device, &ctx.queue, &ctx.material_layout, &scene);
    gpu.update(&ctx.device, &ctx.queue, &ctx.material_layout, &mut scene);

    let pending = export::capture(
        &ctx,
        gpu.render(&scene),
        Resolution::Standard.target(),
        wgpu::Color::WHITE,
    )
    .unwrap();
    assert_eq!(pending.size(), (1280, 720));
    let image = futures::executor::block_on(pending.read()).unwrap();

    assert_eq!(image.dimensions(), (1280, 720));
    assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
    let [r, _, b, a] = image.get_pixel(640, 360).0;
    assert_eq!(a, 255);
    assert!(b > r, "the default blue garment is in the middle");
}

#[test]
#[cfg(feature = "integration-tests")]
fn tiled_capture_matches_a_single_pass() {
    use drape_ngin::{
        design::DesignConfig,
        export::{self, Resolution},
        viewport::{SceneRenderer, garment::GpuScene},
    };

    let ctx = headless();
    let mut scene = SceneRenderer::new();
    scene.sync(&DesignConfig::default());
    let mut gpu = GpuScene::new(&ctx.device, &ctx.queue, &ctx.material_layout, &scene);
    gpu.update(&ctx.device, &ctx.queue, &ctx.material_layout, &mut scene);
    let target = Resolution::Standard.target();

    let whole = export::capture(&ctx, gpu.render(&scene), target, wgpu::Color::WHITE).unwrap();
    assert_eq!(whole.tile_count(), 1);
    let whole = futures::executor::block_on(whole.read()).unwrap();

    let tiled =
        export::capture_tiled(&ctx, gpu.render(&scene), target, wgpu::Color::WHITE, 512).unwrap();
    assert_eq!(tiled.tile_count(), 6);
    assert_eq!(tiled.size(), (1280, 720));
    let tiled = futures::executor::block_on(tiled.read()).unwrap();

    assert_eq!(tiled.dimensions(), whole.dimensions());
    let differing = whole
        .pixels()
        .zip(tiled.pixels())
        .filter(|(a, b)| a.0.iter().zip(b.0).any(|(x, y)| x.abs_diff(y) > 2))
        .count();
    // rasterization at tile seams may differ by a handful of edge pixels
    assert!(differing < 64, "{differing} pixels differ");
}

#[test]
#[cfg(feature = "integration-tests")]
fn export_command_downloads_a_png() {
    use drape_ngin::{
        app::{CustomizerEvent, CustomizerFlow},
        context::InitContext,
        coordinator::{Command, Coordinator},
        export::Resolution,
        flow::{GraphicsFlow, Out},
        settings::Settings,
    };

    let mut ctx = headless();
    let platform = RecordingPlatform::default();
    let mut flow = CustomizerFlow::new(
        &InitContext::from(&ctx),
        Settings::default(),
        Box::new(platform.clone()),
    );
    let mut state = Coordinator::default();
    flow.on_init(&mut ctx, &mut state);
    flow.on_update(&ctx, &mut state, instant::Duration::ZERO);

    let (_, out) = flow.on_custom_events(&ctx, &mut state, Command::Export(Resolution::Hd).into());
    assert!(state.is_exporting);
    let Out::FutEvent(mut pending) = out else {
        panic!("export runs as a future");
    };
    assert_eq!(pending.len(), 1);
    let finished = futures::executor::block_on(Box::into_pin(pending.remove(0)));
    assert!(matches!(finished, CustomizerEvent::ExportFinished { .. }));

    flow.on_custom_events(&ctx, &mut state, finished);
    assert!(!state.is_exporting);

    let downloads = platform.downloads();
    assert_eq!(downloads.len(), 1);
    let (file_name, bytes) = &downloads[0];
    assert!(file_name.starts_with("custom-garment-hd-"));
    assert!(file_name.ends_with(".png"));
    let png = image::load_from_memory(bytes).unwrap();
    assert_eq!((png.width(), png.height()), (1920, 1080));
}
