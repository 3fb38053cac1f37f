use chrono::{TimeZone, Utc};
use drape_ngin::{
    ar::ArSupport,
    coordinator::{ActiveView, Command, Coordinator, Effect, Env},
    design::{Color, DesignChange, DesignConfig, ModelSource},
    embed::{EmbedConfig, EmbedSize},
    material::MaterialPreset,
};

fn env() -> Env {
    Env {
        page_url: "https://shop.example/customize".to_string(),
        origin: "https://shop.example".to_string(),
        now: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        native_share: false,
        ar_support: ArSupport::Unsupported,
    }
}

fn customized() -> Coordinator {
    let mut state = Coordinator::default();
    let env = env();
    for change in [
        DesignChange::SetModel(ModelSource::new("models/hoodie.glb")),
        DesignChange::SetColor(Color::new("#8B5CF6")),
        DesignChange::SetMaterial(MaterialPreset::Silk),
    ] {
        state.apply(Command::Design(change), &env);
    }
    state
}

#[test]
fn switching_views_keeps_the_design() {
    let mut state = customized();
    let before = state.design().clone();

    state.apply(Command::SetView(ActiveView::Embed), &env());
    assert_eq!(state.view, ActiveView::Embed);
    state.apply(Command::ToggleView, &env());
    assert_eq!(state.view, ActiveView::Customizer);

    assert_eq!(state.design(), &before);
    assert_eq!(state.design().color().as_str(), "#8B5CF6");
    assert!(!state.getting_started_visible());
}

#[test]
fn copied_embed_link_reproduces_the_design() {
    let mut state = customized();
    state.apply(Command::SetEmbedSize(EmbedSize::LARGE), &env());

    let [Effect::CopyToClipboard(snippet)]: [Effect; 1] = state
        .apply(Command::CopyEmbedHtml, &env())
        .try_into()
        .unwrap()
    else {
        panic!("expected the snippet on the clipboard");
    };
    assert!(snippet.contains(r#"width="1200""#));
    let src = snippet
        .split("src=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap();
    let query = src
        .strip_prefix("https://shop.example/embed")
        .expect("iframe points at the embed route");

    let config = EmbedConfig::from_query(query).unwrap();
    assert_eq!(
        config.to_json().unwrap(),
        r##"{"modelUrl":"models/hoodie.glb","defaultColor":"#8B5CF6","defaultMaterial":"silk","width":1200,"height":900}"##
    );

    let mut embedded = Coordinator::new(DesignConfig::default());
    embedded.apply(Command::LoadEmbedConfig(config), &env());
    assert_eq!(embedded.design(), state.design());
    assert_eq!(embedded.embed.size, EmbedSize::LARGE);
}

#[test]
fn share_link_is_remembered_and_copied() {
    let mut state = customized();
    let effects = state.apply(Command::GenerateShareLink, &env());
    let url = "https://shop.example/customize?design=1700000000123&timestamp=2023-11-14T22%3A13%3A20.123Z";
    assert_eq!(effects, vec![Effect::CopyToClipboard(url.to_string())]);
    assert_eq!(state.share_url.as_deref(), Some(url));
}

#[test]
fn typed_embed_dimensions_reach_the_snippet() {
    let mut state = customized();
    state.apply(Command::SetEmbedWidth(640), &env());
    state.apply(Command::SetEmbedHeight(360), &env());
    assert_eq!(state.embed.size, EmbedSize::new(640, 360));

    let snippet = state
        .embed
        .iframe_snippet("https://shop.example", state.design())
        .unwrap();
    assert!(snippet.contains(r#"width="640""#), "{snippet}");
    assert!(snippet.contains(r#"height="360""#), "{snippet}");
}

#[test]
fn swatches_cycle_from_the_current_colour() {
    let mut state = Coordinator::default();
    let revision = state.revision();
    state.apply(Command::NextSwatch, &env());
    assert_eq!(state.revision(), revision + 1);
    assert_eq!(state.design().color().as_str(), "#FF6B6B");
    state.apply(Command::NextSwatch, &env());
    assert_eq!(state.design().color().as_str(), "#4ECDC4");
}

#[test]
fn entering_and_leaving_ar_changes_the_presentation() {
    let mut state = customized();
    let effects = state.apply(Command::EnterAr, &env());
    assert_eq!(effects, vec![Effect::PresentationChanged]);
    assert!(state.ar.is_active());
    assert_eq!(state.apply(Command::ExitAr, &env()), vec![Effect::PresentationChanged]);
    assert!(!state.ar.is_active());
}
