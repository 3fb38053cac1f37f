#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    drape_ngin::app::run_customizer(drape_ngin::settings::Settings::default())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
