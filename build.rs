use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

/// Bundled sample garments live in `assets/`. They are copied into the build
/// output so relative model paths resolve the same way for `cargo run` and
/// the web bundle.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    if !manifest_dir.join("assets").exists() {
        return Ok(());
    }

    let mut options = CopyOptions::new();
    options.overwrite = true;
    copy_items(&[manifest_dir.join("assets")], env::var("OUT_DIR")?, &options)?;
    Ok(())
}
