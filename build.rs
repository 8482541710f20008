use anyhow::Context;
use fs_extra::{copy_items, dir::CopyOptions};
use std::{env, path::PathBuf};

// Levels and the optional sample config are read from `assets/` at run time;
// keep a copy next to the build output so the binary finds them there too.
fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::new()
    };
    copy_items(&[assets], &out_dir, &options)
        .with_context(|| format!("copying level assets to {}", out_dir))?;
    Ok(())
}
