//! Build script for tracklens.
//!
//! Copies the `.env.example` configuration template into the user's local
//! data directory (`<data_local_dir>/tracklens/.env.example`) so a ready-made
//! template sits next to the `.env` file the binary reads at startup.
//!
//! Every failure here is reported as a cargo warning. A read-only home
//! directory must not break compilation.

use std::{env, fs, path::PathBuf};

/// Copies the configuration template next to the `.env` the binary reads.
///
/// # Build Process
///
/// 1. **Rebuild Trigger**: re-runs when `.env.example` changes
/// 2. **Path Resolution**: source is the crate root, target is
///    `<data_local_dir>/tracklens`
/// 3. **Directory Creation**: creates the target directory when missing
/// 4. **File Copy**: writes `.env.example` into it
///
/// ## Destination Location
/// - Linux: `~/.local/share/tracklens/.env.example`
/// - macOS: `~/Library/Application Support/tracklens/.env.example`
/// - Windows: `%LOCALAPPDATA%/tracklens/.env.example`
///
/// # Error Handling
///
/// A missing template, an unwritable data directory or a failed copy each
/// produce a `cargo:warning` and the build continues. Only an unset
/// `CARGO_MANIFEST_DIR` is returned as an error.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    if !env_example_path.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
        return Ok(());
    }

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("tracklens");

    if let Err(e) = fs::create_dir_all(&out_dir) {
        println!(
            "cargo:warning=cannot create {}: {}",
            out_dir.display(),
            e
        );
        return Ok(());
    }

    let copied = fs::read_to_string(&env_example_path)
        .and_then(|contents| fs::write(out_dir.join(".env.example"), contents));
    if let Err(e) = copied {
        println!("cargo:warning=cannot copy .env.example: {}", e);
    }

    Ok(())
}
