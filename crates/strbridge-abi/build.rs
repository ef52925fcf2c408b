use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=version_scripts/strbridge.map");

    // Only GNU-style linkers understand version scripts.
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if !matches!(target_os.as_str(), "linux" | "android" | "freebsd") {
        return;
    }

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let map = PathBuf::from(manifest_dir).join("version_scripts/strbridge.map");
    if map.exists() {
        println!(
            "cargo:rustc-cdylib-link-arg=-Wl,--version-script={}",
            map.display()
        );
    }
}
