use std::process::Command;

fn main() {
    // Short commit hash, empty outside a git checkout
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    // Generate version: PKG_VERSION or PKG_VERSION+COMMIT
    let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let version = if commit.is_empty() {
        pkg_version
    } else {
        format!("{}+{}", pkg_version, commit)
    };

    println!("cargo:rustc-env=WANDELEN_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}
