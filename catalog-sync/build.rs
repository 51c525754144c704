//! Embeds build provenance shown in the startup banner

use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn main() {
    println!("cargo:rustc-env=GIT_HASH={}", git_revision());
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
    println!(
        "cargo:rustc-env=BUILD_PROFILE={}",
        env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string())
    );

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}

/// Abbreviated commit, suffixed with `-modified` for a dirty tree
fn git_revision() -> String {
    let output = Command::new("git")
        .args(["describe", "--always", "--abbrev=10", "--dirty=-modified"])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if revision.is_empty() {
                UNKNOWN.to_string()
            } else {
                revision
            }
        }
        _ => UNKNOWN.to_string(),
    }
}
