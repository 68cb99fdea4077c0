use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=CUSTOM_FIELD_ORDER_VERSION");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let version = std::env::var("CUSTOM_FIELD_ORDER_VERSION")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .or_else(git_describe)
        .map(|raw| strip_tag_prefix(raw.trim()).to_string())
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=CUSTOM_FIELD_ORDER_BUILD_VERSION={version}");
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8(output.stdout).ok())
        .flatten()
}

/// `v1.2.3` becomes `1.2.3`; bare commit hashes pass through.
fn strip_tag_prefix(raw: &str) -> &str {
    match raw.strip_prefix('v') {
        Some(rest) if rest.starts_with(|ch: char| ch.is_ascii_digit()) => rest,
        _ => raw,
    }
}
