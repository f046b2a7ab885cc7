use std::process::Command;

fn git(repo_root: &str, args: &[&str]) -> Option<String> {
    let out = Command::new("git").arg("-C").arg(repo_root).args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let repo_root = format!("{manifest_dir}/..");

    let sha = git(&repo_root, &["rev-parse", "--short", "HEAD"])
        .unwrap_or_else(|| "unknown".to_string());
    let dirty = git(&repo_root, &["status", "--porcelain", "--untracked-files=no"]).is_some();
    let version = if dirty { format!("{sha}-dirty") } else { sha };

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rustc-env=MYOLDTIMER_BUILD_SHA={version}");
}
