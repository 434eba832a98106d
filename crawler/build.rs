use std::path::PathBuf;
use std::process::Command;

fn git(args: &[&str], dir: Option<&PathBuf>) -> String {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    cmd.output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                Some(String::from_utf8_lossy(&o.stdout).trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    // Git metadata lives at the workspace root, one level above crawler/
    let workspace_root = std::env::var("CARGO_MANIFEST_DIR")
        .ok()
        .map(PathBuf::from)
        .and_then(|dir| dir.parent().map(PathBuf::from));

    let hash = git(&["rev-parse", "--short", "HEAD"], workspace_root.as_ref());
    let branch = git(&["rev-parse", "--abbrev-ref", "HEAD"], workspace_root.as_ref());

    let build_time = match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(dur) => format!("{}", dur.as_secs()),
        Err(_) => "unknown".to_string(),
    };

    println!("cargo:rustc-env=GIT_HASH={}", hash);
    println!("cargo:rustc-env=GIT_BRANCH={}", branch);
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);
}
