use std::fs;
use std::path::{Path, PathBuf};

const ALLOWED_SUBMIT_CALLERS: &[&str] = &["src/strategy/claimer.rs"];

fn collect_rust_files(root: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rust_files(&path, out);
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) == Some("rs") {
            out.push(path);
        }
    }
}

fn source_files() -> (PathBuf, Vec<PathBuf>) {
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut files = Vec::new();
    collect_rust_files(&repo_root.join("src"), &mut files);
    (repo_root, files)
}

fn relative(repo_root: &Path, file: &Path) -> String {
    file.strip_prefix(repo_root)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

#[test]
fn claim_submission_only_happens_in_scheduler() {
    let (repo_root, files) = source_files();

    let mut offenders = Vec::new();
    for file in files {
        let rel = relative(&repo_root, &file);
        let content = fs::read_to_string(&file).unwrap_or_default();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if !trimmed.contains(".submit_claim(") {
                continue;
            }
            if ALLOWED_SUBMIT_CALLERS.iter().any(|allowed| *allowed == rel) {
                continue;
            }
            offenders.push(format!("{rel}:{}: {}", idx + 1, trimmed));
        }
    }

    assert!(
        offenders.is_empty(),
        "claim submission outside the scheduler:\n{}",
        offenders.join("\n")
    );
}

#[test]
fn scheduler_never_reschedules_recursively() {
    let (repo_root, files) = source_files();
    let claimer = files
        .iter()
        .find(|f| relative(&repo_root, f) == "src/strategy/claimer.rs")
        .expect("scheduler source should exist");
    let content = fs::read_to_string(claimer).expect("scheduler source should be readable");
    let production = content.split("#[cfg(test)]").next().unwrap_or_default();

    assert!(production.contains("loop {"));
    assert!(!production.contains("tokio::spawn("));
    assert!(!production.contains("Box::pin(self.run"));
}
