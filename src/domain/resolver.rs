//! Path normalization and identity keys
//!
//! Every favorite is identified by the key of its absolute path. Keys are
//! the lexically normalized path, lower-cased when the host filesystem
//! ignores case. The case policy is fixed once per process.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// How the host filesystem compares names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasePolicy {
    Sensitive,
    Insensitive,
}

impl CasePolicy {
    /// Builds a policy from a config flag
    pub fn from_insensitive(insensitive: bool) -> Self {
        if insensitive {
            CasePolicy::Insensitive
        } else {
            CasePolicy::Sensitive
        }
    }

    pub fn is_insensitive(self) -> bool {
        self == CasePolicy::Insensitive
    }
}

static CASE_POLICY: OnceLock<CasePolicy> = OnceLock::new();

/// Pins the case policy before first use.
///
/// Returns `false` when the policy was already fixed (by an earlier call or
/// by a key lookup that triggered detection).
pub fn init_case_policy(policy: CasePolicy) -> bool {
    CASE_POLICY.set(policy).is_ok()
}

/// Returns the process-wide case policy, detecting it on first call
pub fn case_policy() -> CasePolicy {
    *CASE_POLICY.get_or_init(detect_case_policy)
}

/// Probes the temp directory with a mixed-case file name
fn detect_case_policy() -> CasePolicy {
    let dir = std::env::temp_dir();
    let probe = dir.join(format!("favs-CaseProbe-{}", std::process::id()));
    let folded = dir.join(format!("favs-caseprobe-{}", std::process::id()));

    let detected = match fs::write(&probe, b"") {
        Ok(()) => {
            let insensitive = folded.exists();
            let _ = fs::remove_file(&probe);
            Some(CasePolicy::from_insensitive(insensitive))
        }
        Err(_) => None,
    };

    let policy = detected.unwrap_or_else(|| {
        CasePolicy::from_insensitive(cfg!(any(windows, target_os = "macos")))
    });
    tracing::debug!(?policy, "Detected filesystem case policy");
    policy
}

/// Lexically normalizes a path.
///
/// Drops `.` segments, resolves `..` against preceding segments without
/// climbing above the root, and collapses separators. Input that cannot be
/// a path (embedded NUL) comes back unchanged.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    if path.contains('\0') {
        return path.to_string();
    }

    let mut out = PathBuf::new();
    let mut has_root = false;
    let mut depth = 0usize;

    for component in Path::new(path).components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => {
                has_root = true;
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !has_root {
                    out.push("..");
                }
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        return ".".to_string();
    }

    match out.into_os_string().into_string() {
        Ok(normalized) => normalized,
        Err(_) => path.to_string(),
    }
}

/// Computes the identity key under an explicit policy
pub fn key_with_policy(path: &str, policy: CasePolicy) -> String {
    let normalized = normalize(path);
    match policy {
        CasePolicy::Insensitive => normalized.to_lowercase(),
        CasePolicy::Sensitive => normalized,
    }
}

/// Computes the identity key under the process-wide policy
pub fn key_for(path: &str) -> String {
    key_with_policy(path, case_policy())
}

/// Makes a user-supplied path absolute and normalized.
///
/// Returns `None` for blank, non-UTF-8 or otherwise unusable input.
pub fn absolutize(path: &Path) -> Option<String> {
    let text = path.to_str()?;
    if text.trim().is_empty() || text.contains('\0') {
        return None;
    }

    let absolute = std::path::absolute(path).ok()?;
    let absolute = absolute.to_str()?;
    Some(normalize(absolute))
}

/// Returns the final segment of a normalized path, or the path itself
pub fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.to_string())
}
