use anyhow::{Context, Result};
use collinear::{CollinearCfg, KeyPolicy, RunStats};
use serde::Serialize;
use serde_json::json;
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run parameters recorded next to an output file.
#[derive(Debug, Serialize)]
pub struct Payload {
    pub input: String,
    pub rel_tol: f64,
    pub abs_tol: f64,
    pub min_points: usize,
    pub tolerant_keys: bool,
    pub stats: Stats,
    pub lines_emitted: usize,
}

/// Serializable mirror of `RunStats`.
#[derive(Debug, Serialize)]
pub struct Stats {
    pub points: usize,
    pub pairs: usize,
    pub degenerate_pairs: usize,
    pub lines_discovered: usize,
    pub points_added: usize,
}

impl From<RunStats> for Stats {
    fn from(s: RunStats) -> Self {
        Self {
            points: s.points,
            pairs: s.pairs,
            degenerate_pairs: s.degenerate_pairs,
            lines_discovered: s.lines_discovered,
            points_added: s.points_added,
        }
    }
}

impl Payload {
    pub fn new(input: String, cfg: &CollinearCfg, stats: RunStats, lines_emitted: usize) -> Self {
        Self {
            input,
            rel_tol: cfg.rel_tol,
            abs_tol: cfg.abs_tol,
            min_points: cfg.min_points,
            tolerant_keys: cfg.keys == KeyPolicy::Tolerant,
            stats: stats.into(),
            lines_emitted,
        }
    }
}

/// Write `<artifact-stem>.provenance.json` containing the git commit, callsite, params, and outputs.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: &Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let provenance_path = provenance_path(artifact);
    if let Some(parent) = provenance_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let params = serde_json::to_value(payload)?;
    let doc = json!({
        "code_rev": current_git_rev(),
        "version": collinear::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "params": params,
        "outputs": [artifact.to_string_lossy()]
    });
    fs::write(&provenance_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", provenance_path.display()))?;
    Ok(provenance_path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    let mut name = stem;
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

pub fn current_git_rev() -> String {
    if let Some(from_env) = option_env!("GIT_COMMIT") {
        if !from_env.is_empty() {
            return from_env.to_string();
        }
    }
    if let Ok(env_override) = std::env::var("GIT_COMMIT") {
        if !env_override.is_empty() {
            return env_override;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}
