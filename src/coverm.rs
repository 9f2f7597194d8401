use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::info;

use crate::config::TuneConfig;
use crate::domain::GridPoint;
use crate::error::TuneError;

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub coverm: Option<String>,
}

/// Boundary to the coverage-filtering tool. One call filters the shared BAM
/// for a single grid point and leaves a dense per-genome table at the
/// configured fixed path.
pub trait FilterClient: Send + Sync {
    fn filter(&self, config: &TuneConfig, point: GridPoint) -> Result<(), TuneError>;
    fn tool_info(&self) -> ToolInfo;
}

#[derive(Debug, Clone)]
pub enum FilterToolStatus {
    Ready,
    Missing { message: String },
}

#[derive(Clone)]
pub struct SystemCovermClient {
    coverm: Option<PathBuf>,
}

impl SystemCovermClient {
    pub fn new() -> Self {
        Self {
            coverm: find_in_path("coverm"),
        }
    }

    pub fn tool_status(&self) -> FilterToolStatus {
        if self.coverm.is_none() {
            return FilterToolStatus::Missing {
                message: "missing coverm (CoverM coverage calculator)".to_string(),
            };
        }
        FilterToolStatus::Ready
    }

    fn require_coverm(&self) -> Result<&PathBuf, TuneError> {
        self.coverm
            .as_ref()
            .ok_or_else(|| TuneError::MissingTool("coverm".to_string()))
    }

    fn run_cmd(&self, program: &Path, args: &[String]) -> Result<(), TuneError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| TuneError::FilterFailed(err.to_string()))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("command failed: {}", program.display())
        } else {
            stderr
        };
        Err(TuneError::FilterFailed(message))
    }
}

impl Default for SystemCovermClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterClient for SystemCovermClient {
    fn filter(&self, config: &TuneConfig, point: GridPoint) -> Result<(), TuneError> {
        let coverm = self.require_coverm()?;
        info!("filtering read mapping results ({point})");
        self.run_cmd(coverm.as_path(), &filter_args(config, point))
    }

    fn tool_info(&self) -> ToolInfo {
        ToolInfo {
            coverm: self
                .coverm
                .as_ref()
                .and_then(|path| tool_version(path, &["--version"])),
        }
    }
}

/// Builds the `coverm genome` invocation for one grid point. Thresholds are
/// fractions on the grid but percentages on the tool's command line; trim
/// bounds are symmetric and only requested for a nonzero limit threshold.
pub fn filter_args(config: &TuneConfig, point: GridPoint) -> Vec<String> {
    let mut args = vec![
        "genome".to_string(),
        "-b".to_string(),
        config.mappings_bam().to_string(),
        "--genome-definition".to_string(),
        config.genome_definition().to_string(),
        "--min-read-percent-identity".to_string(),
        (point.percent_identity * 100.0).to_string(),
        "--min-read-aligned-percent".to_string(),
        (point.query_coverage * 100.0).to_string(),
        "--output-format".to_string(),
        "dense".to_string(),
        "-t".to_string(),
        config.threads.to_string(),
        "-m".to_string(),
    ];
    if config.use_geq {
        // Absolute quantification needs the depth metric plus its spread.
        if point.trims_coverage() {
            args.push("trimmed_mean".to_string());
        } else {
            args.push("mean".to_string());
        }
        args.push("covered_bases".to_string());
        args.push("variance".to_string());
    } else {
        args.push("relative_abundance".to_string());
    }
    if point.trims_coverage() {
        args.push("--trim-min".to_string());
        args.push((point.limit_threshold * 100.0).to_string());
        args.push("--trim-max".to_string());
        args.push((100.0 - point.limit_threshold * 100.0).to_string());
    }
    args.push("-o".to_string());
    args.push(config.filtered_table().to_string());
    args
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}

fn tool_version(path: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(path).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() { None } else { Some(stdout) }
}
