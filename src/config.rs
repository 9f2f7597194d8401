use camino::{Utf8Path, Utf8PathBuf};

/// Immutable configuration for one tuning sweep. All intermediate artifacts
/// live at fixed paths under the run directory, so two sweeps must never
/// share an `outdir`.
#[derive(Debug, Clone)]
pub struct TuneConfig {
    pub outdir: Utf8PathBuf,
    pub database: Utf8PathBuf,
    pub threads: usize,
    pub use_geq: bool,
    pub correct_loq: bool,
    pub out_file: Utf8PathBuf,
}

impl TuneConfig {
    pub fn mappings_bam(&self) -> Utf8PathBuf {
        self.outdir.join("mappings.bam")
    }

    pub fn filtered_table(&self) -> Utf8PathBuf {
        self.outdir.join("mappings_filtered.txt")
    }

    pub fn census_report(&self) -> Utf8PathBuf {
        self.outdir.join("geq.txt")
    }

    pub fn genome_definition(&self) -> Utf8PathBuf {
        self.database.join("gdef.txt")
    }

    pub fn source_map(&self) -> Utf8PathBuf {
        self.database.join("sources.txt")
    }

    pub fn output_table(&self) -> Utf8PathBuf {
        suffixed(&self.out_file, ".tune.csv")
    }

    pub fn run_metadata(&self) -> Utf8PathBuf {
        suffixed(&self.out_file, ".tune.json")
    }
}

fn suffixed(path: &Utf8Path, suffix: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}{suffix}"))
}
