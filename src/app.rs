use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::abundance::{Aggregator, GenomeAbundanceTable, Normalization};
use crate::census;
use crate::config::TuneConfig;
use crate::coverm::FilterClient;
use crate::domain::ParameterGrid;
use crate::error::TuneError;
use crate::fs_util::write_bytes_atomic;
use crate::matrix::TuneMatrix;
use crate::sources::SourceMap;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct TuneResult {
    pub iterations: usize,
    pub sources: Vec<String>,
    pub rescaled_points: usize,
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub tool: String,
    pub completed_at: String,
    pub iterations: usize,
    pub use_geq: bool,
    pub correct_loq: bool,
    pub sources: Vec<String>,
    pub output: String,
}

#[derive(Clone)]
pub struct App<F: FilterClient> {
    config: TuneConfig,
    filter: F,
}

impl<F: FilterClient> App<F> {
    pub fn new(config: TuneConfig, filter: F) -> Self {
        Self { config, filter }
    }

    pub fn config(&self) -> &TuneConfig {
        &self.config
    }

    /// Runs the full sweep. Grid points execute strictly in order because
    /// every point overwrites the same fixed-path filtered table; a point is
    /// aggregated before the next one starts. Any failure aborts the sweep
    /// with no partial output.
    pub fn tune(&self, sink: &dyn ProgressSink) -> Result<TuneResult, TuneError> {
        let started = Instant::now();

        let sources = SourceMap::from_file(&self.config.source_map())?;
        let labels: Vec<String> = sources.labels().iter().map(|s| s.to_string()).collect();
        info!(
            "loaded {} genomes across {} sources",
            sources.len(),
            labels.len()
        );

        let mode = if self.config.use_geq {
            let geq = census::read_geq(&self.config.census_report())?;
            info!("normalizing to {geq} genome equivalents");
            Normalization::GenomeEquivalents {
                geq,
                correct_loq: self.config.correct_loq,
            }
        } else {
            Normalization::Relative
        };

        let aggregator = Aggregator::new(&sources);
        let grid = ParameterGrid::default();
        let total = grid.len();
        let mut matrix = TuneMatrix::new();
        let mut rescaled_points = 0;

        for (index, point) in grid.points().enumerate() {
            let iteration = index + 1;
            self.filter.filter(&self.config, point)?;
            let table = GenomeAbundanceTable::from_file(&self.config.filtered_table())?;
            let portions = aggregator.summarize(&table, mode);
            if portions.rescaled {
                rescaled_points += 1;
            }
            matrix.push_column(iteration, &portions, point)?;
            sink.event(ProgressEvent {
                message: format!("{iteration} / {total} iterations finished"),
                elapsed: Some(started.elapsed()),
            });
        }

        let output_path = self.config.output_table();
        matrix.write_csv(&output_path)?;
        self.write_metadata(&labels, total)?;
        info!("tuning matrix written to {output_path}");

        Ok(TuneResult {
            iterations: total,
            sources: labels,
            rescaled_points,
            output_path: output_path.into_string(),
        })
    }

    fn write_metadata(&self, sources: &[String], iterations: usize) -> Result<(), TuneError> {
        let metadata = RunMetadata {
            tool: format!("sourcetune {}", env!("CARGO_PKG_VERSION")),
            completed_at: chrono::Utc::now().to_rfc3339(),
            iterations,
            use_geq: self.config.use_geq,
            correct_loq: self.config.correct_loq,
            sources: sources.to_vec(),
            output: self.config.output_table().into_string(),
        };
        let content = serde_json::to_vec_pretty(&metadata)
            .map_err(|err| TuneError::Filesystem(err.to_string()))?;
        write_bytes_atomic(&self.config.run_metadata(), &content)
    }
}
