use std::collections::HashMap;
use std::fs;

use camino::Utf8Path;
use serde::Serialize;
use tracing::warn;

use crate::domain::default_loq;
use crate::error::TuneError;
use crate::sources::SourceMap;

/// Per-genome abundance values for one grid point, parsed from the dense
/// table left behind by the filtering tool. Only the first metric column is
/// read; repeated rows for a genome sum.
#[derive(Debug, Clone, Default)]
pub struct GenomeAbundanceTable {
    values: HashMap<String, f64>,
}

impl GenomeAbundanceTable {
    pub fn from_file(path: &Utf8Path) -> Result<Self, TuneError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| TuneError::AbundanceRead(path.to_path_buf()))?;
        Self::from_tsv(&content)
    }

    pub fn from_tsv(content: &str) -> Result<Self, TuneError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut values = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|err| TuneError::AbundanceParse(err.to_string()))?;
            let genome = record
                .get(0)
                .ok_or_else(|| TuneError::AbundanceParse("empty table row".to_string()))?;
            let field = record.get(1).ok_or_else(|| {
                TuneError::AbundanceParse(format!("row for {genome} has no metric column"))
            })?;
            let value: f64 = field.trim().parse().map_err(|_| {
                TuneError::AbundanceParse(format!("invalid abundance for {genome}: {field}"))
            })?;
            *values.entry(genome.to_string()).or_insert(0.0) += value;
        }
        Ok(Self { values })
    }

    pub fn value(&self, genome: &str) -> f64 {
        self.values.get(genome).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Normalization {
    Relative,
    GenomeEquivalents { geq: f64, correct_loq: bool },
}

#[derive(Debug, Clone, Serialize)]
pub struct SourcePortion {
    pub source: String,
    pub portion: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourcePortions {
    pub portions: Vec<SourcePortion>,
    pub rescaled: bool,
}

/// Rolls per-genome abundances up to one portion per source label.
pub struct Aggregator<'a> {
    sources: &'a SourceMap,
    loq: f64,
}

impl<'a> Aggregator<'a> {
    pub fn new(sources: &'a SourceMap) -> Self {
        Self {
            sources,
            loq: default_loq(),
        }
    }

    pub fn with_loq(sources: &'a SourceMap, loq: f64) -> Self {
        Self { sources, loq }
    }

    /// Produces one row per distinct source label, ascending, even when a
    /// label's genomes sum to zero. Portions come out as fractions of unity
    /// in both modes.
    pub fn summarize(&self, table: &GenomeAbundanceTable, mode: Normalization) -> SourcePortions {
        let mut portions: Vec<SourcePortion> = self
            .sources
            .labels()
            .into_iter()
            .map(|label| {
                let total: f64 = self
                    .sources
                    .genomes_for(label)
                    .map(|genome| {
                        let value = table.value(genome);
                        match mode {
                            Normalization::Relative => value,
                            Normalization::GenomeEquivalents { correct_loq, .. } => {
                                self.classify(value, correct_loq)
                            }
                        }
                    })
                    .sum();
                let portion = match mode {
                    Normalization::Relative => total,
                    Normalization::GenomeEquivalents { geq, .. } => total / geq,
                };
                SourcePortion {
                    source: label.to_string(),
                    portion,
                }
            })
            .collect();

        let mut rescaled = false;
        if matches!(mode, Normalization::GenomeEquivalents { .. }) {
            let sum: f64 = portions.iter().map(|p| p.portion).sum();
            if sum > 1.0 {
                // Shared divisor keeps relative proportions intact.
                for portion in &mut portions {
                    portion.portion /= sum;
                }
                rescaled = true;
                warn!(
                    "sum of genome-equivalent portions exceeds 1; portions have been rescaled"
                );
                warn!(
                    "re-run without genome-equivalent normalization to check the recovered-read \
                     percentage; below ~90% this normalization may not be robust for the dataset"
                );
            }
        }

        for portion in &mut portions {
            portion.portion /= 100.0;
        }

        SourcePortions { portions, rescaled }
    }

    // Values under the quantification limit are known underestimates; the
    // correction substitutes the limit itself. At or above the limit the
    // value passes through, and undetected genomes contribute nothing.
    fn classify(&self, value: f64, correct_loq: bool) -> f64 {
        if value >= self.loq {
            value
        } else if value > 0.0 {
            if correct_loq { self.loq } else { value }
        } else {
            0.0
        }
    }
}
