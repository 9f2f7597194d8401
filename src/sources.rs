use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use camino::Utf8Path;
use serde::Deserialize;

use crate::error::TuneError;

#[derive(Debug, Deserialize)]
struct SourceRecord {
    genome: String,
    source: String,
}

/// Genome-to-source assignments, loaded once per sweep from the database's
/// tab-separated `sources.txt`. Genome ids are unique; source labels are
/// shared by any number of genomes.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    by_genome: BTreeMap<String, String>,
}

impl SourceMap {
    pub fn from_file(path: &Utf8Path) -> Result<Self, TuneError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| TuneError::SourceMapRead(path.to_path_buf()))?;
        let map = Self::from_tsv(&content)?;
        if map.is_empty() {
            return Err(TuneError::EmptySourceMap(path.to_path_buf()));
        }
        Ok(map)
    }

    pub fn from_tsv(content: &str) -> Result<Self, TuneError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut by_genome = BTreeMap::new();
        for record in reader.deserialize() {
            let record: SourceRecord =
                record.map_err(|err| TuneError::SourceMapParse(err.to_string()))?;
            by_genome.insert(record.genome, record.source);
        }
        Ok(Self { by_genome })
    }

    pub fn len(&self) -> usize {
        self.by_genome.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_genome.is_empty()
    }

    pub fn source_of(&self, genome: &str) -> Option<&str> {
        self.by_genome.get(genome).map(String::as_str)
    }

    /// Distinct source labels, ascending.
    pub fn labels(&self) -> Vec<&str> {
        self.by_genome
            .values()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn genomes_for<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a str> {
        self.by_genome
            .iter()
            .filter(move |(_, label)| label.as_str() == source)
            .map(|(genome, _)| genome.as_str())
    }
}
