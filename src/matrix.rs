use camino::Utf8Path;

use crate::abundance::SourcePortions;
use crate::domain::GridPoint;
use crate::error::TuneError;
use crate::fs_util::write_bytes_atomic;

const PARAMETER_ROWS: [&str; 3] = ["limit_threshold", "query_coverage", "percent_identity"];

/// Accumulates one column per grid iteration: source portions on top, the
/// three literal parameter values underneath. The label column is fixed by
/// the first iteration; later iterations must match it.
#[derive(Debug, Clone, Default)]
pub struct TuneMatrix {
    labels: Vec<String>,
    columns: Vec<Column>,
}

#[derive(Debug, Clone)]
struct Column {
    header: String,
    values: Vec<f64>,
}

impl TuneMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_column(
        &mut self,
        iteration: usize,
        portions: &SourcePortions,
        point: GridPoint,
    ) -> Result<(), TuneError> {
        if self.columns.is_empty() {
            self.labels = portions
                .portions
                .iter()
                .map(|p| p.source.clone())
                .collect();
            self.labels
                .extend(PARAMETER_ROWS.iter().map(|row| row.to_string()));
        } else {
            let expected = self.labels.len() - PARAMETER_ROWS.len();
            if portions.portions.len() != expected {
                return Err(TuneError::MatrixShape(format!(
                    "iteration {iteration} produced {} sources, expected {expected}",
                    portions.portions.len()
                )));
            }
            for (label, portion) in self.labels.iter().zip(&portions.portions) {
                if label != &portion.source {
                    return Err(TuneError::MatrixShape(format!(
                        "iteration {iteration} reported source {} where {label} was expected",
                        portion.source
                    )));
                }
            }
        }

        let mut values: Vec<f64> = portions.portions.iter().map(|p| p.portion).collect();
        values.push(point.limit_threshold);
        values.push(point.query_coverage);
        values.push(point.percent_identity);
        self.columns.push(Column {
            header: format!("iteration {iteration}"),
            values,
        });
        Ok(())
    }

    pub fn iterations(&self) -> usize {
        self.columns.len()
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, TuneError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["Source".to_string()];
        header.extend(self.columns.iter().map(|column| column.header.clone()));
        writer
            .write_record(&header)
            .map_err(|err| TuneError::Filesystem(err.to_string()))?;
        for (row, label) in self.labels.iter().enumerate() {
            let mut record = vec![label.clone()];
            record.extend(self.columns.iter().map(|column| column.values[row].to_string()));
            writer
                .write_record(&record)
                .map_err(|err| TuneError::Filesystem(err.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|err| TuneError::Filesystem(err.to_string()))
    }

    pub fn write_csv(&self, path: &Utf8Path) -> Result<(), TuneError> {
        let bytes = self.to_csv_bytes()?;
        write_bytes_atomic(path, &bytes)
    }
}
