use std::fs;

use camino::Utf8Path;

use crate::error::TuneError;

// Census reports place the genome-equivalents estimate on line index 12,
// second whitespace-delimited token.
const GEQ_LINE: usize = 12;
const GEQ_TOKEN: usize = 1;

/// Reads the genome-equivalents normalization constant from a census report.
pub fn read_geq(path: &Utf8Path) -> Result<f64, TuneError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|_| TuneError::CensusRead(path.to_path_buf()))?;
    parse_geq(&content)
}

pub fn parse_geq(content: &str) -> Result<f64, TuneError> {
    let line = content.lines().nth(GEQ_LINE).ok_or_else(|| {
        TuneError::CensusParse(format!("census report has no line {GEQ_LINE}"))
    })?;
    let token = line.split_whitespace().nth(GEQ_TOKEN).ok_or_else(|| {
        TuneError::CensusParse(format!("census line {GEQ_LINE} has no field {GEQ_TOKEN}"))
    })?;
    let value: f64 = token
        .parse()
        .map_err(|_| TuneError::CensusParse(format!("invalid genome equivalents: {token}")))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(TuneError::CensusParse(format!(
            "genome equivalents must be a positive number, got {value}"
        )));
    }
    Ok(value)
}
