use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TuneError {
    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("read filtering failed: {0}")]
    FilterFailed(String),

    #[error("failed to read source map at {0}")]
    SourceMapRead(Utf8PathBuf),

    #[error("failed to parse source map: {0}")]
    SourceMapParse(String),

    #[error("source map at {0} contains no genome entries")]
    EmptySourceMap(Utf8PathBuf),

    #[error("failed to read census report at {0}")]
    CensusRead(Utf8PathBuf),

    #[error("failed to parse census report: {0}")]
    CensusParse(String),

    #[error("failed to read filtered mapping table at {0}")]
    AbundanceRead(Utf8PathBuf),

    #[error("failed to parse filtered mapping table: {0}")]
    AbundanceParse(String),

    #[error("inconsistent tuning matrix: {0}")]
    MatrixShape(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
