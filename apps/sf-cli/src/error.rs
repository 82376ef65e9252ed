use sf_gas::GasError;
use sf_results::ResultsError;
use sf_shock::ShockError;
use sf_zone::ZoneError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read case file {path}: {source}")]
    CaseIo {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid case file: {0}")]
    CaseYaml(#[from] serde_yaml::Error),

    #[error("Missing input: {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Gas(#[from] GasError),

    #[error(transparent)]
    Shock(#[from] ShockError),

    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error(transparent)]
    Results(#[from] ResultsError),
}

pub type CliResult<T> = Result<T, CliError>;
