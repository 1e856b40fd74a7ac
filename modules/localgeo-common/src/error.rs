use thiserror::Error;

pub type Result<T> = std::result::Result<T, LocalGeoError>;

#[derive(Error, Debug)]
pub enum LocalGeoError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
