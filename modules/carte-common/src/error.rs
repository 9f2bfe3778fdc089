use thiserror::Error;

pub type Result<T> = std::result::Result<T, CarteError>;

#[derive(Error, Debug)]
pub enum CarteError {
    /// A dataset could not be fetched (I/O failure or non-success status).
    #[error("Erreur de chargement: {resource}: {message}")]
    Load { resource: String, message: String },

    /// A dataset was fetched but is not valid JSON of the expected shape.
    #[error("Invalid data in {resource}: {message}")]
    Parse { resource: String, message: String },

    #[error("Geocoding error: {0}")]
    Geocode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CarteError {
    pub fn load(resource: impl Into<String>, message: impl ToString) -> Self {
        CarteError::Load {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(resource: impl Into<String>, message: impl ToString) -> Self {
        CarteError::Parse {
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}
