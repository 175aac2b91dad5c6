use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{collection} document {id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("No items could be read from the receipt")]
    NoItemsParsed,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Malformed document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
