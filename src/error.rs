use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteKitError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON document: {path}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document not found: {path}")]
    DocumentNotFound { path: String },

    #[error("Remote documents are not supported: {url}")]
    RemoteSourceUnsupported { url: String },

    #[error("Invalid site document {path}: {message}")]
    InvalidDocument { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },
}

impl SiteKitError {
    /// Process exit status for a run that stopped on this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SiteKitError::Config { .. } | SiteKitError::InvalidPath { .. } => 1,
            SiteKitError::Json { .. }
            | SiteKitError::DocumentNotFound { .. }
            | SiteKitError::InvalidDocument { .. } => 3,
            SiteKitError::RemoteSourceUnsupported { .. } => 4,
            SiteKitError::Io(_) => 5,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for SiteKitError {
    fn user_message(&self) -> String {
        match self {
            SiteKitError::Json { path, source } => {
                format!("Could not parse {} as JSON: {}", path, source)
            }
            SiteKitError::DocumentNotFound { path } => {
                format!("Document does not exist: {}", path)
            }
            SiteKitError::RemoteSourceUnsupported { url } => {
                format!("Cannot fetch remote document: {}", url)
            }
            SiteKitError::InvalidDocument { path, message } => {
                format!("{} is not a valid site document: {}", path, message)
            }
            SiteKitError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            SiteKitError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            SiteKitError::Json { .. } => Some(
                "Check the file for trailing commas or comments; only strict JSON is accepted.".to_string()
            ),
            SiteKitError::DocumentNotFound { .. } => Some(
                "Check the path is correct relative to the current working directory.".to_string()
            ),
            SiteKitError::RemoteSourceUnsupported { .. } => Some(
                "Download the document first and pass the local file path instead.".to_string()
            ),
            SiteKitError::InvalidDocument { .. } => Some(
                "The document must be a JSON object whose \"sites\" field is an array.".to_string()
            ),
            SiteKitError::Config { .. } => Some(
                "Check your configuration file syntax, or run with --generate-config for a fresh sample.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for SiteKitError {
    fn from(error: toml::de::Error) -> Self {
        SiteKitError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SiteKitError>;
