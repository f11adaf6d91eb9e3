use crate::raster::SubsampleRatio;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported YCbCr subsample ratio: {0}")]
    UnsupportedSubsampleRatio(SubsampleRatio),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn error_code(&self) -> i32 {
        match self {
            Error::Io(_) => -1,
            Error::UnsupportedSubsampleRatio(_) => -2,
            Error::Config(_) => -3,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
