//! Error types for Slidecast Core

use crate::{ProviderKind, SlideId};
use thiserror::Error;

/// Result type alias for video operations
pub type Result<T> = std::result::Result<T, Error>;

/// Video integration error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Source errors
    #[error("Invalid video source for slide {slide}: {raw:?}")]
    InvalidSource { slide: SlideId, raw: String },

    // Provider errors
    #[error("{provider} SDK unavailable: {reason}")]
    SdkUnavailable { provider: ProviderKind, reason: String },

    #[error("{provider} SDK error: {message}")]
    Sdk { provider: ProviderKind, message: String },

    // Internal errors
    #[error("Race resolution fault: {0}")]
    RaceResolutionFault(String),

    #[error("Unknown slide: {0}")]
    UnknownSlide(SlideId),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an SDK error
    pub fn sdk(provider: ProviderKind, msg: impl Into<String>) -> Self {
        Error::Sdk {
            provider,
            message: msg.into(),
        }
    }

    /// Returns true if the carousel can keep running after this error.
    ///
    /// Every provider-side failure only disables video on the affected
    /// slide. A race fault means two adapters were alive for one slide.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::RaceResolutionFault(_))
    }

    /// Returns the error code carried by `video:error` events
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidSource { .. } => "INVALID_SOURCE",
            Error::SdkUnavailable { .. } => "SDK_UNAVAILABLE",
            Error::Sdk { .. } => "SDK_ERROR",
            Error::RaceResolutionFault(_) => "RACE_FAULT",
            Error::UnknownSlide(_) => "UNKNOWN_SLIDE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
