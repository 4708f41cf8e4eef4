#![forbid(unsafe_code)]

//! Failures raised while turning a channel URL into a video list.
//!
//! The `Display` text of every variant is what the HTTP client sees, so keep
//! the wording short and free of internal detail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid channel URL.")]
    InvalidUrl,

    #[error("Could not parse channel from URL.")]
    UnrecognizedChannel,

    #[error("Channel not found for this URL.")]
    ChannelNotFound,

    #[error("Could not find uploads playlist for this channel.")]
    MissingUploads,

    /// Transport failure, non-2xx status or undecodable body from the
    /// video platform.
    #[error("{0}")]
    Upstream(String),
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => {
                FetchError::Upstream(format!("Request failed with status code {code}"))
            }
            ureq::Error::Transport(transport) => FetchError::Upstream(transport.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
