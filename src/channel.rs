#![forbid(unsafe_code)]

//! Classifies user supplied channel URLs.

use url::Url;

use crate::error::{FetchError, Result};

/// How a channel URL names its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelReference {
    /// `/channel/<UC...>`
    ChannelId(String),
    /// Legacy `/user/<name>`
    Username(String),
    /// `/@handle`, stored with the leading `@`.
    Handle(String),
}

impl ChannelReference {
    /// Query parameter and value the channel lookup endpoint expects for this
    /// kind of reference.
    pub fn lookup_param(&self) -> (&'static str, &str) {
        match self {
            ChannelReference::ChannelId(id) => ("id", id.as_str()),
            ChannelReference::Handle(handle) => ("forHandle", handle.as_str()),
            ChannelReference::Username(name) => ("forUsername", name.as_str()),
        }
    }
}

/// Parses `raw` as a URL and picks the channel reference out of its path.
///
/// Rules are tried in order: `channel/<id>`, `user/<name>`, then the first
/// segment starting with `@`.
pub fn parse_channel_url(raw: &str) -> Result<ChannelReference> {
    let url = Url::parse(raw).map_err(|_| FetchError::InvalidUrl)?;
    let segments: Vec<&str> = url
        .path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.as_slice() {
        ["channel", id, ..] => return Ok(ChannelReference::ChannelId((*id).to_string())),
        ["user", name, ..] => return Ok(ChannelReference::Username((*name).to_string())),
        _ => {}
    }

    segments
        .iter()
        .find(|segment| segment.starts_with('@'))
        .map(|handle| ChannelReference::Handle((*handle).to_string()))
        .ok_or(FetchError::UnrecognizedChannel)
}
