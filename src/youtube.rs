#![forbid(unsafe_code)]

//! Thin blocking client for the three YouTube Data API endpoints the catalog
//! needs, plus the serde mirrors of their responses.
//!
//! Only the fields we read are declared. Everything is optional on the wire, so
//! absent objects decode to `None`/empty instead of failing the whole page.
//! A `null` item list reads as an empty one.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use ureq::{Agent, AgentBuilder};

use crate::channel::ChannelReference;
use crate::error::{FetchError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Upper bound the API accepts for `maxResults` and for ids per video lookup.
pub const MAX_PAGE_SIZE: usize = 50;

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelItem {
    pub id: Option<String>,
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelatedPlaylists {
    pub uploads: Option<String>,
}

impl ChannelItem {
    pub fn uploads_playlist(&self) -> Option<&str> {
        self.content_details
            .as_ref()?
            .related_playlists
            .as_ref()?
            .uploads
            .as_deref()
            .filter(|uploads| !uploads.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemListResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<PlaylistItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    pub video_id: Option<String>,
}

impl PlaylistItem {
    pub fn video_id(&self) -> Option<&str> {
        self.content_details
            .as_ref()?
            .video_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    #[serde(default)]
    pub id: String,
    pub content_details: Option<VideoContentDetails>,
    pub snippet: Option<VideoSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoSnippet {
    pub title: Option<String>,
}

/// The upstream calls the catalog pipeline is built on. Calls block the
/// calling thread until the platform answers.
pub trait VideoPlatform: Send + Sync {
    /// Looks up a channel's id and related playlists.
    fn channels(&self, reference: &ChannelReference) -> Result<ChannelListResponse>;

    /// Fetches one page of a playlist. `page_token` is `None` for the first
    /// page.
    fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse>;

    /// Fetches duration and title for at most [`MAX_PAGE_SIZE`] ids.
    fn videos(&self, ids: &[String]) -> Result<VideoListResponse>;
}

pub struct YouTubeClient {
    agent: Agent,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout: Duration) -> Self {
        Self {
            agent: AgentBuilder::new().timeout(timeout).build(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        let request = params
            .iter()
            .fold(self.agent.get(&url), |request, (name, value)| {
                request.query(name, value)
            })
            .query("key", &self.api_key);

        let response = request.call()?;
        response.into_json::<T>().map_err(|err| {
            FetchError::Upstream(format!("Invalid response from video platform: {err}"))
        })
    }
}

impl VideoPlatform for YouTubeClient {
    fn channels(&self, reference: &ChannelReference) -> Result<ChannelListResponse> {
        let (selector, value) = reference.lookup_param();
        self.get_json("channels", &[("part", "id,contentDetails"), (selector, value)])
    }

    fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse> {
        let max_results = MAX_PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get_json("playlistItems", &params)
    }

    fn videos(&self, ids: &[String]) -> Result<VideoListResponse> {
        let joined = ids.join(",");
        self.get_json("videos", &[("part", "contentDetails,snippet"), ("id", joined.as_str())])
    }
}
