#![forbid(unsafe_code)]

use serde::Serialize;

use crate::catalog::VideoDetail;

/// Videos shorter than this many seconds count as shorts.
pub const SHORTS_MAX_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    Shorts,
    Long,
}

impl Category {
    /// Reads the `type` query value. Anything unrecognised means `All`.
    pub fn from_param(value: &str) -> Self {
        match value {
            "shorts" => Category::Shorts,
            "long" => Category::Long,
            _ => Category::All,
        }
    }

    /// A zero duration is unknown, so it is neither short nor long.
    pub fn includes(self, duration_seconds: u64) -> bool {
        match self {
            Category::All => true,
            Category::Shorts => duration_seconds > 0 && duration_seconds < SHORTS_MAX_SECONDS,
            Category::Long => duration_seconds >= SHORTS_MAX_SECONDS,
        }
    }
}

/// One entry of the `videos` array returned by `/api/videos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub id: String,
    pub title: String,
    pub duration_seconds: u64,
    pub url: String,
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Keeps the details matching `category`, in order, and attaches watch URLs.
pub fn select_videos(details: Vec<VideoDetail>, category: Category) -> Vec<VideoResult> {
    details
        .into_iter()
        .filter(|detail| category.includes(detail.duration_seconds))
        .map(|detail| VideoResult {
            url: watch_url(&detail.id),
            id: detail.id,
            title: detail.title,
            duration_seconds: detail.duration_seconds,
        })
        .collect()
}
