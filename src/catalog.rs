#![forbid(unsafe_code)]

//! Channel URL to video list pipeline.
//!
//! Every stage feeds the next, so a request runs them strictly one after the
//! other and the first failure aborts the whole request. Nothing is retried
//! and partial results are dropped.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::channel::{ChannelReference, parse_channel_url};
use crate::error::{FetchError, Result};
use crate::filter::{Category, VideoResult, select_videos};
use crate::youtube::{MAX_PAGE_SIZE, VideoItem, VideoPlatform};

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("duration pattern compiles")
});

/// Where a channel keeps its uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadsHandle {
    pub channel_id: String,
    pub uploads_playlist_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetail {
    pub id: String,
    pub title: String,
    /// `0` means the duration was missing or unreadable.
    pub duration_seconds: u64,
}

/// Resolves a channel reference with a single channel lookup. Only the first
/// returned channel is considered.
pub fn resolve_uploads(
    platform: &dyn VideoPlatform,
    reference: &ChannelReference,
) -> Result<UploadsHandle> {
    let response = platform.channels(reference)?;
    let channel = response
        .items
        .into_iter()
        .next()
        .ok_or(FetchError::ChannelNotFound)?;
    let uploads_playlist_id = channel
        .uploads_playlist()
        .ok_or(FetchError::MissingUploads)?
        .to_string();

    Ok(UploadsHandle {
        channel_id: channel.id.unwrap_or_default(),
        uploads_playlist_id,
    })
}

/// Walks the uploads playlist page by page until the platform stops handing
/// out continuation tokens. Ids keep playlist order.
pub fn list_upload_ids(platform: &dyn VideoPlatform, handle: &UploadsHandle) -> Result<Vec<String>> {
    let mut video_ids = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = platform.playlist_items(&handle.uploads_playlist_id, page_token.as_deref())?;
        let before = video_ids.len();
        video_ids.extend(
            page.items
                .iter()
                .filter_map(|item| item.video_id().map(str::to_string)),
        );
        let skipped = page.items.len() - (video_ids.len() - before);
        if skipped > 0 {
            debug!(
                "Skipped {skipped} playlist entries without a video id in {}",
                handle.uploads_playlist_id
            );
        }

        match page.next_page_token.filter(|token| !token.is_empty()) {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(video_ids)
}

/// Fetches title and duration for `video_ids` in batches of
/// [`MAX_PAGE_SIZE`]. Videos the platform does not return are left out.
pub fn fetch_video_details(
    platform: &dyn VideoPlatform,
    video_ids: &[String],
) -> Result<Vec<VideoDetail>> {
    let mut details = Vec::with_capacity(video_ids.len());

    for batch in video_ids.chunks(MAX_PAGE_SIZE) {
        let response = platform.videos(batch)?;
        if response.items.len() < batch.len() {
            debug!(
                "Video lookup returned {} of {} requested ids",
                response.items.len(),
                batch.len()
            );
        }
        details.extend(response.items.into_iter().map(VideoDetail::from));
    }

    Ok(details)
}

impl From<VideoItem> for VideoDetail {
    fn from(item: VideoItem) -> Self {
        let duration_seconds = item
            .content_details
            .and_then(|details| details.duration)
            .map(|raw| duration_to_seconds(&raw))
            .unwrap_or(0);
        VideoDetail {
            id: item.id,
            title: item.snippet.and_then(|snippet| snippet.title).unwrap_or_default(),
            duration_seconds,
        }
    }
}

/// Converts `PT#H#M#S` durations into seconds. Missing components count as
/// zero and anything the pattern does not find yields `0`.
pub fn duration_to_seconds(raw: &str) -> u64 {
    let Some(captures) = DURATION_PATTERN.captures(raw) else {
        return 0;
    };
    let component = |index: usize| {
        captures
            .get(index)
            .and_then(|value| value.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    component(1)
        .saturating_mul(3600)
        .saturating_add(component(2).saturating_mul(60))
        .saturating_add(component(3))
}

/// Everything a single `/api/videos` request does once its inputs are
/// validated.
pub fn fetch_channel_videos(
    platform: &dyn VideoPlatform,
    channel_url: &str,
    category: Category,
) -> Result<Vec<VideoResult>> {
    let reference = parse_channel_url(channel_url)?;
    let handle = resolve_uploads(platform, &reference)?;
    let video_ids = list_upload_ids(platform, &handle)?;
    if video_ids.is_empty() {
        debug!("Channel {} has no uploads", handle.channel_id);
        return Ok(Vec::new());
    }

    let details = fetch_video_details(platform, &video_ids)?;
    let videos = select_videos(details, category);
    debug!(
        "Channel {}: {} uploads, {} videos after {:?} filter",
        handle.channel_id,
        video_ids.len(),
        videos.len(),
        category
    );
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::fake::{FakePlatform, channel_with_uploads};
    use crate::youtube::{PlaylistItem, PlaylistItemListResponse, VideoContentDetails};

    fn numbered_uploads(count: usize) -> Vec<(String, Option<&'static str>)> {
        (0..count)
            .map(|index| (format!("vid{index:03}"), Some("PT2M")))
            .collect()
    }

    fn platform_with(uploads: &[(String, Option<&'static str>)]) -> FakePlatform {
        let borrowed: Vec<(&str, Option<&str>)> = uploads
            .iter()
            .map(|(id, duration)| (id.as_str(), *duration))
            .collect();
        FakePlatform::with_uploads(&borrowed)
    }

    fn handle() -> UploadsHandle {
        UploadsHandle {
            channel_id: "UCfake".into(),
            uploads_playlist_id: "UUfake".into(),
        }
    }

    #[test]
    fn duration_decoding_handles_partial_components() {
        assert_eq!(duration_to_seconds("PT1M30S"), 90);
        assert_eq!(duration_to_seconds("PT2H"), 7200);
        assert_eq!(duration_to_seconds("PT45S"), 45);
        assert_eq!(duration_to_seconds("PT1H2M3S"), 3723);
        assert_eq!(duration_to_seconds("PT0S"), 0);
    }

    #[test]
    fn duration_decoding_falls_back_to_zero() {
        assert_eq!(duration_to_seconds(""), 0);
        assert_eq!(duration_to_seconds("garbage"), 0);
        assert_eq!(duration_to_seconds("P1D"), 0);
        assert_eq!(duration_to_seconds("PT"), 0);
    }

    #[test]
    fn day_prefixed_durations_decode_to_zero() {
        assert_eq!(duration_to_seconds("P1DT2M"), 0);
        assert_eq!(duration_to_seconds("P0DT1M5S"), 0);
    }

    #[test]
    fn resolver_returns_uploads_handle() {
        let platform = FakePlatform::with_uploads(&[]);
        let reference = ChannelReference::Handle("@creator".into());

        let handle = resolve_uploads(&platform, &reference).unwrap();
        assert_eq!(handle.channel_id, "UCfake");
        assert_eq!(handle.uploads_playlist_id, "UUfake");
        assert_eq!(*platform.channel_lookups.lock().unwrap(), vec![reference]);
    }

    #[test]
    fn resolver_reports_unknown_channel() {
        let mut platform = FakePlatform::with_uploads(&[]);
        platform.channel = None;

        let err = resolve_uploads(&platform, &ChannelReference::ChannelId("UCx".into())).unwrap_err();
        assert!(matches!(err, FetchError::ChannelNotFound));
        assert_eq!(err.to_string(), "Channel not found for this URL.");
    }

    #[test]
    fn resolver_reports_missing_uploads_playlist() {
        let mut platform = FakePlatform::with_uploads(&[]);
        platform.channel = Some(channel_with_uploads(None));

        let err = resolve_uploads(&platform, &ChannelReference::Username("old".into())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find uploads playlist for this channel."
        );
    }

    #[test]
    fn enumerator_follows_continuation_tokens() {
        let uploads = numbered_uploads(120);
        let platform = platform_with(&uploads);

        let ids = list_upload_ids(&platform, &handle()).unwrap();
        assert_eq!(platform.page_calls(), 3);
        assert_eq!(
            *platform.page_requests.lock().unwrap(),
            vec![None, Some("page-1".to_string()), Some("page-2".to_string())]
        );
        let expected: Vec<String> = uploads.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn enumerator_skips_entries_without_video_id() {
        let mut platform = FakePlatform::with_uploads(&[("a", Some("PT1S")), ("b", Some("PT1S"))]);
        platform.pages[0].items.insert(1, PlaylistItem::default());

        let ids = list_upload_ids(&platform, &handle()).unwrap();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn enumerator_stops_on_empty_token() {
        let mut platform = FakePlatform::with_uploads(&[("a", None)]);
        platform.pages[0].next_page_token = Some(String::new());
        platform.pages.push(PlaylistItemListResponse::default());

        let ids = list_upload_ids(&platform, &handle()).unwrap();
        assert_eq!(ids, vec!["a".to_string()]);
        assert_eq!(platform.page_calls(), 1);
    }

    #[test]
    fn batcher_splits_into_upstream_sized_chunks() {
        let uploads = numbered_uploads(120);
        let platform = platform_with(&uploads);
        let ids: Vec<String> = uploads.into_iter().map(|(id, _)| id).collect();

        let details = fetch_video_details(&platform, &ids).unwrap();
        assert_eq!(platform.batch_sizes(), vec![50, 50, 20]);
        let returned: Vec<String> = details.iter().map(|detail| detail.id.clone()).collect();
        assert_eq!(returned, ids);
        assert!(details.iter().all(|detail| detail.duration_seconds == 120));
    }

    #[test]
    fn batcher_drops_videos_the_platform_omits() {
        let mut platform = FakePlatform::with_uploads(&[("a", Some("PT5S")), ("b", Some("PT6S"))]);
        platform.details.remove("a");

        let details =
            fetch_video_details(&platform, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, "b");
        assert_eq!(details[0].title, "Video b");
        assert_eq!(details[0].duration_seconds, 6);
    }

    #[test]
    fn video_detail_defaults_missing_fields() {
        let detail = VideoDetail::from(VideoItem {
            id: "x".into(),
            content_details: Some(VideoContentDetails { duration: None }),
            snippet: None,
        });
        assert_eq!(detail.title, "");
        assert_eq!(detail.duration_seconds, 0);
    }

    #[test]
    fn pipeline_filters_shorts_end_to_end() {
        let platform = FakePlatform::with_uploads(&[
            ("short", Some("PT30S")),
            ("long", Some("PT1M30S")),
            ("unknown", None),
        ]);

        let videos = fetch_channel_videos(
            &platform,
            "https://www.youtube.com/channel/UCabc",
            Category::Shorts,
        )
        .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, "short");
        assert_eq!(videos[0].duration_seconds, 30);
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=short");
        assert_eq!(
            *platform.channel_lookups.lock().unwrap(),
            vec![ChannelReference::ChannelId("UCabc".into())]
        );
    }

    #[test]
    fn pipeline_skips_detail_lookup_for_empty_channel() {
        let platform = FakePlatform::with_uploads(&[]);

        let videos =
            fetch_channel_videos(&platform, "https://www.youtube.com/@quiet", Category::All).unwrap();
        assert!(videos.is_empty());
        assert_eq!(platform.page_calls(), 1);
        assert!(platform.batch_sizes().is_empty());
    }

    #[test]
    fn pipeline_stops_before_upstream_on_bad_url() {
        let platform = FakePlatform::with_uploads(&[]);

        let err = fetch_channel_videos(&platform, "::nope::", Category::All).unwrap_err();
        assert_eq!(err.to_string(), "Invalid channel URL.");
        assert!(platform.channel_lookups.lock().unwrap().is_empty());
    }

    #[test]
    fn pipeline_propagates_upstream_failures() {
        let mut platform = FakePlatform::with_uploads(&[("a", Some("PT5S"))]);
        platform.fail_videos = Some("Request failed with status code 403".into());

        let err = fetch_channel_videos(&platform, "https://www.youtube.com/@a", Category::All)
            .unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status code 403");
    }
}
