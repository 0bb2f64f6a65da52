use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::{OwnerHandle, VideoId};

/// Raw watch progress for one video, unique per `(owner, video_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub video_id: VideoId,
    pub owner: OwnerHandle,
    pub completed: bool,
    pub watched_seconds: u32,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(owner: OwnerHandle, video_id: VideoId) -> Self {
        Self {
            video_id,
            owner,
            completed: false,
            watched_seconds: 0,
        }
    }

    #[must_use]
    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }

    #[must_use]
    pub fn with_watched_seconds(mut self, seconds: u32) -> Self {
        self.watched_seconds = seconds;
        self
    }
}

/// Course video metadata used to turn watched seconds into a percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub id: VideoId,
    pub title: String,
    pub duration_seconds: Option<u32>,
}

/// Per-video progress as shown to the creator. Recomputed on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedProgress {
    pub video_id: VideoId,
    pub completed: bool,
    pub watched_seconds: u32,
    pub percentage: u8,
}

/// Completed versus total videos of a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CourseProgress {
    pub completed: usize,
    pub total: usize,
}

/// Watched share of a video, rounded and capped at 100.
///
/// Unknown or zero durations yield 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn watch_percentage(watched_seconds: u32, total_seconds: Option<u32>) -> u8 {
    match total_seconds {
        Some(total) if total > 0 => {
            let pct = (f64::from(watched_seconds) / f64::from(total) * 100.0).round();
            // Clamped to 0..=100 before the cast.
            pct.min(100.0) as u8
        }
        _ => 0,
    }
}

/// Lookup from video id to its duration.
#[derive(Debug, Clone, Default)]
pub struct DurationIndex(HashMap<VideoId, u32>);

impl DurationIndex {
    #[must_use]
    pub fn from_videos(videos: &[VideoMeta]) -> Self {
        Self(
            videos
                .iter()
                .filter_map(|v| v.duration_seconds.map(|d| (v.id.clone(), d)))
                .collect(),
        )
    }

    #[must_use]
    pub fn duration_of(&self, id: &VideoId) -> Option<u32> {
        self.0.get(id).copied()
    }
}

/// Derives display progress for each record, keeping record order.
#[must_use]
pub fn derive_progress(records: &[ProgressRecord], durations: &DurationIndex) -> Vec<DerivedProgress> {
    records
        .iter()
        .map(|record| DerivedProgress {
            video_id: record.video_id.clone(),
            completed: record.completed,
            watched_seconds: record.watched_seconds,
            percentage: watch_percentage(record.watched_seconds, durations.duration_of(&record.video_id)),
        })
        .collect()
}

/// Counts how many of `video_ids` are completed in `records`.
#[must_use]
pub fn course_progress(records: &[ProgressRecord], video_ids: &[VideoId]) -> CourseProgress {
    let completed = video_ids
        .iter()
        .filter(|id| records.iter().any(|r| &r.video_id == *id && r.completed))
        .count();
    CourseProgress {
        completed,
        total: video_ids.len(),
    }
}
