use creator_core::model::{
    CreatorCounters, OwnerHandle, ProgressRecord, VideoId, VideoMeta,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn i64_from_u64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn opt_u64(row: &SqliteRow, field: &'static str) -> Result<Option<u64>, StorageError> {
    row.try_get::<Option<i64>, _>(field)
        .map_err(ser)?
        .map(|v| u64_from_i64(field, v))
        .transpose()
}

fn req_u64(row: &SqliteRow, field: &'static str) -> Result<u64, StorageError> {
    u64_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let owner = OwnerHandle::parse(row.try_get::<String, _>("owner").map_err(ser)?).map_err(ser)?;
    let video_id =
        VideoId::parse(row.try_get::<String, _>("video_id").map_err(ser)?).map_err(ser)?;
    let completed: bool = row.try_get("completed").map_err(ser)?;
    let watched_seconds = u32_from_i64(
        "watched_seconds",
        row.try_get::<i64, _>("watched_seconds").map_err(ser)?,
    )?;

    Ok(ProgressRecord {
        video_id,
        owner,
        completed,
        watched_seconds,
    })
}

pub(crate) fn map_counters_row(row: &SqliteRow) -> Result<CreatorCounters, StorageError> {
    Ok(CreatorCounters {
        total_diamonds: req_u64(row, "total_diamonds")?,
        monthly_diamonds: req_u64(row, "monthly_diamonds")?,
        diamonds_today: req_u64(row, "diamonds_today")?,
        live_days: u32_from_i64("live_days", row.try_get::<i64, _>("live_days").map_err(ser)?)?,
        live_seconds: req_u64(row, "live_seconds")?,
        silver_target: opt_u64(row, "silver_target")?,
        gold_target: opt_u64(row, "gold_target")?,
        status: row.try_get("status").map_err(ser)?,
    })
}

pub(crate) fn map_video_row(row: &SqliteRow) -> Result<VideoMeta, StorageError> {
    let id = VideoId::parse(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?;
    let duration_seconds = row
        .try_get::<Option<i64>, _>("duration_seconds")
        .map_err(ser)?
        .map(|v| u32_from_i64("duration_seconds", v))
        .transpose()?;

    Ok(VideoMeta {
        id,
        title: row.try_get("title").map_err(ser)?,
        duration_seconds,
    })
}
