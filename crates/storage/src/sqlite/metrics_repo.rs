use async_trait::async_trait;
use creator_core::model::{CreatorCounters, OwnerHandle};
use sqlx::SqlitePool;

use super::SqliteRepository;
use super::mapping::{conn, i64_from_u64, map_counters_row};
use crate::repository::{MetricsRepository, StorageError};

#[async_trait]
impl MetricsRepository for SqliteRepository {
    async fn get_counters(
        &self,
        owner: &OwnerHandle,
    ) -> Result<Option<CreatorCounters>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    total_diamonds, monthly_diamonds, diamonds_today,
                    live_days, live_seconds, silver_target, gold_target, status
                FROM creator_counters
                WHERE owner = ?1
            ",
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_counters_row).transpose()
    }
}

pub(super) async fn put_counters(
    pool: &SqlitePool,
    owner: &OwnerHandle,
    counters: &CreatorCounters,
) -> Result<(), StorageError> {
    let silver = counters
        .silver_target
        .map(|v| i64_from_u64("silver_target", v))
        .transpose()?;
    let gold = counters
        .gold_target
        .map(|v| i64_from_u64("gold_target", v))
        .transpose()?;

    sqlx::query(
        r"
            INSERT INTO creator_counters (
                owner, total_diamonds, monthly_diamonds, diamonds_today,
                live_days, live_seconds, silver_target, gold_target, status
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(owner) DO UPDATE SET
                total_diamonds = excluded.total_diamonds,
                monthly_diamonds = excluded.monthly_diamonds,
                diamonds_today = excluded.diamonds_today,
                live_days = excluded.live_days,
                live_seconds = excluded.live_seconds,
                silver_target = excluded.silver_target,
                gold_target = excluded.gold_target,
                status = excluded.status
        ",
    )
    .bind(owner.as_str())
    .bind(i64_from_u64("total_diamonds", counters.total_diamonds)?)
    .bind(i64_from_u64("monthly_diamonds", counters.monthly_diamonds)?)
    .bind(i64_from_u64("diamonds_today", counters.diamonds_today)?)
    .bind(i64::from(counters.live_days))
    .bind(i64_from_u64("live_seconds", counters.live_seconds)?)
    .bind(silver)
    .bind(gold)
    .bind(counters.status.as_deref())
    .execute(pool)
    .await
    .map_err(conn)?;

    Ok(())
}
