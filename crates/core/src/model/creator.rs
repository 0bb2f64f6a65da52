use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SILVER_TARGET: u64 = 200_000;
pub const DEFAULT_GOLD_TARGET: u64 = 500_000;
pub const DEFAULT_STATUS: &str = "Rookie (New)";

const SECONDS_PER_HOUR: u64 = 3_600;

/// Raw creator counters as stored remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorCounters {
    pub total_diamonds: u64,
    pub monthly_diamonds: u64,
    pub diamonds_today: u64,
    pub live_days: u32,
    pub live_seconds: u64,
    pub silver_target: Option<u64>,
    pub gold_target: Option<u64>,
    pub status: Option<String>,
}

/// Diamond milestone a creator is working towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Silver,
    Gold,
}

impl Tier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard statistics derived from the latest `CreatorCounters`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatorStats {
    pub current_status: String,
    pub next_tier: Tier,
    pub target_amount: u64,
    pub remaining: u64,
    /// Not capped: exceeds 100 once a tier is passed and counters are stale.
    pub progress_percentage: f64,
    pub live_hours: u64,
    pub total_diamonds: u64,
    pub monthly_diamonds: u64,
    pub diamonds_today: u64,
    pub live_days: u32,
}

/// Computes tier progress from raw counters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn derive_stats(counters: &CreatorCounters) -> CreatorStats {
    let silver_target = counters.silver_target.unwrap_or(DEFAULT_SILVER_TARGET);
    let gold_target = counters.gold_target.unwrap_or(DEFAULT_GOLD_TARGET);

    let (next_tier, target_amount) = if counters.total_diamonds >= silver_target {
        (Tier::Gold, gold_target)
    } else {
        (Tier::Silver, silver_target)
    };

    let progress_percentage = if target_amount > 0 {
        counters.total_diamonds as f64 / target_amount as f64 * 100.0
    } else {
        0.0
    };

    CreatorStats {
        current_status: counters
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_STATUS.to_owned()),
        next_tier,
        target_amount,
        remaining: target_amount.saturating_sub(counters.total_diamonds),
        progress_percentage,
        live_hours: counters.live_seconds / SECONDS_PER_HOUR,
        total_diamonds: counters.total_diamonds,
        monthly_diamonds: counters.monthly_diamonds,
        diamonds_today: counters.diamonds_today,
        live_days: counters.live_days,
    }
}
