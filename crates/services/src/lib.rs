#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod creator_stats;
pub mod error;
pub mod flyer;
pub mod progress_tracker;
pub mod session;

pub use creator_core::Clock;

pub use app_services::AppServices;
pub use config::FlyerConfig;
pub use creator_stats::CreatorStatsService;
pub use error::{AggregateError, AppServicesError, JobError};
pub use flyer::{FlyerJob, FlyerRenderer, HttpFlyerRenderer, JobClient};
pub use progress_tracker::ProgressTracker;
pub use session::{MemorySessionProvider, SessionProvider};
