mod client;
mod http;
mod job;

pub use client::{FlyerRenderer, JobClient, parse_flyer_response};
pub use http::HttpFlyerRenderer;
pub use job::FlyerJob;
