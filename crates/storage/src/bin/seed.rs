use std::fmt;

use creator_core::model::{CreatorCounters, OwnerHandle, ProgressRecord, VideoId, VideoMeta};
use storage::repository::{ProgressRepository, Storage};
use storage::sqlite::SqliteRepository;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    owner: String,
    total_diamonds: u64,
    live_seconds: u64,
    watched: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse::<T>()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("CREATOR_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3?mode=rwc".into());
        let mut owner = std::env::var("CREATOR_OWNER").unwrap_or_else(|_| "demo".into());
        let mut total_diamonds = 120_000;
        let mut live_seconds = 90_000;
        let mut watched = 2;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--owner" => owner = require_value(&mut args, "--owner")?,
                "--diamonds" => {
                    total_diamonds = parse_number(require_value(&mut args, "--diamonds")?, "--diamonds")?;
                }
                "--live-seconds" => {
                    live_seconds =
                        parse_number(require_value(&mut args, "--live-seconds")?, "--live-seconds")?;
                }
                "--watched" => {
                    watched = parse_number(require_value(&mut args, "--watched")?, "--watched")?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            owner,
            total_diamonds,
            live_seconds,
            watched,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3?mode=rwc)");
    eprintln!("  --owner <handle>          Creator handle to seed (default: demo)");
    eprintln!("  --diamonds <n>            Total diamonds (default: 120000)");
    eprintln!("  --live-seconds <n>        Total live seconds (default: 90000)");
    eprintln!("  --watched <n>             Number of catalog videos marked watched (default: 2)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CREATOR_DB_URL, CREATOR_OWNER");
}

const CATALOG: [(&str, &str, u32); 5] = [
    ("welcome", "Welcome to the agency", 180),
    ("first-live", "Your first live", 600),
    ("battles", "Winning battles", 900),
    ("gifting", "Gifts and diamonds", 420),
    ("schedule", "Building a schedule", 300),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let owner = OwnerHandle::parse(&args.owner)?;
    let repo = SqliteRepository::connect(&args.db_url).await?;
    repo.migrate().await?;

    for (position, (id, title, duration)) in (0_u32..).zip(CATALOG) {
        let video = VideoMeta {
            id: VideoId::parse(id)?,
            title: title.to_owned(),
            duration_seconds: Some(duration),
        };
        repo.put_video(&video, position).await?;
    }

    repo.put_counters(
        &owner,
        &CreatorCounters {
            total_diamonds: args.total_diamonds,
            monthly_diamonds: args.total_diamonds / 4,
            diamonds_today: args.total_diamonds / 60,
            live_days: 12,
            live_seconds: args.live_seconds,
            ..CreatorCounters::default()
        },
    )
    .await?;

    let storage = Storage::from_sqlite(repo);
    for (id, _, duration) in CATALOG.iter().take(args.watched as usize) {
        let record = ProgressRecord::new(owner.clone(), VideoId::parse(id)?)
            .completed()
            .with_watched_seconds(*duration);
        storage.progress.upsert_progress(&record).await?;
    }

    println!(
        "Seeded {} videos, counters and {} watched videos for {} into {}",
        CATALOG.len(),
        CATALOG.len().min(args.watched as usize),
        owner,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
