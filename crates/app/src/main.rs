use std::fmt;

use creator_core::model::{
    AuthToken, ImageUpload, JobRequest, JobState, OwnerHandle, Session, VideoId,
};
use services::{AppServices, Clock, FlyerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidId { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw:?}"),
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

fn parse_video(raw: String, flag: &'static str) -> Result<VideoId, ArgsError> {
    VideoId::parse(&raw).map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- stats    [--db <sqlite_url>] [--owner <handle>]");
    eprintln!("  cargo run -p app -- progress [--db <sqlite_url>] [--owner <handle>] [--course <id,id,..>]");
    eprintln!("  cargo run -p app -- watch    [--db <sqlite_url>] [--owner <handle>] --video <id> [--seconds <n>]");
    eprintln!("  cargo run -p app -- flyer    --title <t> --creator <name> --opponent <name> --date <d> --image <path>");
    eprintln!("                               [--image-name <name>] [--mime <type>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://dev.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CREATOR_DB_URL, CREATOR_OWNER, CREATOR_ACCESS_TOKEN,");
    eprintln!("  CREATOR_FLYER_URL, CREATOR_API_KEY, CREATOR_HTTP_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone)]
enum Command {
    Stats,
    Progress { course: Vec<VideoId> },
    Watch { video: VideoId, seconds: Option<u32> },
    Flyer(JobRequest),
}

#[derive(Debug, Default)]
struct FlyerArgs {
    title: Option<String>,
    creator: Option<String>,
    opponent: Option<String>,
    date: Option<String>,
    image: Option<String>,
    image_name: Option<String>,
    mime: Option<String>,
}

impl FlyerArgs {
    fn into_request(self) -> Result<JobRequest, ArgsError> {
        // Blank values are left to the validation layer; only absent flags fail here.
        Ok(JobRequest {
            title: self.title.ok_or(ArgsError::MissingFlag { flag: "--title" })?,
            creator_label: self.creator.ok_or(ArgsError::MissingFlag { flag: "--creator" })?,
            opponent_label: self
                .opponent
                .ok_or(ArgsError::MissingFlag { flag: "--opponent" })?,
            event_date: self.date.ok_or(ArgsError::MissingFlag { flag: "--date" })?,
            image: ImageUpload {
                uri: self.image.ok_or(ArgsError::MissingFlag { flag: "--image" })?,
                name: self.image_name,
                mime_type: self.mime,
            },
        })
    }
}

struct Args {
    db_url: String,
    owner: Option<String>,
    command: Command,
}

impl Args {
    fn parse(subcommand: &str, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("CREATOR_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://dev.sqlite3".into(), normalize_sqlite_url);
        let mut owner = std::env::var("CREATOR_OWNER").ok();
        let mut course = Vec::new();
        let mut video = None;
        let mut seconds = None;
        let mut flyer = FlyerArgs::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--owner" => owner = Some(require_value(args, "--owner")?),
                "--course" => {
                    course = require_value(args, "--course")?
                        .split(',')
                        .filter(|id| !id.trim().is_empty())
                        .map(|id| parse_video(id.to_owned(), "--course"))
                        .collect::<Result<_, _>>()?;
                }
                "--video" => video = Some(parse_video(require_value(args, "--video")?, "--video")?),
                "--seconds" => {
                    let value = require_value(args, "--seconds")?;
                    seconds = Some(value.parse::<u32>().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--seconds",
                        raw: value.clone(),
                    })?);
                }
                "--title" => flyer.title = Some(require_value(args, "--title")?),
                "--creator" => flyer.creator = Some(require_value(args, "--creator")?),
                "--opponent" => flyer.opponent = Some(require_value(args, "--opponent")?),
                "--date" => flyer.date = Some(require_value(args, "--date")?),
                "--image" => flyer.image = Some(require_value(args, "--image")?),
                "--image-name" => flyer.image_name = Some(require_value(args, "--image-name")?),
                "--mime" => flyer.mime = Some(require_value(args, "--mime")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match subcommand {
            "stats" => Command::Stats,
            "progress" => Command::Progress { course },
            "watch" => Command::Watch {
                video: video.ok_or(ArgsError::MissingFlag { flag: "--video" })?,
                seconds,
            },
            "flyer" => Command::Flyer(flyer.into_request()?),
            other => return Err(ArgsError::UnknownArg(other.to_owned())),
        };

        Ok(Self {
            db_url,
            owner,
            command,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,services=info,app=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn sign_in_from_env(services: &AppServices, owner: Option<&OwnerHandle>) {
    let Some(owner) = owner else {
        return;
    };
    let token = std::env::var("CREATOR_ACCESS_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty());
    if let Some(token) = token {
        services
            .session()
            .sign_in(Session::new(owner.clone(), AuthToken::new(token)));
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let subcommand = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => first,
    };

    let parsed = Args::parse(&subcommand, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::system(), FlyerConfig::from_env()).await?;
    let owner = parsed.owner.as_deref().map(OwnerHandle::parse).transpose()?;
    sign_in_from_env(&services, owner.as_ref());
    info!(db = %parsed.db_url, command = %subcommand, "starting");

    match parsed.command {
        Command::Stats => {
            let owner = owner.ok_or(ArgsError::MissingFlag { flag: "--owner" })?;
            let stats_service = services.creator_stats();
            match stats_service.refresh(&owner).await {
                Some(stats) => {
                    println!("status:     {}", stats.current_status);
                    println!(
                        "diamonds:   {} total, {} this month, {} today",
                        stats.total_diamonds, stats.monthly_diamonds, stats.diamonds_today
                    );
                    println!(
                        "next tier:  {} ({} to go, {:.1}%)",
                        stats.next_tier, stats.remaining, stats.progress_percentage
                    );
                    println!("live:       {} days, {} hours", stats.live_days, stats.live_hours);
                }
                None => println!("no stats for {owner} yet"),
            }
            if let Some(err) = stats_service.error() {
                eprintln!("warning: {err}");
            }
        }
        Command::Progress { course } => {
            let owner = owner.ok_or(ArgsError::MissingFlag { flag: "--owner" })?;
            let tracker = services.progress();
            for item in tracker.load(&owner).await {
                let mark = if item.completed { "x" } else { " " };
                println!(
                    "[{mark}] {:<24} {:>3}% ({}s)",
                    item.video_id, item.percentage, item.watched_seconds
                );
            }
            if !course.is_empty() {
                let progress = tracker.course_progress(&course);
                println!("course: {}/{} completed", progress.completed, progress.total);
            }
            if let Some(err) = tracker.error() {
                eprintln!("warning: {err}");
            }
        }
        Command::Watch { video, seconds } => {
            let owner = owner.ok_or(ArgsError::MissingFlag { flag: "--owner" })?;
            let tracker = services.progress();
            tracker.load(&owner).await;
            match seconds {
                Some(seconds) => tracker.record_watch_time(&video, seconds).await,
                None => tracker.mark_watched(&video).await,
            }
            match tracker.error() {
                Some(err) => eprintln!("saved locally, store update failed: {err}"),
                None => println!("{video}: watched={}", tracker.is_watched(&video)),
            }
        }
        Command::Flyer(request) => {
            if !services.flyer_enabled() {
                eprintln!("CREATOR_FLYER_URL is not set; the request will be rejected");
            }
            match services.flyer_job().submit(request).await {
                JobState::Success(result) => {
                    println!("{}", result.url());
                    println!(
                        "{}x{} in {}ms ({})",
                        result.width(),
                        result.height(),
                        result.duration_ms(),
                        result.storage_path()
                    );
                }
                JobState::Error(message) => {
                    eprintln!("{message}");
                    std::process::exit(1);
                }
                other => eprintln!("unexpected job state: {other:?}"),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(subcommand: &str, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_owned());
        Args::parse(subcommand, &mut iter)
    }

    #[test]
    fn flyer_flags_build_a_request() {
        let args = parse(
            "flyer",
            &[
                "--title", "Battle", "--creator", "Nova", "--opponent", "Blaze", "--date",
                "2026-10-30", "--image", "/tmp/bg.png", "--mime", "image/png",
            ],
        )
        .unwrap();
        let Command::Flyer(request) = args.command else {
            panic!("expected flyer command");
        };
        assert_eq!(request.title, "Battle");
        assert_eq!(request.image.mime(), "image/png");
        assert_eq!(request.image.file_name(), "photo.jpg");
    }

    #[test]
    fn missing_flyer_flag_is_reported() {
        let err = parse("flyer", &["--title", "Battle"]).err().unwrap();
        assert_eq!(err.to_string(), "--creator is required");
    }

    #[test]
    fn course_list_is_split_on_commas() {
        let args = parse("progress", &["--course", "a, b,,c", "--db", "sqlite://x.db"]).unwrap();
        let Command::Progress { course } = args.command else {
            panic!("expected progress command");
        };
        assert_eq!(course.len(), 3);
        assert_eq!(args.db_url, "sqlite://x.db");
    }

    #[test]
    fn watch_requires_a_video() {
        assert!(matches!(
            parse("watch", &[]),
            Err(ArgsError::MissingFlag { flag: "--video" })
        ));
        assert!(matches!(
            parse("watch", &["--video", "a", "--seconds", "ten"]),
            Err(ArgsError::InvalidNumber { .. })
        ));
    }
}
