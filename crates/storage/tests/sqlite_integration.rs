use creator_core::model::{CreatorCounters, OwnerHandle, ProgressRecord, VideoId, VideoMeta};
use storage::repository::{MetricsRepository, ProgressRepository, VideoCatalogRepository};
use storage::sqlite::SqliteRepository;

fn owner(raw: &str) -> OwnerHandle {
    OwnerHandle::parse(raw).unwrap()
}

fn vid(raw: &str) -> VideoId {
    VideoId::parse(raw).unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_progress_upsert_updates_existing_row() {
    let repo = connect("memdb_progress_upsert").await;

    repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("intro")).with_watched_seconds(40))
        .await
        .unwrap();
    repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("lighting")))
        .await
        .unwrap();
    repo.upsert_progress(
        &ProgressRecord::new(owner("nova"), vid("intro"))
            .completed()
            .with_watched_seconds(120),
    )
    .await
    .unwrap();

    let rows = repo.list_progress(&owner("nova")).await.expect("list");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].video_id, vid("intro"));
    assert!(rows[0].completed);
    assert_eq!(rows[0].watched_seconds, 120);
    assert_eq!(rows[1].video_id, vid("lighting"));
    assert!(!rows[1].completed);

    assert!(repo.list_progress(&owner("blaze")).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_counters_round_trip_optional_targets() {
    let repo = connect("memdb_counters").await;

    assert!(repo.get_counters(&owner("nova")).await.unwrap().is_none());

    let counters = CreatorCounters {
        total_diamonds: 250_000,
        monthly_diamonds: 40_000,
        diamonds_today: 1_200,
        live_days: 18,
        live_seconds: 86_400,
        silver_target: Some(200_000),
        gold_target: None,
        status: Some("Silver Partner".into()),
    };
    repo.put_counters(&owner("nova"), &counters).await.unwrap();

    let fetched = repo
        .get_counters(&owner("nova"))
        .await
        .unwrap()
        .expect("counters row");
    assert_eq!(fetched, counters);

    let updated = CreatorCounters {
        total_diamonds: 260_000,
        status: None,
        ..counters
    };
    repo.put_counters(&owner("nova"), &updated).await.unwrap();
    let fetched = repo.get_counters(&owner("nova")).await.unwrap().unwrap();
    assert_eq!(fetched.total_diamonds, 260_000);
    assert_eq!(fetched.status, None);
}

#[tokio::test]
async fn sqlite_videos_are_listed_in_course_order() {
    let repo = connect("memdb_videos").await;

    let second = VideoMeta {
        id: vid("battles"),
        title: "Winning battles".into(),
        duration_seconds: Some(900),
    };
    let first = VideoMeta {
        id: vid("welcome"),
        title: "Welcome".into(),
        duration_seconds: None,
    };
    repo.put_video(&second, 1).await.unwrap();
    repo.put_video(&first, 0).await.unwrap();

    let videos = repo.list_videos().await.unwrap();
    assert_eq!(videos, vec![first, second]);
}
