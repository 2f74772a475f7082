//! End-to-end pipeline tests against a mock upstream.
//!
//! Drives `run_archiver` the way the CLI does and checks the on-disk archive
//! layout, the incremental sync behavior, and media completion.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use md5::{Digest, Md5};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use archive_chan::config::Config;
use archive_chan::models::ThreadRef;
use archive_chan::pipeline::{MediaOutcome, SyncStatus, ThreadOutcome, run_archiver};
use archive_chan::storage::{LocalStore, ThreadStore};

const OP_IMAGE: &[u8] = b"op image bytes";
const REPLY_IMAGE: &[u8] = b"reply image bytes";

fn b64_md5(bytes: &[u8]) -> String {
    STANDARD.encode(Md5::digest(bytes))
}

fn config(server: &MockServer, root: &TempDir, preserve_media: bool) -> Config {
    let mut config = Config::default();
    config.archive.api_host = server.uri();
    config.archive.media_host = server.uri();
    config.archive.root = root.path().to_path_buf();
    config.archive.preserve_media = preserve_media;
    config.retry.max_attempts = 2;
    config.retry.base_delay_ms = 0;
    config.retry.max_delay_ms = 0;
    config
}

fn thread_payload(replies: u64, archived: bool) -> serde_json::Value {
    let mut op = serde_json::json!({
        "no": 570368,
        "now": "12/31/18(Mon)17:05:48",
        "name": "Anonymous",
        "sub": "Paper planes",
        "com": "Post your planes",
        "replies": replies,
        "images": 1,
        "semantic_url": "paper-planes",
        "tim": 100, "ext": ".png", "fsize": OP_IMAGE.len(),
        "md5": b64_md5(OP_IMAGE)
    });
    if archived {
        op["archived"] = serde_json::json!(1);
    }
    serde_json::json!({
        "posts": [
            op,
            {"no": 570370, "com": "nice", "tim": 200, "ext": ".jpg",
             "fsize": REPLY_IMAGE.len(), "md5": b64_md5(REPLY_IMAGE)}
        ]
    })
}

async fn mount_thread(server: &MockServer, payload: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/po/thread/570368.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload))
        .mount(server)
        .await;
}

async fn mount_media(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/po/100.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(OP_IMAGE.to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/po/200.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(REPLY_IMAGE.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn archives_open_thread_then_reports_unchanged() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    mount_thread(&server, thread_payload(10, false)).await;

    let config = config(&server, &root, false);
    let thread = ThreadRef::new("po", 570368);

    // First run creates the snapshot.
    let reports = run_archiver(
        &config,
        &LocalStore::new(root.path()),
        vec![thread.clone()],
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert!(matches!(
        reports[0].outcome,
        Ok(ThreadOutcome::Archived {
            sync: SyncStatus::Updated,
            media: None,
        })
    ));

    let json_path = root.path().join("po/570368/thread.json");
    assert!(json_path.is_file());
    let page_path = root.path().join("po/570368/index.html");
    assert!(page_path.is_file());
    let mtime = std::fs::metadata(&json_path).unwrap().modified().unwrap();

    // Second run with identical upstream state writes nothing.
    let reports = run_archiver(
        &config,
        &LocalStore::new(root.path()),
        vec![thread],
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert!(matches!(
        reports[0].outcome,
        Ok(ThreadOutcome::Archived {
            sync: SyncStatus::Unchanged,
            ..
        })
    ));
    let mtime_after = std::fs::metadata(&json_path).unwrap().modified().unwrap();
    assert_eq!(mtime, mtime_after);
}

#[tokio::test]
async fn archived_thread_completes_media_and_never_fetches_again() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    mount_thread(&server, thread_payload(12, true)).await;
    mount_media(&server).await;

    let config = config(&server, &root, true);
    let store = LocalStore::new(root.path());
    let thread = ThreadRef::new("po", 570368);

    let reports = run_archiver(&config, &store, vec![thread.clone()], CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(
        reports[0].outcome,
        Ok(ThreadOutcome::Archived {
            sync: SyncStatus::Updated,
            media: Some(MediaOutcome::Complete),
        })
    ));

    // Both media files landed under their deterministic names.
    assert_eq!(
        std::fs::read(root.path().join("po/570368/media/100.png")).unwrap(),
        OP_IMAGE
    );
    assert_eq!(
        std::fs::read(root.path().join("po/570368/media/200.jpg")).unwrap(),
        REPLY_IMAGE
    );

    let snapshot = store.load(&thread).await.unwrap().unwrap();
    assert!(snapshot.local.archived);
    assert!(snapshot.local.media_complete);

    // A fresh upstream that answers nothing: the terminal thread must not
    // produce a single request.
    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let reports = run_archiver(&config, &store, vec![thread], CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(
        reports[0].outcome,
        Ok(ThreadOutcome::Archived {
            sync: SyncStatus::Terminal,
            media: Some(MediaOutcome::Complete),
        })
    ));
}

#[tokio::test]
async fn corrupt_media_is_replaced_on_the_next_run() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    mount_thread(&server, thread_payload(12, true)).await;
    mount_media(&server).await;

    let config = config(&server, &root, true);
    let store = LocalStore::new(root.path());
    let thread = ThreadRef::new("po", 570368);

    // Previously archived snapshot, with one media file corrupted on disk and
    // completion not yet recorded.
    run_archiver(&config, &store, vec![thread.clone()], CancellationToken::new())
        .await
        .unwrap();
    let mut snapshot = store.load(&thread).await.unwrap().unwrap();
    snapshot.local.media_complete = false;
    store.save(&thread, &snapshot).await.unwrap();
    std::fs::write(root.path().join("po/570368/media/100.png"), b"bitrot").unwrap();

    let reports = run_archiver(&config, &store, vec![thread.clone()], CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(
        reports[0].outcome,
        Ok(ThreadOutcome::Archived {
            sync: SyncStatus::Terminal,
            media: Some(MediaOutcome::Complete),
        })
    ));
    assert_eq!(
        std::fs::read(root.path().join("po/570368/media/100.png")).unwrap(),
        OP_IMAGE
    );
    assert!(store.load(&thread).await.unwrap().unwrap().local.media_complete);
}

#[tokio::test]
async fn unknown_thread_fails_without_leaving_state() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/po/thread/999999.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = config(&server, &root, false);
    let reports = run_archiver(
        &config,
        &LocalStore::new(root.path()),
        vec![ThreadRef::new("po", 999999)],
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(reports[0].outcome.is_err());
    assert!(!root.path().join("po/999999").exists());
}
