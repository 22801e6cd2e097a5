//! Integration tests for the download coordinator
//!
//! Drives the public API end to end against a simulated streaming engine:
//! the engine hands out task handles and records commands, and the tests
//! play back the progress / save-location / completion reports a real
//! platform engine would deliver.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use offstream::{
    event_channel, AssetState, Downloader, DownloaderConfig, EngineError, EngineEvent,
    EventSender, StreamingEngine, TaskHandle, TaskId, TimeRange,
};

/// Simulated engine: creates handles on demand, remembers what it was
/// asked to do, and leaves event emission to the test.
struct SimEngine {
    next_id: AtomicU64,
    created: Mutex<Vec<TaskHandle>>,
    cancelled: Mutex<Vec<TaskId>>,
    persisted: Mutex<Vec<TaskHandle>>,
}

impl SimEngine {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            created: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            persisted: Mutex::new(Vec::new()),
        })
    }

    fn last_task(&self) -> TaskHandle {
        self.created.lock().unwrap().last().unwrap().clone()
    }
}

#[async_trait]
impl StreamingEngine for SimEngine {
    async fn create_task(
        &self,
        locator: &Url,
        title: &str,
        _min_bitrate_bps: u32,
    ) -> Option<TaskHandle> {
        let handle = TaskHandle {
            id: TaskId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            locator: locator.clone(),
            description: title.to_string(),
        };
        self.created.lock().unwrap().push(handle.clone());
        Some(handle)
    }

    async fn resume(&self, _task: &TaskHandle) {}

    async fn cancel(&self, task: &TaskHandle) {
        self.cancelled.lock().unwrap().push(task.id);
    }

    async fn existing_tasks(&self) -> Vec<TaskHandle> {
        self.persisted.lock().unwrap().clone()
    }
}

fn sample_locator() -> Url {
    Url::parse("https://cdn.example.com/sample/master.m3u8").unwrap()
}

/// Let the coordinator's event pump drain everything emitted so far.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn write_tree(home: &Path, rel: &str, sizes: &[(&str, usize)]) {
    let root = home.join(rel);
    for (name, size) in sizes {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, vec![0u8; *size]).unwrap();
    }
}

fn emit_saved(events: &EventSender, task: TaskId, rel: &str) {
    events
        .send(EngineEvent::SavedTo {
            task,
            relative_path: rel.to_string(),
        })
        .unwrap();
}

#[tokio::test]
async fn test_full_download_lifecycle() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let home = tempfile::tempdir().unwrap();
    let engine = SimEngine::new();
    let (events, receiver) = event_channel();
    let downloader = Downloader::new(
        engine.clone(),
        receiver,
        DownloaderConfig::for_home(home.path()),
    );

    let asset = downloader.asset(sample_locator(), "Sample");
    assert_eq!(asset.state().await, AssetState::NotDownloaded);
    assert_eq!(asset.offline_size().await, 0);
    assert!(asset.local_path().is_none());

    let fractions = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(Mutex::new(Vec::new()));
    {
        let fractions = fractions.clone();
        let finished = finished.clone();
        asset
            .finish(move |rel| finished.lock().unwrap().push(rel))
            .download_with_progress(move |f| fractions.lock().unwrap().push(f))
            .await;
    }
    settle().await;
    assert_eq!(asset.state().await, AssetState::Downloading);
    let task = engine.last_task();
    assert_eq!(task.description, "Sample");

    // ranges summing to 0.42 of the expected span
    events
        .send(EngineEvent::LoadedRanges {
            task: task.id,
            loaded: vec![TimeRange::new(0.0, 30.0), TimeRange::new(30.0, 12.0)],
            expected: TimeRange::new(0.0, 100.0),
        })
        .unwrap();
    settle().await;
    {
        let fractions = fractions.lock().unwrap();
        assert_eq!(fractions.len(), 1);
        assert!((fractions[0] - 0.42).abs() < 1e-9);
    }

    write_tree(
        home.path(),
        "Sample",
        &[("master.m3u8", 200), ("segments/0.ts", 1400), ("segments/1.ts", 400)],
    );
    emit_saved(&events, task.id, "Sample/master.m3u8");
    events
        .send(EngineEvent::Completed {
            task: task.id,
            error: None,
        })
        .unwrap();
    settle().await;

    assert_eq!(
        finished.lock().unwrap().as_slice(),
        ["Sample/master.m3u8".to_string()]
    );
    assert_eq!(asset.state().await, AssetState::Downloaded);
    // sizing follows the recorded save location, here the manifest file
    assert_eq!(asset.offline_size().await, 200);
    assert_eq!(
        asset.local_path().unwrap(),
        home.path().join("Sample/master.m3u8")
    );
    assert!(downloader.asset_exists("Sample").await);
    assert_eq!(
        downloader.downloaded_assets().get("Sample").map(String::as_str),
        Some("Sample/master.m3u8")
    );

    // downloading again never creates a second task
    asset.download().await;
    settle().await;
    assert_eq!(engine.created.lock().unwrap().len(), 1);

    // delete drops both the file and the store entry
    asset.delete_local_copy().await.unwrap();
    assert_eq!(asset.state().await, AssetState::NotDownloaded);
    assert!(!downloader.asset_exists("Sample").await);
    assert!(downloader.downloaded_assets().is_empty());
}

#[tokio::test]
async fn test_progress_is_monotonic_for_realistic_sequences() {
    let home = tempfile::tempdir().unwrap();
    let engine = SimEngine::new();
    let (events, receiver) = event_channel();
    let downloader = Downloader::new(
        engine.clone(),
        receiver,
        DownloaderConfig::for_home(home.path()),
    );

    let asset = downloader.asset(sample_locator(), "Sample");
    let fractions = Arc::new(Mutex::new(Vec::new()));
    {
        let fractions = fractions.clone();
        asset
            .download_with_progress(move |f| fractions.lock().unwrap().push(f))
            .await;
    }
    settle().await;
    let task = engine.last_task();

    let expected = TimeRange::new(0.0, 600.0);
    for loaded_secs in [60.0, 180.0, 390.0, 600.0] {
        events
            .send(EngineEvent::LoadedRanges {
                task: task.id,
                loaded: vec![TimeRange::new(0.0, loaded_secs)],
                expected,
            })
            .unwrap();
    }
    settle().await;

    let fractions = fractions.lock().unwrap();
    assert_eq!(fractions.len(), 4);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!((fractions[3] - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_cancellation_after_save_cleans_partial_download() {
    let home = tempfile::tempdir().unwrap();
    let engine = SimEngine::new();
    let (events, receiver) = event_channel();
    let downloader = Downloader::new(
        engine.clone(),
        receiver,
        DownloaderConfig::for_home(home.path()),
    );

    let asset = downloader.asset(sample_locator(), "Sample");
    let finished = Arc::new(Mutex::new(0u32));
    let errored = Arc::new(Mutex::new(0u32));
    {
        let finished = finished.clone();
        let errored = errored.clone();
        asset
            .finish(move |_| *finished.lock().unwrap() += 1)
            .on_error(move |_| *errored.lock().unwrap() += 1)
            .download()
            .await;
    }
    settle().await;
    let task = engine.last_task();

    write_tree(home.path(), "Sample", &[("master.m3u8", 100)]);
    emit_saved(&events, task.id, "Sample/master.m3u8");
    settle().await;

    asset.cancel_download().await;
    assert_eq!(engine.cancelled.lock().unwrap().as_slice(), [task.id]);
    // removal is deferred until the engine confirms the cancellation
    assert_eq!(asset.state().await, AssetState::Downloading);

    events
        .send(EngineEvent::Completed {
            task: task.id,
            error: Some(EngineError::Cancelled),
        })
        .unwrap();
    settle().await;

    assert_eq!(asset.state().await, AssetState::NotDownloaded);
    assert!(!home.path().join("Sample/master.m3u8").exists());
    assert_eq!(*finished.lock().unwrap(), 0);
    assert_eq!(*errored.lock().unwrap(), 0);

    // cancelling again with nothing live is a no-op
    asset.cancel_download().await;
    assert_eq!(engine.cancelled.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_restart_recovery_reattaches_engine_tasks() {
    let home = tempfile::tempdir().unwrap();

    // first run: start a download, engine saves a partial tree
    let engine = SimEngine::new();
    let (events, receiver) = event_channel();
    let downloader = Downloader::new(
        engine.clone(),
        receiver,
        DownloaderConfig::for_home(home.path()),
    );
    downloader
        .asset(sample_locator(), "Sample")
        .download()
        .await;
    settle().await;
    let task = engine.last_task();
    drop(events);
    drop(downloader);

    // second run: the engine still knows the task
    let engine2 = SimEngine::new();
    engine2.persisted.lock().unwrap().push(task.clone());
    let (events2, receiver2) = event_channel();
    let downloader2 = Downloader::new(
        engine2.clone(),
        receiver2,
        DownloaderConfig::for_home(home.path()),
    );
    assert_eq!(downloader2.restore_tasks().await, 1);

    // an equal asset observes the resumed download; reconstructed tasks
    // carry no callbacks of their own
    let asset = downloader2.asset(sample_locator(), "Sample");
    assert_eq!(asset.state().await, AssetState::Downloading);

    write_tree(home.path(), "Sample", &[("master.m3u8", 300)]);
    emit_saved(&events2, task.id, "Sample/master.m3u8");
    events2
        .send(EngineEvent::Completed {
            task: task.id,
            error: None,
        })
        .unwrap();
    settle().await;

    assert_eq!(asset.state().await, AssetState::Downloaded);
    assert_eq!(asset.offline_size().await, 300);
}
