use orrery::config::Config;
use orrery::panel::{PanelCommand, PanelDriver, UpdateMode};
use orrery::phase::{PhaseReading, PhaseStatus};
use orrery::source::PhaseFetch;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Scripted reading source that counts fetches
struct ScriptedSource {
    readings: Mutex<VecDeque<PhaseReading>>,
    fallback: PhaseReading,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    fn constant(reading: PhaseReading) -> Self {
        Self {
            readings: Mutex::new(VecDeque::new()),
            fallback: reading,
            fetches: AtomicUsize::new(0),
        }
    }

    fn sequence(readings: Vec<PhaseReading>) -> Self {
        Self {
            readings: Mutex::new(readings.into()),
            fallback: PhaseReading::absent(),
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PhaseFetch for ScriptedSource {
    async fn fetch(&self) -> PhaseReading {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.readings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

fn driver_with(
    source: Arc<ScriptedSource>,
    initial_mode: UpdateMode,
) -> (PanelDriver, mpsc::UnboundedSender<PanelCommand>) {
    let mut config = Config::default();
    config.panel.initial_mode = initial_mode;
    config.source.poll_interval_secs = 5;
    let (tx, rx) = mpsc::unbounded_channel();
    let driver = PanelDriver::from_config(config, source, rx, tx.clone()).unwrap();
    (driver, tx)
}

#[tokio::test]
async fn switching_to_automatic_fetches_immediately() {
    let source = Arc::new(ScriptedSource::constant(PhaseReading::measured(2.5)));
    let (mut driver, _tx) = driver_with(source.clone(), UpdateMode::Manual);
    assert_eq!(source.fetch_count(), 0);

    driver.set_mode(UpdateMode::Automatic).await;

    assert_eq!(source.fetch_count(), 1);
    let snapshot = driver.snapshot();
    assert_eq!(snapshot.mode, UpdateMode::Automatic);
    assert_eq!(snapshot.status, PhaseStatus::Warn);
    assert_eq!(snapshot.angle, Some(2.5));
}

#[tokio::test]
async fn setting_active_mode_again_is_a_noop() {
    let source = Arc::new(ScriptedSource::constant(PhaseReading::measured(0.5)));
    let (mut driver, _tx) = driver_with(source.clone(), UpdateMode::Automatic);

    driver.set_mode(UpdateMode::Automatic).await;
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn manual_submit_rejects_non_numeric_input() {
    let source = Arc::new(ScriptedSource::constant(PhaseReading::measured(1.0)));
    let (mut driver, _tx) = driver_with(source, UpdateMode::Manual);

    let result = driver.submit_manual_angle("abc");
    assert!(result.is_err());

    // No state change: the reading is still the startup one
    assert!(driver.current_reading().is_absent());
    assert_eq!(driver.snapshot().status, PhaseStatus::Disconnected);
}

#[tokio::test]
async fn manual_submit_applies_and_classifies() {
    let source = Arc::new(ScriptedSource::constant(PhaseReading::absent()));
    let (mut driver, _tx) = driver_with(source, UpdateMode::Manual);

    let applied = driver.submit_manual_angle(" 2.5 ").unwrap();
    assert!((applied - 2.5).abs() < f64::EPSILON);

    let snapshot = driver.snapshot();
    assert_eq!(snapshot.angle, Some(2.5));
    assert_eq!(snapshot.status, PhaseStatus::Warn);
    assert_eq!(snapshot.mode, UpdateMode::Manual);
}

#[tokio::test]
async fn manual_submit_rejected_in_automatic_mode() {
    let source = Arc::new(ScriptedSource::constant(PhaseReading::measured(1.0)));
    let (mut driver, _tx) = driver_with(source, UpdateMode::Automatic);

    let result = driver.submit_manual_angle("1.0");
    assert!(result.is_err());
    assert!(driver.current_reading().is_absent());
}

#[tokio::test]
async fn poll_scenarios_cover_every_status() {
    let source = Arc::new(ScriptedSource::sequence(vec![
        PhaseReading::measured(2.5),
        PhaseReading::measured(4.1),
        PhaseReading::measured(0.0),
        PhaseReading::absent(),
    ]));
    let (mut driver, _tx) = driver_with(source, UpdateMode::Automatic);

    driver.poll_once().await;
    assert_eq!(driver.snapshot().status, PhaseStatus::Warn);

    driver.poll_once().await;
    assert_eq!(driver.snapshot().status, PhaseStatus::Alarm);

    driver.poll_once().await;
    assert_eq!(driver.snapshot().status, PhaseStatus::Ok);
    assert_eq!(driver.snapshot().angle, Some(0.0));

    driver.poll_once().await;
    assert_eq!(driver.snapshot().status, PhaseStatus::Disconnected);
    assert_eq!(driver.snapshot().angle, None);

    assert_eq!(driver.snapshot().total_polls, 4);
}

#[tokio::test(start_paused = true)]
async fn automatic_mode_polls_on_the_configured_interval() {
    let source = Arc::new(ScriptedSource::constant(PhaseReading::measured(1.0)));
    let (mut driver, _tx) = driver_with(source.clone(), UpdateMode::Automatic);
    let handle = tokio::spawn(async move { driver.run().await });

    // Immediate first tick plus two 5 s cycles
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(source.fetch_count() >= 3);
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn switching_to_manual_cancels_polling() {
    let source = Arc::new(ScriptedSource::constant(PhaseReading::measured(1.0)));
    let (mut driver, tx) = driver_with(source.clone(), UpdateMode::Automatic);
    let handle = tokio::spawn(async move { driver.run().await });

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(source.fetch_count() >= 2);

    tx.send(PanelCommand::SetMode(UpdateMode::Manual)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let at_switch = source.fetch_count();

    // No further automatic fetch after the switch
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.fetch_count(), at_switch);
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn switching_to_automatic_schedules_recurring_polls() {
    let source = Arc::new(ScriptedSource::constant(PhaseReading::measured(1.0)));
    let (mut driver, tx) = driver_with(source.clone(), UpdateMode::Manual);
    let handle = tokio::spawn(async move { driver.run().await });

    // Manual mode at startup: nothing fetches
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(source.fetch_count(), 0);

    tx.send(PanelCommand::SetMode(UpdateMode::Automatic)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    // One immediate fetch on the switch
    assert_eq!(source.fetch_count(), 1);

    // ...and the recurring schedule after it
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(source.fetch_count() >= 3);
    handle.abort();
}

#[tokio::test]
async fn select_model_switches_and_skips_missing_assets() {
    let assets = tempfile::tempdir().unwrap();
    std::fs::write(assets.path().join("turbine.glb"), b"glTF").unwrap();
    // gearbox.glb deliberately not created

    let mut config = Config::default();
    config.panel.initial_mode = UpdateMode::Manual;
    config.models.assets_dir = assets.path().to_string_lossy().to_string();

    let (tx, rx) = mpsc::unbounded_channel();
    let source = Arc::new(ScriptedSource::constant(PhaseReading::absent()));
    let mut driver = PanelDriver::from_config(config, source, rx, tx).unwrap();
    assert_eq!(driver.active_model(), "turbine");

    // Unknown id is an error
    assert!(driver.select_model("flux-capacitor").is_err());

    // Known model with a missing asset is skipped, selection unchanged
    let skipped = driver.select_model("gearbox").unwrap();
    assert!(skipped.is_none());
    assert_eq!(driver.active_model(), "turbine");

    // Once the asset exists the selection goes through
    std::fs::write(assets.path().join("gearbox.glb"), b"glTF").unwrap();
    let entry = driver.select_model("gearbox").unwrap().unwrap();
    assert_eq!(entry.id, "gearbox");
    assert_eq!(driver.active_model(), "gearbox");
    assert_eq!(driver.snapshot().model, "gearbox");
}

#[tokio::test]
async fn redraw_frames_reach_subscribers() {
    let source = Arc::new(ScriptedSource::constant(PhaseReading::measured(4.1)));
    let (mut driver, _tx) = driver_with(source, UpdateMode::Automatic);
    let mut frames = driver.subscribe_frames();

    driver.poll_once().await;

    let frame = frames.recv().await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(json["status"], "ALARM");
    assert_eq!(json["mode"], "automatic");
}
