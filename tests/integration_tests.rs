use async_trait::async_trait;
use river_watch::advisory::{AdvisoryContext, AdvisoryReport, Advisor};
use river_watch::broadcast::Event;
use river_watch::engine::Engine;
use river_watch::error::AdvisoryError;
use river_watch::escalation::GateState;
use river_watch::model::SeverityTier;
use river_watch::source::LinesSource;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::mpsc;

const FIXTURE: &[u8] = include_bytes!("fixtures/tallo_episode.jsonl");

#[derive(Default)]
struct RecordingAdvisor {
    requests: Mutex<Vec<AdvisoryContext>>,
}

#[async_trait]
impl Advisor for RecordingAdvisor {
    async fn advise(&self, ctx: &AdvisoryContext) -> Result<AdvisoryReport, AdvisoryError> {
        self.requests.lock().unwrap().push(ctx.clone());
        Ok(AdvisoryReport {
            analysis: format!("Critical water level at {}", ctx.location),
            actions: vec!["Close the bridge".into(), "Open evacuation posts".into()],
            public_message: "Move to higher ground".into(),
        })
    }
}

fn collect(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn test_full_pipeline() {
    let advisor = Arc::new(RecordingAdvisor::default());
    let mut engine = Engine::new(Some(advisor.clone() as Arc<dyn Advisor>));
    let handle = engine.handle();
    let mut observer = handle.attach();
    assert!(observer.initial_logs.is_empty());

    let mut source = LinesSource::new(FIXTURE);
    let stats = engine.run(&mut source).await;
    engine.drain().await;

    assert_eq!(stats.accepted, 10);
    assert_eq!(stats.rejected, 5);
    assert_eq!(stats.transport_errors, 0);

    // One episode: sensor01 opened it, sensor02 kept it alive, sensor02 closed it.
    let requests = advisor.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].sensor_id, "sensor01");
    assert_eq!(requests[0].water_height_cm, 203.1);
    assert_eq!(engine.gate().dispatches(), 1);
    assert_eq!(engine.gate().resets(), 1);
    assert_eq!(engine.gate().state(), GateState::Idle);

    let summary = handle.summary();
    assert_eq!(summary.total_sensors, 3);
    assert_eq!(summary.highest, SeverityTier::Watch);
    assert_eq!(summary.watch, 1);
    assert_eq!(summary.safe, 2);

    let logs = handle.logs();
    assert_eq!(logs.len(), 6);
    assert_eq!(logs[0].sensor_id, "sensor01");
    assert_eq!(logs[0].status, "✅ Aman");
    assert_eq!(logs[5].status, "⚠️ Siaga");

    let events = collect(&mut observer.events);
    let count = |name: &str| events.iter().filter(|e| e.name() == name).count();
    assert_eq!(count("update_sensor"), 10);
    assert_eq!(count("new_log"), 6);
    assert_eq!(count("system_summary"), 10);
    assert_eq!(count("generating_report"), 1);
    assert_eq!(count("gemini_report"), 1);
    assert_eq!(count("gemini_error"), 0);

    let late = handle.attach();
    assert_eq!(late.initial_logs, logs);
}

#[tokio::test]
async fn test_transport_errors_do_not_stop_ingestion() {
    let mut engine = Engine::new(None);
    let (tx, mut rx) = mpsc::channel(8);

    tx.send(Err(anyhow::anyhow!("connection reset by broker")))
        .await
        .unwrap();
    tx.send(Ok(br#"{"id_sensor":"sensor01","ketinggian_air":120,"status":"Siaga"}"#.to_vec()))
        .await
        .unwrap();
    tx.send(Err(anyhow::anyhow!("subscription lost"))).await.unwrap();
    tx.send(Ok(br#"{"id_sensor":"sensor02","ketinggian_air":40,"status":"Aman"}"#.to_vec()))
        .await
        .unwrap();
    drop(tx);

    let stats = engine.run(&mut rx).await;
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.transport_errors, 2);
    assert_eq!(engine.handle().summary().highest, SeverityTier::Watch);
}

#[tokio::test]
async fn test_empty_source_leaves_state_untouched() {
    let mut engine = Engine::new(None);
    let mut source = LinesSource::new(&b""[..]);

    let stats = engine.run(&mut source).await;
    assert_eq!(stats.accepted + stats.rejected + stats.transport_errors, 0);
    assert_eq!(engine.handle().summary().highest, SeverityTier::Safe);
    assert_eq!(engine.gate().state(), GateState::Idle);
}

#[tokio::test]
async fn test_undecodable_line_is_rejected_not_a_transport_error() {
    let mut engine = Engine::new(None);
    let input: &[u8] = b"{\"id_sensor\":\"sensor01\",\"ketinggian_air\":120,\"status\":\"Siaga\"}\n\
        \xff\xfe\n\
        {\"id_sensor\":\"sensor02\",\"ketinggian_air\":40,\"status\":\"Aman\"}\n";
    let mut source = LinesSource::new(input);

    let stats = engine.run(&mut source).await;
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.transport_errors, 0);
}
