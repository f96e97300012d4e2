//! Tests for the structured log events emitted during reconciliation.

mod common;

use std::sync::{Arc, Mutex};

use aws_batch_job_queue::JobQueueResource;
use common::FakeBatchService;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    message: String,
    fields: Vec<(String, String)>,
}

#[derive(Default)]
struct FieldCapture {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for FieldCapture {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }
}

/// A test layer that captures every event.
struct EventCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for EventCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut capture = FieldCapture::default();
        event.record(&mut capture);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: capture.message,
            fields: capture.fields,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCaptureLayer {
        events: events.clone(),
    });
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

#[test]
fn test_missing_queue_logs_warning_with_id() {
    let rt = runtime();
    let events = capture(|| {
        rt.block_on(async {
            let resource = JobQueueResource::new(Arc::new(FakeBatchService::new()));
            assert!(resource.read("gone").await.unwrap().is_none());
        })
    });

    let warning = events
        .iter()
        .find(|e| e.level == Level::WARN)
        .expect("a warning for the missing queue");
    assert!(warning.message.contains("not found"));
    assert!(warning
        .fields
        .iter()
        .any(|(name, value)| name == "id" && value == "gone"));
}

#[test]
fn test_create_logs_polls_and_creation() {
    let rt = runtime();
    let events = capture(|| {
        rt.block_on(async {
            let resource = JobQueueResource::new(Arc::new(FakeBatchService::new()));
            let spec = aws_batch_job_queue::JobQueueSpec::new(
                "q1",
                1,
                aws_batch_job_queue::JobQueueState::Enabled,
            )
            .with_compute_environment("a", 0);
            resource.create(&spec).await.unwrap();
        })
    });

    let polls = events
        .iter()
        .filter(|e| e.message == "Polled status")
        .count();
    assert!(polls >= 2, "expected pending and final polls, got {polls}");
    assert!(events.iter().any(|e| e.message == "JobQueue created"));
}
