//! The sensor pump and the tick loop open spans for the OTLP layer to export.

use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use stancelink_hal::SimBody;
use stancelink_middleware::{EventBus, link};
use stancelink_runtime::{PostureConfig, PostureController, PostureLoop};
use tracing::Subscriber;
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Records the name of every span opened while it is installed.
#[derive(Clone, Default)]
struct SpanNames(Arc<Mutex<Vec<&'static str>>>);

impl SpanNames {
    fn seen(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

impl<S: Subscriber> Layer<S> for SpanNames {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        self.0.lock().unwrap().push(attrs.metadata().name());
    }
}

#[test]
fn pump_and_tick_open_spans() {
    let names = SpanNames::default();
    let subscriber = tracing_subscriber::registry().with(names.clone());

    tracing::subscriber::with_default(subscriber, || {
        let controller = PostureController::new(
            PostureConfig::default(),
            Box::new(SimBody::new(0.0)),
            EventBus::default(),
        );
        let mut posture_loop = PostureLoop::new(controller);
        let outbox = posture_loop.outbox();

        let stream = Cursor::new("H;900,900,900,900;900,900,900,900\n");
        let frames = link::pump(stream, &outbox, &AtomicBool::new(false)).unwrap();
        assert_eq!(frames, 1);

        posture_loop.tick(0.02);
        posture_loop.tick(0.02);
    });

    let seen = names.seen();
    assert_eq!(seen.iter().filter(|n| **n == "sensor_link").count(), 1);
    assert_eq!(seen.iter().filter(|n| **n == "posture_tick").count(), 2);
}
