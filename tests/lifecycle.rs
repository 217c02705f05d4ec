mod common;

use std::sync::Arc;
use std::time::Duration;

use grid_ingest::app::scheduler::Scheduler;
use grid_ingest::app::serve;
use grid_ingest::config::{OverlapPolicy, ScheduleConfig};
use grid_ingest::data::GridSource;
use grid_ingest::error::AppError;
use grid_ingest::sink::{MemoryWriter, PointWriter};
use grid_ingest::sink::memory::WriterEvent;
use tokio_util::sync::CancellationToken;

use common::{FakeSource, full_report};

fn scheduler() -> Scheduler {
    Scheduler::new(&ScheduleConfig {
        interval: Duration::from_secs(60),
        overlap: OverlapPolicy::Allow,
        shutdown_grace: Duration::from_secs(10),
    })
    .with_alignment(false)
}

/// Serve until cancelled after `stop_after`, return the outcome.
async fn serve_for(writer: Arc<MemoryWriter>, stop_after: Duration) -> Result<(), AppError> {
    let source = Arc::new(FakeSource::ok(full_report()));
    let token = CancellationToken::new();

    let run_token = token.clone();
    let handle = tokio::spawn(async move { serve(&scheduler(), source, writer, run_token).await });

    tokio::time::sleep(stop_after).await;
    token.cancel();
    handle.await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn cancellation_closes_the_writer_once_after_the_last_flush() {
    let writer = Arc::new(MemoryWriter::new());

    let outcome = serve_for(Arc::clone(&writer), Duration::from_secs(90)).await;
    assert!(outcome.is_ok());

    let events = writer.events();
    let closes = events.iter().filter(|e| **e == WriterEvent::Close).count();
    assert_eq!(closes, 1);
    assert_eq!(events.last(), Some(&WriterEvent::Close));

    let last_flush = events
        .iter()
        .rposition(|e| *e == WriterEvent::Flush)
        .expect("cycles flushed before shutdown");
    assert_eq!(last_flush, events.len() - 2);
    assert_eq!(writer.flush_count(), 2);
    assert!(writer.is_closed());
}

#[tokio::test(start_paused = true)]
async fn failing_close_exits_with_code_one() {
    let writer = Arc::new(MemoryWriter::new());
    writer.fail_flushes(true);

    let err = serve_for(Arc::clone(&writer), Duration::from_secs(30))
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("shutdown failure"));
    assert_eq!(writer.events().last(), Some(&WriterEvent::Close));
}

#[tokio::test(start_paused = true)]
async fn cancelling_before_any_tick_still_closes_cleanly() {
    let writer = Arc::new(MemoryWriter::new());
    let source = Arc::new(FakeSource::ok(full_report()));
    let token = CancellationToken::new();
    token.cancel();

    let dyn_source: Arc<dyn GridSource> = Arc::clone(&source) as Arc<dyn GridSource>;
    let dyn_writer: Arc<dyn PointWriter> = Arc::clone(&writer) as Arc<dyn PointWriter>;
    let outcome = serve(&scheduler(), dyn_source, dyn_writer, token).await;

    assert!(outcome.is_ok());
    assert_eq!(source.calls(), 0);
    assert_eq!(writer.events(), vec![WriterEvent::Close]);
}
