// Integration tests for the capture session pipeline
//
// These drive real silence backends through the mixer, segment encoder, and
// a scripted transcriber, and verify segment cadence, hallucination
// filtering, and teardown behavior.

mod common;

use std::time::Duration;
use tokio::sync::mpsc;

use callscribe::capture::CaptureSession;
use callscribe::coordinator::TranscriptUpdate;
use common::{fast_capture_config, silence_factory, ScriptedTranscriber};

use callscribe::audio::AudioStreamSource;

async fn start_session(
    transcriber: std::sync::Arc<ScriptedTranscriber>,
) -> (CaptureSession, mpsc::Receiver<TranscriptUpdate>) {
    let factory = silence_factory();
    let tab = factory(AudioStreamSource::Tab).unwrap();
    let mic = factory(AudioStreamSource::Microphone).ok();

    let (tx, rx) = mpsc::channel(64);
    let session = CaptureSession::start(fast_capture_config(), tab, mic, transcriber, tx)
        .await
        .expect("session should start");

    (session, rx)
}

#[tokio::test]
async fn test_segments_flow_to_transcript_channel() {
    let transcriber = ScriptedTranscriber::repeating("Let's review the roadmap");
    let (session, mut rx) = start_session(transcriber.clone()).await;

    // Run across at least two cadence boundaries
    tokio::time::sleep(Duration::from_millis(550)).await;
    session.stop().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }

    assert!(
        updates.len() >= 2,
        "expected at least two segment updates, got {}",
        updates.len()
    );
    assert!(updates.iter().all(|u| u.text == "Let's review the roadmap"));
    assert!(transcriber.call_count() >= 2);
}

#[tokio::test]
async fn test_final_segment_flushed_on_stop() {
    let transcriber = ScriptedTranscriber::repeating("closing remarks");
    let (session, mut rx) = start_session(transcriber).await;

    // Stop mid-interval: the partial segment must still be dispatched
    tokio::time::sleep(Duration::from_millis(120)).await;
    session.stop().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut saw_final = false;
    while let Ok(update) = rx.try_recv() {
        if update.is_final {
            saw_final = true;
        }
    }
    assert!(saw_final, "final flush should carry is_final");
}

#[tokio::test]
async fn test_hallucinated_text_never_reaches_transcript() {
    // The scripted transcriber skips the HTTP client, so this exercises the
    // filter applied on the dispatch path
    let transcriber = ScriptedTranscriber::repeating("Thanks for watching!");
    let (session, mut rx) = start_session(transcriber.clone()).await;

    tokio::time::sleep(Duration::from_millis(550)).await;
    session.stop().await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err(), "hallucinations must be dropped");
    assert!(transcriber.call_count() >= 2, "segments were still submitted");
}

#[tokio::test]
async fn test_dropped_session_ends_capture_loop() {
    let transcriber = ScriptedTranscriber::repeating("lingering words");
    let (session, mut rx) = start_session(transcriber).await;

    // Dropping without stop() drops the stop sender; the loop must exit and
    // flush the final segment rather than spin
    tokio::time::sleep(Duration::from_millis(120)).await;
    drop(session);
    tokio::time::sleep(Duration::from_millis(150)).await;

    let mut saw_final = false;
    while let Ok(update) = rx.try_recv() {
        if update.is_final {
            saw_final = true;
        }
    }
    assert!(saw_final, "final flush should still happen when the session is dropped");
}

#[tokio::test]
async fn test_tab_only_session_still_produces_segments() {
    let transcriber = ScriptedTranscriber::repeating("tab audio only");
    let factory = common::tab_only_factory();
    let tab = factory(AudioStreamSource::Tab).unwrap();
    assert!(factory(AudioStreamSource::Microphone).is_err());

    let (tx, mut rx) = mpsc::channel(64);
    let session = CaptureSession::start(fast_capture_config(), tab, None, transcriber, tx)
        .await
        .expect("tab-only session should start");

    tokio::time::sleep(Duration::from_millis(300)).await;
    session.stop().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(rx.try_recv().is_ok(), "tab-only capture should still transcribe");
}
