// Persistence tests: the state store must round-trip state and never block
// startup on a missing or corrupt file.

use tempfile::TempDir;

use callscribe::coordinator::RecordingState;
use callscribe::store::{PersistedState, StateStore};

#[tokio::test]
async fn test_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));

    let state = PersistedState {
        recording_state: RecordingState::recording(42),
        transcript: "[9:15:02 AM] We agreed on the Q3 plan.\n".to_string(),
    };
    store.save(&state).await.unwrap();

    let loaded = store.load().await;
    assert!(loaded.recording_state.is_recording);
    assert_eq!(loaded.recording_state.tab_id, Some(42));
    assert_eq!(loaded.transcript, state.transcript);
}

#[tokio::test]
async fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path().join("nope").join("state.json"));

    let loaded = store.load().await;
    assert!(!loaded.recording_state.is_recording);
    assert!(loaded.transcript.is_empty());
}

#[tokio::test]
async fn test_corrupt_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    tokio::fs::write(&path, b"{not json").await.unwrap();

    let loaded = StateStore::new(&path).load().await;
    assert!(!loaded.recording_state.is_recording);
    assert!(loaded.transcript.is_empty());
}

#[tokio::test]
async fn test_save_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("state.json");
    let store = StateStore::new(&path);

    store.save(&PersistedState::default()).await.unwrap();
    assert!(path.exists());
}
