//! Integration tests for the structural trace events.
//!
//! Run with `--features tracing`.

#![cfg(feature = "tracing")]

use persistent_btree::persistent::PersistentTreeMap;
use rstest::rstest;
use std::io;
use std::sync::{Arc, Mutex};
use tracing::Level;

#[derive(Clone, Default)]
struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    fn contents(&self) -> String {
        let bytes = self.0.lock().expect("capture lock poisoned");
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedOutput {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("capture lock poisoned")
            .extend_from_slice(buffer);
        Ok(buffer.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture<F: FnOnce()>(action: F) -> String {
    let output = CapturedOutput::default();
    let writer = output.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, action);
    output.contents()
}

#[rstest]
fn test_root_split_is_traced() {
    let logs = capture(|| {
        let map = (0..12).fold(PersistentTreeMap::new(), |map, key| map.insert(key, key).1);
        assert_eq!(map.height(), 2);
    });
    assert!(logs.contains("persistent_btree"));
    assert!(logs.contains("splitting full root"));
}

#[rstest]
fn test_root_collapse_is_traced() {
    let map: PersistentTreeMap<i32, i32> = (0..12).map(|key| (key, key)).collect();
    let logs = capture(|| {
        let shrunk = (0..6).fold(map.clone(), |map, key| map.remove(&key).1);
        assert_eq!(shrunk.height(), 1);
    });
    assert!(logs.contains("collapsing empty root"));
}

#[rstest]
fn test_bulk_load_reports_length() {
    let logs = capture(|| {
        let map = PersistentTreeMap::from_sorted_iter((0..200).map(|key| (key, ())));
        assert_eq!(map.len(), 200);
    });
    assert!(logs.contains("bulk load finished"));
    assert!(logs.contains("length=200"));
}

#[rstest]
fn test_quiet_without_structural_change() {
    let map: PersistentTreeMap<i32, i32> = (0..5).map(|key| (key, key)).collect();
    let logs = capture(|| {
        let _ = map.insert(10, 10);
        let _ = map.get(&3);
    });
    assert!(logs.is_empty());
}
