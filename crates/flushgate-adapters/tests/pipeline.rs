//! End-to-end: producers, flusher and concrete sinks.

use std::thread;
use std::time::Duration;

use flushgate_adapters::sinks::{ChannelSink, MemorySink, NullSink};
use flushgate_adapters::storage::batch_file::{BatchFileConfig, BatchFileReader, BatchFileSink};
use flushgate_core::{AppendError, BatchId, FlushMode, GateConfig, Writer, spawn};
use tempfile::tempdir;

fn produce(writer: &Writer, producers: u8, events: usize, event_len: usize) {
    let handles: Vec<_> = (0..producers)
        .map(|tag| {
            let writer = writer.clone();
            thread::spawn(move || {
                let payload = vec![tag; event_len];
                let mut sent = 0;
                while sent < events {
                    match writer.append(&payload) {
                        Ok(()) => sent += 1,
                        Err(AppendError::CapacityExceeded { .. }) => {
                            thread::sleep(Duration::from_micros(100));
                        }
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_batch_file_round_trip_through_flusher() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.batches");

    let sink = BatchFileSink::open(&path, BatchFileConfig::default()).unwrap();
    let (writer, flusher) = spawn(GateConfig::new(1000), sink).unwrap();

    produce(&writer, 4, 100, 25);
    let residual = flusher.shutdown().unwrap();

    let frames = BatchFileReader::new(&path).read_strict().unwrap();
    assert!(!frames.is_empty());

    // Batch ids are dense and every batch reached the threshold
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.id, BatchId::new(i as u64 + 1));
        assert!(frame.len() >= 1000);
    }

    let flushed: usize = frames.iter().map(|f| f.len()).sum();
    assert_eq!(flushed + residual.len(), 4 * 100 * 25);
    assert!(residual.len() < 1000);

    let stats = writer.stats();
    assert_eq!(stats.batches_flushed, frames.len() as u64);
    assert_eq!(stats.bytes_flushed, flushed as u64);
    assert_eq!(stats.batches_failed, 0);
}

#[test]
fn test_memory_sink_swap_mode() {
    let view = MemorySink::new();
    let config = GateConfig::new(64).with_flush_mode(FlushMode::Swap);
    let (writer, flusher) = spawn(config, view.clone()).unwrap();

    produce(&writer, 3, 50, 8);
    let residual = flusher.shutdown().unwrap();

    assert_eq!(view.total_bytes() + residual.len(), 3 * 50 * 8);
    let mut all = view.concat();
    all.extend_from_slice(&residual);
    assert!(all.chunks(8).all(|c| c.iter().all(|&b| b == c[0])));
}

#[test]
fn test_null_sink_counts() {
    let counters = NullSink::new();
    let (writer, flusher) = spawn(GateConfig::new(10), counters.clone()).unwrap();

    produce(&writer, 2, 20, 5);
    let residual = flusher.shutdown().unwrap();

    assert_eq!(counters.bytes() + residual.len() as u64, 200);
    assert_eq!(counters.batches(), writer.stats().batches_flushed);
}

#[test]
fn test_disconnected_channel_drops_batches() {
    let (sink, rx) = ChannelSink::unbounded();
    drop(rx);
    let (writer, flusher) = spawn(GateConfig::new(4), sink).unwrap();

    writer.append(b"lost").unwrap();
    // Wait until the flusher has taken and failed the batch
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while writer.stats().batches_failed == 0 && std::time::Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(writer.buffered_bytes(), 0);
    writer.append(b"ok").unwrap();
    assert_eq!(&flusher.shutdown().unwrap()[..], b"ok");
    assert_eq!(writer.stats().bytes_dropped, 4);
}
