//! Integration tests for detection feeding the cooldown queue
//!
//! Producer and consumer run on real threads; the signal is either scripted
//! or a file rewritten by the test, as a sensor daemon would.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use buzzlink_core::{
    CooldownQueue, DetectionLoop, DetectionSwitch, EdgeDetector, FileSignal, MockClock,
    PollOutcome, ScriptedSignal, SystemClock,
};

#[test]
fn slow_consumer_sees_bounded_fifo_stream() {
    // 12 episodes, far faster than the consumer drains them
    let samples: Vec<bool> = (0..24).map(|i| i % 2 == 0).collect();
    let queue: Arc<CooldownQueue> = Arc::new(CooldownQueue::new());
    let mut detection = DetectionLoop::new(
        ScriptedSignal::new(samples),
        Arc::clone(&queue),
        DetectionSwitch::new(true),
        MockClock::new(0),
        Duration::from_millis(100),
    );

    let consumer_queue = Arc::clone(&queue);
    let consumer = thread::spawn(move || {
        let mut seen = Vec::new();
        while let Some(event) = consumer_queue.dequeue_timeout(Duration::from_millis(300)) {
            seen.push(event);
            thread::sleep(Duration::from_millis(20));
        }
        seen
    });

    let edges = (0..24)
        .filter(|_| matches!(detection.poll_once(), PollOutcome::Edge { .. }))
        .count();
    let seen = consumer.join().unwrap();

    assert_eq!(edges, 12);
    let stats = queue.stats().snapshot();
    assert_eq!(stats.accepted + stats.dropped, 12);
    assert_eq!(seen.len() as u64, stats.accepted);
    assert!(stats.max_depth <= 5);
    assert!(seen.windows(2).all(|w| w[0].seq() < w[1].seq()));
    assert!(seen.windows(2).all(|w| w[0].enqueued_at() <= w[1].enqueued_at()));
}

#[test]
fn file_signal_drives_detection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presence");
    fs::write(&path, "120.5").unwrap();

    let queue: Arc<CooldownQueue> = Arc::new(CooldownQueue::new());
    let mut detection = DetectionLoop::new(
        FileSignal::new(&path).with_threshold_cm(30.0),
        Arc::clone(&queue),
        DetectionSwitch::new(true),
        SystemClock::new(),
        Duration::from_millis(10),
    );

    assert_eq!(detection.poll_once(), PollOutcome::Absent);
    fs::write(&path, "12.0").unwrap();
    assert_eq!(detection.poll_once(), PollOutcome::Edge { accepted: true });
    fs::write(&path, "present").unwrap();
    assert_eq!(detection.poll_once(), PollOutcome::Present);

    // Sensor daemon mid-rewrite: unreadable counts as absent and rearms
    fs::write(&path, "").unwrap();
    assert_eq!(detection.poll_once(), PollOutcome::ReadFailed);
    fs::write(&path, "30").unwrap();
    assert_eq!(detection.poll_once(), PollOutcome::Edge { accepted: true });

    assert_eq!(queue.len(), 2);
}

#[test]
fn debounced_detection_ignores_single_sample_gaps() {
    let flicker = [true, true, false, true, true, false, false, true];
    let queue: Arc<CooldownQueue> = Arc::new(CooldownQueue::new());
    let mut detection = DetectionLoop::new(
        ScriptedSignal::new(flicker),
        Arc::clone(&queue),
        DetectionSwitch::new(true),
        MockClock::new(0),
        Duration::from_millis(100),
    )
    .with_detector(EdgeDetector::new().with_rearm_samples(2));

    for _ in 0..flicker.len() {
        detection.poll_once();
    }

    assert_eq!(queue.len(), 2);
}
