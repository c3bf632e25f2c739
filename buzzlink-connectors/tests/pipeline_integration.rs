//! End-to-end tests over loopback
//!
//! Each test runs real nodes on OS-assigned ports with shortened cooldowns
//! and pulses. Counts are asserted exactly; timings only as lower bounds.

mod common;

use std::net::TcpListener;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use buzzlink_connectors::{
    spawn_buzzer, spawn_detector, DeliveryWorker, HttpNotifier, ServerError, StartupError,
};
use buzzlink_core::{CooldownQueue, DeliveryConfig, MemoryActuator, ScriptedSignal, SystemClock};

use common::{body, loopback_config, notify_url, raw_exchange, wait_until};

#[test]
fn one_episode_one_buzz() {
    let actuator = MemoryActuator::new();
    let buzzer = spawn_buzzer(actuator.clone(), &loopback_config()).unwrap();

    let mut config = loopback_config();
    config.notify = config.notify.url(notify_url(buzzer.receiver_addr()));
    let signal = ScriptedSignal::new([false, false, true, true, true, false]);
    let detector = spawn_detector(signal, HttpNotifier::new(&config.notify).unwrap(), &config).unwrap();

    assert!(wait_until(Duration::from_secs(3), || buzzer.pulses().load(Ordering::Relaxed) == 1));

    // Give a spurious second delivery time to show up
    thread::sleep(Duration::from_millis(400));
    assert_eq!(buzzer.pulses().load(Ordering::Relaxed), 1);
    assert_eq!(actuator.activations(), 1);
    assert!(!actuator.is_active());

    let delivery = detector.delivery_stats();
    assert_eq!(delivery.attempts.load(Ordering::Relaxed), 1);
    assert_eq!(delivery.delivered.load(Ordering::Relaxed), 1);
    assert_eq!(detector.queue().stats().snapshot().accepted, 1);
}

#[test]
fn burst_is_capped_and_drained_at_cooldown_pace() {
    let buzzer = spawn_buzzer(MemoryActuator::new(), &loopback_config()).unwrap();

    let queue: Arc<CooldownQueue> = Arc::new(CooldownQueue::new());
    let accepted = (0..10).filter(|&i| queue.try_enqueue(i)).count();
    assert_eq!(accepted, 5);
    assert_eq!(queue.stats().snapshot().dropped, 5);

    let delivery = DeliveryConfig::new(notify_url(buzzer.receiver_addr()))
        .cooldown_ms(150)
        .timeout_ms(1000);
    let mut worker = DeliveryWorker::new(
        Arc::clone(&queue),
        HttpNotifier::new(&delivery).unwrap(),
        SystemClock::new(),
        delivery.cooldown(),
    );

    let attempts: Vec<_> = (0..5).map(|_| worker.deliver_next()).collect();

    assert!(attempts.iter().all(|a| a.result.is_ok()));
    for pair in attempts.windows(2) {
        assert!(pair[1].started_at - pair[0].started_at >= 150);
    }
    assert!(queue.is_empty());
    assert_eq!(buzzer.pulses().load(Ordering::Relaxed), 5);
}

#[test]
fn silent_connection_still_buzzes() {
    let actuator = MemoryActuator::new();
    let buzzer = spawn_buzzer(actuator.clone(), &loopback_config()).unwrap();

    let reply = raw_exchange(buzzer.receiver_addr(), b"", Duration::from_secs(2));

    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("Content-Type: text/plain"));
    assert_eq!(body(&reply), "Notified");
    assert_eq!(buzzer.pulses().load(Ordering::Relaxed), 1);
    assert_eq!(actuator.transitions(), vec![true, false]);
}

#[test]
fn receiver_survives_actuator_failure() {
    let actuator = MemoryActuator::new();
    actuator.fail_activations(1);
    let buzzer = spawn_buzzer(actuator.clone(), &loopback_config()).unwrap();
    let addr = buzzer.receiver_addr();

    let first = raw_exchange(addr, b"GET /notify HTTP/1.1\r\n\r\n", Duration::from_secs(2));
    assert!(first.starts_with("HTTP/1.1 500"));
    assert!(!actuator.is_active());

    let second = raw_exchange(addr, b"GET /notify HTTP/1.1\r\n\r\n", Duration::from_secs(2));
    assert_eq!(body(&second), "Notified");
    assert_eq!(buzzer.pulses().load(Ordering::Relaxed), 1);
}

#[test]
fn control_endpoint_toggles_detection() {
    let mut config = loopback_config();
    config.detector = config.detector.start_enabled(false);
    let detector = spawn_detector(
        ScriptedSignal::new([false]).cycle(),
        HttpNotifier::new(&config.notify).unwrap(),
        &config,
    )
    .unwrap();
    let addr = detector.control_addr();

    let reply = raw_exchange(addr, b"GET /video HTTP/1.1\r\n\r\n", Duration::from_secs(2));
    assert_eq!(body(&reply), "Detection started");
    assert!(detector.switch().is_enabled());

    let reply = raw_exchange(addr, b"GET /stop HTTP/1.1\r\n\r\n", Duration::from_secs(2));
    assert_eq!(body(&reply), "Detection stopped");
    assert!(!detector.switch().is_enabled());

    let reply = raw_exchange(addr, b"GET /elsewhere HTTP/1.1\r\n\r\n", Duration::from_secs(2));
    assert!(reply.starts_with("HTTP/1.1 404"));
}

#[test]
fn heartbeat_starts_detection_remotely() {
    let mut detector_config = loopback_config();
    detector_config.detector = detector_config.detector.start_enabled(false);
    let buzzer_placeholder = TcpListener::bind("127.0.0.1:0").unwrap();
    detector_config.notify = detector_config
        .notify
        .url(notify_url(buzzer_placeholder.local_addr().unwrap()));
    let detector = spawn_detector(
        ScriptedSignal::new([false]).cycle(),
        HttpNotifier::new(&detector_config.notify).unwrap(),
        &detector_config,
    )
    .unwrap();
    assert!(!detector.switch().is_enabled());

    let mut buzzer_config = loopback_config();
    buzzer_config.heartbeat = buzzer_config
        .heartbeat
        .enabled(true)
        .interval_ms(100)
        .delivery(
            DeliveryConfig::new(format!("http://{}/video", detector.control_addr()))
                .cooldown_ms(100)
                .timeout_ms(1000),
        );
    let buzzer = spawn_buzzer(MemoryActuator::new(), &buzzer_config).unwrap();

    assert!(wait_until(Duration::from_secs(3), || detector.switch().is_enabled()));
    let heartbeat = buzzer.heartbeat().unwrap();
    assert!(wait_until(Duration::from_secs(3), || {
        heartbeat.delivery.delivered.load(Ordering::Relaxed) >= 1
    }));
}

#[test]
fn startup_errors_are_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = loopback_config();
    config.receiver = config.receiver.port(taken.local_addr().unwrap().port());
    assert!(matches!(
        spawn_buzzer(MemoryActuator::new(), &config),
        Err(StartupError::Server(ServerError::Bind { .. }))
    ));

    let mut config = loopback_config();
    config.receiver = config.receiver.pulse_ms(0);
    assert!(matches!(
        spawn_buzzer(MemoryActuator::new(), &config),
        Err(StartupError::Config(_))
    ));
}
