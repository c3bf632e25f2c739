//! Long-running threads for each device role
//!
//! ## Detector device
//!
//! ```text
//! [detect] signal → EdgeDetector → try_enqueue ─┐
//!                                               ├─ CooldownQueue ─→ [deliver] → buzzer /notify
//! [control] GET /video, /stop → DetectionSwitch ┘
//! ```
//!
//! ## Buzzer device
//!
//! ```text
//! [receive]   accept → pulse(actuator) → "Notified"
//! [heartbeat] PeriodicTrigger → CooldownQueue → [return] → detector /video
//! ```
//!
//! The queue is the only state shared between a producer and its worker,
//! and each one is owned by the node that spawned it. Listeners are bound
//! before any thread starts, so a taken port is reported to the caller
//! instead of killing a background thread.
//!
//! None of the loops return. [`DetectorNode::join`] and
//! [`BuzzerNode::join`] only come back if a thread panicked.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use buzzlink_core::{
    Actuator, ConfigError, CooldownQueue, DetectionLoop, DetectionSwitch, EdgeDetector, NodeConfig,
    PeriodicTrigger, PresenceSignal, SystemClock,
};
use thiserror::Error;

use crate::control::ControlEndpoint;
use crate::http::HttpNotifier;
use crate::receiver::NotificationReceiver;
use crate::server::{Server, ServerError, ServerStats};
use crate::worker::{DeliveryStats, DeliveryWorker};
use crate::Notifier;

/// Why a node could not start
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

fn spawn_named<F>(name: &'static str, body: F) -> Result<JoinHandle<()>, StartupError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(body)
        .map_err(|source| StartupError::Spawn { name, source })
}

fn join_all(threads: Vec<JoinHandle<()>>) {
    for handle in threads {
        let name = handle.thread().name().unwrap_or("unnamed").to_string();
        if handle.join().is_err() {
            log::error!("Thread {} panicked", name);
        }
    }
}

/// Handles to a running detector device
pub struct DetectorNode {
    queue: Arc<CooldownQueue>,
    switch: DetectionSwitch,
    delivery: Arc<DeliveryStats>,
    control: Arc<ServerStats>,
    control_addr: SocketAddr,
    threads: Vec<JoinHandle<()>>,
}

impl DetectorNode {
    pub fn queue(&self) -> &Arc<CooldownQueue> {
        &self.queue
    }

    pub fn switch(&self) -> &DetectionSwitch {
        &self.switch
    }

    pub fn delivery_stats(&self) -> &Arc<DeliveryStats> {
        &self.delivery
    }

    pub fn control_stats(&self) -> &Arc<ServerStats> {
        &self.control
    }

    /// Where the start/stop endpoint is listening
    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    /// Block on the node's threads
    pub fn join(self) {
        join_all(self.threads)
    }
}

/// Start detection, delivery and the control endpoint
pub fn spawn_detector<S, T>(signal: S, notifier: T, config: &NodeConfig) -> Result<DetectorNode, StartupError>
where
    S: PresenceSignal + 'static,
    T: Notifier + 'static,
{
    config.detector.validate()?;
    config.notify.validate()?;
    config.receiver.validate()?;

    let control_addr = format!("{}:{}", config.receiver.bind_addr, config.detector.control_port);
    let switch = DetectionSwitch::new(config.detector.start_enabled);
    let mut control = Server::bind(control_addr.as_str(), ControlEndpoint::new(switch.clone()), &config.receiver)?;
    let control_addr = control.local_addr().map_err(ServerError::from)?;
    let control_stats = control.stats();

    let queue: Arc<CooldownQueue> = Arc::new(CooldownQueue::new());
    let mut detection = DetectionLoop::new(
        signal,
        Arc::clone(&queue),
        switch.clone(),
        SystemClock::new(),
        config.detector.poll_interval(),
    )
    .with_detector(EdgeDetector::new().with_rearm_samples(config.detector.rearm_samples));

    let mut worker = DeliveryWorker::new(
        Arc::clone(&queue),
        notifier,
        SystemClock::new(),
        config.notify.cooldown(),
    );
    let delivery = worker.stats();

    let threads = vec![
        spawn_named("control", move || {
            control.run();
        })?,
        spawn_named("deliver", move || {
            worker.run();
        })?,
        spawn_named("detect", move || {
            detection.run();
        })?,
    ];

    log::info!(
        "Detector running: control on {}, notifying {} (detection {})",
        control_addr,
        config.notify.url,
        if switch.is_enabled() { "on" } else { "waiting for start" }
    );

    Ok(DetectorNode {
        queue,
        switch,
        delivery,
        control: control_stats,
        control_addr,
        threads,
    })
}

/// Return-notification side of a buzzer node
pub struct Heartbeat {
    pub queue: Arc<CooldownQueue>,
    pub delivery: Arc<DeliveryStats>,
}

/// Handles to a running buzzer device
pub struct BuzzerNode {
    receiver_addr: SocketAddr,
    pulses: Arc<AtomicU64>,
    receiver: Arc<ServerStats>,
    heartbeat: Option<Heartbeat>,
    threads: Vec<JoinHandle<()>>,
}

impl BuzzerNode {
    /// Where the notification receiver is listening
    pub fn receiver_addr(&self) -> SocketAddr {
        self.receiver_addr
    }

    /// Completed buzzer pulses
    pub fn pulses(&self) -> &Arc<AtomicU64> {
        &self.pulses
    }

    pub fn receiver_stats(&self) -> &Arc<ServerStats> {
        &self.receiver
    }

    /// `None` when the heartbeat is disabled
    pub fn heartbeat(&self) -> Option<&Heartbeat> {
        self.heartbeat.as_ref()
    }

    pub fn join(self) {
        join_all(self.threads)
    }
}

/// Start the notification receiver and, if enabled, the return notification
pub fn spawn_buzzer<A>(actuator: A, config: &NodeConfig) -> Result<BuzzerNode, StartupError>
where
    A: Actuator + 'static,
{
    config.receiver.validate()?;
    config.heartbeat.validate()?;

    let handler = NotificationReceiver::new(actuator, SystemClock::new(), config.receiver.pulse());
    let pulses = handler.pulse_counter();
    let mut server = Server::bind(config.receiver.listen_addr().as_str(), handler, &config.receiver)?;
    let receiver_addr = server.local_addr().map_err(ServerError::from)?;
    let receiver = server.stats();

    let mut threads = vec![spawn_named("receive", move || {
        server.run();
    })?];

    let heartbeat = if config.heartbeat.enabled {
        let queue: Arc<CooldownQueue> = Arc::new(CooldownQueue::new());
        let trigger = PeriodicTrigger::new(Arc::clone(&queue), SystemClock::new(), config.heartbeat.interval());
        let mut worker = DeliveryWorker::new(
            Arc::clone(&queue),
            HttpNotifier::new(&config.heartbeat.delivery)?,
            SystemClock::new(),
            config.heartbeat.delivery.cooldown(),
        );
        let delivery = worker.stats();

        threads.push(spawn_named("return", move || {
            worker.run();
        })?);
        threads.push(spawn_named("heartbeat", move || {
            trigger.run();
        })?);

        log::info!(
            "Return notification to {} every {:?}",
            config.heartbeat.delivery.url,
            config.heartbeat.interval()
        );
        Some(Heartbeat { queue, delivery })
    } else {
        None
    };

    log::info!("Buzzer running: receiver on {}", receiver_addr);

    Ok(BuzzerNode {
        receiver_addr,
        pulses,
        receiver,
        heartbeat,
        threads,
    })
}
