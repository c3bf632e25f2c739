//! One entry point per device role
//!
//! Each builds its collaborators from the configuration, starts the loops
//! and blocks for the life of the process.

use std::path::PathBuf;

use anyhow::Context;
use buzzlink_connectors::{spawn_buzzer, spawn_detector, HttpNotifier};
use buzzlink_core::{
    Actuator, FileActuator, FileSignal, MemoryActuator, NodeConfig, PresenceSignal, ProximityAlarm,
    ScriptedSignal, SystemClock,
};

/// Absent for two seconds, present for one, at the default poll interval
fn demo_signal() -> ScriptedSignal {
    let absent = std::iter::repeat(false).take(20);
    let present = std::iter::repeat(true).take(10);
    ScriptedSignal::new(absent.chain(present)).cycle()
}

fn actuator(gpio_value_path: Option<PathBuf>) -> Box<dyn Actuator> {
    match gpio_value_path {
        Some(path) => {
            log::info!("Driving buzzer through {}", path.display());
            Box::new(FileActuator::new(path))
        }
        None => {
            log::warn!("No GPIO path given, buzzer is simulated");
            Box::new(MemoryActuator::new())
        }
    }
}

pub fn detector(config: &NodeConfig, signal_path: PathBuf, demo: bool) -> anyhow::Result<()> {
    let signal: Box<dyn PresenceSignal> = if demo {
        log::info!("Using demo presence pattern");
        Box::new(demo_signal())
    } else {
        log::info!("Reading presence from {}", signal_path.display());
        Box::new(FileSignal::new(signal_path).with_threshold_cm(config.detector.presence_threshold_cm))
    };

    let notifier = HttpNotifier::new(&config.notify)?;
    let node = spawn_detector(signal, notifier, config).context("starting detector")?;
    node.join();
    anyhow::bail!("detector threads exited")
}

pub fn buzzer(config: &NodeConfig, gpio_value_path: Option<PathBuf>) -> anyhow::Result<()> {
    let node = spawn_buzzer(actuator(gpio_value_path), config).context("starting buzzer")?;
    node.join();
    anyhow::bail!("buzzer threads exited")
}

pub fn proximity(
    config: &NodeConfig,
    distance_path: PathBuf,
    gpio_value_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let threshold_cm = config.detector.presence_threshold_cm;
    log::info!(
        "Proximity beeper on {} (threshold {} cm)",
        distance_path.display(),
        threshold_cm
    );
    let mut alarm = ProximityAlarm::new(
        FileSignal::new(distance_path),
        actuator(gpio_value_path),
        SystemClock::new(),
    )
    .with_threshold_cm(threshold_cm);
    alarm.run()
}
