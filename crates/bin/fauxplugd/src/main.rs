//! # fauxplugd: smart plug emulator daemon
//!
//! Composition root that wires switches to their handlers and runs the
//! emulator loop.
//!
//! ## Responsibilities
//! - Load and validate configuration (config file, env vars)
//! - Initialise logging
//! - Build the shared LED strip and one action handler per switch
//! - Bind every switch's control listener and the SSDP socket
//! - Run the single-threaded event loop until SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no protocol logic belongs here.

mod config;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use fauxplug_adapter_led::{IndicatorHandler, LedStripHandler, VirtualStrip};
use fauxplug_adapter_net::{Emulator, resolve_advertise_ip};
use fauxplug_app::ports::{ActionHandler, Clock, SharedStrip, SystemClock};
use fauxplug_app::services::switch_service::SwitchService;
use fauxplug_domain::device::DeviceIdentity;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, HandlerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    if clock.now().is_none() {
        tracing::warn!("system clock not synchronised, Date headers use a placeholder");
    }

    let listen_ip = config.listen_ip()?;
    let advertise_ip = resolve_advertise_ip(config.server.advertise_ip, listen_ip);
    tracing::info!(%listen_ip, %advertise_ip, "starting");

    let strip: SharedStrip<VirtualStrip> =
        Arc::new(Mutex::new(VirtualStrip::new(config.strip.length)));

    let mut emulator = Emulator::new(
        config.emulator.clone(),
        config.discovery.clone(),
        Arc::clone(&clock),
    );

    if config.devices.is_empty() {
        tracing::warn!("no devices configured, nothing to emulate");
    }
    for device in &config.devices {
        let identity = DeviceIdentity::new(device.description.as_str())?;
        let handler = build_handler(&device.handler, &strip);
        let switch = SwitchService::new(identity, handler, Arc::clone(&clock));
        let addr = SocketAddr::new(listen_ip, device.port()?);
        emulator
            .add_switch(switch, addr, advertise_ip)
            .with_context(|| format!("failed to start switch {:?}", device.description))?;
    }

    tokio::select! {
        () = emulator.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_handler(
    config: &HandlerConfig,
    strip: &SharedStrip<VirtualStrip>,
) -> Option<Box<dyn ActionHandler>> {
    match config {
        HandlerConfig::LedStrip { color, brightness } => Some(Box::new(LedStripHandler::new(
            Arc::clone(strip),
            *color,
            *brightness,
        ))),
        HandlerConfig::Indicator => Some(Box::new(IndicatorHandler::new())),
        HandlerConfig::None => None,
    }
}
