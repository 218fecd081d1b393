//! The bridge adapter.
//!
//! Owns one driver instance and one slot mapping, and keeps the slot values
//! consistent with driver state under both directions of traffic:
//!
//! - driver state-change events project onto fixed slots ([`Projection`]);
//! - inbound slot writes turn into driver commands;
//! - a bus that reboots independently of the device gets a full rewrite of
//!   every feedback the moment it comes back online (`resync_all`).
//!
//! Construction is deliberately staged: the driver identity is assigned
//! first, feedbacks and routing descriptors are built next, and transport
//! initialization is deferred until after full construction so inbound
//! events can never race against partially-built feedback objects.

use crate::bus::SignalBus;
use crate::config::DeviceConfig;
use crate::driver::{DisplayDriver, StateCategory, StateEvent};
use crate::error::BridgeResult;
use crate::feedback::{BoolFeedback, IntFeedback, StringFeedback};
use crate::joinmap::BridgeJoinMap;
use crate::monitor::{
    CommunicationMonitor, HealthStatus, DEFAULT_ERROR_AFTER, DEFAULT_WARNING_AFTER,
};
use crate::routing::{classify, RouteChange, RoutingInputPort};
use crate::transport::{self, PortEnvironment, TransportBinding};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

const ROUTE_CHANNEL_CAPACITY: usize = 16;

/// The complete feedback set of one bridged display.
struct Feedbacks {
    connect: BoolFeedback,
    power: BoolFeedback,
    warming: BoolFeedback,
    cooling: BoolFeedback,
    mute: BoolFeedback,
    video_mute: BoolFeedback,
    status: IntFeedback,
    volume: IntFeedback,
    lamp_hours_1: IntFeedback,
    current_input: StringFeedback,
}

impl Feedbacks {
    fn fire_all(&self) {
        self.connect.fire_update();
        self.power.fire_update();
        self.warming.fire_update();
        self.cooling.fire_update();
        self.mute.fire_update();
        self.video_mute.fire_update();
        self.status.fire_update();
        self.volume.fire_update();
        self.lamp_hours_1.fire_update();
        self.current_input.fire_update();
    }
}

/// State shared between the adapter and its projection tasks.
struct Projection {
    key: String,
    driver: Arc<dyn DisplayDriver>,
    feedbacks: Feedbacks,
    input_ports: Vec<RoutingInputPort>,
    route_tx: broadcast::Sender<RouteChange>,
}

impl Projection {
    /// Full rewrite of every feedback slot from current driver state.
    ///
    /// Named operation by design: it is the broad invalidation strategy
    /// invoked from two independent triggers (driver reconnect, bus
    /// reconnect).
    fn resync_all(&self) {
        self.feedbacks.fire_all();
    }

    /// Projects one state-change notification onto the slot mapping.
    fn apply(&self, category: StateCategory) {
        match category {
            // A reconnect may have silently changed multiple underlying
            // values; refresh everything.
            StateCategory::Connection => self.resync_all(),

            StateCategory::Power | StateCategory::PoweredOn | StateCategory::PoweredOff => {
                self.feedbacks.power.fire_update();
            }

            StateCategory::WarmingUp | StateCategory::WarmedUp => {
                self.feedbacks.warming.fire_update();
            }

            StateCategory::CoolingDown | StateCategory::CooledDown => {
                self.feedbacks.cooling.fire_update();
            }

            StateCategory::VideoMute => self.feedbacks.video_mute.fire_update(),
            StateCategory::Mute => self.feedbacks.mute.fire_update(),
            StateCategory::Volume => self.feedbacks.volume.fire_update(),

            StateCategory::Input => {
                let active = self.driver.input_source();
                let port = self
                    .input_ports
                    .iter()
                    .find(|p| active == Some(p.match_token))
                    .cloned();
                if port.is_none() {
                    warn!("[{}] input change to unenumerated input {:?}", self.key, active);
                }
                self.feedbacks.current_input.fire_update();
                // The notification fires either way; a None port is the
                // observable "unknown input" signal.
                let _ = self.route_tx.send(RouteChange { port });
            }

            // Reserved for future slots; the categories are matched here so
            // adding slots later is a local change.
            StateCategory::LampHours => {}
            StateCategory::Audio => {}
        }
    }
}

/// Adapter between one display driver and the numbered-signal bus.
pub struct BridgeAdapter {
    name: String,
    config: DeviceConfig,
    driver: Arc<dyn DisplayDriver>,
    monitor: Arc<CommunicationMonitor>,
    proj: Arc<Projection>,
    route_tx: broadcast::Sender<RouteChange>,
    transport: Mutex<Option<TransportBinding>>,
    event_task: Mutex<Option<JoinHandle<()>>>,
    status_task: Mutex<Option<JoinHandle<()>>>,
    online_tasks: Mutex<Vec<JoinHandle<()>>>,
    active: AtomicBool,
}

impl BridgeAdapter {
    /// Constructs an adapter with the default health thresholds.
    pub fn new(config: DeviceConfig, driver: Arc<dyn DisplayDriver>) -> Self {
        Self::with_thresholds(config, driver, DEFAULT_WARNING_AFTER, DEFAULT_ERROR_AFTER)
    }

    /// Constructs an adapter with explicit health thresholds.
    pub fn with_thresholds(
        config: DeviceConfig,
        driver: Arc<dyn DisplayDriver>,
        warning_after: Duration,
        error_after: Duration,
    ) -> Self {
        info!("[{}] constructing bridge for '{}'", config.key, config.name);

        // Identity must be assigned before any transport activity begins.
        driver.set_id(config.id);

        let monitor = Arc::new(CommunicationMonitor::new(
            Arc::clone(&driver),
            warning_after,
            error_after,
        ));

        // Lazy read-throughs: every feedback re-reads live driver state.
        let feedbacks = Feedbacks {
            connect: {
                let d = Arc::clone(&driver);
                BoolFeedback::new("connect", move || d.connected())
            },
            power: {
                let d = Arc::clone(&driver);
                BoolFeedback::new("power", move || d.power_is_on())
            },
            warming: {
                let d = Arc::clone(&driver);
                BoolFeedback::new("warming", move || d.warming_up())
            },
            cooling: {
                let d = Arc::clone(&driver);
                BoolFeedback::new("cooling", move || d.cooling_down())
            },
            mute: {
                let d = Arc::clone(&driver);
                BoolFeedback::new("mute", move || d.muted())
            },
            video_mute: {
                let d = Arc::clone(&driver);
                BoolFeedback::new("videoMute", move || d.video_mute_is_on())
            },
            status: {
                let m = Arc::clone(&monitor);
                IntFeedback::new("status", move || m.status().code())
            },
            volume: {
                let d = Arc::clone(&driver);
                IntFeedback::new("volume", move || d.volume_percent())
            },
            lamp_hours_1: {
                let d = Arc::clone(&driver);
                IntFeedback::new("lampHours1", move || {
                    d.lamp_hours().first().copied().unwrap_or(0).min(u32::from(u16::MAX)) as u16
                })
            },
            current_input: {
                let d = Arc::clone(&driver);
                StringFeedback::new("currentInput", move || {
                    let active = d.input_source();
                    d.usable_inputs()
                        .into_iter()
                        .find(|input| Some(input.id) == active)
                        .map(|input| input.name)
                        .unwrap_or_default()
                })
            },
        };

        // Enumerate routable inputs once; the list is static per device.
        let input_ports: Vec<RoutingInputPort> = if driver.supports_set_input_source() {
            driver
                .usable_inputs()
                .into_iter()
                .map(|input| {
                    let (connection_type, signal_kind) = classify(input.connector);
                    RoutingInputPort {
                        key: input.name,
                        signal_kind,
                        connection_type,
                        match_token: input.id,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };
        debug!("[{}] enumerated {} routable inputs", config.key, input_ports.len());

        let (route_tx, _) = broadcast::channel(ROUTE_CHANNEL_CAPACITY);

        let proj = Arc::new(Projection {
            key: config.key.clone(),
            driver: Arc::clone(&driver),
            feedbacks,
            input_ports,
            route_tx: route_tx.clone(),
        });

        Self {
            name: config.name.clone(),
            config,
            driver,
            monitor,
            proj,
            route_tx,
            transport: Mutex::new(None),
            event_task: Mutex::new(None),
            status_task: Mutex::new(None),
            online_tasks: Mutex::new(Vec::new()),
            active: AtomicBool::new(false),
        }
    }

    /// Device key.
    pub fn key(&self) -> &str {
        &self.config.key
    }

    /// Device display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The driver owned by this adapter.
    pub fn driver(&self) -> &Arc<dyn DisplayDriver> {
        &self.driver
    }

    /// Routable inputs enumerated at construction.
    pub fn input_ports(&self) -> Vec<RoutingInputPort> {
        self.proj.input_ports.clone()
    }

    /// Current health status.
    pub fn health_status(&self) -> HealthStatus {
        self.monitor.status()
    }

    /// Watches health status transitions.
    pub fn subscribe_health(&self) -> watch::Receiver<HealthStatus> {
        self.monitor.subscribe()
    }

    /// Subscribes to routing-changed notifications.
    pub fn subscribe_route_changes(&self) -> broadcast::Receiver<RouteChange> {
        self.route_tx.subscribe()
    }

    /// The transport binding opened by [`init_transport`](Self::init_transport).
    pub fn transport_binding(&self) -> Option<TransportBinding> {
        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Selects and initializes the declared transport.
    ///
    /// Deferred until after full construction (typically right after
    /// activation) so inbound events cannot race partially-built state.
    pub fn init_transport(&self, env: &dyn PortEnvironment) -> BridgeResult<TransportBinding> {
        let binding = transport::select(&self.config, self.driver.as_ref(), env)?;
        let mut guard = self.transport.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(binding.clone());
        Ok(binding)
    }

    /// Connects or disconnects the underlying driver session.
    ///
    /// Disconnect is skipped for drivers that do not support it.
    pub fn set_connect(&self, value: bool) {
        if value {
            self.driver.connect();
        } else if self.driver.supports_disconnect() {
            self.driver.disconnect();
        }
    }

    /// Whether the driver session is live.
    pub fn connect(&self) -> bool {
        self.driver.connected()
    }

    /// Whether the adapter is activated.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Activates the adapter: subscribes to driver events, opens the driver
    /// session, and starts the health monitor.
    ///
    /// Activating an already-active adapter is a no-op returning `true`,
    /// so duplicate subscriptions cannot accumulate. Must be called from
    /// within a Tokio runtime.
    pub fn activate(&self) -> bool {
        if self.active.swap(true, Ordering::SeqCst) {
            debug!("[{}] activate called while already active", self.config.key);
            return true;
        }

        // Subscribe before spawning so no event between activation and the
        // task's first poll is lost.
        let events = self.driver.subscribe();
        let proj = Arc::clone(&self.proj);
        let key = self.config.key.clone();
        let task = tokio::spawn(run_projection(key, proj, events));
        *self
            .event_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task);

        // Health transitions project onto the status slot as they happen,
        // not only on the next driver event.
        let mut health = self.monitor.subscribe();
        let proj = Arc::clone(&self.proj);
        let status_task = tokio::spawn(async move {
            while health.changed().await.is_ok() {
                proj.feedbacks.status.fire_update();
            }
        });
        *self
            .status_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(status_task);

        self.set_connect(true);
        self.monitor.start();
        info!("[{}] activated", self.config.key);
        true
    }

    /// Deactivates the adapter: stops the monitor, closes the driver
    /// session, and unsubscribes from driver events.
    ///
    /// Idempotent; safe on an already-inactive instance.
    pub fn deactivate(&self) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return true;
        }

        self.monitor.stop();
        self.set_connect(false);

        if let Some(task) = self
            .event_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        if let Some(task) = self
            .status_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        info!("[{}] deactivated", self.config.key);
        true
    }

    /// Attaches this device to a bus at the given join start.
    ///
    /// Binds every feedback to its fixed slot exactly once per attach call,
    /// registers the inbound command slots, writes the one-time static
    /// values, and installs the offline-to-online resynchronization
    /// handler. Must be called from within a Tokio runtime.
    pub fn link_to_bus(&self, bus: &Arc<dyn SignalBus>, join_start: u32) {
        let map = BridgeJoinMap::new(join_start);
        info!("[{}] linking to bus at join start {}", self.config.key, join_start);

        // Inbound command slots.
        {
            let d = Arc::clone(&self.driver);
            bus.set_digital_action(
                map.connect,
                Box::new(move |sig| {
                    if sig {
                        d.connect();
                    } else if d.supports_disconnect() {
                        d.disconnect();
                    }
                }),
            );
        }
        {
            let d = Arc::clone(&self.driver);
            bus.set_digital_action(
                map.video_mute_on,
                Box::new(move |sig| {
                    if sig {
                        d.video_mute_on();
                    }
                }),
            );
        }
        {
            let d = Arc::clone(&self.driver);
            bus.set_digital_action(
                map.video_mute_off,
                Box::new(move |sig| {
                    if sig {
                        d.video_mute_off();
                    }
                }),
            );
        }
        {
            let d = Arc::clone(&self.driver);
            bus.set_digital_action(
                map.power_on,
                Box::new(move |sig| {
                    if sig {
                        d.power_on();
                    }
                }),
            );
        }
        {
            let d = Arc::clone(&self.driver);
            bus.set_digital_action(
                map.power_off,
                Box::new(move |sig| {
                    if sig {
                        d.power_off();
                    }
                }),
            );
        }
        {
            let d = Arc::clone(&self.driver);
            bus.set_digital_action(
                map.mute_on,
                Box::new(move |sig| {
                    if sig {
                        d.mute_on();
                    }
                }),
            );
        }
        {
            let d = Arc::clone(&self.driver);
            bus.set_digital_action(
                map.mute_off,
                Box::new(move |sig| {
                    if sig {
                        d.mute_off();
                    }
                }),
            );
        }
        {
            let d = Arc::clone(&self.driver);
            bus.set_digital_action(
                map.volume_up,
                Box::new(move |sig| {
                    if sig {
                        d.volume_up();
                    }
                }),
            );
        }
        {
            let d = Arc::clone(&self.driver);
            bus.set_digital_action(
                map.volume_down,
                Box::new(move |sig| {
                    if sig {
                        d.volume_down();
                    }
                }),
            );
        }
        {
            let d = Arc::clone(&self.driver);
            bus.set_analog_action(map.volume_level, Box::new(move |level| d.set_volume(level)));
        }

        // Feedback slots, bound exactly once per attach.
        let f = &self.proj.feedbacks;
        f.connect.link(bus, map.connect);
        f.power.link(bus, map.power_on);
        f.warming.link(bus, map.warming);
        f.cooling.link(bus, map.cooling);
        f.mute.link(bus, map.mute_on);
        f.video_mute.link(bus, map.video_mute_on);
        f.status.link(bus, map.status);
        f.volume.link(bus, map.volume_level);
        f.lamp_hours_1.link(bus, map.lamp_hours_1);
        f.current_input.link(bus, map.current_input);

        // One-time static values.
        write_statics(bus, &map, &self.driver, &self.name);

        // Resynchronization path for a bus that rebooted independently of
        // the device: on every offline-to-online transition, re-write the
        // statics and re-fire every feedback.
        let mut online_rx = bus.online_events();
        let proj = Arc::clone(&self.proj);
        let bus_for_task = Arc::clone(bus);
        let driver = Arc::clone(&self.driver);
        let device_name = self.name.clone();
        let key = self.config.key.clone();
        let task = tokio::spawn(async move {
            while online_rx.changed().await.is_ok() {
                let online = *online_rx.borrow_and_update();
                if online {
                    debug!("[{}] bus came online, resyncing", key);
                    write_statics(&bus_for_task, &map, &driver, &device_name);
                    proj.resync_all();
                }
            }
        });
        self.online_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
    }

    /// Full rewrite of every feedback slot from current driver state.
    pub fn resync_all(&self) {
        self.proj.resync_all();
    }

    // -- command surface -------------------------------------------------

    /// Powers the display on.
    pub fn power_on(&self) {
        self.driver.power_on();
    }

    /// Powers the display off.
    pub fn power_off(&self) {
        self.driver.power_off();
    }

    /// Toggles display power.
    pub fn power_toggle(&self) {
        self.driver.power_toggle();
    }

    /// Sets the volume percentage.
    pub fn set_volume(&self, level: u16) {
        self.driver.set_volume(level);
    }

    /// Nudges the volume up one step.
    pub fn volume_up(&self) {
        self.driver.volume_up();
    }

    /// Nudges the volume down one step.
    pub fn volume_down(&self) {
        self.driver.volume_down();
    }

    /// Mutes audio.
    pub fn mute_on(&self) {
        self.driver.mute_on();
    }

    /// Unmutes audio.
    pub fn mute_off(&self) {
        self.driver.mute_off();
    }

    /// Toggles audio mute.
    pub fn mute_toggle(&self) {
        if self.driver.muted() {
            self.driver.mute_off();
        } else {
            self.driver.mute_on();
        }
    }

    /// Mutes video.
    pub fn video_mute_on(&self) {
        self.driver.video_mute_on();
    }

    /// Unmutes video.
    pub fn video_mute_off(&self) {
        self.driver.video_mute_off();
    }

    /// Switches to the input behind the given routing descriptor.
    pub fn execute_switch(&self, port: &RoutingInputPort) {
        self.driver.set_input_source(port.match_token);
    }
}

impl Drop for BridgeAdapter {
    fn drop(&mut self) {
        self.deactivate();
        for task in self
            .online_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
        {
            task.abort();
        }
    }
}

fn write_statics(
    bus: &Arc<dyn SignalBus>,
    map: &BridgeJoinMap,
    driver: &Arc<dyn DisplayDriver>,
    device_name: &str,
) {
    let info = driver.info();
    bus.set_serial(map.driver_name, &info.driver_name);
    bus.set_serial(map.device_name, device_name);
    bus.set_digital(map.is_two_way_display, true);
    bus.set_digital(map.video_mute_supported, driver.supports_video_mute_feedback());
    bus.set_digital(map.lamp_hours_supported, driver.supports_lamp_hours());
}

async fn run_projection(
    key: String,
    proj: Arc<Projection>,
    mut events: broadcast::Receiver<StateEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => proj.apply(event.category),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                // Missed notifications leave unknown slots stale; fall back
                // to the broad invalidation.
                warn!("[{}] projection lagged {} events, full resync", key, missed);
                proj.resync_all();
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("[{}] driver event stream closed", key);
                break;
            }
        }
    }
}
