//! # Event Loop
//!
//! Drives a [`Watchface`] the way a watch platform would: a clock service that
//! reports which [`TimeUnits`] rolled over, a battery service, a vibration
//! motor, and the AppMessage link to the phone. After every handled event the
//! face is redrawn into a [`Framebuffer`].

use crate::battery::BatteryState;
use crate::clock::TimeUnits;
use crate::config::Config;
use crate::face::{FaceSettings, Watchface};
use crate::framebuffer::Framebuffer;
use crate::message::{AppMessageResult, Dictionary};
use crate::transport::AppMessage;
use crate::weather::weather_request;
use chrono::{Local, NaiveDateTime};
use embedded_graphics::prelude::*;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// How often the wall clock is sampled for unit rollovers
const CLOCK_POLL: Duration = Duration::from_secs(1);
/// How often the battery service is asked for the charge state
const BATTERY_POLL: Duration = Duration::from_secs(60);

/// Battery service.
pub trait BatterySource {
    /// Charge state right now
    fn peek(&mut self) -> BatteryState;
}

/// Vibration motor.
pub trait Vibes {
    fn long_pulse(&mut self);
}

/// Battery that always reports the same state.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedBattery(pub BatteryState);

impl BatterySource for FixedBattery {
    fn peek(&mut self) -> BatteryState {
        self.0
    }
}

/// Battery read from the Linux power-supply class in sysfs.
pub struct SysfsBattery {
    root: PathBuf,
    last: BatteryState,
}

impl SysfsBattery {
    pub const DEFAULT_ROOT: &'static str = "/sys/class/power_supply";

    pub fn new() -> Self {
        Self::with_root(Self::DEFAULT_ROOT)
    }

    /// Scan `root` instead of the real sysfs directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last: BatteryState {
                charge_percent: 100,
                is_charging: false,
            },
        }
    }

    /// First supply of type "Battery" under the root.
    fn find_battery(&self) -> io::Result<PathBuf> {
        let mut entries: Vec<_> = fs::read_dir(&self.root)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .collect();
        entries.sort();
        entries
            .into_iter()
            .find(|p| read_trimmed(&p.join("type")).is_ok_and(|t| t == "Battery"))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no battery supply"))
    }

    pub fn read(&self) -> io::Result<BatteryState> {
        let supply = self.find_battery()?;
        let capacity: u8 = read_trimmed(&supply.join("capacity"))?
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let status = read_trimmed(&supply.join("status")).unwrap_or_default();
        Ok(BatteryState {
            charge_percent: capacity.min(100),
            is_charging: status == "Charging",
        })
    }
}

impl Default for SysfsBattery {
    fn default() -> Self {
        Self::new()
    }
}

impl BatterySource for SysfsBattery {
    fn peek(&mut self) -> BatteryState {
        match self.read() {
            Ok(state) => self.last = state,
            Err(e) => debug!(root = %self.root.display(), error = %e, "battery read failed, keeping last state"),
        }
        self.last
    }
}

fn read_trimmed(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

/// Vibration motor that only logs.
#[derive(Debug, Default)]
pub struct LogVibes;

impl Vibes for LogVibes {
    fn long_pulse(&mut self) {
        info!("bzzzzz (long pulse)");
    }
}

/// Face plus the services that feed it.
pub struct Runtime<B, V> {
    face: Watchface,
    framebuffer: Framebuffer,
    bounds: Size,
    battery: B,
    vibes: V,
    link: AppMessage,
    last_battery: Option<BatteryState>,
}

impl<B: BatterySource, V: Vibes> Runtime<B, V> {
    pub fn new(config: &Config, battery: B, vibes: V, link: AppMessage) -> Self {
        let bounds = Size::new(config.face.width, config.face.height);
        Self {
            face: Watchface::new(FaceSettings::from(config)),
            framebuffer: Framebuffer::new(bounds.width, bounds.height),
            bounds,
            battery,
            vibes,
            link,
            last_battery: None,
        }
    }

    pub fn face(&self) -> &Watchface {
        &self.face
    }

    pub fn face_mut(&mut self) -> &mut Watchface {
        &mut self.face
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Push the window, show the current time, date and battery, and ask the
    /// phone for weather straight away.
    pub fn start(&mut self, now: NaiveDateTime) {
        self.face.load(self.bounds);
        let battery = self.battery.peek();
        self.last_battery = Some(battery);
        self.face.init(now, battery);
        self.send(&weather_request());
        self.render();
    }

    /// Dispatch the clock moving from `prev` to `now`. Returns true if the face
    /// was ticked.
    pub fn tick(&mut self, prev: NaiveDateTime, now: NaiveDateTime) -> bool {
        let units = TimeUnits::between(prev, now) & TimeUnits::FACE_SUBSCRIPTION;
        if units.is_empty() {
            return false;
        }

        let outcome = self.face.on_tick(now, units);
        if outcome.vibrate {
            self.vibes.long_pulse();
        }
        if let Some(request) = outcome.request {
            self.send(&request);
        }
        true
    }

    /// Ask the battery service for the charge state; returns true if it
    /// changed and the face was told.
    pub fn poll_battery(&mut self) -> bool {
        let state = self.battery.peek();
        if self.last_battery == Some(state) {
            return false;
        }
        self.last_battery = Some(state);
        self.face.on_battery(state);
        true
    }

    /// Hand one inbound message, or its drop reason, to the face.
    pub fn deliver(&mut self, message: Result<Dictionary, AppMessageResult>) {
        match message {
            Ok(dict) => self.face.on_inbox(&dict),
            Err(reason) => self.face.on_inbox_dropped(reason),
        }
    }

    /// Redraw the face into the framebuffer.
    pub fn render(&mut self) -> &Framebuffer {
        self.face
            .draw(&mut self.framebuffer)
            .unwrap_or_else(|never| match never {});
        &self.framebuffer
    }

    /// Wait up to `timeout` for one inbound message and deliver it. Returns
    /// true if something arrived.
    pub async fn settle(&mut self, timeout: Duration) -> bool {
        match time::timeout(timeout, self.link.recv()).await {
            Ok(Some(message)) => {
                self.deliver(message);
                self.render();
                true
            }
            Ok(None) | Err(_) => false,
        }
    }

    /// Run until `shutdown` resolves, then unload the window.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut last = Local::now().naive_local();
        self.start(last);
        info!(time = %self.face.time_text(), date = %self.face.date_text(), "watchface started");

        let mut clock = time::interval(CLOCK_POLL);
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut battery = time::interval(BATTERY_POLL);
        battery.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut link_open = true;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                _ = clock.tick() => {
                    let now = Local::now().naive_local();
                    if self.tick(last, now) {
                        self.render();
                    }
                    last = now;
                }

                _ = battery.tick() => {
                    if self.poll_battery() {
                        self.render();
                    }
                }

                message = self.link.recv(), if link_open => match message {
                    Some(message) => {
                        self.deliver(message);
                        self.render();
                    }
                    None => {
                        warn!("phone link closed; weather will no longer update");
                        link_open = false;
                    }
                },
            }
        }

        self.face.unload();
        info!("watchface stopped");
    }

    fn send(&mut self, dict: &Dictionary) {
        match self.link.send(dict) {
            Ok(()) => self.face.on_outbox_sent(),
            Err(reason) => self.face.on_outbox_failed(reason),
        }
    }
}
