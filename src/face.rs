//! # The Watchface
//!
//! [`Watchface`] holds the face's state and exposes one method per platform
//! callback. It never blocks, never talks to the transport itself and never
//! reads the clock: the caller passes the time in and acts on the
//! [`TickOutcome`] it gets back.
//!
//! ## Callbacks
//! - **Window**: [`Watchface::load`] creates the layers, [`Watchface::unload`] drops them
//! - **Tick**: [`Watchface::on_tick`] refreshes time/date, asks for the hourly
//!   vibe and produces the periodic weather request
//! - **Battery**: [`Watchface::on_battery`] records the charge and dirties the meter
//! - **Inbox**: [`Watchface::on_inbox`] turns a phone reply into the weather text
//! - **Draw**: [`Watchface::draw`] renders every layer into any 1-bit `DrawTarget`

use crate::battery::{BatteryMeter, BatteryState};
use crate::clock::{format_date, format_time, TimeUnits};
use crate::config::Config;
use crate::layout::{FontSet, Layout, Rect};
use crate::message::{AppMessageResult, Dictionary};
use crate::weather::{weather_request, weather_text, Weather};
use crate::{FontVariant, TemperatureUnit};
use chrono::{NaiveDateTime, Timelike};
use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::Rectangle,
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use tracing::{debug, error, info};

/// Time text shown before the first tick
const PLACEHOLDER_TIME: &str = "00:00";

/// Face behaviour taken from [`Config`].
#[derive(Clone, Debug)]
pub struct FaceSettings {
    pub use_24h: bool,
    pub font: FontVariant,
    pub loading_text: String,
    pub hourly_vibe: bool,
    pub refresh_minutes: u32,
    pub unit: TemperatureUnit,
    pub show_conditions: bool,
}

impl From<&Config> for FaceSettings {
    fn from(config: &Config) -> Self {
        FaceSettings {
            use_24h: config.clock.use_24h,
            font: config.face.font,
            loading_text: config.face.loading_text.clone(),
            hourly_vibe: config.face.hourly_vibe,
            refresh_minutes: config.weather.refresh_minutes,
            unit: config.weather.unit,
            show_conditions: config.weather.show_conditions,
        }
    }
}

impl Default for FaceSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// What the runtime has to do after a tick.
#[derive(Debug, Default, PartialEq)]
pub struct TickOutcome {
    /// Fire a long vibration pulse
    pub vibrate: bool,
    /// Send this message to the phone
    pub request: Option<Dictionary>,
}

/// Layers that exist between window load and unload.
#[derive(Debug)]
struct Layers {
    layout: Layout,
    fonts: FontSet,
}

/// Clock, date, battery bar and weather text.
pub struct Watchface {
    settings: FaceSettings,
    time_text: String,
    date_text: String,
    weather_text: Option<String>,
    battery: BatteryMeter,
    layers: Option<Layers>,
}

impl Watchface {
    pub fn new(settings: FaceSettings) -> Self {
        Self {
            settings,
            time_text: String::new(),
            date_text: String::new(),
            weather_text: None,
            battery: BatteryMeter::new(),
            layers: None,
        }
    }

    /// Startup updates: show the current time and date and the battery level
    /// the battery service reports right now.
    pub fn init(&mut self, now: NaiveDateTime, battery: BatteryState) {
        self.update_time(&now);
        self.update_date(&now);
        self.on_battery(battery);
    }

    /// Window load: build the layers for a window `bounds` in size.
    pub fn load(&mut self, bounds: Size) {
        let layout = Layout::for_variant(self.settings.font, bounds.width);
        let fonts = FontSet::for_variant(self.settings.font);
        debug!(font = ?self.settings.font, ?layout, "loading window");

        if self.time_text.is_empty() {
            self.time_text = PLACEHOLDER_TIME.to_string();
        }
        self.layers = Some(Layers { layout, fonts });
    }

    /// Window unload: release the layers. Texts survive for the next load.
    pub fn unload(&mut self) {
        debug!("unloading window");
        self.layers = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.layers.is_some()
    }

    /// Switch font family; a loaded window is rebuilt at the same width.
    pub fn set_font(&mut self, font: FontVariant) {
        self.settings.font = font;
        if let Some(width) = self.layers.as_ref().map(|l| l.layout.time.w) {
            self.load(Size::new(width, 0));
        }
    }

    /// Tick handler for the MINUTE | HOUR | DAY subscription.
    pub fn on_tick(&mut self, now: NaiveDateTime, units: TimeUnits) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if units.contains(TimeUnits::MINUTE) {
            self.update_time(&now);
        }
        if units.contains(TimeUnits::HOUR) && self.settings.hourly_vibe {
            outcome.vibrate = true;
        }
        if units.contains(TimeUnits::DAY) {
            self.update_date(&now);
        }

        let refresh = self.settings.refresh_minutes;
        if refresh > 0 && now.minute() % refresh == 0 {
            debug!(minute = now.minute(), "weather refresh due");
            outcome.request = Some(weather_request());
        }

        outcome
    }

    /// Battery service callback.
    pub fn on_battery(&mut self, state: BatteryState) {
        debug!(
            percent = state.charge_percent,
            charging = state.is_charging,
            "battery update"
        );
        self.battery.update(state);
    }

    /// Inbox callback. Messages without weather tuples are ignored.
    pub fn on_inbox(&mut self, dict: &Dictionary) {
        let Some(weather) = Weather::from_dictionary(dict) else {
            debug!(tuples = dict.len(), "inbox message has no weather");
            return;
        };

        let text = weather_text(&weather, self.settings.unit, self.settings.show_conditions);
        info!(weather = %text, "weather updated");
        self.weather_text = Some(text);
    }

    pub fn on_inbox_dropped(&mut self, reason: AppMessageResult) {
        error!(%reason, "message dropped");
    }

    pub fn on_outbox_failed(&mut self, reason: AppMessageResult) {
        error!(%reason, "outbox send failed");
    }

    pub fn on_outbox_sent(&mut self) {
        info!("outbox send success");
    }

    pub fn time_text(&self) -> &str {
        &self.time_text
    }

    pub fn date_text(&self) -> &str {
        &self.date_text
    }

    /// Weather text, or the loading text until the phone answers
    pub fn weather_text(&self) -> &str {
        self.weather_text
            .as_deref()
            .unwrap_or(&self.settings.loading_text)
    }

    pub fn battery_level(&self) -> u8 {
        self.battery.level()
    }

    /// True when the battery layer has changed since the last draw
    pub fn needs_battery_redraw(&self) -> bool {
        self.battery.is_dirty()
    }

    pub fn font(&self) -> FontVariant {
        self.settings.font
    }

    /// Frames of the loaded layers
    pub fn layout(&self) -> Option<Layout> {
        self.layers.as_ref().map(|l| l.layout)
    }

    /// Render the window: black background, then the time, date, battery
    /// and weather layers in that order. Draws nothing while unloaded.
    pub fn draw<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some(layers) = &self.layers else {
            return Ok(());
        };
        let layout = layers.layout;
        let fonts = layers.fonts;

        target.clear(BinaryColor::Off)?;
        draw_text(target, &self.time_text, layout.time, fonts.time)?;
        draw_text(target, &self.date_text, layout.date, fonts.date)?;
        self.battery.draw(target, layout.battery)?;
        let weather = self.weather_text().to_string();
        draw_text(target, &weather, layout.weather, fonts.weather)?;
        Ok(())
    }

    fn update_time(&mut self, now: &NaiveDateTime) {
        self.time_text = format_time(now, self.settings.use_24h);
    }

    fn update_date(&mut self, now: &NaiveDateTime) {
        self.date_text = format_date(now);
    }
}

/// White text on a clear background, centred horizontally at the top of
/// `frame` and clipped to it.
fn draw_text<D>(
    target: &mut D,
    text: &str,
    frame: Rect,
    font: &'static MonoFont<'static>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let character_style = MonoTextStyle::new(font, BinaryColor::On);
    let text_style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();

    let area: Rectangle = frame.into();
    let mut clipped = target.clipped(&area);
    Text::with_text_style(
        fit_width(text, font, frame.w),
        Point::new(frame.center_x(), frame.y),
        character_style,
        text_style,
    )
    .draw(&mut clipped)?;
    Ok(())
}

/// Longest prefix of `text` whose glyphs fit in `width` pixels.
fn fit_width<'a>(text: &'a str, font: &MonoFont<'_>, width: u32) -> &'a str {
    let advance = font.character_size.width + font.character_spacing;
    let max_chars = ((width + font.character_spacing) / advance.max(1)) as usize;
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
