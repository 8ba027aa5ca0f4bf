//! # Watchface Scenario Tests
//!
//! These tests drive the face the way the event loop does, across module
//! boundaries: ticks over a whole day, the full request/reply exchange with the
//! companion, and rendering of both font variants.

use std::future::Future;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use embedded_graphics::prelude::Size;
use tempfile::TempDir;

use crate::battery::BatteryState;
use crate::clock::TimeUnits;
use crate::companion::{Companion, WeatherCache, WeatherError, WeatherSource};
use crate::config::Config;
use crate::face::{FaceSettings, Watchface};
use crate::framebuffer::Framebuffer;
use crate::runtime::{FixedBattery, Runtime, Vibes};
use crate::transport::AppMessage;
use crate::weather::Weather;
use crate::FontVariant;

struct SunnySource;

impl WeatherSource for SunnySource {
    fn current(&self) -> impl Future<Output = Result<Weather, WeatherError>> + Send {
        async { Ok(Weather::new(81, "Clear")) }
    }
}

#[derive(Default)]
struct CountingVibes(usize);

impl Vibes for CountingVibes {
    fn long_pulse(&mut self) {
        self.0 += 1;
    }
}

fn midnight() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 17)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// A full day of minute ticks asks for weather 48 times, buzzes every hour
/// and changes the date once.
#[test]
fn day_of_ticks() {
    let mut face = Watchface::new(FaceSettings::default());
    face.load(Size::new(144, 168));
    let start = midnight() - chrono::Duration::minutes(1);
    face.init(start, BatteryState::default());
    assert_eq!(face.date_text(), "Fri Oct 16");

    let mut requests = 0;
    let mut vibes = 0;
    let mut prev = start;
    for minute in 0..(24 * 60) {
        let now = midnight() + chrono::Duration::minutes(minute);
        let units = TimeUnits::between(prev, now) & TimeUnits::FACE_SUBSCRIPTION;
        let outcome = face.on_tick(now, units);
        requests += outcome.request.is_some() as usize;
        vibes += outcome.vibrate as usize;
        prev = now;
    }

    assert_eq!(requests, 48);
    assert_eq!(vibes, 24);
    assert_eq!(face.date_text(), "Sat Oct 17");
    assert_eq!(face.time_text(), "23:59");
}

/// Startup request goes to the companion and its reply lands on the face.
#[tokio::test]
async fn watch_and_companion_exchange_weather() {
    let cache_dir = TempDir::new().unwrap();
    let config = Config::default();
    let (link, phone) = AppMessage::open(config.message.inbox_size, config.message.outbox_size);

    let companion = Companion::new(
        SunnySource,
        WeatherCache::new(cache_dir.path().join("w.json"), Duration::from_secs(60)),
    );
    let phone_task = tokio::spawn(companion.run(phone));

    let mut watch = Runtime::new(
        &config,
        FixedBattery(BatteryState {
            charge_percent: 64,
            is_charging: true,
        }),
        CountingVibes::default(),
        link,
    );
    watch.start(midnight() + chrono::Duration::hours(7));
    assert_eq!(watch.face().weather_text(), "Loading...");

    assert!(watch.settle(Duration::from_secs(5)).await);
    assert_eq!(watch.face().weather_text(), "81°F");
    assert_eq!(watch.face().time_text(), "07:00");
    assert_eq!(watch.face().battery_level(), 64);

    drop(watch);
    phone_task.await.unwrap();
}

/// Both variants render every layer and keep the area above the clock dark.
#[test]
fn both_font_variants_render() {
    for font in [FontVariant::Solaria, FontVariant::Pirulen] {
        let mut config = Config::default();
        config.face.font = font;

        let mut face = Watchface::new(FaceSettings::from(&config));
        face.load(Size::new(config.face.width, config.face.height));
        face.init(
            midnight() + chrono::Duration::minutes(754),
            BatteryState {
                charge_percent: 50,
                is_charging: false,
            },
        );
        let mut reply = Weather::new(-3, "Snow").to_dictionary();
        reply.write_int32(99, 1);
        face.on_inbox(&reply);
        assert_eq!(face.weather_text(), "-3°F");
        assert_eq!(face.time_text(), "12:34");

        let mut fb = Framebuffer::new(config.face.width, config.face.height);
        face.draw(&mut fb).unwrap();

        let layout = face.layout().unwrap();
        assert!(fb.lit_pixels_in(0, layout.time.y as u32, 144, 20) > 0, "{font:?} time");
        assert!(fb.lit_pixels_in(0, layout.weather.y as u32, 144, 25) > 0, "{font:?} weather");
        assert_eq!(fb.lit_pixels_in(0, 0, 144, 25), 0, "{font:?} header");

        // Half battery: left half of the bar lit, right half dark
        assert!(fb.pixel(10, 69));
        assert!(fb.pixel(71, 70));
        assert!(!fb.pixel(72, 69));
    }
}

/// The ASCII dump shows something recognisable for a rendered face.
#[test]
fn ascii_frame_has_content() {
    let mut face = Watchface::new(FaceSettings::default());
    face.load(Size::new(144, 168));
    face.init(midnight(), BatteryState::default());

    let mut fb = Framebuffer::new(144, 168);
    face.draw(&mut fb).unwrap();
    let ascii = fb.to_ascii();

    assert_eq!(ascii.lines().count(), 168);
    assert!(ascii.lines().all(|l| l.chars().count() == 144));
    assert!(ascii.contains('█'));
}
