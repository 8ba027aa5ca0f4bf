//! # Weather Watchface Core Library
//!
//! This library provides the watchface itself and everything it talks to: the clock
//! and date formatting, the battery meter, the AppMessage dictionary codec shared
//! with the phone, the phone-side weather companion, and a small tokio event loop
//! that drives the face the way a watch platform would.
//!
//! ## Design Philosophy
//!
//! ### Callbacks Over a Loop
//! The face never owns its event loop. [`face::Watchface`] exposes one method per
//! platform callback (window load/unload, tick, battery, inbox, outbox results,
//! draw), and [`runtime::Runtime`] decides when to call them. That keeps the face
//! a plain state machine that tests can drive tick by tick.
//!
//! ### Minimal State
//! The only state the face keeps is a handful of strings (time, date, weather),
//! the last battery percentage, and the font-variant flag.
//!
//! ### Data Flow
//! 1. **Tick**: clock poll → changed [`clock::TimeUnits`] → time/date text, hourly vibe
//! 2. **Weather**: half-hour tick → request dictionary → phone → reply dictionary → weather text
//! 3. **Render**: face → [`framebuffer::Framebuffer`] (any embedded-graphics `DrawTarget`)
//!
//! ## Core Types
//! - [`FontVariant`]: which font family (and layer geometry) the face uses
//! - [`TemperatureUnit`]: how the companion asks for and the face labels temperatures

use serde::{Deserialize, Serialize};

// Module declarations
pub mod battery;
pub mod clock;
pub mod companion;
pub mod config;
pub mod face;
pub mod framebuffer;
pub mod layout;
pub mod message;
pub mod runtime;
pub mod transport;
pub mod weather;

#[cfg(test)]
mod tests;

pub use battery::BatteryState;
pub use face::Watchface;

/// Font family of the face.
///
/// The two variants use different fonts and nudge the layers by a pixel or
/// six, so the variant picks both [`layout::FontSet`] and [`layout::Layout`].
///
/// # Example
/// ```
/// use watchface_lib::FontVariant;
///
/// assert_eq!(FontVariant::default(), FontVariant::Solaria);
/// assert_ne!(FontVariant::Pirulen, FontVariant::Solaria);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontVariant {
    /// Tall, light face; the default
    #[default]
    Solaria,
    /// Wide, bold face
    Pirulen,
}

/// Temperature unit requested from the weather service and shown on the face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    /// Suffix appended to the temperature on the face
    pub fn suffix(self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Celsius => "°C",
        }
    }

    /// Query value understood by the Open-Meteo API
    pub fn query_value(self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Celsius => "celsius",
        }
    }
}
