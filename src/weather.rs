//! Weather payload carried by AppMessage, and the string the face shows for it.

use crate::message::{Dictionary, TupleValue, KEY_CONDITIONS, KEY_REQUEST_WEATHER, KEY_TEMPERATURE};
use crate::TemperatureUnit;
use serde::{Deserialize, Serialize};

/// Longest weather text the face keeps, in bytes.
pub const MAX_WEATHER_TEXT: usize = 31;

/// Current conditions as sent by the phone.
///
/// Either field may be missing from a message; a missing temperature is
/// `None`, missing conditions are an empty string.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: Option<i32>,
    pub conditions: String,
}

impl Weather {
    pub fn new(temperature: i32, conditions: impl Into<String>) -> Self {
        Self {
            temperature: Some(temperature),
            conditions: conditions.into(),
        }
    }

    /// Read the weather tuples of an inbound message.
    ///
    /// `None` when the message carries neither key.
    pub fn from_dictionary(dict: &Dictionary) -> Option<Self> {
        let temperature = dict.find(KEY_TEMPERATURE).and_then(TupleValue::as_i32);
        let conditions = dict.find(KEY_CONDITIONS).and_then(TupleValue::as_str);

        if temperature.is_none() && conditions.is_none() {
            return None;
        }
        Some(Self {
            temperature,
            conditions: conditions.unwrap_or_default().to_string(),
        })
    }

    /// Reply message for the watch.
    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        if let Some(t) = self.temperature {
            dict.write_int32(KEY_TEMPERATURE, t);
        }
        if !self.conditions.is_empty() {
            dict.write_cstring(KEY_CONDITIONS, &self.conditions);
        }
        dict
    }
}

/// Outbound request asking the phone for fresh weather.
pub fn weather_request() -> Dictionary {
    let mut dict = Dictionary::new();
    dict.write_uint8(KEY_REQUEST_WEATHER, 0);
    dict
}

/// True if `dict` is a weather request.
pub fn is_weather_request(dict: &Dictionary) -> bool {
    dict.find(KEY_REQUEST_WEATHER).is_some()
}

/// Text for the weather layer, e.g. "72°F" or "72°F Cloudy".
pub fn weather_text(weather: &Weather, unit: TemperatureUnit, show_conditions: bool) -> String {
    let text = match (weather.temperature, weather.conditions.is_empty()) {
        (Some(t), false) if show_conditions => {
            format!("{}{} {}", t, unit.suffix(), weather.conditions)
        }
        (Some(t), _) => format!("{}{}", t, unit.suffix()),
        (None, _) => weather.conditions.clone(),
    };
    truncate_to(text, MAX_WEATHER_TEXT)
}

fn truncate_to(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_roundtrips_through_dictionary() {
        let weather = Weather::new(72, "Clear");
        let dict = weather.to_dictionary();
        assert_eq!(dict.len(), 2);
        assert_eq!(Weather::from_dictionary(&dict), Some(weather));
    }

    #[test]
    fn test_message_without_weather_keys() {
        assert_eq!(Weather::from_dictionary(&weather_request()), None);
        assert_eq!(Weather::from_dictionary(&Dictionary::new()), None);
    }

    #[test]
    fn test_partial_messages_are_accepted() {
        let mut temp_only = Dictionary::new();
        temp_only.write_int32(KEY_TEMPERATURE, 55);
        let weather = Weather::from_dictionary(&temp_only).unwrap();
        assert_eq!(weather.temperature, Some(55));
        assert!(weather.conditions.is_empty());

        let mut cond_only = Dictionary::new();
        cond_only.write_cstring(KEY_CONDITIONS, "Fog");
        let weather = Weather::from_dictionary(&cond_only).unwrap();
        assert_eq!(weather.temperature, None);
        assert_eq!(weather.conditions, "Fog");
    }

    #[test]
    fn test_small_integer_widths_are_read() {
        let mut dict = Dictionary::new();
        dict.write(KEY_TEMPERATURE, TupleValue::Int8(-12));
        assert_eq!(
            Weather::from_dictionary(&dict).unwrap().temperature,
            Some(-12)
        );
    }

    #[test]
    fn test_weather_text_formats() {
        let weather = Weather::new(72, "Cloudy");
        assert_eq!(weather_text(&weather, TemperatureUnit::Fahrenheit, false), "72°F");
        assert_eq!(weather_text(&weather, TemperatureUnit::Celsius, false), "72°C");
        assert_eq!(
            weather_text(&weather, TemperatureUnit::Fahrenheit, true),
            "72°F Cloudy"
        );

        let cold = Weather::new(-40, "");
        assert_eq!(weather_text(&cold, TemperatureUnit::Celsius, true), "-40°C");

        let no_temp = Weather {
            temperature: None,
            conditions: "Rain".into(),
        };
        assert_eq!(weather_text(&no_temp, TemperatureUnit::Fahrenheit, false), "Rain");
    }

    #[test]
    fn test_weather_text_truncates_on_char_boundary() {
        let weather = Weather::new(7, "Thunderstorm with heavy hail and wind");
        let text = weather_text(&weather, TemperatureUnit::Fahrenheit, true);
        assert!(text.len() <= MAX_WEATHER_TEXT);
        assert!(text.starts_with("7°F Thunderstorm"));

        // "°" straddles byte 31 here and must not be split
        let long = Weather {
            temperature: None,
            conditions: format!("{}°", "a".repeat(30)),
        };
        let text = weather_text(&long, TemperatureUnit::Fahrenheit, false);
        assert_eq!(text, "a".repeat(30));
    }

    #[test]
    fn test_request_detection() {
        assert!(is_weather_request(&weather_request()));
        assert!(!is_weather_request(&Weather::new(1, "x").to_dictionary()));
    }
}
