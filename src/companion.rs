//! # Phone Companion
//!
//! The phone half of the weather exchange. It waits for the watch's request
//! message, looks up current conditions and answers with a temperature and a
//! condition word.
//!
//! ## Data Source
//!
//! ### Open-Meteo
//! - **URL**: https://api.open-meteo.com/v1/forecast
//! - **Query**: `current=temperature_2m,weather_code` for the configured coordinates
//! - **Format**: JSON; the WMO weather code is mapped to a short word ("Rain")
//!
//! ## Caching Strategy
//! - **Location**: configurable, `/tmp/watchface_weather.json` by default
//! - **TTL**: 30 minutes, matching the face's refresh interval
//! - **Validation**: file modification time checked before loading; an entry
//!   fetched for other coordinates or another unit is a miss
//! - **Fallback**: when the fetch fails, a stale cache entry is still better
//!   than "Loading..." forever; with no cache at all, no reply is sent
//!
//! All errors propagate through [`WeatherError`].

use crate::config::WeatherConfig;
use crate::message::Dictionary;
use crate::transport::PhoneLink;
use crate::weather::{is_weather_request, Weather};
use crate::TemperatureUnit;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use std::{fs, io};
use thiserror::Error;
use tracing::{debug, info, warn};

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Errors that can occur while fetching or caching weather.
#[derive(Error, Debug)]
pub enum WeatherError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsed but did not carry what we asked for
    #[error("unexpected response: {0}")]
    Response(String),

    /// Cache file operations failed (permissions, disk space)
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),

    /// Cache or response body is not valid JSON for the expected shape
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache entry older than its TTL
    #[error("cache entry is stale")]
    Stale,

    /// Cache entry was fetched for another location or unit
    #[error("cache entry is for {0}")]
    OtherQuery(String),
}

/// Anything that can report current weather.
pub trait WeatherSource: Send + Sync {
    fn current(&self) -> impl Future<Output = Result<Weather, WeatherError>> + Send;
}

/// Open-Meteo forecast API client.
pub struct OpenMeteo {
    client: reqwest::Client,
    url: String,
}

impl OpenMeteo {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::with_base_url(config, OPEN_METEO_URL)
    }

    /// Client against another Open-Meteo compatible endpoint.
    pub fn with_base_url(config: &WeatherConfig, base_url: &str) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: forecast_url(base_url, config.latitude, config.longitude, config.unit),
        })
    }
}

impl WeatherSource for OpenMeteo {
    fn current(&self) -> impl Future<Output = Result<Weather, WeatherError>> + Send {
        async move {
            debug!(url = %self.url, "fetching weather");
            let body = self
                .client
                .get(&self.url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            parse_forecast(&body)
        }
    }
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: Option<CurrentConditions>,
}

#[derive(Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    weather_code: u8,
}

fn forecast_url(base: &str, latitude: f64, longitude: f64, unit: TemperatureUnit) -> String {
    format!(
        "{base}?latitude={latitude}&longitude={longitude}\
         &current=temperature_2m,weather_code&temperature_unit={}",
        unit.query_value()
    )
}

/// Turn an Open-Meteo forecast body into [`Weather`].
pub fn parse_forecast(body: &str) -> Result<Weather, WeatherError> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    let current = response
        .current
        .ok_or_else(|| WeatherError::Response("no current conditions".to_string()))?;
    Ok(Weather::new(
        current.temperature_2m.round() as i32,
        condition_word(current.weather_code),
    ))
}

/// Short description of a WMO weather interpretation code.
pub fn condition_word(code: u8) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mostly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing Drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing Rain",
        71 | 73 | 75 => "Snow",
        77 => "Snow Grains",
        80..=82 => "Showers",
        85 | 86 => "Snow Showers",
        95 => "Thunderstorm",
        96 | 99 => "Hail",
        _ => "Unknown",
    }
}

/// What a cached reading was fetched for: coordinates and unit.
pub fn cache_query(config: &WeatherConfig) -> String {
    format!(
        "{},{},{}",
        config.latitude,
        config.longitude,
        config.unit.query_value()
    )
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    query: String,
    weather: Weather,
}

/// JSON file holding the last good weather.
pub struct WeatherCache {
    path: PathBuf,
    ttl: Duration,
    query: String,
}

impl WeatherCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            query: String::new(),
        }
    }

    pub fn from_config(config: &WeatherConfig) -> Self {
        Self::new(
            &config.cache_path,
            Duration::from_secs(config.cache_ttl_minutes * 60),
        )
        .with_query(cache_query(config))
    }

    /// Only accept entries saved under `query`.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached weather if younger than the TTL.
    pub fn load_fresh(&self) -> Result<Weather, WeatherError> {
        if self.age()? >= self.ttl {
            return Err(WeatherError::Stale);
        }
        self.load_any()
    }

    /// Cached weather regardless of age.
    pub fn load_any(&self) -> Result<Weather, WeatherError> {
        let data = fs::read(&self.path)?;
        let entry: CacheEntry = serde_json::from_slice(&data)?;
        if entry.query != self.query {
            return Err(WeatherError::OtherQuery(entry.query));
        }
        Ok(entry.weather)
    }

    pub fn save(&self, weather: &Weather) -> Result<(), WeatherError> {
        let entry = CacheEntry {
            query: self.query.clone(),
            weather: weather.clone(),
        };
        let data = serde_json::to_vec(&entry)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    fn age(&self) -> Result<Duration, WeatherError> {
        let modified = fs::metadata(&self.path)?.modified()?;
        // mtime slightly in the future counts as brand new
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO))
    }
}

/// Phone-side request handler.
pub struct Companion<S> {
    source: S,
    cache: WeatherCache,
}

impl<S: WeatherSource> Companion<S> {
    pub fn new(source: S, cache: WeatherCache) -> Self {
        Self { source, cache }
    }

    /// Current weather: fresh cache, else the source, else stale cache.
    pub async fn current_weather(&self) -> Option<Weather> {
        if let Ok(weather) = self.cache.load_fresh() {
            debug!("serving cached weather");
            return Some(weather);
        }

        match self.source.current().await {
            Ok(weather) => {
                if let Err(e) = self.cache.save(&weather) {
                    // Not fatal; the next request just fetches again
                    warn!(path = %self.cache.path().display(), error = %e, "weather cache write failed");
                }
                Some(weather)
            }
            Err(e) => {
                warn!(error = %e, "weather fetch failed");
                match self.cache.load_any() {
                    Ok(weather) => {
                        info!("falling back to stale cached weather");
                        Some(weather)
                    }
                    Err(e) => {
                        debug!(error = %e, "no usable cached weather");
                        None
                    }
                }
            }
        }
    }

    /// Reply to one raw message from the watch, if it asks for weather.
    pub async fn handle(&self, bytes: &[u8]) -> Option<Dictionary> {
        let request = match Dictionary::decode(bytes) {
            Ok(dict) => dict,
            Err(e) => {
                warn!(error = %e, "undecodable message from watch");
                return None;
            }
        };
        if !is_weather_request(&request) {
            debug!(tuples = request.len(), "ignoring non-weather message");
            return None;
        }

        let weather = self.current_weather().await;
        if weather.is_none() {
            warn!("no weather available, request left unanswered");
        }
        weather.map(|w| w.to_dictionary())
    }

    /// Serve requests until the watch side of the link goes away.
    pub async fn run(self, mut link: PhoneLink) {
        info!("companion ready");
        while let Some(bytes) = link.recv().await {
            let Some(reply) = self.handle(&bytes).await else {
                continue;
            };
            if let Err(e) = link.send(&reply).await {
                warn!(error = %e, "reply not delivered");
                break;
            }
        }
        info!("watch link closed, companion stopping");
    }
}
