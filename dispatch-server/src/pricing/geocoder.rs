//! Address geocoding

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// WGS84 point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn as_pair(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("delivery address is empty")]
    EmptyAddress,

    #[error("address not found: {0}")]
    NotFound(String),

    #[error("geocoder request failed: {0}")]
    Request(String),

    #[error("geocoder returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("geocoding is disabled")]
    Disabled,
}

/// Resolves a free-text address to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

/// Nominatim-compatible HTTP geocoder (`?q=<address>&format=json&limit=1`)
pub struct HttpGeocoder {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl HttpGeocoder {
    pub fn new(url: &str, user_agent: &str, timeout_ms: u64) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| GeocodeError::Request(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        if self.url.is_empty() {
            return Err(GeocodeError::Disabled);
        }

        let response = self
            .client
            .get(&self.url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;

        let latitude = hit
            .lat
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad latitude {}", hit.lat)))?;
        let longitude = hit
            .lon
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad longitude {}", hit.lon)))?;

        tracing::debug!(address, latitude, longitude, "Address geocoded");
        Ok(Coordinates {
            latitude,
            longitude,
        })
    }
}

/// Fixed address table; records every lookup
#[derive(Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, Coordinates>,
    lookups: Mutex<Vec<String>>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        self.entries.insert(
            address.to_string(),
            Coordinates {
                latitude,
                longitude,
            },
        );
        self
    }

    /// Addresses looked up so far, in order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push(address.to_string());
        }
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        self.entries
            .get(address)
            .copied()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_geocoder_resolves_and_records() {
        let geocoder = StaticGeocoder::new().with_address("1 Main St", 10.0, 20.0);
        let hit = geocoder.geocode("1 Main St").await.unwrap();
        assert_eq!(hit.as_pair(), (10.0, 20.0));
        assert!(matches!(
            geocoder.geocode("nowhere").await,
            Err(GeocodeError::NotFound(_))
        ));
        assert_eq!(geocoder.lookups(), vec!["1 Main St", "nowhere"]);
    }

    #[tokio::test]
    async fn http_geocoder_rejects_blank_address_without_network() {
        let geocoder = HttpGeocoder::new("http://127.0.0.1:9/search", "test", 100).unwrap();
        assert!(matches!(
            geocoder.geocode("   ").await,
            Err(GeocodeError::EmptyAddress)
        ));
    }

    #[tokio::test]
    async fn http_geocoder_with_empty_url_is_disabled() {
        let geocoder = HttpGeocoder::new("", "test", 100).unwrap();
        assert!(matches!(
            geocoder.geocode("1 Main St").await,
            Err(GeocodeError::Disabled)
        ));
    }
}
