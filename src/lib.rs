//! This library looks up FEMA's [National Risk Index](https://hazards.fema.gov/nri/) for an
//! address. Meant to be super simple.
//!
//! The address is geocoded with the Google Maps Geocoding API, projected to Web Mercator, and
//! used to query the National Risk Index county layer on ArcGIS.
//!
//! Note that this needs [`tokio`](https://crates.io/crates/tokio), as [`reqwest`](https://crates.io/crates/reqwest) needs `tokio`!

#[macro_use]
extern crate log;

pub mod geocode;
pub mod geometry;
pub mod risk;

pub use geocode::{Address, GeocodeError, Geocoder};
pub use geometry::{Coordinate, GeometryError, LatLng};
pub use risk::{Attributes, RiskQueryError};

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2_500);

/// Printed above the report.
pub const PREAMBLE: &str = "Here's some risk information about your home:";

/// Everything one run needs, built once by the caller.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub address: Address,
    /// Applies to each of the two requests separately.
    pub timeout: Duration,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Config {
            api_key: api_key.into(),
            address: Address::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Which step of a report failed.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("error getting geometry for address: failed to get coords from google maps: {0}")]
    Geocode(#[from] GeocodeError),
    #[error("error getting geometry for address: {0}")]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    RiskQuery(#[from] RiskQueryError),
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),
}

/// Geocodes `addr` and projects it to the spatial reference the risk layer is queried in.
pub async fn resolve(
    geocoder: &Geocoder,
    addr: &Address,
    timeout: Duration,
) -> Result<Coordinate, ReportError> {
    let pos = tokio::time::timeout(timeout, geocoder.locate(addr))
        .await
        .map_err(|_| ReportError::Timeout("geocoding", timeout))??;
    let point = Coordinate::from_lat_lng(pos)?;
    info!("{} is at x={}, y={}", addr, point.x, point.y);
    Ok(point)
}

/// Fetches risk information for the county containing `point`.
pub async fn query(point: &Coordinate, timeout: Duration) -> Result<Attributes, ReportError> {
    let attrs = tokio::time::timeout(timeout, risk::get_basic(point))
        .await
        .map_err(|_| ReportError::Timeout("arcgis query", timeout))??;
    Ok(attrs)
}

/// Resolve, then query. Single attempt for each, nothing is retried.
pub async fn report(config: &Config) -> Result<Attributes, ReportError> {
    let geocoder = Geocoder::new(config.api_key.as_str());
    let point = resolve(&geocoder, &config.address, config.timeout).await?;
    query(&point, config.timeout).await
}
