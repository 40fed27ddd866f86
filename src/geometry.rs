//! Web Mercator points, as understood by the ArcGIS REST API.

use serde::Serialize;
use thiserror::Error;

/// Radius of the sphere used by Web Mercator, in meters.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Web Mercator is undefined at the poles, everything beyond this is clamped.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// `wkid` ESRI uses for Web Mercator
pub const WEB_MERCATOR_WKID: u32 = 102_100;
/// `latestWkid` for the same projection, i.e. EPSG:3857
pub const WEB_MERCATOR_LATEST_WKID: u32 = 3857;

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("latitude/longitude out of range: {lat}, {lng}")]
    OutOfRange { lat: f64, lng: f64 },
}

/// Geographic position in degrees, as returned by a geocoder.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Serialize, Copy, Clone, Debug, PartialEq)]
pub struct SpatialReference {
    #[serde(rename = "latestWkid")]
    pub latest_wkid: u32,
    pub wkid: u32,
}

impl SpatialReference {
    pub const WEB_MERCATOR: SpatialReference = SpatialReference {
        latest_wkid: WEB_MERCATOR_LATEST_WKID,
        wkid: WEB_MERCATOR_WKID,
    };
}

/// A planar point in Web Mercator meters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    /// Projects a WGS84 position with the spherical Web Mercator formula.
    pub fn from_lat_lng(pos: LatLng) -> Result<Self, GeometryError> {
        let LatLng { lat, lng } = pos;
        if !lat.is_finite() || !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeometryError::OutOfRange { lat, lng });
        }
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let x = EARTH_RADIUS * lng.to_radians();
        let y = EARTH_RADIUS * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        Ok(Coordinate { x, y })
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            spatial_reference: SpatialReference::WEB_MERCATOR,
            x: self.x,
            y: self.y,
        }
    }
}

/// The `geometry` parameter of a feature query.
#[derive(Serialize, Copy, Clone, Debug, PartialEq)]
pub struct Geometry {
    #[serde(rename = "spatialReference")]
    pub spatial_reference: SpatialReference,
    pub x: f64,
    pub y: f64,
}
