//! Address lookups against the [Google Maps Geocoding API](https://developers.google.com/maps/documentation/geocoding/requests-geocoding).

use crate::geometry::LatLng;
use reqwest::Error as ReqwestError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::form_urlencoded;

const GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Postal address handed to the geocoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Address {
    pub street: String,
    pub number: u32,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Address {
            street: "Central Park West".into(),
            number: 115,
            city: "New York".into(),
            state: "New York".into(),
            country: "United States".into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let street = match (self.number, self.street.trim()) {
            (0, s) => s.to_string(),
            (n, "") => n.to_string(),
            (n, s) => format!("{} {}", n, s),
        };
        let parts: Vec<&str> = [
            street.as_str(),
            self.city.trim(),
            self.state.trim(),
            self.country.trim(),
        ]
        .iter()
        .copied()
        .filter(|p| !p.is_empty())
        .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Status codes from [the geocoding docs](https://developers.google.com/maps/documentation/geocoding/requests-geocoding#StatusCodes).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Status {
    Ok,
    ZeroResults,
    OverDailyLimit,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
}

impl FromStr for Status {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "OK" => Status::Ok,
            "ZERO_RESULTS" => Status::ZeroResults,
            "OVER_DAILY_LIMIT" => Status::OverDailyLimit,
            "OVER_QUERY_LIMIT" => Status::OverQueryLimit,
            "REQUEST_DENIED" => Status::RequestDenied,
            "INVALID_REQUEST" => Status::InvalidRequest,
            "UNKNOWN_ERROR" => Status::UnknownError,
            other => return Err(format!("unknown geocoding status {:?}", other)),
        })
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "OK",
            Status::ZeroResults => "ZERO_RESULTS",
            Status::OverDailyLimit => "OVER_DAILY_LIMIT",
            Status::OverQueryLimit => "OVER_QUERY_LIMIT",
            Status::RequestDenied => "REQUEST_DENIED",
            Status::InvalidRequest => "INVALID_REQUEST",
            Status::UnknownError => "UNKNOWN_ERROR",
        })
    }
}

#[derive(Error, Debug)]
pub enum GeocodeError {
    /// The URL is stripped from the error, it carries the key.
    #[error("request to google maps failed: {0}")]
    Http(#[source] ReqwestError),
    #[error("could not decode google maps response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Google answered, but with something other than `OK`. An invalid key ends up here.
    #[error("google maps returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Provider {
        status: Status,
        message: Option<String>,
    },
    #[error("address not found")]
    NotFound,
}

#[derive(Deserialize, Debug)]
struct Response {
    status: Status,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize, Debug)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
    geometry: ResultGeometry,
}

#[derive(Deserialize, Debug)]
struct ResultGeometry {
    location: Location,
}

#[derive(Deserialize, Debug)]
struct Location {
    lat: f64,
    lng: f64,
}

impl From<ReqwestError> for GeocodeError {
    fn from(re: ReqwestError) -> Self {
        Self::Http(re.without_url())
    }
}

/// Resolves addresses with a Google Maps API key.
pub struct Geocoder {
    api_key: String,
    endpoint: String,
}

impl Geocoder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, GEOCODE_ENDPOINT)
    }

    /// Talks to `endpoint` instead of Google, e.g. a local stand-in.
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Geocoder {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, addr: &Address) -> String {
        let prefix = format!("{}?", self.endpoint);
        let start = prefix.len();
        form_urlencoded::Serializer::for_suffix(prefix, start)
            .append_pair("address", &addr.to_string())
            .append_pair("key", &self.api_key)
            .finish()
    }

    /// One attempt, no timeout.
    pub async fn locate(&self, addr: &Address) -> Result<LatLng, GeocodeError> {
        let request = self.request_url(addr);
        // the URL carries the key, don't log it
        debug!("geocoding {:?} with google maps", addr.to_string());
        let raw_string = reqwest::get(&request)
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!("raw string from google maps {}", raw_string);
        parse_response(&raw_string)
    }
}

/// Picks the location of the best ranked result.
pub fn parse_response(body: &str) -> Result<LatLng, GeocodeError> {
    let response: Response = serde_json::from_str(body)?;
    match response.status {
        Status::Ok => {}
        Status::ZeroResults => return Err(GeocodeError::NotFound),
        status => {
            warn!("google maps returned status {}", status);
            return Err(GeocodeError::Provider {
                status,
                message: response.error_message,
            });
        }
    }
    let best = response.results.into_iter().next().ok_or(GeocodeError::NotFound)?;
    info!(
        "geocoded to {:?} at {}, {}",
        best.formatted_address, best.geometry.location.lat, best.geometry.location.lng
    );
    Ok(LatLng {
        lat: best.geometry.location.lat,
        lng: best.geometry.location.lng,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{
        "results": [
            {
                "formatted_address": "115 Central Park W, New York, NY 10023, USA",
                "geometry": {
                    "location": { "lat": 40.7781, "lng": -73.9741 },
                    "location_type": "ROOFTOP"
                },
                "place_id": "abc"
            },
            {
                "formatted_address": "somewhere else",
                "geometry": { "location": { "lat": 1.0, "lng": 2.0 } }
            }
        ],
        "status": "OK"
    }"#;

    #[test]
    fn default_address_line() {
        assert_eq!(
            Address::default().to_string(),
            "115 Central Park West, New York, New York, United States"
        );
    }

    #[test]
    fn address_skips_empty_parts() {
        let addr = Address {
            street: "Main St".into(),
            number: 0,
            city: "".into(),
            state: "WA".into(),
            country: " ".into(),
        };
        assert_eq!(addr.to_string(), "Main St, WA");
    }

    #[test]
    fn url_is_encoded() {
        let url = Geocoder::new("k3y").request_url(&Address::default());
        assert_eq!(
            url,
            "https://maps.googleapis.com/maps/api/geocode/json?address=115+Central+Park+West%2C+New+York%2C+New+York%2C+United+States&key=k3y"
        );
    }

    #[test]
    fn url_with_other_endpoint() {
        let url = Geocoder::with_endpoint("k", "http://127.0.0.1:1/geocode/json").request_url(
            &Address {
                street: "Broad St".into(),
                number: 400,
                city: "Seattle".into(),
                state: "".into(),
                country: "".into(),
            },
        );
        assert_eq!(
            url,
            "http://127.0.0.1:1/geocode/json?address=400+Broad+St%2C+Seattle&key=k"
        );
    }

    #[tokio::test]
    async fn transport_errors_hide_the_key() {
        // nothing listens on port 1
        let geocoder = Geocoder::with_endpoint("SECRETKEY123", "http://127.0.0.1:1/geocode/json");
        let err = geocoder.locate(&Address::default()).await.unwrap_err();
        assert!(matches!(err, GeocodeError::Http(_)));
        let shown = format!("{} {:?}", err, err);
        assert!(!shown.contains("SECRETKEY123"), "{}", shown);
        let shown = crate::ReportError::from(err).to_string();
        assert!(!shown.contains("SECRETKEY123"), "{}", shown);
    }

    #[test]
    fn takes_first_result() {
        assert_eq!(
            parse_response(OK_BODY).unwrap(),
            LatLng {
                lat: 40.7781,
                lng: -73.9741
            }
        );
    }

    #[test]
    fn denied_key() {
        let body = r#"{"error_message":"The provided API key is invalid.","results":[],"status":"REQUEST_DENIED"}"#;
        match parse_response(body) {
            Err(GeocodeError::Provider { status, message }) => {
                assert_eq!(status, Status::RequestDenied);
                assert_eq!(message.as_deref(), Some("The provided API key is invalid."));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn nothing_found() {
        let body = r#"{"results":[],"status":"ZERO_RESULTS"}"#;
        assert!(matches!(parse_response(body), Err(GeocodeError::NotFound)));
        let body = r#"{"results":[],"status":"OK"}"#;
        assert!(matches!(parse_response(body), Err(GeocodeError::NotFound)));
    }

    #[test]
    fn garbage() {
        assert!(matches!(parse_response("<html>"), Err(GeocodeError::Decode(_))));
        assert!(matches!(
            parse_response(r#"{"status":"WHAT"}"#),
            Err(GeocodeError::Decode(_))
        ));
    }
}
