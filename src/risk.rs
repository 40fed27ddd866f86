//! Queries the [National Risk Index](https://hazards.fema.gov/nri/) county layer, which FEMA
//! publishes as an ArcGIS feature service.

use crate::geometry::{Coordinate, WEB_MERCATOR_WKID};
use reqwest::Error as ReqwestError;
use serde::{Deserialize, Deserializer};
use std::fmt;
use thiserror::Error;
use url::Url;

const NRI_COUNTIES_QUERY: &str = "https://services.arcgis.com/XG15cJAlne2vxtgt/arcgis/rest/services/National_Risk_Index_Counties/FeatureServer/0/query";

#[derive(Error, Debug)]
pub enum RiskQueryError {
    #[error("error parsing arcgis url: {0}")]
    Url(#[from] url::ParseError),
    #[error("error marshaling geometry: {0}")]
    Geometry(serde_json::Error),
    #[error("error querying arcgis: {0}")]
    Http(#[from] ReqwestError),
    #[error("error unmarshaling response: {0}")]
    Decode(#[from] serde_json::Error),
    /// ArcGIS reports most failures as a 200 with an `error` object in the body.
    #[error("arcgis returned error {code}: {message}")]
    Service { code: i32, message: String },
    #[error("expected 1 feature, but got {0}")]
    UnexpectedResultCount(usize),
}

/// ArcGIS sends `null` for values missing in the data set, those read as zero/empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Risk information for one county.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Attributes {
    #[serde(rename = "STATE", deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(rename = "COUNTY", deserialize_with = "null_as_default")]
    pub county: String,
    #[serde(rename = "RISK_SCORE", deserialize_with = "null_as_default")]
    pub risk_score: f64,
    #[serde(rename = "RISK_RATNG", deserialize_with = "null_as_default")]
    pub risk_rating: String,
    #[serde(rename = "DRGT_RISKS", deserialize_with = "null_as_default")]
    pub drought_risk_score: f64,
    #[serde(rename = "DRGT_RISKR", deserialize_with = "null_as_default")]
    pub drought_risk_rating: String,
    #[serde(rename = "ERQK_RISKS", deserialize_with = "null_as_default")]
    pub earthquake_risk_score: f64,
    #[serde(rename = "ERQK_RISKR", deserialize_with = "null_as_default")]
    pub earthquake_risk_rating: String,
    #[serde(rename = "TRND_RISKS", deserialize_with = "null_as_default")]
    pub tornado_risk_score: f64,
    #[serde(rename = "TRND_RISKR", deserialize_with = "null_as_default")]
    pub tornado_risk_rating: String,
}

impl Attributes {
    /// The report, one line per field. Scores get two decimals.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("State: {}", self.state),
            format!("County: {}", self.county),
            format!("RiskScore: {:.2}", self.risk_score),
            format!("RiskRating: {}", self.risk_rating),
            format!("DroughtRiskScore: {:.2}", self.drought_risk_score),
            format!("DroughtRiskRating: {}", self.drought_risk_rating),
            format!("EarthquakeRiskScore: {:.2}", self.earthquake_risk_score),
            format!("EarthquakeRiskRating: {}", self.earthquake_risk_rating),
            format!("TornadoRiskScore: {:.2}", self.tornado_risk_score),
            format!("TornadoRiskRating: {}", self.tornado_risk_rating),
        ]
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
struct QueryResult {
    #[serde(default)]
    features: Vec<Feature>,
    error: Option<ServiceError>,
}

#[derive(Deserialize, Debug)]
struct Feature {
    attributes: Attributes,
}

#[derive(Deserialize, Debug)]
struct ServiceError {
    code: i32,
    #[serde(default)]
    message: String,
}

/// Builds the feature query for the county intersecting `point`.
pub fn query_url(point: &Coordinate) -> Result<Url, RiskQueryError> {
    let geometry = serde_json::to_string(&point.geometry()).map_err(RiskQueryError::Geometry)?;
    let sr = WEB_MERCATOR_WKID.to_string();
    let mut url = Url::parse(NRI_COUNTIES_QUERY)?;
    // sorted by key
    url.query_pairs_mut()
        .append_pair("f", "json")
        .append_pair("geometry", &geometry)
        .append_pair("geometryType", "esriGeometryPoint")
        .append_pair("inSR", &sr)
        .append_pair("outFields", "*")
        .append_pair("outSR", &sr)
        .append_pair("spatialRel", "esriSpatialRelIntersects")
        .append_pair("where", "1=1");
    Ok(url)
}

/// Decodes a query response, which has to hold exactly one feature.
pub fn parse_response(body: &str) -> Result<Attributes, RiskQueryError> {
    let result: QueryResult = serde_json::from_str(body)?;
    if let Some(err) = result.error {
        return Err(RiskQueryError::Service {
            code: err.code,
            message: err.message,
        });
    }
    let mut features = result.features;
    if features.len() != 1 {
        return Err(RiskQueryError::UnexpectedResultCount(features.len()));
    }
    Ok(features.remove(0).attributes)
}

/// No retries, just one attempt, no timeout, nothing
pub async fn get_basic(point: &Coordinate) -> Result<Attributes, RiskQueryError> {
    let request = query_url(point)?;

    debug!("URL to GET from arcgis {}", request);
    let raw_string = reqwest::get(request)
        .await?
        .error_for_status()?
        .text()
        .await?;

    debug!("raw string from arcgis {}", raw_string);

    parse_response(&raw_string)
}
