//! Place lookup results from the geocoding endpoints

use serde::{Deserialize, Serialize};

/// A named place returned by place search or reverse geocoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// Administrative subdivisions, coarsest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin4: Option<String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// Envelope shared by the search and reverse endpoints
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GeocodingResponse {
    #[serde(default)]
    pub results: Vec<Suggestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocoding_response_decodes_partial_entries() {
        let json = r#"{"results": [
            {"name": "Berlin", "country": "Germany", "country_code": "DE",
             "admin1": "Land Berlin", "latitude": 52.52437, "longitude": 13.41053},
            {"name": "Berlin", "latitude": 44.47, "longitude": -71.18}
        ]}"#;
        let response: GeocodingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].admin1.as_deref(), Some("Land Berlin"));
        assert_eq!(response.results[0].country_code.as_deref(), Some("DE"));
        assert!(response.results[1].country.is_none());
        assert!(response.results[1].admin4.is_none());
    }

    #[test]
    fn test_geocoding_response_without_results() {
        let response: GeocodingResponse = serde_json::from_str("{\"generationtime_ms\": 0.5}").unwrap();
        assert!(response.results.is_empty());
    }
}
