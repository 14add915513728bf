//! Road closures from the NPS carto feed.

use serde_json::Value;

use crate::error::FetchError;
use crate::module::{DigestModule, ModuleOutput};
use crate::providers::http;

const CLOSED_ROADS_URL: &str = "https://carto.nps.gov/user/glaclive/api/v2/sql?\
format=GeoJSON&q=SELECT%20*%20FROM%20glac_road_nds%20WHERE%20status%20=%20%27closed%27";

pub struct RoadsModule {
    user_agent: String,
}

impl RoadsModule {
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
        }
    }
}

impl DigestModule for RoadsModule {
    fn name(&self) -> &'static str {
        "roads"
    }

    fn field_keys(&self) -> &'static [&'static str] {
        &["roads"]
    }

    fn fetch(&self) -> Result<ModuleOutput, FetchError> {
        let client = http::client(&self.user_agent)?;
        let geojson = http::get_json(&client, CLOSED_ROADS_URL)?;
        Ok(ModuleOutput::new().with_field("roads", summarize_closures(&geojson)))
    }
}

/// Distinct closed road names, deduplicated and sorted. An empty feed
/// means every road is open, which reads as "nothing to report".
fn summarize_closures(geojson: &Value) -> String {
    let Some(features) = geojson.get("features").and_then(Value::as_array) else {
        return String::new();
    };

    let mut names: Vec<String> = features
        .iter()
        .filter_map(|f| f.pointer("/properties/rdname").and_then(Value::as_str))
        // The feed renders one segment of Two Medicine Road oddly.
        .map(|name| name.replace("to Running Eagle", "Road"))
        .collect();
    names.sort();
    names.dedup();

    if names.is_empty() {
        String::new()
    } else {
        format!("Closed roads: {}.", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closures_are_deduplicated_and_sorted() {
        let geojson = json!({
            "features": [
                {"properties": {"rdname": "Going-to-the-Sun Road"}},
                {"properties": {"rdname": "Camas Road"}},
                {"properties": {"rdname": "Going-to-the-Sun Road"}},
            ]
        });
        assert_eq!(
            summarize_closures(&geojson),
            "Closed roads: Camas Road, Going-to-the-Sun Road."
        );
    }

    #[test]
    fn odd_two_medicine_segment_name_is_normalized() {
        let geojson = json!({
            "features": [{"properties": {"rdname": "Two Medicine to Running Eagle"}}]
        });
        assert_eq!(
            summarize_closures(&geojson),
            "Closed roads: Two Medicine Road."
        );
    }

    #[test]
    fn no_features_means_nothing_to_report() {
        assert_eq!(summarize_closures(&json!({"features": []})), "");
        assert_eq!(summarize_closures(&json!({})), "");
    }
}
