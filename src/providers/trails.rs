//! Trail closures from the NPS carto feed.

use serde_json::Value;

use crate::error::FetchError;
use crate::module::{DigestModule, ModuleOutput};
use crate::providers::http;

const CLOSED_TRAILS_URL: &str = "https://carto.nps.gov/user/glaclive/api/v2/sql?\
format=GeoJSON&q=SELECT%20*%20FROM%20nps_trails%20WHERE%20status%20=%20%27closed%27";

pub struct TrailsModule {
    user_agent: String,
}

impl TrailsModule {
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
        }
    }
}

impl DigestModule for TrailsModule {
    fn name(&self) -> &'static str {
        "trails"
    }

    fn field_keys(&self) -> &'static [&'static str] {
        &["trails"]
    }

    fn fetch(&self) -> Result<ModuleOutput, FetchError> {
        let client = http::client(&self.user_agent)?;
        let geojson = http::get_json(&client, CLOSED_TRAILS_URL)?;
        Ok(ModuleOutput::new().with_field("trails", summarize_closures(&geojson)))
    }
}

fn summarize_closures(geojson: &Value) -> String {
    let Some(features) = geojson.get("features").and_then(Value::as_array) else {
        return String::new();
    };

    let mut names: Vec<&str> = features
        .iter()
        .filter_map(|f| f.pointer("/properties/trail_name").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .collect();
    names.sort_unstable();
    names.dedup();

    if names.is_empty() {
        String::new()
    } else {
        format!("Closed trails: {}.", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closed_trails_are_listed_once_each() {
        let geojson = json!({
            "features": [
                {"properties": {"trail_name": "Highline Trail"}},
                {"properties": {"trail_name": "Grinnell Glacier Trail"}},
                {"properties": {"trail_name": "Highline Trail"}},
                {"properties": {"trail_name": ""}},
            ]
        });
        assert_eq!(
            summarize_closures(&geojson),
            "Closed trails: Grinnell Glacier Trail, Highline Trail."
        );
    }

    #[test]
    fn all_trails_open_reads_as_empty() {
        assert_eq!(summarize_closures(&json!({"features": []})), "");
    }
}
