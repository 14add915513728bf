//! Front-country campground status from the NPS carto feed.

use serde_json::Value;

use crate::error::FetchError;
use crate::module::{DigestModule, ModuleOutput};
use crate::providers::http;

const CAMPGROUNDS_URL: &str = "https://carto.nps.gov/user/glaclive/api/v2/sql?\
format=JSON&q=SELECT%20*%20FROM%20glac_front_country_campgrounds";

pub struct CampgroundsModule {
    user_agent: String,
}

impl CampgroundsModule {
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
        }
    }
}

impl DigestModule for CampgroundsModule {
    fn name(&self) -> &'static str {
        "campgrounds"
    }

    fn field_keys(&self) -> &'static [&'static str] {
        &["campgrounds"]
    }

    fn fetch(&self) -> Result<ModuleOutput, FetchError> {
        let client = http::client(&self.user_agent)?;
        let payload = http::get_json(&client, CAMPGROUNDS_URL)?;
        Ok(ModuleOutput::new().with_field("campgrounds", summarize_status(&payload)))
    }
}

/// One line per campground that is not plainly open. A fully open park
/// reads as "nothing to report".
fn summarize_status(payload: &Value) -> String {
    let Some(rows) = payload.get("rows").and_then(Value::as_array) else {
        return String::new();
    };

    let mut lines: Vec<String> = rows
        .iter()
        .filter_map(|row| {
            let name = row.get("name").and_then(Value::as_str)?;
            let status = row.get("status").and_then(Value::as_str)?;
            if status.eq_ignore_ascii_case("open") {
                None
            } else {
                Some(format!("{name}: {status}"))
            }
        })
        .collect();
    lines.sort();

    lines.join("\n")
}
