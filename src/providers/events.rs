//! Today's ranger programs and events from the NPS developer API.

use serde_json::Value;

use crate::config::Settings;
use crate::datetime::today_string;
use crate::error::FetchError;
use crate::module::{DigestModule, ModuleOutput};
use crate::providers::http;

pub struct EventsModule {
    api_key: String,
    park_code: String,
    user_agent: String,
}

impl EventsModule {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.nps_api_key.clone(),
            park_code: settings.park_code.clone(),
            user_agent: settings.user_agent.clone(),
        }
    }

    fn url(&self, date: &str) -> String {
        format!(
            "https://developer.nps.gov/api/v1/events?parkCode={}&dateStart={date}&dateEnd={date}",
            self.park_code
        )
    }
}

impl DigestModule for EventsModule {
    fn name(&self) -> &'static str {
        "events"
    }

    fn field_keys(&self) -> &'static [&'static str] {
        &["events"]
    }

    fn fetch(&self) -> Result<ModuleOutput, FetchError> {
        let client = http::client(&self.user_agent)?;
        let payload = http::get_json_with_key(&client, &self.url(&today_string()), &self.api_key)?;
        Ok(ModuleOutput::new().with_field("events", summarize_events(&payload)))
    }
}

/// "Title at Location (times)" lines, sorted by title. No events today
/// is a legitimate empty result, not an error.
fn summarize_events(payload: &Value) -> String {
    let Some(data) = payload.get("data").and_then(Value::as_array) else {
        return String::new();
    };

    let mut lines: Vec<String> = data
        .iter()
        .filter_map(|event| {
            let title = event.get("title").and_then(Value::as_str)?;
            let location = event.get("location").and_then(Value::as_str).unwrap_or("");
            let times = event
                .get("times")
                .and_then(Value::as_array)
                .and_then(|t| t.first())
                .map(|t| {
                    let start = t.get("timestart").and_then(Value::as_str).unwrap_or("");
                    let end = t.get("timeend").and_then(Value::as_str).unwrap_or("");
                    format!("{start}-{end}")
                })
                .unwrap_or_default();

            let mut line = title.to_string();
            if !location.is_empty() {
                line.push_str(&format!(" at {location}"));
            }
            if times.len() > 1 {
                line.push_str(&format!(" ({times})"));
            }
            Some(line)
        })
        .collect();
    lines.sort();

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_include_location_and_times() {
        let payload = json!({
            "data": [
                {
                    "title": "Ranger Talk",
                    "location": "Apgar Visitor Center",
                    "times": [{"timestart": "10:00 AM", "timeend": "11:00 AM"}],
                },
                {"title": "Astronomy Night", "location": ""},
            ]
        });
        assert_eq!(
            summarize_events(&payload),
            "Astronomy Night\nRanger Talk at Apgar Visitor Center (10:00 AM-11:00 AM)"
        );
    }

    #[test]
    fn no_events_today_is_empty_not_an_error() {
        assert_eq!(summarize_events(&json!({"data": []})), "");
        assert_eq!(summarize_events(&json!({})), "");
    }
}
