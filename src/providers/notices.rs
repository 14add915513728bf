//! Park-wide alerts and notices from the NPS developer API.

use serde_json::Value;

use crate::config::Settings;
use crate::error::FetchError;
use crate::module::{DigestModule, ModuleOutput};
use crate::providers::http;

pub struct NoticesModule {
    api_key: String,
    park_code: String,
    user_agent: String,
}

impl NoticesModule {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.nps_api_key.clone(),
            park_code: settings.park_code.clone(),
            user_agent: settings.user_agent.clone(),
        }
    }

    fn url(&self) -> String {
        format!(
            "https://developer.nps.gov/api/v1/alerts?parkCode={}&limit=50",
            self.park_code
        )
    }
}

impl DigestModule for NoticesModule {
    fn name(&self) -> &'static str {
        "notices"
    }

    fn field_keys(&self) -> &'static [&'static str] {
        &["notices"]
    }

    fn fetch(&self) -> Result<ModuleOutput, FetchError> {
        let client = http::client(&self.user_agent)?;
        let payload = http::get_json_with_key(&client, &self.url(), &self.api_key)?;
        Ok(ModuleOutput::new().with_field("notices", summarize_notices(&payload)))
    }
}

fn summarize_notices(payload: &Value) -> String {
    let Some(data) = payload.get("data").and_then(Value::as_array) else {
        return String::new();
    };

    let lines: Vec<String> = data
        .iter()
        .filter_map(|alert| {
            let title = alert.get("title").and_then(Value::as_str)?;
            let category = alert.get("category").and_then(Value::as_str).unwrap_or("");
            if category.is_empty() {
                Some(title.to_string())
            } else {
                Some(format!("{category}: {title}"))
            }
        })
        .collect();

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn notices_carry_their_category() {
        let payload = json!({
            "data": [
                {"category": "Caution", "title": "Bear activity near Lake McDonald"},
                {"title": "Shuttle schedule change"},
            ]
        });
        assert_eq!(
            summarize_notices(&payload),
            "Caution: Bear activity near Lake McDonald\nShuttle schedule change"
        );
    }

    #[test]
    fn no_active_notices_is_empty() {
        assert_eq!(summarize_notices(&json!({"data": []})), "");
    }
}
