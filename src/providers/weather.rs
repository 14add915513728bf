//! Daily forecast and active weather alerts.
//!
//! The forecast comes from Open-Meteo (keyless); alerts come from the
//! National Weather Service. Alerts are best-effort: losing them
//! degrades the module to a warning instead of failing the forecast.

use serde_json::Value;
use tracing::warn;

use crate::error::FetchError;
use crate::module::{DigestModule, ModuleOutput};
use crate::providers::http;

// Park headquarters, the reference point for forecast and alerts.
const LATITUDE: f64 = 48.4950;
const LONGITUDE: f64 = -113.9811;

pub struct WeatherModule {
    user_agent: String,
}

impl WeatherModule {
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
        }
    }

    fn forecast_url(&self) -> String {
        format!(
            "https://api.open-meteo.com/v1/forecast?latitude={LATITUDE}&longitude={LONGITUDE}\
             &daily=temperature_2m_max,temperature_2m_min,precipitation_probability_max\
             &temperature_unit=fahrenheit&timezone=America%2FDenver&forecast_days=1"
        )
    }

    fn alerts_url(&self) -> String {
        format!("https://api.weather.gov/alerts/active?point={LATITUDE},{LONGITUDE}")
    }
}

impl DigestModule for WeatherModule {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn field_keys(&self) -> &'static [&'static str] {
        &["weather", "weather_alerts"]
    }

    fn fetch(&self) -> Result<ModuleOutput, FetchError> {
        let client = http::client(&self.user_agent)?;

        let forecast = http::get_json(&client, &self.forecast_url())?;
        let summary = summarize_forecast(&forecast)
            .ok_or_else(|| FetchError::parse("forecast response missing daily values"))?;

        let mut output = ModuleOutput::new().with_field("weather", summary);
        match http::get_json(&client, &self.alerts_url()) {
            Ok(alerts) => {
                output.set("weather_alerts", summarize_alerts(&alerts));
            }
            Err(e) => {
                warn!(error = %e, "weather alerts unavailable");
                output.set("weather_alerts", "");
                output.warn(format!("weather alerts unavailable: {e}"));
            }
        }
        Ok(output)
    }
}

fn summarize_forecast(forecast: &Value) -> Option<String> {
    let daily = forecast.get("daily")?;
    let high = daily.get("temperature_2m_max")?.get(0)?.as_f64()?;
    let low = daily.get("temperature_2m_min")?.get(0)?.as_f64()?;
    let precip = daily
        .get("precipitation_probability_max")
        .and_then(|p| p.get(0))
        .and_then(Value::as_f64);

    let mut summary = format!("High {}\u{b0}F, low {}\u{b0}F.", high.round(), low.round());
    if let Some(precip) = precip {
        if precip > 0.0 {
            summary.push_str(&format!(" {}% chance of precipitation.", precip.round()));
        }
    }
    Some(summary)
}

fn summarize_alerts(alerts: &Value) -> String {
    let headlines: Vec<&str> = alerts
        .get("features")
        .and_then(Value::as_array)
        .map(|features| {
            features
                .iter()
                .filter_map(|f| f.pointer("/properties/headline").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    headlines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn forecast_summary_includes_precipitation_when_likely() {
        let forecast = json!({
            "daily": {
                "temperature_2m_max": [71.6],
                "temperature_2m_min": [44.8],
                "precipitation_probability_max": [35.0],
            }
        });
        assert_eq!(
            summarize_forecast(&forecast).unwrap(),
            "High 72\u{b0}F, low 45\u{b0}F. 35% chance of precipitation."
        );
    }

    #[test]
    fn dry_forecast_omits_precipitation() {
        let forecast = json!({
            "daily": {
                "temperature_2m_max": [80.0],
                "temperature_2m_min": [50.0],
                "precipitation_probability_max": [0.0],
            }
        });
        assert_eq!(
            summarize_forecast(&forecast).unwrap(),
            "High 80\u{b0}F, low 50\u{b0}F."
        );
    }

    #[test]
    fn malformed_forecast_yields_none() {
        assert!(summarize_forecast(&json!({"daily": {}})).is_none());
        assert!(summarize_forecast(&json!({})).is_none());
    }

    #[test]
    fn alert_headlines_are_joined() {
        let alerts = json!({
            "features": [
                {"properties": {"headline": "Red Flag Warning until 8 PM"}},
                {"properties": {"headline": "Air Quality Alert"}},
            ]
        });
        assert_eq!(
            summarize_alerts(&alerts),
            "Red Flag Warning until 8 PM\nAir Quality Alert"
        );
        assert_eq!(summarize_alerts(&json!({"features": []})), "");
    }
}
