//! OpenWeatherMap integration.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use agentry_core::engine::runner::Invocation;
use agentry_core::tool::Tool;
use agentry_types::outcome::StepResult;
use agentry_types::tool::{ParameterKind, ToolCapability, ToolError, ToolParameter};

use super::{f64_param, str_param};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Weather lookups backed by the OpenWeatherMap API.
pub struct WeatherTool {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    capabilities: Vec<ToolCapability>,
}

impl WeatherTool {
    pub fn new(client: reqwest::Client, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            capabilities: declare_capabilities(),
        }
    }

    /// Override the base URL (testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key(&self) -> Result<&SecretString, ToolError> {
        self.api_key
            .as_ref()
            .ok_or_else(|| ToolError::MissingKey("WEATHER_API_KEY".to_string()))
    }

    async fn request(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value, ToolError> {
        let key = self.key()?;
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(endpoint, "querying OpenWeatherMap");

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("appid", key.expose_secret())])
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match status.as_u16() {
                401 => "invalid API key".to_string(),
                404 => "city not found".to_string(),
                _ => response.text().await.unwrap_or_default(),
            };
            return Err(ToolError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::Deserialization(e.to_string()))
    }

    async fn current_weather(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let location = location_query(params);
        let units = str_param(params, "units").unwrap_or("metric").to_string();

        let data = self
            .request("weather", &[("q", location.clone()), ("units", units.clone())])
            .await?;

        Ok(StepResult::success(shape_conditions(&data, &units))
            .with_metadata(json!({"api_source": "OpenWeatherMap", "location_query": location})))
    }

    async fn forecast(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let location = location_query(params);
        let units = str_param(params, "units").unwrap_or("metric").to_string();

        let data = self
            .request("forecast", &[("q", location.clone()), ("units", units.clone())])
            .await?;

        // Collapse the 3-hourly list into per-day min/max with a midday
        // description.
        let mut days: BTreeMap<String, (f64, f64, String)> = BTreeMap::new();
        for entry in data["list"].as_array().into_iter().flatten() {
            let Some(stamp) = entry["dt_txt"].as_str() else {
                continue;
            };
            let date = stamp.split(' ').next().unwrap_or(stamp).to_string();
            let temp = entry["main"]["temp"].as_f64().unwrap_or(0.0);
            let description = entry["weather"][0]["description"]
                .as_str()
                .unwrap_or("")
                .to_string();

            days.entry(date)
                .and_modify(|(min, max, _)| {
                    *min = min.min(temp);
                    *max = max.max(temp);
                })
                .or_insert((temp, temp, description));
        }

        let forecast: Vec<Value> = days
            .into_iter()
            .map(|(date, (min, max, description))| {
                json!({
                    "date": date,
                    "temperature_min": min,
                    "temperature_max": max,
                    "description": description,
                })
            })
            .collect();

        Ok(StepResult::success(json!({
            "location": data["city"]["name"],
            "country": data["city"]["country"],
            "days": forecast,
            "units": units,
        }))
        .with_metadata(json!({"api_source": "OpenWeatherMap", "location_query": location})))
    }

    async fn by_coordinates(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let lat = f64_param(params, "lat").unwrap_or(0.0);
        let lon = f64_param(params, "lon").unwrap_or(0.0);
        let units = str_param(params, "units").unwrap_or("metric").to_string();

        let data = self
            .request(
                "weather",
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("units", units.clone()),
                ],
            )
            .await?;

        Ok(StepResult::success(shape_conditions(&data, &units))
            .with_metadata(json!({"api_source": "OpenWeatherMap"})))
    }
}

impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Current conditions and forecasts from OpenWeatherMap"
    }

    fn capabilities(&self) -> &[ToolCapability] {
        &self.capabilities
    }

    async fn execute(
        &self,
        capability: &str,
        parameters: &serde_json::Map<String, Value>,
        _invocation: &Invocation<'_>,
    ) -> Result<StepResult, ToolError> {
        match capability {
            "get_current_weather" => self.current_weather(parameters).await,
            "get_weather_forecast" => self.forecast(parameters).await,
            "get_weather_by_coordinates" => self.by_coordinates(parameters).await,
            other => Err(ToolError::UnknownCapability(other.to_string())),
        }
    }
}

/// Build the `q` query value: "city" or "city,country".
fn location_query(params: &serde_json::Map<String, Value>) -> String {
    let city = str_param(params, "city").unwrap_or_default();
    match str_param(params, "country_code") {
        Some(country) => format!("{city},{country}"),
        None => city.to_string(),
    }
}

/// Shape a current-conditions response into the step data payload.
fn shape_conditions(data: &Value, units: &str) -> Value {
    json!({
        "location": {
            "name": data["name"],
            "country": data["sys"]["country"],
            "coordinates": {"lat": data["coord"]["lat"], "lon": data["coord"]["lon"]},
        },
        "current": {
            "temperature": data["main"]["temp"],
            "feels_like": data["main"]["feels_like"],
            "humidity": data["main"]["humidity"],
            "pressure": data["main"]["pressure"],
        },
        "weather": {
            "summary": data["weather"][0]["main"],
            "description": data["weather"][0]["description"],
        },
        "wind": {
            "speed": data["wind"]["speed"],
            "direction": data["wind"]["deg"],
        },
        "clouds": data["clouds"]["all"],
        "units": units,
    })
}

fn units_parameter() -> ToolParameter {
    ToolParameter::optional("units", ParameterKind::String, "temperature units")
        .with_default(json!("metric"))
        .with_allowed(vec![json!("metric"), json!("imperial"), json!("kelvin")])
}

fn declare_capabilities() -> Vec<ToolCapability> {
    vec![
        ToolCapability::new("get_current_weather", "Get current weather for a city")
            .with_parameters(vec![
                ToolParameter::required(
                    "city",
                    ParameterKind::String,
                    "city name (e.g. 'London', 'Tokyo')",
                ),
                ToolParameter::optional(
                    "country_code",
                    ParameterKind::String,
                    "ISO 3166 country code (e.g. 'US', 'GB')",
                ),
                units_parameter(),
            ])
            .with_examples(vec![
                "get_current_weather(city='London')",
                "get_current_weather(city='Tokyo', units='imperial')",
            ]),
        ToolCapability::new("get_weather_forecast", "Get a 5-day forecast for a city")
            .with_parameters(vec![
                ToolParameter::required("city", ParameterKind::String, "city name"),
                ToolParameter::optional(
                    "country_code",
                    ParameterKind::String,
                    "ISO 3166 country code",
                ),
                units_parameter(),
            ])
            .with_examples(vec!["get_weather_forecast(city='Paris', country_code='FR')"]),
        ToolCapability::new(
            "get_weather_by_coordinates",
            "Get current weather for geographic coordinates",
        )
        .with_parameters(vec![
            ToolParameter::required("lat", ParameterKind::Number, "latitude"),
            ToolParameter::required("lon", ParameterKind::Number, "longitude"),
            units_parameter(),
        ])
        .with_examples(vec!["get_weather_by_coordinates(lat=40.71, lon=-74.01)"]),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tool(api_key: Option<&str>) -> WeatherTool {
        WeatherTool::new(
            reqwest::Client::new(),
            api_key.map(SecretString::from),
        )
    }

    fn params(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_capability_declarations() {
        let tool = tool(Some("k"));
        let names: Vec<&str> = tool.capabilities().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "get_current_weather",
                "get_weather_forecast",
                "get_weather_by_coordinates"
            ]
        );

        let current = &tool.capabilities()[0];
        assert!(current.parameters.iter().any(|p| p.name == "city" && p.required));
        assert!(current.parameters.iter().any(|p| p.name == "units" && !p.required));
    }

    #[test]
    fn test_parameter_validation_through_declaration() {
        let tool = tool(Some("k"));
        let capability = &tool.capabilities()[0];

        assert!(capability.validate(&params(json!({"city": "Oslo"}))).is_ok());
        assert!(capability.validate(&params(json!({}))).is_err());
        assert!(
            capability
                .validate(&params(json!({"city": "Oslo", "units": "rankine"})))
                .is_err()
        );
    }

    #[test]
    fn test_location_query_with_country() {
        assert_eq!(
            location_query(&params(json!({"city": "London", "country_code": "GB"}))),
            "London,GB"
        );
        assert_eq!(location_query(&params(json!({"city": "London"}))), "London");
    }

    #[test]
    fn test_shape_conditions() {
        let data = json!({
            "name": "Oslo",
            "sys": {"country": "NO"},
            "coord": {"lat": 59.91, "lon": 10.75},
            "main": {"temp": 4.2, "feels_like": 1.0, "humidity": 80, "pressure": 1012},
            "weather": [{"main": "Clouds", "description": "overcast clouds"}],
            "wind": {"speed": 3.1, "deg": 200},
            "clouds": {"all": 90}
        });
        let shaped = shape_conditions(&data, "metric");
        assert_eq!(shaped["location"]["name"], json!("Oslo"));
        assert_eq!(shaped["current"]["temperature"], json!(4.2));
        assert_eq!(shaped["weather"]["summary"], json!("Clouds"));
        assert_eq!(shaped["units"], json!("metric"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_key_fault() {
        let tool = tool(None);
        let results = HashMap::new();
        let metadata = HashMap::new();
        let invocation = Invocation {
            step_id: "s",
            attempt: 1,
            prior_results: &results,
            metadata: &metadata,
        };

        let err = tool
            .execute(
                "get_current_weather",
                &params(json!({"city": "Oslo"})),
                &invocation,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingKey(ref k) if k == "WEATHER_API_KEY"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_capability() {
        let tool = tool(Some("k"));
        let results = HashMap::new();
        let metadata = HashMap::new();
        let invocation = Invocation {
            step_id: "s",
            attempt: 1,
            prior_results: &results,
            metadata: &metadata,
        };

        let err = tool
            .execute("make_it_rain", &serde_json::Map::new(), &invocation)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownCapability(_)));
    }
}
