//! Weather lookup tool (canned data)

use async_trait::async_trait;
use serde_json::json;

use super::{ToolError, ToolTrait};

#[derive(Debug, Default, Clone)]
pub struct WeatherTool;

impl WeatherTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolTrait for WeatherTool {
    fn name(&self) -> &str {
        "weather_search"
    }

    fn description(&self) -> &str {
        "Look up the current weather for a city. Input should be the city name."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "type": "string", "description": "City name" }
            },
            "required": ["input"]
        })
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let city = input.trim();
        if city.is_empty() {
            return Ok("Please provide a city name.".to_string());
        }
        Ok(format!(
            "Current weather in {}: sunny, 25°C, humidity 60%",
            city
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_weather_for_city() {
        let out = WeatherTool::new().invoke(" Beijing ").await.unwrap();
        assert_eq!(out, "Current weather in Beijing: sunny, 25°C, humidity 60%");
    }

    #[tokio::test]
    async fn test_weather_requires_city() {
        let out = WeatherTool::new().invoke("").await.unwrap();
        assert_eq!(out, "Please provide a city name.");
    }
}
