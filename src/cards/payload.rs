use super::TaggedBlockKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current conditions plus a short forecast for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub location: String,
    pub date: String,
    pub time: String,
    pub temperature: f64,
    pub condition: String,
    pub humidity: f64,
    pub wind_speed: f64,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub day: String,
    pub condition: String,
    pub high_temp: f64,
    pub low_temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgriPriceData {
    pub title: String,
    pub date: String,
    pub region: String,
    pub market: String,
    pub items: Vec<PriceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceItem {
    pub product: String,
    pub current_price: f64,
    pub previous_price: f64,
    pub unit: String,
    pub trend: PriceTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmingTechniqueData {
    pub title: String,
    pub crop: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    pub steps: Vec<TechniqueStep>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueStep {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgriNewsData {
    pub title: String,
    pub articles: Vec<NewsArticle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Diagnosis of a plant disease, usually from an uploaded photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantDoctorData {
    pub plant_name: String,
    pub disease: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub causes: Vec<String>,
    pub treatments: Vec<String>,
    #[serde(default)]
    pub prevention: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A successfully parsed block payload, one variant per [`TaggedBlockKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum ParsedPayload {
    Weather(WeatherData),
    AgriPrice(AgriPriceData),
    FarmingTechnique(FarmingTechniqueData),
    ArgiNews(AgriNewsData),
    PlantDoctor(PlantDoctorData),
    Status(StatusData),
}

/// A closed block whose content could not be turned into a payload
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("malformed {kind} payload: {message}")]
pub struct ParseError {
    pub kind: TaggedBlockKind,
    /// Raw text found between the delimiters
    pub fragment: String,
    pub message: String,
}

impl ParsedPayload {
    /// Parse the text between a kind's delimiters into its typed payload.
    ///
    /// JSON that is well-formed but does not match the kind's schema is
    /// rejected the same way as invalid JSON.
    pub fn parse(kind: TaggedBlockKind, fragment: &str) -> Result<Self, ParseError> {
        let json = fragment.trim();
        let parsed = match kind {
            TaggedBlockKind::Weather => serde_json::from_str(json).map(ParsedPayload::Weather),
            TaggedBlockKind::AgriPrice => serde_json::from_str(json).map(ParsedPayload::AgriPrice),
            TaggedBlockKind::FarmingTechnique => {
                serde_json::from_str(json).map(ParsedPayload::FarmingTechnique)
            }
            TaggedBlockKind::ArgiNews => serde_json::from_str(json).map(ParsedPayload::ArgiNews),
            TaggedBlockKind::PlantDoctor => {
                serde_json::from_str(json).map(ParsedPayload::PlantDoctor)
            }
            TaggedBlockKind::Status => serde_json::from_str(json).map(ParsedPayload::Status),
        };

        parsed.map_err(|e| ParseError {
            kind,
            fragment: fragment.to_string(),
            message: e.to_string(),
        })
    }

    pub fn kind(&self) -> TaggedBlockKind {
        match self {
            ParsedPayload::Weather(_) => TaggedBlockKind::Weather,
            ParsedPayload::AgriPrice(_) => TaggedBlockKind::AgriPrice,
            ParsedPayload::FarmingTechnique(_) => TaggedBlockKind::FarmingTechnique,
            ParsedPayload::ArgiNews(_) => TaggedBlockKind::ArgiNews,
            ParsedPayload::PlantDoctor(_) => TaggedBlockKind::PlantDoctor,
            ParsedPayload::Status(_) => TaggedBlockKind::Status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weather_with_integer_numbers() {
        let json = r#"{"location":"Hà Nội","date":"Thứ Năm","time":"15:30","temperature":27,"condition":"Mây","humidity":75,"windSpeed":12,"forecast":[{"day":"Thứ Sáu","condition":"Mưa rào","highTemp":30,"lowTemp":24.5}]}"#;
        let payload = ParsedPayload::parse(TaggedBlockKind::Weather, json).unwrap();

        let ParsedPayload::Weather(weather) = payload else {
            panic!("expected weather payload");
        };
        assert_eq!(weather.location, "Hà Nội");
        assert_eq!(weather.wind_speed, 12.0);
        assert_eq!(weather.forecast.len(), 1);
        assert_eq!(weather.forecast[0].low_temp, 24.5);
    }

    #[test]
    fn test_parse_price_trend() {
        let json = r#"{
            "title": "Giá lúa hôm nay",
            "date": "19/10",
            "region": "Đồng bằng sông Cửu Long",
            "market": "Cần Thơ",
            "items": [
                {"product": "Lúa IR50404", "currentPrice": 7200, "previousPrice": 7000, "unit": "đ/kg", "trend": "up"},
                {"product": "Lúa OM18", "currentPrice": 7500, "previousPrice": 7500, "unit": "đ/kg", "trend": "stable"}
            ]
        }"#;
        let payload = ParsedPayload::parse(TaggedBlockKind::AgriPrice, json).unwrap();
        let ParsedPayload::AgriPrice(prices) = payload else {
            panic!("expected price payload");
        };
        assert_eq!(prices.items[0].trend, PriceTrend::Up);
        assert_eq!(prices.items[1].trend, PriceTrend::Stable);
    }

    #[test]
    fn test_unknown_trend_is_rejected() {
        let json = r#"{"title":"t","date":"d","region":"r","market":"m","items":[{"product":"p","currentPrice":1,"previousPrice":1,"unit":"u","trend":"sideways"}]}"#;
        let err = ParsedPayload::parse(TaggedBlockKind::AgriPrice, json).unwrap_err();
        assert_eq!(err.kind, TaggedBlockKind::AgriPrice);
        assert_eq!(err.fragment, json);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let err = ParsedPayload::parse(TaggedBlockKind::Status, r#"{"message":"x"}"#).unwrap_err();
        assert!(err.message.contains("status"), "message was: {}", err.message);
    }

    #[test]
    fn test_empty_fragment_is_an_error() {
        assert!(ParsedPayload::parse(TaggedBlockKind::Weather, "   \n ").is_err());
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"plantName":"Lúa","disease":"Đạo ôn","symptoms":["Vết hình thoi"],"treatments":["Phun Tricyclazole"]}"#;
        let payload = ParsedPayload::parse(TaggedBlockKind::PlantDoctor, json).unwrap();
        let ParsedPayload::PlantDoctor(diagnosis) = payload else {
            panic!("expected plant doctor payload");
        };
        assert!(diagnosis.confidence.is_none());
        assert!(diagnosis.prevention.is_empty());
    }

    #[test]
    fn test_payload_reports_its_kind() {
        let payload = ParsedPayload::parse(TaggedBlockKind::Status, r#"{"status":"ok"}"#).unwrap();
        assert_eq!(payload.kind(), TaggedBlockKind::Status);
    }
}
