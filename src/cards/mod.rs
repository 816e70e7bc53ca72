//! Structured cards the assistant embeds in its replies

mod kind;
mod payload;

pub use kind::{TaggedBlockKind, OPEN_MARKER, TRIPLE_MARKER};
pub use payload::{
    AgriNewsData, AgriPriceData, FarmingTechniqueData, ForecastDay, NewsArticle, ParseError,
    ParsedPayload, PlantDoctorData, PriceItem, PriceTrend, StatusData, TechniqueStep, WeatherData,
};
