use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker every open delimiter starts with
pub const OPEN_MARKER: &str = "@@";

/// Longer marker accepted by the triple and both conventions
pub const TRIPLE_MARKER: &str = "@@@";

/// The kinds of structured blocks the assistant can embed in its replies.
///
/// Declaration order is the priority order used when extracting blocks,
/// and `Ord` follows it so maps keyed by kind iterate in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaggedBlockKind {
    Weather,
    AgriPrice,
    FarmingTechnique,
    ArgiNews,
    PlantDoctor,
    Status,
}

impl TaggedBlockKind {
    pub const ALL: [TaggedBlockKind; 6] = [
        TaggedBlockKind::Weather,
        TaggedBlockKind::AgriPrice,
        TaggedBlockKind::FarmingTechnique,
        TaggedBlockKind::ArgiNews,
        TaggedBlockKind::PlantDoctor,
        TaggedBlockKind::Status,
    ];

    /// Tag name as it appears between the angle brackets
    pub fn tag_name(&self) -> &'static str {
        match self {
            TaggedBlockKind::Weather => "WEATHER_DATA",
            TaggedBlockKind::AgriPrice => "AGRI_PRICE_DATA",
            TaggedBlockKind::FarmingTechnique => "FARMING_TECHNIQUE",
            TaggedBlockKind::ArgiNews => "ARGI_NEWS",
            TaggedBlockKind::PlantDoctor => "PLANT_DOCTOR",
            TaggedBlockKind::Status => "STATUS",
        }
    }

    /// Open delimiter in the double-`@` form, e.g. `@@<WEATHER_DATA>`
    pub fn open_delimiter(&self) -> String {
        format!("{OPEN_MARKER}<{}>", self.tag_name())
    }

    /// Close delimiter, e.g. `</WEATHER_DATA>`
    pub fn close_delimiter(&self) -> String {
        format!("</{}>", self.tag_name())
    }

    /// Vietnamese label shown on cards and loading placeholders
    pub fn label(&self) -> &'static str {
        match self {
            TaggedBlockKind::Weather => "Thời tiết",
            TaggedBlockKind::AgriPrice => "Giá nông sản",
            TaggedBlockKind::FarmingTechnique => "Kỹ thuật canh tác",
            TaggedBlockKind::ArgiNews => "Tin tức nông nghiệp",
            TaggedBlockKind::PlantDoctor => "Bác sĩ cây trồng",
            TaggedBlockKind::Status => "Trạng thái",
        }
    }
}

impl fmt::Display for TaggedBlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiters() {
        assert_eq!(
            TaggedBlockKind::Weather.open_delimiter(),
            "@@<WEATHER_DATA>"
        );
        assert_eq!(
            TaggedBlockKind::AgriPrice.close_delimiter(),
            "</AGRI_PRICE_DATA>"
        );
        assert_eq!(TaggedBlockKind::ArgiNews.open_delimiter(), "@@<ARGI_NEWS>");
    }

    #[test]
    fn test_priority_order_matches_ord() {
        let mut sorted = TaggedBlockKind::ALL.to_vec();
        sorted.reverse();
        sorted.sort();
        assert_eq!(sorted, TaggedBlockKind::ALL.to_vec());
    }
}
