//! System prompt that teaches the model the card markup

use crate::cards::TaggedBlockKind;
use crate::extraction::MarkerConvention;

const SYSTEM_MESSAGE: &str = include_str!("../resources/system_message.md");

struct CardDoc {
    kind: TaggedBlockKind,
    when: &'static str,
    example: &'static str,
}

const CARD_DOCS: [CardDoc; 6] = [
    CardDoc {
        kind: TaggedBlockKind::Weather,
        when: "Khi người dùng hỏi về thời tiết hoặc dự báo ở một địa phương.",
        example: r#"{"location":"Cần Thơ","date":"Thứ Hai, 20/10","time":"08:00","temperature":29,"condition":"Nắng nhẹ","humidity":78,"windSpeed":12,"forecast":[{"day":"Thứ Ba","condition":"Mưa rào","highTemp":31,"lowTemp":25},{"day":"Thứ Tư","condition":"Nhiều mây","highTemp":30,"lowTemp":24}]}"#,
    },
    CardDoc {
        kind: TaggedBlockKind::AgriPrice,
        when: "Khi người dùng hỏi giá nông sản. Giá tính bằng số, không có dấu phân cách; trend là up, down hoặc stable.",
        example: r#"{"title":"Giá cà phê nhân xô","date":"20/10/2025","region":"Tây Nguyên","market":"Đắk Lắk","items":[{"product":"Cà phê Robusta","currentPrice":112500,"previousPrice":111000,"unit":"đ/kg","trend":"up"},{"product":"Hồ tiêu","currentPrice":141000,"previousPrice":141000,"unit":"đ/kg","trend":"stable"}]}"#,
    },
    CardDoc {
        kind: TaggedBlockKind::FarmingTechnique,
        when: "Khi hướng dẫn quy trình canh tác theo từng bước. season và tips có thể bỏ qua.",
        example: r#"{"title":"Bón phân cho lúa giai đoạn đẻ nhánh","crop":"Lúa","season":"Đông Xuân","steps":[{"title":"Bón thúc lần 1","description":"7-10 ngày sau sạ, bón 40 kg urê mỗi ha."},{"title":"Bón thúc lần 2","description":"18-22 ngày sau sạ, bón NPK 20-20-15."}],"tips":["Giữ mực nước 3-5 cm khi bón phân."]}"#,
    },
    CardDoc {
        kind: TaggedBlockKind::ArgiNews,
        when: "Khi tổng hợp tin tức nông nghiệp. url có thể bỏ qua.",
        example: r#"{"title":"Tin nông nghiệp hôm nay","articles":[{"title":"Giá lúa tăng nhẹ ở Đồng bằng sông Cửu Long","summary":"Thương lái thu mua lúa OM18 cao hơn tuần trước 200 đ/kg.","source":"Báo Nông nghiệp","date":"20/10/2025"}]}"#,
    },
    CardDoc {
        kind: TaggedBlockKind::PlantDoctor,
        when: "Khi chẩn đoán bệnh cây trồng, nhất là khi người dùng gửi ảnh. confidence là phần trăm từ 0 đến 100.",
        example: r#"{"plantName":"Lúa","disease":"Bệnh đạo ôn lá","confidence":85,"symptoms":["Vết bệnh hình thoi màu nâu xám trên lá"],"causes":["Nấm Pyricularia oryzae","Bón thừa đạm"],"treatments":["Phun Tricyclazole theo liều khuyến cáo"],"prevention":["Bón phân cân đối","Dùng giống kháng bệnh"]}"#,
    },
    CardDoc {
        kind: TaggedBlockKind::Status,
        when: "Khi cần báo trạng thái ngắn, ví dụ đang tra cứu dữ liệu.",
        example: r#"{"status":"Đang tra cứu","message":"Em đang lấy giá mới nhất"}"#,
    },
];

/// Open and close delimiters the model is asked to write
fn delimiters(kind: TaggedBlockKind, convention: MarkerConvention) -> (String, String) {
    match convention {
        MarkerConvention::Triple => (
            format!("@{}", kind.open_delimiter()),
            format!("{}@@@", kind.close_delimiter()),
        ),
        MarkerConvention::Double | MarkerConvention::Both => {
            (kind.open_delimiter(), kind.close_delimiter())
        }
    }
}

fn syntax_doc(convention: MarkerConvention) -> String {
    let (open, close) = match convention {
        MarkerConvention::Triple => ("@@@<TÊN_THẺ>", "</TÊN_THẺ>@@@"),
        MarkerConvention::Double | MarkerConvention::Both => ("@@<TÊN_THẺ>", "</TÊN_THẺ>"),
    };
    format!("Cú pháp của một khối thẻ:\n\n{open}\n{{ ...JSON... }}\n{close}")
}

fn cards_doc(convention: MarkerConvention) -> String {
    CARD_DOCS
        .iter()
        .map(|doc| {
            let (open, close) = delimiters(doc.kind, convention);
            format!(
                "## {} ({})\n\n{}\n\n{}\n{}\n{}",
                doc.kind.label(),
                doc.kind.tag_name(),
                doc.when,
                open,
                doc.example,
                close
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the system prompt for the given marker convention
pub fn system_prompt(convention: MarkerConvention) -> String {
    SYSTEM_MESSAGE
        .replace("{{syntax}}", &syntax_doc(convention))
        .replace("{{cards}}", &cards_doc(convention))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::ParsedPayload;
    use crate::extraction::Extractor;

    #[test]
    fn test_examples_match_their_schemas() {
        for doc in &CARD_DOCS {
            let parsed = ParsedPayload::parse(doc.kind, doc.example)
                .unwrap_or_else(|e| panic!("{} example does not parse: {e}", doc.kind));
            assert_eq!(parsed.kind(), doc.kind);
        }
    }

    #[test]
    fn test_every_kind_is_documented() {
        let documented: Vec<_> = CARD_DOCS.iter().map(|doc| doc.kind).collect();
        assert_eq!(documented, TaggedBlockKind::ALL.to_vec());
    }

    #[test]
    fn test_placeholders_are_replaced() {
        for convention in [
            MarkerConvention::Double,
            MarkerConvention::Triple,
            MarkerConvention::Both,
        ] {
            let prompt = system_prompt(convention);
            assert!(!prompt.contains("{{syntax}}"));
            assert!(!prompt.contains("{{cards}}"));
        }
    }

    #[test]
    fn test_triple_convention_uses_triple_markers() {
        let prompt = system_prompt(MarkerConvention::Triple);
        assert!(prompt.contains("@@@<WEATHER_DATA>"));
        assert!(prompt.contains("</WEATHER_DATA>@@@"));

        let prompt = system_prompt(MarkerConvention::Double);
        assert!(!prompt.contains("@@@"));
    }

    #[test]
    fn test_prompt_examples_extract_as_cards() {
        // The documented examples are themselves valid blocks
        for convention in [MarkerConvention::Double, MarkerConvention::Triple] {
            let result = Extractor::new(convention).extract(&system_prompt(convention));
            assert_eq!(result.blocks.len(), TaggedBlockKind::ALL.len());
            assert!(result.errors.is_empty());
        }
    }
}
