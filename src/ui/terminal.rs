use super::streaming::{Card, RenderDecision};
use super::{RenderSink, UIError};
use crate::cards::{ParsedPayload, PriceTrend, TaggedBlockKind};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::Mutex;

// ANSI color codes for terminal formatting
struct Colors {
    reset: &'static str,
    dim: &'static str,
    bold: &'static str,
    green: &'static str,
    cyan: &'static str,
}

impl Colors {
    fn new() -> Self {
        Colors {
            reset: "\x1b[0m",
            dim: "\x1b[2m",
            bold: "\x1b[1m",
            green: "\x1b[32m",
            cyan: "\x1b[36m",
        }
    }
}

// What has already been written for the current turn
#[derive(Default)]
struct TurnOutput {
    printed_text: String,
    shown_cards: BTreeSet<TaggedBlockKind>,
    shown_placeholders: BTreeSet<TaggedBlockKind>,
}

/// Renders decisions as an append-only terminal transcript
pub struct TerminalRenderer {
    colors: Colors,
    writer: Mutex<Box<dyn Write + Send>>,
    state: Mutex<TurnOutput>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            colors: Colors::new(),
            writer: Mutex::new(writer),
            state: Mutex::new(TurnOutput::default()),
        }
    }

    /// Forget what was printed so the next decision starts a fresh turn
    pub fn begin_turn(&self, prompt: Option<&str>) -> Result<(), UIError> {
        *self.state.lock().unwrap() = TurnOutput::default();
        if let Some(prompt) = prompt {
            let mut writer = self.writer.lock().unwrap();
            writeln!(
                writer,
                "\n{}{}> {}{}",
                self.colors.green, self.colors.bold, prompt, self.colors.reset
            )?;
        }
        Ok(())
    }

    fn output_for(&self, decision: &RenderDecision, state: &mut TurnOutput) -> String {
        let mut out = String::new();

        for kind in &decision.loading_kinds {
            if decision.show_loading_placeholder && state.shown_placeholders.insert(*kind) {
                out.push_str(&format!(
                    "\n{}⏳ Đang tải {}...{}\n",
                    self.colors.dim,
                    kind.label(),
                    self.colors.reset
                ));
            }
        }

        for card in &decision.cards_to_render {
            if state.shown_cards.insert(card.kind) {
                out.push_str(&format!(
                    "\n{}{}┌ {}{}\n{}",
                    self.colors.cyan,
                    self.colors.bold,
                    card.kind.label(),
                    self.colors.reset,
                    format_card(card)
                ));
            }
        }

        if decision.show_plain_text {
            match decision.plain_text.strip_prefix(state.printed_text.as_str()) {
                Some(suffix) => out.push_str(suffix),
                None => {
                    out.push('\n');
                    out.push_str(&decision.plain_text);
                }
            }
            state.printed_text = decision.plain_text.clone();
        }

        out
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for TerminalRenderer {
    fn render(&self, decision: &RenderDecision) -> Result<(), UIError> {
        let out = {
            let mut state = self.state.lock().unwrap();
            self.output_for(decision, &mut state)
        };
        if out.is_empty() {
            return Ok(());
        }

        let mut writer = self.writer.lock().unwrap();
        write!(writer, "{out}")?;
        writer.flush()?;
        Ok(())
    }
}

fn trend_symbol(trend: PriceTrend) -> &'static str {
    match trend {
        PriceTrend::Up => "▲",
        PriceTrend::Down => "▼",
        PriceTrend::Stable => "■",
    }
}

fn bullet_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("│ {heading}:\n"));
    for item in items {
        out.push_str(&format!("│   • {item}\n"));
    }
}

/// Plain-text body of a card, one line per row, without colors
pub fn format_card(card: &Card) -> String {
    let mut out = String::new();

    match &card.payload {
        ParsedPayload::Weather(weather) => {
            out.push_str(&format!(
                "│ {} · {} {}\n",
                weather.location, weather.date, weather.time
            ));
            out.push_str(&format!(
                "│ {}°C, {} · độ ẩm {}% · gió {} km/h\n",
                weather.temperature, weather.condition, weather.humidity, weather.wind_speed
            ));
            for day in &weather.forecast {
                out.push_str(&format!(
                    "│   {}: {} {}–{}°C\n",
                    day.day, day.condition, day.low_temp, day.high_temp
                ));
            }
        }
        ParsedPayload::AgriPrice(prices) => {
            out.push_str(&format!(
                "│ {} ({}, {} · {})\n",
                prices.title, prices.date, prices.market, prices.region
            ));
            for item in &prices.items {
                out.push_str(&format!(
                    "│   {} {}: {} {} (trước: {})\n",
                    trend_symbol(item.trend),
                    item.product,
                    item.current_price,
                    item.unit,
                    item.previous_price
                ));
            }
        }
        ParsedPayload::FarmingTechnique(technique) => {
            out.push_str(&format!("│ {} · {}", technique.title, technique.crop));
            if let Some(season) = &technique.season {
                out.push_str(&format!(" · {season}"));
            }
            out.push('\n');
            for (i, step) in technique.steps.iter().enumerate() {
                out.push_str(&format!("│   {}. {}: {}\n", i + 1, step.title, step.description));
            }
            bullet_list(&mut out, "Mẹo", &technique.tips);
        }
        ParsedPayload::ArgiNews(news) => {
            out.push_str(&format!("│ {}\n", news.title));
            for article in &news.articles {
                out.push_str(&format!(
                    "│   • {} ({}, {})\n│     {}\n",
                    article.title, article.source, article.date, article.summary
                ));
            }
        }
        ParsedPayload::PlantDoctor(diagnosis) => {
            out.push_str(&format!("│ {}: {}", diagnosis.plant_name, diagnosis.disease));
            if let Some(confidence) = diagnosis.confidence {
                out.push_str(&format!(" ({confidence}%)"));
            }
            out.push('\n');
            bullet_list(&mut out, "Triệu chứng", &diagnosis.symptoms);
            bullet_list(&mut out, "Nguyên nhân", &diagnosis.causes);
            bullet_list(&mut out, "Cách điều trị", &diagnosis.treatments);
            bullet_list(&mut out, "Phòng ngừa", &diagnosis.prevention);
        }
        ParsedPayload::Status(status) => {
            out.push_str(&format!("│ {}", status.status));
            if let Some(message) = &status.message {
                out.push_str(&format!(": {message}"));
            }
            out.push('\n');
        }
    }

    out.push_str("└\n");
    out
}
