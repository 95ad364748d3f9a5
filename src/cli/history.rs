use super::ui;
use crate::coordinator::QuoteState;
use crate::core::PricePoint;
use comfy_table::Cell;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 60;

/// One character per bucket of points, scaled between the series low and high.
fn sparkline(points: &[PricePoint]) -> String {
    let (low, high) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.price), hi.max(p.price))
        });
    let span = high - low;
    let bucket = points.len().div_ceil(SPARK_WIDTH).max(1);

    points
        .chunks(bucket)
        .map(|chunk| {
            let avg = chunk.iter().map(|p| p.price).sum::<f64>() / chunk.len() as f64;
            let level = if span > 0.0 {
                (((avg - low) / span) * (SPARK_LEVELS.len() - 1) as f64).round() as usize
            } else {
                SPARK_LEVELS.len() / 2
            };
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

impl QuoteState {
    pub fn display_history(&self) -> String {
        let Some(selection) = self.selection else {
            return ui::style_text("No commodity selected.", ui::StyleType::Subtle);
        };

        let mut output = format!(
            "{} · {}\n\n",
            ui::style_text(selection.commodity.display_name(), ui::StyleType::Title),
            selection.range
        );

        let points = self.visible_history.as_deref().unwrap_or_default();
        match (points.first(), points.last()) {
            (Some(first), Some(last)) => {
                let low = points.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
                let high = points
                    .iter()
                    .map(|p| p.price)
                    .fold(f64::NEG_INFINITY, f64::max);
                let change_pct = if first.price != 0.0 {
                    Some((last.price - first.price) / first.price * 100.0)
                } else {
                    None
                };

                let mut table = ui::new_styled_table();
                table.set_header(vec![
                    ui::header_cell("From"),
                    ui::header_cell("To"),
                    ui::header_cell("Open"),
                    ui::header_cell("Last"),
                    ui::header_cell("Low"),
                    ui::header_cell("High"),
                    ui::header_cell("Change (%)"),
                ]);
                table.add_row(vec![
                    Cell::new(first.timestamp.format("%Y-%m-%d %H:%M")),
                    Cell::new(last.timestamp.format("%Y-%m-%d %H:%M")),
                    ui::number_cell(first.price),
                    ui::number_cell(last.price),
                    ui::number_cell(low),
                    ui::number_cell(high),
                    change_pct.map_or_else(ui::na_cell, |c| ui::change_cell(c, "%")),
                ]);

                output.push_str(&sparkline(points));
                output.push_str("\n\n");
                output.push_str(&table.to_string());
                output.push_str(&format!(
                    "\n{}",
                    ui::style_text(
                        &format!("{} points, {}", points.len(), selection.commodity.unit()),
                        ui::StyleType::Subtle
                    )
                ));
            }
            _ if self.is_history_loading => {
                output.push_str(&ui::style_text("Loading history...", ui::StyleType::Subtle));
            }
            _ => {
                output.push_str(&ui::style_text(
                    "No history available.",
                    ui::StyleType::Subtle,
                ));
            }
        }

        if let Some(error) = &self.history_error {
            output.push_str(&format!("\n{}", ui::style_text(error, ui::StyleType::Error)));
        }

        output
    }
}
