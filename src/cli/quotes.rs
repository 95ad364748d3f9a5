use super::ui;
use crate::coordinator::QuoteState;
use crate::filter::Filter;
use chrono::{DateTime, Local, Utc};
use comfy_table::Cell;

fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

impl QuoteState {
    pub fn display_as_table(&self) -> String {
        let mut output = format!(
            "{} ({})\n\n",
            ui::style_text("Commodity Prices", ui::StyleType::Title),
            self.filter
        );

        let quotes = self.visible_quotes();
        if quotes.is_empty() {
            let empty = match self.filter {
                Filter::FavoritesOnly if self.favorites.is_empty() => {
                    "No favorites yet. Use `favorite <commodity>` to add one."
                }
                _ => "No prices to show.",
            };
            output.push_str(&ui::style_text(empty, ui::StyleType::Subtle));
        } else {
            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell(""),
                ui::header_cell("Commodity"),
                ui::header_cell("Price"),
                ui::header_cell("Unit"),
                ui::header_cell("Change"),
                ui::header_cell("Change (%)"),
                ui::header_cell("As of"),
            ]);

            for quote in &quotes {
                let star = if self.favorites.contains(&quote.commodity) {
                    "★"
                } else {
                    ""
                };
                table.add_row(vec![
                    Cell::new(star),
                    Cell::new(quote.commodity.display_name()),
                    ui::number_cell(quote.price),
                    Cell::new(quote.commodity.unit()),
                    ui::change_cell(quote.change, ""),
                    ui::change_cell(quote.change_percent, "%"),
                    quote
                        .observed_at
                        .map_or_else(ui::na_cell, |ts| Cell::new(format_time(ts))),
                ]);
            }
            output.push_str(&table.to_string());
        }

        if let Some(updated) = self.last_updated {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(
                    &format!("Last updated: {}", format_time(updated)),
                    ui::StyleType::Subtle
                )
            ));
        }
        if let Some(info) = &self.info_message {
            output.push_str(&format!("\n{}", ui::style_text(info, ui::StyleType::Info)));
        }
        if let Some(error) = &self.error_message {
            output.push_str(&format!("\n{}", ui::style_text(error, ui::StyleType::Error)));
        }

        output
    }
}
