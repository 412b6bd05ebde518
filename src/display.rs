//! Terminal presentation of a recommendation round.
//!
//! The core only hands over a `RecommendationSet`; everything about
//! layout and color lives behind the `Renderer` trait.

use anyhow::Result;
use crossterm::style::{Color, Stylize};
use crossterm::{cursor, queue, terminal};
use std::io::Write;

use crate::gold::format_gold;
use crate::types::{Recommendation, RecommendationSet};

/// Renders a ranked list, its total and the capital it was computed for.
pub trait Renderer {
    fn render(&mut self, set: &RecommendationSet) -> Result<()>;
}

const HEADERS: [&str; 5] = ["Item", "Profit/GP", "Sell Price", "Buy Price", "Max Units"];

/// Grid table, one row per recommendation.
///
/// Profit ratios are green when positive and red otherwise.
pub struct TableRenderer<W: Write> {
    out: W,
    color: bool,
    clear_screen: bool,
}

impl<W: Write> TableRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            color: true,
            clear_screen: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Clear the terminal before each table, like a live board.
    pub fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }
}

fn price_cell(price: Option<u64>) -> String {
    price.map(format_gold).unwrap_or_else(|| "-".to_string())
}

fn row_cells(rec: &Recommendation) -> [String; 5] {
    [
        rec.item_name.clone(),
        format!("{:.2}", rec.profit_ratio),
        price_cell(rec.high_price),
        price_cell(rec.low_price),
        format_gold(rec.max_units),
    ]
}

fn separator(widths: &[usize; 5], fill: char) -> String {
    let mut line = String::from("+");
    for w in widths {
        line.extend(std::iter::repeat(fill).take(w + 2));
        line.push('+');
    }
    line
}

impl<W: Write> Renderer for TableRenderer<W> {
    fn render(&mut self, set: &RecommendationSet) -> Result<()> {
        if self.clear_screen {
            queue!(
                self.out,
                terminal::Clear(terminal::ClearType::All),
                cursor::MoveTo(0, 0)
            )?;
        }

        let rows: Vec<[String; 5]> = set.items.iter().map(row_cells).collect();

        let mut widths = HEADERS.map(|h| h.chars().count());
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }

        writeln!(self.out, "{}", separator(&widths, '-'))?;
        let header_line: Vec<String> = HEADERS
            .iter()
            .zip(widths.iter())
            .map(|(h, &w)| format!(" {h:<w$} "))
            .collect();
        writeln!(self.out, "|{}|", header_line.join("|"))?;
        writeln!(self.out, "{}", separator(&widths, '='))?;

        for (row, rec) in rows.iter().zip(set.items.iter()) {
            let mut cells = Vec::with_capacity(5);
            for (i, (cell, &w)) in row.iter().zip(widths.iter()).enumerate() {
                let padded = format!("{cell:<w$}");
                let shown = if i == 1 {
                    let color = if rec.profit_ratio > 0.0 { Color::Green } else { Color::Red };
                    self.paint(&padded, color)
                } else {
                    padded
                };
                cells.push(format!(" {shown} "));
            }
            writeln!(self.out, "|{}|", cells.join("|"))?;
            writeln!(self.out, "{}", separator(&widths, '-'))?;
        }

        let gold = set
            .capital
            .map(format_gold)
            .unwrap_or_else(|| "-".to_string());
        let summary = format!(
            "Profit/loss total: {:.2} | Your gold: {gold}",
            set.total_profit_ratio()
        );
        writeln!(self.out, "\n{}\n", self.paint(&summary, Color::Cyan))?;

        self.out.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
