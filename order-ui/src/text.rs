//! Plain-text order summary for terminals and logs.

use order_core::editor::OrderEditor;
use order_core::money::format_cents;
use order_core::{Cents, CurrencyFormat};

use crate::summary::summary_rows;

/// Renders the summary as aligned columns: label, subtotal, fee, total.
///
/// The grand total is separated from the rows above it by a rule.
pub fn summary_text(
    editor: &OrderEditor,
    format: &CurrencyFormat,
) -> String {
    let rows = summary_rows(editor);
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            let amount =
                |a: Option<Cents>| a.map_or_else(String::new, |a| format_cents(a, format));
            [
                row.label.clone(),
                amount(row.subtotal),
                amount(row.fee),
                format_cents(row.total, format),
            ]
        })
        .collect();

    let header = [
        String::new(),
        "Subtotal".to_string(),
        "Fee".to_string(),
        "Total".to_string(),
    ];
    let mut widths = [0usize; 4];
    for line in std::iter::once(&header).chain(&cells) {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |line: &[String; 4]| {
        let mut out = format!("{:<w$}", line[0], w = widths[0]);
        for (cell, width) in line[1..].iter().zip(&widths[1..]) {
            out.push_str(&format!("  {cell:>width$}"));
        }
        out.trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&render(&header));
    out.push('\n');
    for (row, line) in rows.iter().zip(&cells) {
        if row.is_grand_total() {
            let rule_len = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
            out.push_str(&"-".repeat(rule_len));
            out.push('\n');
        }
        out.push_str(&render(line));
        out.push('\n');
    }
    out
}
