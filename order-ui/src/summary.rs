//! Rows of the order summary, shared by the HTML and text renderings.

use order_core::Cents;
use order_core::editor::OrderEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Task,
    Reshipping,
    GrandTotal,
}

/// One summary line. Reshipping rows only carry a total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub kind: SummaryKind,
    pub label: String,
    pub subtotal: Option<Cents>,
    pub fee: Option<Cents>,
    pub total: Cents,
}

impl SummaryRow {
    pub fn is_grand_total(&self) -> bool {
        self.kind == SummaryKind::GrandTotal
    }
}

/// Summary rows for the editor's current totals.
pub fn summary_rows(editor: &OrderEditor) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = editor
        .task_views()
        .map(|view| SummaryRow {
            kind: SummaryKind::Task,
            label: format!("Task {}: {}", view.number, view.task.merchant),
            subtotal: Some(view.totals.subtotal),
            fee: Some(view.totals.fee),
            total: view.totals.total,
        })
        .collect();

    let totals = editor.totals();
    if let Some(reshipping_fee) = totals.reshipping_fee {
        rows.push(SummaryRow {
            kind: SummaryKind::Reshipping,
            label: "Reshipping".to_string(),
            subtotal: None,
            fee: None,
            total: reshipping_fee,
        });
    }

    rows.push(SummaryRow {
        kind: SummaryKind::GrandTotal,
        label: "Total".to_string(),
        subtotal: Some(totals.subtotal),
        fee: Some(totals.fee),
        total: totals.total,
    });
    rows
}
