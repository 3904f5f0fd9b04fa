use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::findings::{JobKind, ResolutionStatus};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn yes_no_cell(value: bool) -> Cell {
    if value {
        Cell::new("yes").fg(TableColor::Green)
    } else {
        Cell::new("no").fg(TableColor::Red)
    }
}

/// Like [`yes_no_cell`], but renders `?` when the job's script text was not
/// available: absence of evidence is not evidence of absence.
pub fn presence_cell(value: bool, evidence_available: bool) -> Cell {
    if !evidence_available {
        Cell::new("?").fg(TableColor::DarkGrey)
    } else {
        yes_no_cell(value)
    }
}

pub fn kind_cell(kind: JobKind) -> Cell {
    let color = match kind {
        JobKind::InlineScriptPipeline | JobKind::SourceControlledPipeline => TableColor::Green,
        JobKind::FreeForm => TableColor::Yellow,
        JobKind::Unknown => TableColor::DarkGrey,
    };
    Cell::new(kind.label()).fg(color)
}

pub fn status_cell(status: ResolutionStatus) -> Cell {
    match status {
        ResolutionStatus::Resolved => Cell::new("resolved").fg(TableColor::Green),
        ResolutionStatus::ScriptUnavailable => {
            Cell::new("script unavailable").fg(TableColor::Yellow)
        }
        ResolutionStatus::RepositoryNotFoundLocally => {
            Cell::new("repo not found").fg(TableColor::Red)
        }
    }
}
