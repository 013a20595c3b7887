//! Plain-text and JSON rendering of rounds.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde_json::json;

use statuswatch_types::{CanonicalStatus, ChangeSet, RoundUpdate, ServerConfig, StatusField};

const HEADERS: [&str; 8] = ["SERVER", "STATUS", "ALLIES", "AXIS", "TIME", "SCORE", "MAP", "NEXT"];

/// Render rows as an aligned text table.
///
/// Cells whose field changed in `changes` are suffixed with `*`; error rows
/// carry their detail in a trailing column.
pub fn render_table(rows: &[CanonicalStatus], changes: &BTreeMap<String, ChangeSet>) -> String {
    let empty = ChangeSet::new();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|status| row_cells(status, changes.get(&status.id).unwrap_or(&empty)))
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_row(&mut out, HEADERS.iter().copied(), &widths, None);
    for (status, row) in rows.iter().zip(&cells) {
        write_row(
            &mut out,
            row.iter().map(String::as_str),
            &widths,
            status.error_detail.as_deref(),
        );
    }
    out
}

fn row_cells(status: &CanonicalStatus, changed: &ChangeSet) -> Vec<String> {
    let mark = |fields: &[StatusField], text: String| {
        if fields.iter().any(|f| changed.contains(f)) {
            format!("{}*", text)
        } else {
            text
        }
    };

    vec![
        mark(&[StatusField::Name], status.name.clone()),
        mark(&[StatusField::Outcome], status.outcome.to_string()),
        mark(&[StatusField::AlliesCount], status.allies_count.to_string()),
        mark(&[StatusField::AxisCount], status.axis_count.to_string()),
        mark(&[StatusField::GameTime], status.game_time.to_string()),
        mark(
            &[StatusField::AlliesScore, StatusField::AxisScore],
            format!("{}-{}", status.allies_score, status.axis_score),
        ),
        mark(&[StatusField::CurrentMap], status.current_map.clone()),
        mark(&[StatusField::NextMap], status.next_map.clone()),
    ]
}

fn write_row<'a>(
    out: &mut String,
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
    detail: Option<&str>,
) {
    let mut line = String::new();
    for (cell, width) in cells.zip(widths) {
        let _ = write!(line, "{:<width$}  ", cell, width = *width);
    }
    if let Some(detail) = detail {
        let _ = write!(line, "({})", detail);
    }
    let _ = writeln!(out, "{}", line.trim_end());
}

/// Records of `update` in the order of `servers`.
///
/// Servers the round did not cover are shown as `Loading`, so the rows and
/// the change-sets always come from the same round.
pub fn round_rows(update: &RoundUpdate, servers: &[ServerConfig]) -> Vec<CanonicalStatus> {
    servers
        .iter()
        .map(|server| {
            update
                .statuses
                .get(&server.id)
                .cloned()
                .unwrap_or_else(|| CanonicalStatus::loading(server))
        })
        .collect()
}

/// JSON document describing a round: a summary plus every record and change-set.
pub fn round_json(update: &RoundUpdate) -> serde_json::Value {
    let online = update.statuses.values().filter(|s| s.is_success()).count();
    let changes: BTreeMap<&str, Vec<&str>> = update
        .changes
        .iter()
        .map(|(id, set)| (id.as_str(), set.iter().map(StatusField::as_str).collect()))
        .collect();

    json!({
        "summary": {
            "round": update.round,
            "completedAtMs": update.completed_at_ms,
            "servers": update.statuses.len(),
            "online": online,
            "failed": update.failed_servers(),
            "changed": update.changed_servers(),
        },
        "statuses": update.statuses.values().collect::<Vec<_>>(),
        "changes": changes,
    })
}
