use std::collections::BTreeSet;

use dqcert_core::Table;

use crate::model::ViolationPreview;

/// Union of the offending row sets of all metrics.
pub fn violation_union<'a, I>(sets: I) -> BTreeSet<usize>
where
    I: IntoIterator<Item = &'a BTreeSet<usize>>,
{
    sets.into_iter().flatten().copied().collect()
}

/// Rows to preview: the sorted union truncated to `limit`, or the first
/// `limit` rows when nothing was flagged.
pub fn preview_rows(union: &BTreeSet<usize>, row_count: usize, limit: usize) -> Vec<usize> {
    if union.is_empty() {
        (0..row_count.min(limit)).collect()
    } else {
        union.iter().copied().take(limit).collect()
    }
}

pub fn build_preview(table: &Table, union: &BTreeSet<usize>, limit: usize) -> ViolationPreview {
    let row_indices = preview_rows(union, table.row_count(), limit);
    let rows = row_indices
        .iter()
        .map(|row| table.render_row(*row))
        .collect();
    ViolationPreview {
        row_indices,
        columns: table.column_names(),
        rows,
        violation_count: union.len(),
    }
}
