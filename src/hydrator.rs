//! Row → field assignment by external name.
//!
//! Hydration is best-effort: every column is tried independently, and
//! columns that match no field, carry NULL, or fail coercion are skipped.
//! [`HydrationReport`] records what happened so callers and tests can tell a
//! full bind from a partial one.

use crate::core::{Row, Value};
use crate::metadata::{DbEntity, FieldBinding, find_field};
use std::collections::HashSet;

/// Per-row (or per-batch) hydration counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub assigned: usize,
    pub skipped_null: usize,
    pub unmatched: usize,
    pub failed: usize,
}

impl HydrationReport {
    /// No column was skipped for a mismatch or a failed coercion.
    pub fn is_complete(&self) -> bool {
        self.unmatched == 0 && self.failed == 0
    }

    pub fn merge(&mut self, other: HydrationReport) {
        self.assigned += other.assigned;
        self.skipped_null += other.skipped_null;
        self.unmatched += other.unmatched;
        self.failed += other.failed;
    }
}

enum ColumnOutcome {
    Assigned,
    Null,
    Unmatched,
    Failed,
}

fn hydrate_column<T>(
    instance: &mut T,
    fields: &[FieldBinding<T>],
    column: &str,
    value: &Value,
) -> ColumnOutcome {
    let Some(field) = find_field(fields, column) else {
        tracing::debug!(column, "no field mapped to result column");
        return ColumnOutcome::Unmatched;
    };

    if value.is_null() {
        return ColumnOutcome::Null;
    }

    match field.write(instance, value) {
        Ok(()) => ColumnOutcome::Assigned,
        Err(err) => {
            tracing::debug!(
                column,
                field = field.field_name(),
                error = %err,
                "skipping column that could not be coerced"
            );
            ColumnOutcome::Failed
        }
    }
}

/// Assigns every matching non-null column of `row` into `instance`.
///
/// When a column name repeats, only its first occurrence is read; later ones
/// count as unmatched.
pub fn hydrate_one<T>(instance: &mut T, row: &Row, fields: &[FieldBinding<T>]) -> HydrationReport {
    let mut report = HydrationReport::default();
    let mut seen = HashSet::with_capacity(row.len());
    for (column, value) in row.iter() {
        if !seen.insert(column) {
            tracing::debug!(column, "repeated result column ignored");
            report.unmatched += 1;
            continue;
        }
        match hydrate_column(instance, fields, column, value) {
            ColumnOutcome::Assigned => report.assigned += 1,
            ColumnOutcome::Null => report.skipped_null += 1,
            ColumnOutcome::Unmatched => report.unmatched += 1,
            ColumnOutcome::Failed => report.failed += 1,
        }
    }
    report
}

/// One fresh `T` per row, in row order, plus an optional trailing
/// default-constructed template.
pub fn hydrate_many<'r, T, I>(rows: I, fields: &[FieldBinding<T>], append_template: bool) -> Vec<T>
where
    T: DbEntity,
    I: IntoIterator<Item = &'r Row>,
{
    let rows = rows.into_iter();
    let mut items = Vec::with_capacity(rows.size_hint().0 + usize::from(append_template));
    let mut totals = HydrationReport::default();

    for row in rows {
        let mut item = T::default();
        totals.merge(hydrate_one(&mut item, row, fields));
        items.push(item);
    }

    if !totals.is_complete() {
        tracing::debug!(
            rows = items.len(),
            unmatched = totals.unmatched,
            failed = totals.failed,
            "partial hydration"
        );
    }

    if append_template {
        items.push(T::default());
    }
    items
}
