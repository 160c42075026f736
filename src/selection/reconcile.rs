//! Merge freshly enriched rows into the caller's selection
//!
//! Pure functions, no I/O. The existing selection is never mutated; the
//! next state is returned in `Reconciliation::updated_rows`.

use crate::model::{ParcelFeature, SelectionRow, SelectionSource, SelectionState};
use std::collections::{BTreeSet, HashSet};

/// Outcome of merging new rows into a selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// New rows that made it into `updated_rows`, in order
    pub to_add: Vec<SelectionRow>,
    /// Normalized fnr keys whose rows were toggled off
    pub to_remove: BTreeSet<String>,
    pub updated_rows: SelectionState,
}

fn selected_fnrs<S: SelectionSource + ?Sized>(existing: &S) -> HashSet<String> {
    existing.rows().iter().map(SelectionRow::fnr_key).collect()
}

/// Existing rows minus removed fnrs, then `additions`, capped at `max_results`.
///
/// Earlier selections win over additions when the cap is exceeded.
fn next_state<S: SelectionSource + ?Sized>(
    existing: &S,
    to_remove: &BTreeSet<String>,
    mut additions: Vec<SelectionRow>,
    max_results: usize,
) -> (Vec<SelectionRow>, SelectionState) {
    let kept: Vec<SelectionRow> = existing
        .rows()
        .iter()
        .filter(|row| !to_remove.contains(&row.fnr_key()))
        .cloned()
        .collect();
    let mut kept = SelectionState::from_rows(kept).into_rows();
    kept.truncate(max_results);

    additions.truncate(max_results - kept.len());
    kept.extend(additions.iter().cloned());
    (additions, SelectionState::from_rows(kept))
}

/// Merge `new_rows` into `existing`.
///
/// 1. With toggle on, a row whose fnr is already selected removes that
///    whole fnr group and is not added.
/// 2. Rows whose id is already selected, or already seen in this pass,
///    are skipped.
/// 3. Removals apply first, then additions, then the cap.
pub fn reconcile<S: SelectionSource + ?Sized>(
    new_rows: Vec<SelectionRow>,
    existing: &S,
    toggle_enabled: bool,
    max_results: usize,
) -> Reconciliation {
    let selected = selected_fnrs(existing);
    let mut seen_ids: HashSet<String> = existing.rows().iter().map(|r| r.id.clone()).collect();
    let mut to_remove = BTreeSet::new();
    let mut additions = Vec::new();

    for row in new_rows {
        let key = row.fnr_key();
        if toggle_enabled && selected.contains(&key) {
            to_remove.insert(key);
            continue;
        }
        if !seen_ids.insert(row.id.clone()) {
            continue;
        }
        additions.push(row);
    }

    let (to_add, updated_rows) = next_state(existing, &to_remove, additions, max_results);
    Reconciliation {
        to_add,
        to_remove,
        updated_rows,
    }
}

/// Remove-only result when every parcel is already selected in toggle mode.
///
/// Returns `None` when enrichment is needed: toggle off, no parcels, or at
/// least one parcel not yet selected.
pub fn removal_only<S: SelectionSource + ?Sized>(
    parcels: &[ParcelFeature],
    existing: &S,
    toggle_enabled: bool,
    max_results: usize,
) -> Option<Reconciliation> {
    if !toggle_enabled || parcels.is_empty() {
        return None;
    }
    let selected = selected_fnrs(existing);
    let to_remove: BTreeSet<String> = parcels.iter().map(|p| p.fnr.key()).collect();
    if !to_remove.iter().all(|key| selected.contains(key)) {
        return None;
    }

    let (to_add, updated_rows) = next_state(existing, &to_remove, Vec::new(), max_results);
    Some(Reconciliation {
        to_add,
        to_remove,
        updated_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OwnerRecord, RowStatus};

    fn owner_row(fnr: i64, owner_oid: i64) -> SelectionRow {
        let parcel = ParcelFeature::new(fnr, fnr, format!("Berga {}", fnr));
        SelectionRow::for_owner(&parcel, OwnerRecord::new(owner_oid), 0, "x".into())
    }

    fn ids(state: &SelectionState) -> Vec<String> {
        state.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn toggle_removes_whole_fnr_group() {
        let existing = vec![owner_row(100, 1), owner_row(100, 2), owner_row(200, 3)];
        let result = reconcile(vec![owner_row(100, 1)], &existing, true, 10);

        assert_eq!(result.to_remove, BTreeSet::from(["100".to_string()]));
        assert!(result.to_add.is_empty());
        assert_eq!(ids(&result.updated_rows), vec!["200_3"]);
    }

    #[test]
    fn toggle_never_removes_and_readds_in_one_pass() {
        let existing = vec![owner_row(100, 1)];
        let result = reconcile(vec![owner_row(100, 1), owner_row(100, 9)], &existing, true, 10);

        assert!(result.to_add.is_empty());
        assert!(result.updated_rows.is_empty());
    }

    #[test]
    fn duplicates_are_skipped_without_toggle() {
        let existing = vec![owner_row(100, 1)];
        let result = reconcile(
            vec![owner_row(100, 1), owner_row(200, 2), owner_row(200, 2)],
            &existing,
            false,
            10,
        );

        assert!(result.to_remove.is_empty());
        assert_eq!(result.to_add.len(), 1);
        assert_eq!(ids(&result.updated_rows), vec!["100_1", "200_2"]);
    }

    #[test]
    fn cap_drops_additions_before_existing_rows() {
        let existing = vec![owner_row(1, 1), owner_row(2, 2)];
        let result = reconcile(vec![owner_row(3, 3), owner_row(4, 4)], &existing, true, 3);

        assert_eq!(ids(&result.updated_rows), vec!["1_1", "2_2", "3_3"]);
        assert_eq!(result.to_add.len(), 1);
    }

    #[test]
    fn cap_holds_across_click_sequences() {
        let mut state = SelectionState::new();
        for click in 0..40_i64 {
            let fnr = click % 7;
            let rows: Vec<SelectionRow> = (0..(click % 4)).map(|o| owner_row(fnr, fnr * 10 + o)).collect();
            let max = 1 + (click as usize % 5);
            let result = reconcile(rows, &state, click % 3 != 0, max);
            assert!(result.updated_rows.len() <= max);
            state = result.updated_rows;
        }
    }

    #[test]
    fn works_over_a_selection_state() {
        let state = SelectionState::from_rows(vec![owner_row(100, 1)]);
        let result = reconcile(vec![owner_row(100, 1)], &state, true, 10);
        assert_eq!(result.to_remove.len(), 1);
    }

    #[test]
    fn removal_only_when_every_parcel_is_selected() {
        let existing = vec![owner_row(100, 1), owner_row(200, 2)];
        let selected = [ParcelFeature::new(100, 100, "a")];
        let mixed = [ParcelFeature::new(100, 100, "a"), ParcelFeature::new(300, 300, "c")];

        let result = removal_only(&selected, &existing, true, 10).unwrap();
        assert_eq!(ids(&result.updated_rows), vec!["200_2"]);
        assert!(result.to_add.is_empty());

        assert!(removal_only(&mixed, &existing, true, 10).is_none());
        assert!(removal_only(&selected, &existing, false, 10).is_none());
        assert!(removal_only(&[], &existing, true, 10).is_none());
    }

    #[test]
    fn placeholder_rows_toggle_like_owner_rows() {
        let parcel = ParcelFeature::new("0180-1:2", 5, "Berga 1:2");
        let existing = vec![SelectionRow::placeholder(&parcel, RowStatus::NoOwners, "-".into())];
        let result = reconcile(
            vec![SelectionRow::placeholder(&parcel, RowStatus::NoOwners, "-".into())],
            &existing,
            true,
            10,
        );
        assert!(result.updated_rows.is_empty());
    }
}
