use std::collections::{BTreeMap, BTreeSet};

use super::model::{AttrValue, ContributionBatch};

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per attribute
// ---------------------------------------------------------------------------

/// Per-column selection state: maps attribute name → set of selected values.
/// A column missing from the map imposes no constraint.
pub type FilterState = BTreeMap<String, BTreeSet<AttrValue>>;

/// Initialise a [`FilterState`] with all values selected (i.e., show everything).
pub fn init_filter_state(batch: &ContributionBatch) -> FilterState {
    batch
        .unique_values
        .iter()
        .map(|(col, vals)| (col.clone(), vals.clone()))
        .collect()
}

/// Return indices of particles that pass all active filters.
///
/// A particle passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * Every value of the column is selected → passes
/// * The particle's value for that column is in the selected set → passes
pub fn filtered_indices(batch: &ContributionBatch, filters: &FilterState) -> Vec<usize> {
    batch
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| {
            let attrs = entry.info.particle.attributes();
            filters.iter().all(|(col, selected)| {
                if selected.is_empty() {
                    return false;
                }
                if batch
                    .unique_values
                    .get(col)
                    .is_some_and(|all| selected.len() == all.len())
                {
                    return true;
                }
                let value = attrs.get(col.as_str()).unwrap_or(&AttrValue::Absent);
                selected.contains(value)
            })
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::data::loader::scan;
    use crate::data::model::VolcanoId;

    fn batch() -> ContributionBatch {
        let paths: Vec<PathBuf> = [
            "AB01_1_2_1_b4_5X_phi0phi1_PG.png",
            "AB01_1_2_2_b4_5X_phi0phi1_JJtrlcp.png",
            "AB01_1_2_3_m4_5X_phi0phi1_JJblhcb.png",
            "AB01_1_2_4_m4_5X_phi0phi1_LLtrlcn.png",
        ]
        .iter()
        .map(|p| PathBuf::from(*p))
        .collect();
        scan(&paths, &VolcanoId::Number(1))
    }

    #[test]
    fn everything_selected_shows_all() {
        let batch = batch();
        let filters = init_filter_state(&batch);
        assert_eq!(filtered_indices(&batch, &filters), vec![0, 1, 2, 3]);
    }

    #[test]
    fn selecting_one_main_type() {
        let batch = batch();
        let mut filters = init_filter_state(&batch);
        filters.insert(
            "main_type".to_string(),
            BTreeSet::from([AttrValue::Text("juvenile".to_string())]),
        );
        assert_eq!(filtered_indices(&batch, &filters), vec![1, 2]);
    }

    #[test]
    fn absent_values_can_be_selected() {
        let batch = batch();
        let mut filters = init_filter_state(&batch);
        filters.insert("color".to_string(), BTreeSet::from([AttrValue::Absent]));
        assert_eq!(filtered_indices(&batch, &filters), vec![0]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let batch = batch();
        let mut filters = init_filter_state(&batch);
        filters.insert("shape".to_string(), BTreeSet::new());
        assert!(filtered_indices(&batch, &filters).is_empty());
    }
}
