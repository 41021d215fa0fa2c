//! Drug concept types.

use serde::{Deserialize, Serialize};

/// A drug concept enriched from the terminology service.
///
/// Built once from an upstream detail response and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugRecord {
    pub rxcui: String,
    pub drug_name: String,
    #[serde(default)]
    pub base_names: Vec<String>,
    #[serde(default)]
    pub dose_form_group_names: Vec<String>,
}

impl DrugRecord {
    /// Build a record, deduplicating both name lists in first-seen order.
    pub fn new(
        rxcui: impl Into<String>,
        drug_name: impl Into<String>,
        base_names: impl IntoIterator<Item = String>,
        dose_form_group_names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            rxcui: rxcui.into(),
            drug_name: drug_name.into(),
            base_names: dedup_preserving_order(base_names),
            dose_form_group_names: dedup_preserving_order(dose_form_group_names),
        }
    }
}

/// Remove repeated values, keeping the first occurrence of each.
pub fn dedup_preserving_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
