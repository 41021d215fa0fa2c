//! RxNav response payloads.
//!
//! Only the fields the core reads are modelled; everything else in the
//! upstream JSON is ignored.

use crate::models::DrugRecord;
use crate::{Result, RxListError};
use serde::Deserialize;

/// Response of `GET /drugs.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugsResponse {
    #[serde(default)]
    pub drug_group: DrugGroup,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub concept_group: Vec<ConceptGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptGroup {
    #[serde(default)]
    pub tty: Option<String>,
    #[serde(default)]
    pub concept_properties: Option<Vec<ConceptProperties>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptProperties {
    pub rxcui: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tty: Option<String>,
}

impl DrugsResponse {
    /// All candidate identifiers, flattened across groups in response order.
    /// Blank identifiers are dropped.
    pub fn candidate_rxcuis(&self) -> impl Iterator<Item = &str> {
        self.drug_group
            .concept_group
            .iter()
            .filter_map(|group| group.concept_properties.as_deref())
            .flatten()
            .map(|concept| concept.rxcui.as_str())
            .filter(|rxcui| !rxcui.trim().is_empty())
    }
}

/// Response of `GET /rxcui/{rxcui}/historystatus.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatusResponse {
    pub rxcui_status_history: RxcuiStatusHistory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RxcuiStatusHistory {
    #[serde(default)]
    pub attributes: Option<StatusAttributes>,
    #[serde(default)]
    pub definitional_features: Option<DefinitionalFeatures>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusAttributes {
    #[serde(default)]
    pub rxcui: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tty: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionalFeatures {
    #[serde(default)]
    pub ingredient_and_strength: Vec<IngredientAndStrength>,
    #[serde(default)]
    pub dose_form_group_concept: Vec<DoseFormGroupConcept>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientAndStrength {
    #[serde(default)]
    pub base_rxcui: Option<String>,
    #[serde(default)]
    pub base_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseFormGroupConcept {
    #[serde(default)]
    pub dose_form_group_rxcui: Option<String>,
    #[serde(default)]
    pub dose_form_group_name: Option<String>,
}

impl HistoryStatusResponse {
    /// Convert into a [`DrugRecord`] for the requested identifier.
    ///
    /// A non-blank concept name is required; the two feature lists default
    /// to empty.
    pub fn into_drug_record(self, rxcui: &str) -> Result<DrugRecord> {
        let history = self.rxcui_status_history;

        let drug_name = history
            .attributes
            .and_then(|a| a.name)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| RxListError::Upstream {
                message: format!("historystatus for {} has no attributes.name", rxcui),
            })?;

        let features = history.definitional_features.unwrap_or_default();
        let base_names = features
            .ingredient_and_strength
            .into_iter()
            .filter_map(|i| i.base_name);
        let dose_form_group_names = features
            .dose_form_group_concept
            .into_iter()
            .filter_map(|d| d.dose_form_group_name);

        Ok(DrugRecord::new(
            rxcui,
            drug_name,
            base_names,
            dose_form_group_names,
        ))
    }
}
