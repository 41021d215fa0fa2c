//! Medication list types.

use super::DrugRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry in a user's medication list.
///
/// The drug fields are a snapshot taken when the entry was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationListItem {
    pub id: i64,
    #[serde(skip_serializing)]
    #[serde(default = "unknown_user")]
    pub user_id: UserId,
    pub rxcui: String,
    pub drug_name: String,
    pub base_names: Vec<String>,
    pub dose_form_group_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn unknown_user() -> UserId {
    UserId(0)
}

impl MedicationListItem {
    /// The drug snapshot stored with this entry.
    pub fn snapshot(&self) -> DrugRecord {
        DrugRecord {
            rxcui: self.rxcui.clone(),
            drug_name: self.drug_name.clone(),
            base_names: self.base_names.clone(),
            dose_form_group_names: self.dose_form_group_names.clone(),
        }
    }
}
