//! Medication list workflow.

use super::MedicationStore;
use crate::drugs::DrugService;
use crate::models::{MedicationListItem, UserId};
use crate::{Result, RxListError};
use std::sync::Arc;
use tracing::info;

/// A user's medication list, backed by a store and checked against RxNorm.
#[derive(Clone)]
pub struct MedicationList {
    store: Arc<MedicationStore>,
    drugs: DrugService,
}

impl MedicationList {
    pub fn new(store: Arc<MedicationStore>, drugs: DrugService) -> Self {
        Self { store, drugs }
    }

    pub fn list(&self, user: UserId) -> Result<Vec<MedicationListItem>> {
        self.store.list(user)
    }

    /// Add `rxcui` to `user`'s list.
    ///
    /// Checks run in order: already listed ([`RxListError::Conflict`]),
    /// unknown to RxNorm ([`RxListError::InvalidRxcui`]), no details
    /// ([`RxListError::DrugDetailsUnavailable`]). Upstream transport
    /// failures are returned unchanged.
    pub async fn add(&self, user: UserId, rxcui: &str) -> Result<MedicationListItem> {
        if self.store.exists(user, rxcui)? {
            return Err(RxListError::Conflict {
                rxcui: rxcui.to_string(),
            });
        }

        if !self.drugs.validate_rxcui(rxcui).await? {
            return Err(RxListError::InvalidRxcui {
                rxcui: rxcui.to_string(),
            });
        }

        let record = self
            .drugs
            .drug_details(rxcui)
            .await?
            .ok_or_else(|| RxListError::DrugDetailsUnavailable {
                rxcui: rxcui.to_string(),
            })?;

        let item = self.store.add(user, &record)?;
        info!("User {} added medication {}", user, rxcui);
        Ok(item)
    }

    /// Remove `rxcui` from `user`'s list.
    pub fn remove(&self, user: UserId, rxcui: &str) -> Result<()> {
        self.store.remove(user, rxcui)?;
        info!("User {} removed medication {}", user, rxcui);
        Ok(())
    }
}
