//! Per-user medication lists.
//!
//! [`MedicationStore`] persists entries; [`MedicationList`] adds the
//! terminology checks that guard every insert.

mod list;
mod store;

pub use list::MedicationList;
pub use store::MedicationStore;
