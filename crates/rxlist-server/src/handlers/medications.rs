//! Authenticated medication list endpoints.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::server::AppState;
use crate::validation;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rxlist_core::MedicationListItem;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct MedicationsResponse {
    data: Vec<MedicationListItem>,
}

#[derive(Debug, Serialize)]
pub struct MedicationAdded {
    message: &'static str,
    medication: MedicationListItem,
}

#[derive(Debug, Serialize)]
pub struct MedicationRemoved {
    message: &'static str,
}

/// `GET /medications`
pub async fn list_medications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<MedicationsResponse>, ApiError> {
    let data = state.medications.list(user)?;
    Ok(Json(MedicationsResponse { data }))
}

/// `POST /medications {"rxcui": ...}`
pub async fn add_medication(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<MedicationAdded>), ApiError> {
    let rxcui = validation::rxcui(body.as_ref().map(|Json(b)| b))?;
    let medication = state.medications.add(user, &rxcui).await?;

    Ok((
        StatusCode::CREATED,
        Json(MedicationAdded {
            message: "Medication added successfully",
            medication,
        }),
    ))
}

/// `DELETE /medications {"rxcui": ...}`
pub async fn remove_medication(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    body: Option<Json<Value>>,
) -> Result<Json<MedicationRemoved>, ApiError> {
    let rxcui = validation::rxcui(body.as_ref().map(|Json(b)| b))?;
    state.medications.remove(user, &rxcui)?;

    Ok(Json(MedicationRemoved {
        message: "Medication removed successfully",
    }))
}
