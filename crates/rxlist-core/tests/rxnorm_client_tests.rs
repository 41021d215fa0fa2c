//! RxNormClient against a local server speaking the RxNav JSON shapes.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rxlist_core::network::HttpClient;
use rxlist_core::{
    DrugService, MemoryCache, ResultCache, RxListError, RxNormClient, TerminologySource,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn drugs_payload(name: &str) -> Value {
    match name {
        "aspirin" => json!({
            "drugGroup": {
                "name": "aspirin",
                "conceptGroup": [
                    { "tty": "BPCK" },
                    {
                        "tty": "SBD",
                        "conceptProperties": [
                            { "rxcui": "101", "name": "A", "tty": "SBD" },
                            { "rxcui": "102", "name": "B", "tty": "SBD" },
                            { "rxcui": "103", "name": "C", "tty": "SBD" }
                        ]
                    },
                    {
                        "tty": "SBD",
                        "conceptProperties": [
                            { "rxcui": "104", "name": "D", "tty": "SBD" },
                            { "rxcui": "500", "name": "broken", "tty": "SBD" },
                            { "rxcui": "105", "name": "E", "tty": "SBD" }
                        ]
                    },
                    {
                        "tty": "SBD",
                        "conceptProperties": [
                            { "rxcui": "106", "name": "F", "tty": "SBD" }
                        ]
                    }
                ]
            }
        }),
        "blanks" => json!({
            "drugGroup": {
                "name": "blanks",
                "conceptGroup": [
                    {
                        "tty": "SBD",
                        "conceptProperties": [
                            { "rxcui": "", "name": "no id", "tty": "SBD" },
                            { "rxcui": "blank", "name": "no name", "tty": "SBD" },
                            { "rxcui": "107", "name": "G", "tty": "SBD" }
                        ]
                    }
                ]
            }
        }),
        _ => json!({ "drugGroup": { "name": null } }),
    }
}

fn history_payload(rxcui: &str) -> Value {
    json!({
        "rxcuiStatusHistory": {
            "attributes": {
                "rxcui": rxcui,
                "name": format!("Drug {}", rxcui),
                "tty": "SBD"
            },
            "definitionalFeatures": {
                "ingredientAndStrength": [
                    { "baseRxcui": "1191", "baseName": "Aspirin" },
                    { "baseRxcui": "1191", "baseName": "Aspirin" },
                    { "baseRxcui": "161", "baseName": "Acetaminophen" }
                ],
                "doseFormGroupConcept": [
                    { "doseFormGroupRxcui": "1", "doseFormGroupName": "Oral Product" },
                    { "doseFormGroupRxcui": "2", "doseFormGroupName": "Pill" },
                    { "doseFormGroupRxcui": "1", "doseFormGroupName": "Oral Product" }
                ]
            }
        }
    })
}

async fn drugs(Query(params): Query<HashMap<String, String>>) -> Response {
    assert_eq!(params.get("allsrc").map(String::as_str), Some("1"));
    assert_eq!(params.get("tty").map(String::as_str), Some("SBD"));

    match params.get("name").map(String::as_str) {
        Some("outage") => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        Some("garbage") => "<html>not json</html>".into_response(),
        Some(name) => Json(drugs_payload(name)).into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn rxcui(Path(file): Path<String>) -> Response {
    match file.strip_suffix(".json") {
        Some(id) if id.starts_with('1') => {
            Json(json!({ "idGroup": { "rxnormId": [id] } })).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn history(Path(rxcui): Path<String>) -> Response {
    match rxcui.as_str() {
        "500" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "404" => StatusCode::NOT_FOUND.into_response(),
        "nameless" => Json(json!({ "rxcuiStatusHistory": {} })).into_response(),
        "blank" => Json(json!({
            "rxcuiStatusHistory": { "attributes": { "rxcui": "blank", "name": "" } }
        }))
        .into_response(),
        "bare" => Json(json!({
            "rxcuiStatusHistory": { "attributes": { "name": "Bare Drug" } }
        }))
        .into_response(),
        id => Json(history_payload(id)).into_response(),
    }
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK.into_response()
}

/// Serve a fake RxNav on an ephemeral port and return its base URL.
async fn spawn_rxnav() -> String {
    let app = Router::new()
        .route("/REST/drugs.json", get(drugs))
        .route("/REST/rxcui/:file", get(rxcui))
        .route("/REST/rxcui/:rxcui/historystatus.json", get(history))
        .route("/SLOW/rxcui/:file", get(slow));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn client() -> RxNormClient {
    let base = spawn_rxnav().await;
    RxNormClient::with_base_url(HttpClient::new().unwrap(), format!("{}/REST", base)).unwrap()
}

#[tokio::test]
async fn test_find_candidates_flattens_groups_in_order() {
    let client = client().await;

    let candidates = client.find_candidates("aspirin").await.unwrap();

    assert_eq!(
        candidates,
        vec!["101", "102", "103", "104", "500", "105", "106"]
    );
}

#[tokio::test]
async fn test_find_candidates_without_groups_is_empty() {
    let client = client().await;
    assert!(client.find_candidates("nothing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_candidates_non_success_degrades_to_empty() {
    let client = client().await;
    assert!(client.find_candidates("outage").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_candidates_unparseable_body_is_upstream_error() {
    let client = client().await;
    let err = client.find_candidates("garbage").await.unwrap_err();
    assert!(matches!(err, RxListError::Upstream { .. }));
}

#[tokio::test]
async fn test_fetch_details_dedups_lists() {
    let client = client().await;

    let record = client.fetch_details("101").await.unwrap().unwrap();

    assert_eq!(record.rxcui, "101");
    assert_eq!(record.drug_name, "Drug 101");
    assert_eq!(record.base_names, vec!["Aspirin", "Acetaminophen"]);
    assert_eq!(record.dose_form_group_names, vec!["Oral Product", "Pill"]);
}

#[tokio::test]
async fn test_fetch_details_missing_features_gives_empty_lists() {
    let client = client().await;

    let record = client.fetch_details("bare").await.unwrap().unwrap();

    assert_eq!(record.drug_name, "Bare Drug");
    assert!(record.base_names.is_empty());
    assert!(record.dose_form_group_names.is_empty());
}

#[tokio::test]
async fn test_fetch_details_non_success_is_none() {
    let client = client().await;
    assert!(client.fetch_details("404").await.unwrap().is_none());
    assert!(client.fetch_details("500").await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_details_without_name_is_upstream_error() {
    let client = client().await;
    let err = client.fetch_details("nameless").await.unwrap_err();
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_check_exists_follows_status() {
    let client = client().await;
    assert!(client.check_exists("1191").await.unwrap());
    assert!(!client.check_exists("999").await.unwrap());
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        RxNormClient::with_base_url(HttpClient::new().unwrap(), format!("http://{}/REST", addr))
            .unwrap();
    let err = client.check_exists("1191").await.unwrap_err();
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let base = spawn_rxnav().await;
    let http = HttpClient::with_timeout(Duration::from_millis(200)).unwrap();
    let client = RxNormClient::with_base_url(http, format!("{}/SLOW", base)).unwrap();

    let err = client.check_exists("1191").await.unwrap_err();
    assert!(matches!(err, RxListError::Timeout(_)));
}

#[tokio::test]
async fn test_search_end_to_end_skips_broken_candidate() {
    let client = client().await;
    let drugs = DrugService::new(
        Arc::new(client),
        ResultCache::new(Arc::new(MemoryCache::new())),
    );

    let results = drugs.search("aspirin", 5).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.rxcui.as_str()).collect();
    assert_eq!(ids, vec!["101", "102", "103", "104", "105"]);
    assert!(results.iter().all(|r| r.base_names == vec!["Aspirin", "Acetaminophen"]));
}

#[tokio::test]
async fn test_search_drops_blank_identifiers_and_names() {
    let client = client().await;
    let drugs = DrugService::new(
        Arc::new(client),
        ResultCache::new(Arc::new(MemoryCache::new())),
    );

    let results = drugs.search("blanks", 5).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.rxcui.as_str()).collect();
    assert_eq!(ids, vec!["107"]);
    assert_eq!(results[0].drug_name, "Drug 107");
}
