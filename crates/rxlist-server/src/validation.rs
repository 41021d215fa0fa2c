//! Inbound request validation.
//!
//! Failures are reported as [`RxListError::Validation`] and rendered as 422
//! with per-field messages.

use rxlist_core::config::ValidationConfig;
use rxlist_core::{Result, RxListError};
use serde_json::Value;

pub const DRUG_NAME_REQUIRED: &str = "Drug name is required.";
pub const DRUG_NAME_TOO_SHORT: &str = "Drug name must be at least 2 characters.";
pub const DRUG_NAME_TOO_LONG: &str = "Drug name cannot exceed 100 characters.";
pub const RXCUI_REQUIRED: &str = "RxCUI is required.";
pub const RXCUI_NOT_STRING: &str = "The rxcui field must be a string.";
pub const RXCUI_TOO_LONG: &str = "RxCUI cannot exceed 50 characters.";

fn invalid(field: &str, message: &str) -> RxListError {
    RxListError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Check the `drug_name` search parameter. Returns it unchanged.
pub fn drug_name(value: Option<&str>) -> Result<&str> {
    let value = match value {
        Some(v) if !is_blank(v) => v,
        _ => return Err(invalid("drug_name", DRUG_NAME_REQUIRED)),
    };

    let chars = value.chars().count();
    if chars < ValidationConfig::DRUG_NAME_MIN_CHARS {
        return Err(invalid("drug_name", DRUG_NAME_TOO_SHORT));
    }
    if chars > ValidationConfig::DRUG_NAME_MAX_CHARS {
        return Err(invalid("drug_name", DRUG_NAME_TOO_LONG));
    }

    Ok(value)
}

/// Check the `rxcui` field of a JSON body.
pub fn rxcui(body: Option<&Value>) -> Result<String> {
    let value = match body.and_then(|b| b.get("rxcui")) {
        None | Some(Value::Null) => return Err(invalid("rxcui", RXCUI_REQUIRED)),
        Some(Value::String(s)) if is_blank(s) => return Err(invalid("rxcui", RXCUI_REQUIRED)),
        Some(Value::String(s)) => s,
        Some(_) => return Err(invalid("rxcui", RXCUI_NOT_STRING)),
    };

    if value.chars().count() > ValidationConfig::RXCUI_MAX_CHARS {
        return Err(invalid("rxcui", RXCUI_TOO_LONG));
    }

    Ok(value.clone())
}
