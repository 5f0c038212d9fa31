//! Application error catalogue from the root `x-errors` map

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::generation::extensions::error_declarations;
use crate::generation::utils::to_proper_case;
use crate::generation::{ApiDocument, ErrorCatalog, ErrorEntry, GenerationError};

/// Schema whose `code` enum lists the known error codes
pub const APPLICATION_ERROR_SCHEMA: &str = "ApplicationError";

/// Codes the shared Go error package relies on
pub const REQUIRED_ERROR_CODES: [&str; 11] = [
    "BUSINESS_ERROR",
    "VALIDATION_ERROR",
    "MISSING_REQUIRED_FIELD_ERROR",
    "OBJECT_VERSION_MISMATCH_ERROR",
    "NOT_FOUND_ERROR",
    "SERVICE_CALL_ERROR",
    "FORBIDDEN_ERROR",
    "INTERNAL_SERVER_ERROR",
    "AUTH_HEADER",
    "UNPROCESSABLE_ENTITY_FOREIGN_KEY",
    "UNPROCESSABLE_ENTITY_UNIQUE",
];

static FORMAT_VERB: Lazy<Regex> = Lazy::new(|| Regex::new(r"%+\w").expect("valid regex"));

/// Build the catalogue, `None` when the document declares no errors
pub fn build_error_catalog(document: &ApiDocument) -> Result<Option<ErrorCatalog>, GenerationError> {
    let declarations = error_declarations(document)?;
    if declarations.is_empty() {
        return Ok(None);
    }

    let known = known_codes(document)?;
    if let Some(known) = &known {
        for missing in REQUIRED_ERROR_CODES.iter().filter(|code| !known.contains(**code)) {
            tracing::warn!(code = %missing, "ApplicationError code enum is missing a required code");
        }
    }
    let mut entries = Vec::with_capacity(declarations.len());

    for (code, declaration) in declarations {
        if let Some(known) = &known {
            if !known.contains(&code) {
                return Err(GenerationError::UnknownErrorCode(code));
            }
        }
        if declaration.message.trim().is_empty() {
            return Err(GenerationError::extension(&code, "x-errors", "message is empty"));
        }
        if !(100..=599).contains(&declaration.http_code) {
            return Err(GenerationError::extension(
                &code,
                "x-errors",
                format!("httpCode {} is not an HTTP status", declaration.http_code),
            ));
        }

        entries.push(ErrorEntry {
            ident: to_proper_case(&code),
            is_format: FORMAT_VERB.is_match(&declaration.message),
            message: declaration.message,
            http_status: declaration.http_code,
            has_values: declaration.has_values,
            description: declaration.description,
            code,
        });
    }

    Ok(Some(ErrorCatalog { entries }))
}

/// Literals of `ApplicationError.code`, when that enum is declared
fn known_codes(document: &ApiDocument) -> Result<Option<BTreeSet<String>>, GenerationError> {
    let Some(code) = document
        .schema(APPLICATION_ERROR_SCHEMA)
        .and_then(|schema| schema.properties.get("code"))
    else {
        return Ok(None);
    };

    let code = document.resolve(code)?;
    if !code.is_enum() {
        return Ok(None);
    }

    Ok(Some(
        code.enum_values
            .iter()
            .filter_map(|value| value.as_str().map(String::from))
            .collect(),
    ))
}
