use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::definition::{FormRequirement, FormValueKind};
use super::domain::{describe_value, FormData};
use super::machine::ProcessError;

/// Checks every requirement, reporting all missing keys together before any shape error.
pub(crate) fn check_requirements(
    form: &FormData,
    requirements: &[FormRequirement],
) -> Result<(), ProcessError> {
    let missing: Vec<String> = requirements
        .iter()
        .filter(|requirement| matches!(form.get(requirement.key), None | Some(Value::Null)))
        .map(|requirement| requirement.key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ProcessError::FormDataNotFound { missing });
    }

    for requirement in requirements {
        match requirement.kind {
            FormValueKind::Text => {
                text(form, requirement.key)?;
            }
            FormValueKind::Boolean => {
                boolean(form, requirement.key)?;
            }
            FormValueKind::Uuid => {
                uuid(form, requirement.key)?;
            }
            FormValueKind::DateTime => {
                date_time(form, requirement.key)?;
            }
        }
    }
    Ok(())
}

fn present<'a>(form: &'a FormData, key: &str) -> Result<&'a Value, ProcessError> {
    match form.get(key) {
        None | Some(Value::Null) => Err(ProcessError::FormDataNotFound {
            missing: vec![key.to_string()],
        }),
        Some(value) => Ok(value),
    }
}

fn wrong_shape(key: &str, kind: FormValueKind, found: &Value) -> ProcessError {
    ProcessError::FormDataFormat {
        key: key.to_string(),
        expected: format!("{} (found {})", kind.label(), describe_value(found)),
    }
}

pub(crate) fn text<'a>(form: &'a FormData, key: &str) -> Result<&'a str, ProcessError> {
    let value = present(form, key)?;
    match value.as_str().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(wrong_shape(key, FormValueKind::Text, value)),
    }
}

pub(crate) fn boolean(form: &FormData, key: &str) -> Result<bool, ProcessError> {
    let value = present(form, key)?;
    value
        .as_bool()
        .ok_or_else(|| wrong_shape(key, FormValueKind::Boolean, value))
}

pub(crate) fn uuid(form: &FormData, key: &str) -> Result<Uuid, ProcessError> {
    let value = present(form, key)?;
    value
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or_else(|| wrong_shape(key, FormValueKind::Uuid, value))
}

pub(crate) fn date_time(form: &FormData, key: &str) -> Result<DateTime<Utc>, ProcessError> {
    let value = present(form, key)?;
    value
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok_or_else(|| wrong_shape(key, FormValueKind::DateTime, value))
}

/// Resolves an enumerated form value against the allowed `(value, state)` choices.
pub(crate) fn choice(
    form: &FormData,
    key: &str,
    choices: &[(&'static str, &'static str)],
) -> Result<&'static str, ProcessError> {
    let raw = text(form, key)?;
    choices
        .iter()
        .find(|(value, _)| value.eq_ignore_ascii_case(raw))
        .map(|(_, state)| *state)
        .ok_or_else(|| {
            let allowed: Vec<&str> = choices.iter().map(|(value, _)| *value).collect();
            ProcessError::FormDataFormat {
                key: key.to_string(),
                expected: format!("one of {} (found '{raw}')", allowed.join(", ")),
            }
        })
}
