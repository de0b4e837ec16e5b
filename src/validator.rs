//! `ValidatedJson<T>`: a JSON body extractor that also runs `validator`.
//!
//! - Malformed JSON, a missing field or a mistyped field is a 400.
//! - A body that parses but fails validation is a 422 with the field
//!   messages joined by `, `.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use cuaderno_core::AppError;

/// Flattens field, struct-level and nested errors into readable messages.
fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else if *field == "__all__" {
            prefix.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path))
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

pub fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, "", &mut messages);
    messages.join(", ")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let error_msg = rejection.body_text();

                if error_msg.contains("missing field") {
                    let field = error_msg
                        .split("missing field `")
                        .nth(1)
                        .and_then(|s| s.split('`').next())
                        .unwrap_or("unknown");
                    return AppError::bad_request(anyhow!("{} is required", field));
                }

                if error_msg.contains("invalid type") || error_msg.contains("unknown variant") {
                    return AppError::bad_request(anyhow!("Invalid field type in request"));
                }

                if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    return AppError::bad_request(anyhow!(
                        "Missing 'Content-Type: application/json' header"
                    ));
                }

                AppError::bad_request(anyhow!("Invalid request body"))
            })?;

        value.validate().map_err(|errors| {
            AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                anyhow!("{}", format_errors(&errors)),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuaderno_models::grades::RecordGradesDto;
    use cuaderno_models::subjects::CreateSubjectDto;

    #[test]
    fn test_format_field_errors() {
        let dto = CreateSubjectDto {
            code: String::new(),
            name: "Álgebra".to_string(),
            description: None,
            year: 9,
        };
        let errors = dto.validate().unwrap_err();
        let message = format_errors(&errors);

        assert!(message.contains("Code must be 1-20 characters"));
        assert!(message.contains("Year must be between 1 and 6"));
    }

    #[test]
    fn test_format_nested_errors() {
        let dto: RecordGradesDto =
            serde_json::from_str(r#"{"grades":[{"student_id":1,"score":-2}]}"#).unwrap();
        let errors = dto.validate().unwrap_err();

        assert_eq!(format_errors(&errors), "Score must be zero or greater");
    }
}
