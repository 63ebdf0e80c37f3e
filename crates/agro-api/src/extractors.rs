//! # Extraction Helpers
//!
//! JSON bodies and path ids are taken as raw values and converted here, so
//! malformed input is reported in the API's own error format.

use std::str::FromStr;

use agro_core::ParseIdError;
use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse a path segment into a typed id.
pub fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr<Err = ParseIdError>,
{
    raw.parse::<T>()
        .map_err(|_| AppError::BadRequest(format!("Invalid id: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_core::ProducerId;

    #[test]
    fn parses_numeric_ids() {
        let id: ProducerId = parse_id("12").unwrap();
        assert_eq!(id.get(), 12);
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let err = parse_id::<ProducerId>("abc").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Invalid id: abc"));
        assert!(parse_id::<ProducerId>("0").is_err());
    }
}
