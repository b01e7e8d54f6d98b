use validator::Validate;

use crate::error::ApiError;

/// Runs derive-based payload validation, folding all field errors into a
/// single 400 message.
pub fn validate<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload
        .validate()
        .map_err(|errors| ApiError::Validation(errors.to_string()))
}
