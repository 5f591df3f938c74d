use validator::Validate;

use crate::api::errors::ApiError;

pub(crate) fn validate_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Trims and lowercases an email so lookups are case-insensitive.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn validate_prerequisites(
    subject_id: Option<&str>,
    prerequisite_ids: &[String],
) -> Result<(), ApiError> {
    if subject_id.is_some_and(|id| prerequisite_ids.iter().any(|prerequisite| prerequisite == id)) {
        return Err(ApiError::BadRequest("A subject cannot be its own prerequisite".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_lowercases() {
        assert_eq!(normalize_email("  Ana.Perez@Uni.EDU "), "ana.perez@uni.edu");
    }

    #[test]
    fn self_prerequisite_is_rejected() {
        let ids = vec!["a".to_string(), "b".to_string()];
        assert!(validate_prerequisites(Some("b"), &ids).is_err());
        assert!(validate_prerequisites(Some("c"), &ids).is_ok());
        assert!(validate_prerequisites(None, &ids).is_ok());
    }
}
