use garde::Validate;

use crate::error::{AppError, Result};
use crate::models::user::UserUpdate;

/// Validates a user update.
///
/// # Arguments
///
/// * `update` - The requested changes.
///
/// # Returns
///
/// A `Result<()>` indicating whether the update is well formed.
pub fn validate_update(update: &UserUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(AppError::Validation("No update fields provided".to_string()));
    }

    if let Some(full_name) = &update.full_name {
        if full_name.trim().is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
    }

    update
        .validate()
        .map_err(|report| AppError::Validation(report.to_string()))
}

/// Validates the client fingerprint and naming fields of an API key request.
///
/// # Returns
///
/// A `Result<()>` indicating whether every field is present and bounded.
pub fn validate_fingerprint(fields: &[(&str, &str)]) -> Result<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} cannot be empty", name)));
        }

        if value.len() > 280 {
            return Err(AppError::Validation(format!(
                "{} must be at most 280 characters",
                name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_is_rejected() {
        assert!(matches!(
            validate_update(&UserUpdate::default()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let update = UserUpdate {
            full_name: Some("   ".into()),
            ..UserUpdate::default()
        };
        assert!(validate_update(&update).is_err());
    }

    #[test]
    fn well_formed_update_passes() {
        let update = UserUpdate {
            full_name: Some("Ada".into()),
            email: Some("ada@example.org".into()),
            ..UserUpdate::default()
        };
        assert!(validate_update(&update).is_ok());
    }

    #[test]
    fn fingerprint_fields_must_be_present() {
        assert!(validate_fingerprint(&[("ip_address", "1.1.1.1"), ("user_agent", "ua")]).is_ok());
        assert!(validate_fingerprint(&[("ip_address", "")]).is_err());
        let long = "x".repeat(281);
        assert!(validate_fingerprint(&[("user_agent", long.as_str())]).is_err());
    }
}
