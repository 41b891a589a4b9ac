//! Portal drivers: each wires a router to the backend and, where the role
//! has one, to its persisted session.

pub mod customer;
pub mod farmer;
pub mod restaurant;

use tracing::warn;

use farmpass_shared::constants::MIN_PASSWORD_LEN;
use farmpass_shared::models::NearbyRestaurant;
use farmpass_shared::ValidationError;

use crate::api::Backend;
use crate::error::{ApiError, ErrorKind, Notice};

/// Trimmed value of a mandatory form field.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn check_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Login and registration failures. A 401 here means wrong credentials,
/// so the backend's text is shown instead of the session-expired prompt.
pub(crate) fn auth_notice(err: &ApiError) -> Notice {
    match err {
        ApiError::Unauthenticated { message, .. } => Notice::new(
            ErrorKind::Unauthenticated,
            message.as_deref().unwrap_or("Invalid email or password"),
        ),
        other => Notice::from(other),
    }
}

/// Other restaurants sourcing from the same farm. Supplementary, so any
/// failure yields an empty list.
pub(crate) async fn same_farm<B: Backend + ?Sized>(
    backend: &B,
    batch_id: &str,
    exclude: Option<&str>,
) -> Vec<NearbyRestaurant> {
    if batch_id.is_empty() {
        return Vec::new();
    }
    match backend.same_farm_restaurants(batch_id, exclude).await {
        Ok(restaurants) => restaurants,
        Err(e) => {
            warn!(batch_id, error = %e, "restaurant discovery failed, showing none");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("Farm name", "  Green Valley "), Ok("Green Valley".into()));
        assert_eq!(required("Farm name", "   "), Err(ValidationError::Required("Farm name")));
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(check_password("secret", "secret"), Ok(()));
        assert_eq!(check_password("secret", "secreT"), Err(ValidationError::PasswordMismatch));
        assert_eq!(
            check_password("abc", "abc"),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
    }

    #[test]
    fn test_auth_notice_uses_backend_text() {
        let n = auth_notice(&ApiError::Unauthenticated {
            status: 401,
            message: Some("Invalid credentials".into()),
        });
        assert_eq!(n.message, "Invalid credentials");
    }
}
