use serde::Deserialize;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(custom(function = "trimmed_username"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 3, message = "Password deve avere almeno 3 caratteri"))]
    pub password: String,

    #[serde(default)]
    pub confirm_password: Option<String>,
}

fn trimmed_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().chars().count() < 3 {
        let mut err = ValidationError::new("length");
        err.message = Some("Username deve avere almeno 3 caratteri".into());
        return Err(err);
    }
    Ok(())
}

fn passwords_match(req: &RegisterRequest) -> Result<(), ValidationError> {
    match &req.confirm_password {
        Some(confirm) if confirm != &req.password => {
            let mut err = ValidationError::new("confirm_password");
            err.message = Some("Le password non coincidono".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Compila tutti i campi"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Compila tutti i campi"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, password: &str, confirm: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: confirm.map(str::to_string),
        }
    }

    #[test]
    fn short_fields_are_rejected() {
        assert!(register("ab", "secret", None).validate().is_err());
        assert!(register("   abc   ", "secret", None).validate().is_ok());
        assert!(register("  a  ", "secret", None).validate().is_err());
        assert!(register("mario", "ab", None).validate().is_err());
    }

    #[test]
    fn confirmation_must_match_when_given() {
        assert!(register("mario", "secret", Some("secret")).validate().is_ok());
        assert!(register("mario", "secret", Some("other")).validate().is_err());
    }

    #[test]
    fn login_requires_both_fields() {
        let empty = LoginRequest { username: String::new(), password: "x".to_string() };
        assert!(empty.validate().is_err());
    }
}
