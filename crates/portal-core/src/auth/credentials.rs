//! Login form validation.
//!
//! `validate` is the only way to obtain `ValidCredentials`, and the auth
//! service only accepts `ValidCredentials`, so malformed input never
//! reaches the network.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::LoginRequest;
use crate::config::Locale;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Local part characters, then dot-separated domain labels and a letter TLD.
const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$";

/// Raw values typed into the login form.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials that passed `validate`.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidCredentials(LoginCredentials);

impl ValidCredentials {
    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl fmt::Debug for ValidCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValidCredentials").field(&self.0).finish()
    }
}

impl From<ValidCredentials> for LoginRequest {
    fn from(valid: ValidCredentials) -> Self {
        LoginRequest {
            email: valid.0.email,
            password: valid.0.password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Email,
    Password,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Password => "password",
        }
    }
}

/// Field-level validation failures, one message per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field.name(), message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&summary)
    }
}

impl std::error::Error for FieldErrors {}

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_string());
    }
}

fn invalid_email_message(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "invalid email",
        Locale::Id => "Email tidak valid",
    }
}

fn short_password_message(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "password must be at least 6 characters",
        Locale::Id => "Password minimal 6 karakter",
    }
}

pub fn is_valid_email(email: &str) -> bool {
    if email.starts_with('.') || email.contains("..") {
        return false;
    }
    Regex::new(EMAIL_PATTERN).is_ok_and(|re| re.is_match(email))
}

/// Validate a login form. Pure; reports every failing field.
pub fn validate(
    credentials: &LoginCredentials,
    locale: Locale,
) -> Result<ValidCredentials, FieldErrors> {
    let mut errors = FieldErrors::default();

    if !is_valid_email(&credentials.email) {
        errors.insert(Field::Email, invalid_email_message(locale));
    }
    if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(Field::Password, short_password_message(locale));
    }

    if errors.is_empty() {
        Ok(ValidCredentials(credentials.clone()))
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co.id"));
        assert!(is_valid_email("o'neil_99@example.org"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@example.c"));
        assert!(!is_valid_email(".user@example.com"));
        assert!(!is_valid_email("user..name@example.com"));
        assert!(!is_valid_email("user.@example.com"));
        assert!(!is_valid_email("user name@example.com"));
        assert!(!is_valid_email("user@-example.com"));
    }

    #[test]
    fn test_valid_credentials_pass() {
        let creds = LoginCredentials::new("user@example.com", "secret1");
        let valid = validate(&creds, Locale::En).unwrap();
        assert_eq!(valid.email(), "user@example.com");
    }

    #[test]
    fn test_invalid_email_reports_email_field_only() {
        let creds = LoginCredentials::new("not-an-email", "secret1");
        let errors = validate(&creds, Locale::En).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(Field::Email), Some("invalid email"));
        assert_eq!(errors.get(Field::Password), None);
    }

    #[test]
    fn test_short_password_reports_password_field() {
        for password in ["", "a", "12345"] {
            let creds = LoginCredentials::new("user@example.com", password);
            let errors = validate(&creds, Locale::En).unwrap_err();
            assert_eq!(
                errors.get(Field::Password),
                Some("password must be at least 6 characters")
            );
            assert_eq!(errors.get(Field::Email), None);
        }
    }

    #[test]
    fn test_password_boundary() {
        assert!(validate(&LoginCredentials::new("user@example.com", "123456"), Locale::En).is_ok());
        // Counted in characters, not bytes
        assert!(validate(&LoginCredentials::new("user@example.com", "ééééé"), Locale::En).is_err());
        assert!(validate(&LoginCredentials::new("user@example.com", "éééééé"), Locale::En).is_ok());
    }

    #[test]
    fn test_all_failing_fields_reported() {
        let errors = validate(&LoginCredentials::new("bad", "123"), Locale::En).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "email: invalid email; password: password must be at least 6 characters"
        );
    }

    #[test]
    fn test_messages_follow_locale() {
        let errors = validate(&LoginCredentials::new("bad", "123"), Locale::Id).unwrap_err();
        assert_eq!(errors.get(Field::Email), Some("Email tidak valid"));
        assert_eq!(errors.get(Field::Password), Some("Password minimal 6 karakter"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = LoginCredentials::new("user@example.com", "secret1");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("user@example.com"));
        assert!(!shown.contains("secret1"));
    }

    #[test]
    fn test_form_shape_matches_login_request() {
        let creds = LoginCredentials::new("user@example.com", "secret1");
        let form = serde_json::to_value(&creds).unwrap();
        let request = serde_json::to_value(LoginRequest::from(
            validate(&creds, Locale::En).unwrap(),
        ))
        .unwrap();

        let (Value::Object(form), Value::Object(request)) = (form, request) else {
            panic!("both shapes should serialize to JSON objects");
        };

        let form_fields: Vec<_> = form.keys().collect();
        let request_fields: Vec<_> = request.keys().collect();
        assert_eq!(form_fields, request_fields);

        for (field, value) in &form {
            let other = &request[field];
            assert_eq!(
                std::mem::discriminant(value),
                std::mem::discriminant(other),
                "type mismatch for field {}",
                field
            );
            assert_eq!(value, other, "value mismatch for field {}", field);
        }

        // And the form deserializes from the request shape
        let back: LoginCredentials = serde_json::from_value(Value::Object(request)).unwrap();
        assert_eq!(back, creds);
    }
}
