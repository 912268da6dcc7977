use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::error::ServiceError;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*@([A-Za-z0-9-]+\.)+[A-Za-z]{2,}$"#).unwrap()
});
static USERNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

const PASSWORD_SPECIALS: &str = "@$!%*?&_#-";
const CAPACITY_RANGE: &str = "capacity must be a non-negative number";

/// Collects per-field errors; `finish` fails if any were recorded. Fields
/// that are absent and not required are skipped.
#[derive(Debug, Default)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    fn present<'a>(&mut self, field: &str, value: Option<&'a str>, required: bool) -> Option<&'a str> {
        match value {
            Some(v) => Some(v),
            None => {
                if required {
                    self.fail(field, format!("{} is required", field));
                }
                None
            }
        }
    }

    fn length(&mut self, field: &str, label: &str, value: Option<&str>, required: bool, min: usize, max: usize) -> &mut Self {
        if let Some(v) = self.present(field, value, required) {
            let len = v.trim().chars().count();
            if len < min || len > max {
                self.fail(field, format!("{} must be between {} and {} characters", label, min, max));
            }
        }
        self
    }

    pub fn name(&mut self, value: Option<&str>, required: bool) -> &mut Self {
        self.length("name", "name", value, required, 2, 100)
    }

    pub fn address(&mut self, value: Option<&str>, required: bool) -> &mut Self {
        self.length("address", "address", value, required, 5, 300)
    }

    pub fn phone(&mut self, value: Option<&str>, required: bool) -> &mut Self {
        self.length("phone", "phone number", value, required, 7, 20)
    }

    pub fn email(&mut self, value: Option<&str>, required: bool) -> &mut Self {
        if let Some(v) = self.present("email", value, required) {
            if !EMAIL.is_match(v.trim()) {
                self.fail("email", "please provide a valid email address");
            }
        }
        self
    }

    pub fn username(&mut self, value: Option<&str>, required: bool) -> &mut Self {
        self.length("username", "username", value, required, 3, 20);
        if let Some(v) = value {
            if !USERNAME.is_match(v) {
                self.fail("username", "username can only contain letters, numbers, underscores, and hyphens");
            }
        }
        self
    }

    pub fn password(&mut self, value: Option<&str>, required: bool) -> &mut Self {
        if let Some(v) = self.present("password", value, required) {
            let len = v.chars().count();
            if !(8..=100).contains(&len) {
                self.fail("password", "password must be between 8 and 100 characters");
            } else if !password_is_strong(v) {
                self.fail(
                    "password",
                    format!(
                        "password must contain at least one uppercase letter, one lowercase letter, one number, and one special character ({})",
                        PASSWORD_SPECIALS
                    ),
                );
            }
        }
        self
    }

    pub fn role(&mut self, value: Option<&str>, required: bool) -> &mut Self {
        if let Some(v) = self.present("role", value, required) {
            if v.parse::<crate::authz::Role>().is_err() {
                self.fail("role", "role must be either superadmin or school_admin");
            }
        }
        self
    }

    pub fn capacity(&mut self, value: Option<i64>, required: bool) -> &mut Self {
        match value {
            Some(c) if capacity_in_range(c).is_none() => self.fail("capacity", CAPACITY_RANGE),
            None if required => self.fail("capacity", "capacity is required"),
            _ => {}
        }
        self
    }

    pub fn resources(&mut self, value: Option<&[String]>) -> &mut Self {
        if let Some(items) = value {
            if items.iter().any(|r| r.trim().is_empty() || r.chars().count() > 100) {
                self.fail("resources", "each resource must be a non-empty string under 100 characters");
            }
        }
        self
    }

    /// Login only checks that a password was sent; strength rules apply at creation.
    pub fn password_present(&mut self, value: Option<&str>) -> &mut Self {
        if value.map_or(true, str::is_empty) {
            self.fail("password", "password is required");
        }
        self
    }

    /// Records a cross-field rule the caller evaluated itself.
    pub fn require_field(&mut self, field: &str, message: &str) -> &mut Self {
        self.fail(field, message);
        self
    }

    pub fn finish(&mut self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(ServiceError::Validation {
            message: "Validation failed".to_string(),
            field_errors: std::mem::take(&mut self.errors),
        })
    }
}

fn password_is_strong(password: &str) -> bool {
    password.chars().all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c))
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// Trims and lower-cases an email for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn capacity_in_range(value: i64) -> Option<i32> {
    i32::try_from(value).ok().filter(|c| *c >= 0)
}

/// Capacity narrowed to its stored width, failing like `Validator::capacity`.
pub fn checked_capacity(value: i64) -> Result<i32, ServiceError> {
    capacity_in_range(value).ok_or_else(|| ServiceError::Validation {
        message: "Validation failed".to_string(),
        field_errors: HashMap::from([("capacity".to_string(), CAPACITY_RANGE.to_string())]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors(result: Result<(), ServiceError>) -> HashMap<String, String> {
        match result {
            Err(ServiceError::Validation { field_errors, .. }) => field_errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_valid_school_fields() {
        let result = Validator::new()
            .name(Some("Springfield Elementary"), true)
            .address(Some("19 Plympton Street"), true)
            .email(Some("office@springfield.edu"), true)
            .phone(None, false)
            .finish();
        assert!(result.is_ok());
    }

    #[test]
    fn reports_every_failing_field() {
        let errors = field_errors(
            Validator::new()
                .name(Some("A"), true)
                .address(None, true)
                .email(Some("not-an-email"), true)
                .phone(Some("123"), false)
                .finish(),
        );
        assert_eq!(errors["name"], "name must be between 2 and 100 characters");
        assert_eq!(errors["address"], "address is required");
        assert_eq!(errors["email"], "please provide a valid email address");
        assert_eq!(errors["phone"], "phone number must be between 7 and 20 characters");
    }

    #[test]
    fn password_rules() {
        for strong in ["Admin@1234", "aB3#aB3#"] {
            assert!(Validator::new().password(Some(strong), true).finish().is_ok(), "{} should pass", strong);
        }
        for weak in ["aB3#", "alllowercase1@", "NoDigits@@", "NoSpecial123", "Bad Space1@"] {
            assert!(Validator::new().password(Some(weak), true).finish().is_err(), "{} should be rejected", weak);
        }
    }

    #[test]
    fn username_and_role_rules() {
        let errors = field_errors(Validator::new().username(Some("bad name!"), true).role(Some("teacher"), true).finish());
        assert!(errors.contains_key("username"));
        assert_eq!(errors["role"], "role must be either superadmin or school_admin");
        assert!(Validator::new().username(Some("school_admin-1"), true).role(Some("school_admin"), true).finish().is_ok());
    }

    #[test]
    fn capacity_and_resources() {
        let errors = field_errors(Validator::new().capacity(Some(-1), true).resources(Some(&["".to_string()])).finish());
        assert!(errors.contains_key("capacity"));
        assert!(errors.contains_key("resources"));
        assert!(field_errors(Validator::new().capacity(None, true).finish()).contains_key("capacity"));
    }

    #[test]
    fn capacity_never_truncates() {
        assert_eq!(checked_capacity(30).unwrap(), 30);
        assert!(field_errors(checked_capacity(i64::from(i32::MAX) + 1).map(|_| ())).contains_key("capacity"));
        assert!(field_errors(checked_capacity(-1).map(|_| ())).contains_key("capacity"));
        assert!(field_errors(Validator::new().capacity(Some(1 << 32), true).finish()).contains_key("capacity"));
    }

    #[test]
    fn normalizes_emails() {
        assert_eq!(normalize_email("  Office@Springfield.EDU "), "office@springfield.edu");
    }
}
