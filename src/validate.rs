//! Input validation for forms submitted from the command line.
//!
//! Every check runs so the user sees all problems at once.

use crate::error::{Error, Result};
use crate::models::{ChangePasswordInput, LoginInput, RegisterInput, UpdateUserInput};
use regex::Regex;
use std::fmt;
use url::Url;

const MIN_PASSWORD_CHARS: usize = 8;
const MIN_NAME_CHARS: usize = 2;

const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All failed checks of one form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// First message recorded for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.to_string()))
        }
    }

    fn require_min(&mut self, field: &'static str, value: &str, min: usize, label: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{} is required", label));
        } else if value.chars().count() < min {
            self.add(field, format!("{} must be at least {} characters", label, min));
        }
    }

    fn require_email(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "Email is required");
        } else if !is_valid_email(value) {
            self.add(field, "Please enter a valid email address");
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("  {}: {}", e.field, e.message))
            .collect();
        f.write_str(&lines.join("\n"))
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.starts_with('.') || value.contains("..") {
        return false;
    }
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

/// Absolute http or https URL
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Sign-up form as entered by the user
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub workspace_name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        errors.require_min("name", &self.name, MIN_NAME_CHARS, "Name");
        errors.require_email("email", &self.email);
        errors.require_min("password", &self.password, MIN_PASSWORD_CHARS, "Password");
        errors.require_min(
            "workspaceName",
            &self.workspace_name,
            MIN_NAME_CHARS,
            "Workspace name",
        );
        errors.into_result()
    }

    /// Validated request body; the name splits into first name and the rest
    pub fn into_input(self) -> Result<RegisterInput> {
        self.validate()?;
        let name = self.name.trim();
        let (first, last) = match name.split_once(char::is_whitespace) {
            Some((first, rest)) => (first.to_string(), Some(rest.trim().to_string())),
            None => (name.to_string(), None),
        };
        Ok(RegisterInput {
            email: self.email.trim().to_string(),
            password: self.password,
            first_name: Some(first),
            last_name: last.filter(|l| !l.is_empty()),
            workspace_name: Some(self.workspace_name.trim().to_string()),
            role: None,
        })
    }
}

pub fn validate_login(input: &LoginInput) -> Result<()> {
    let mut errors = ValidationErrors::new();
    errors.require_email("email", &input.email);
    if input.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

pub fn validate_change_password(input: &ChangePasswordInput) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if input.current_password.is_empty() {
        errors.add("currentPassword", "Current password is required");
    }
    errors.require_min(
        "newPassword",
        &input.new_password,
        MIN_PASSWORD_CHARS,
        "Password",
    );
    errors.into_result()
}

pub fn validate_profile(input: &UpdateUserInput) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if let Some(avatar) = input.avatar.as_deref().filter(|a| !a.trim().is_empty()) {
        if !is_http_url(avatar) {
            errors.add("avatar", "Invalid URL");
        }
    }
    errors.into_result()
}

pub fn validate_workspace_name(name: &str) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if name.trim().is_empty() {
        errors.add("name", "Workspace name is required");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            name: "Grace Brewster Hopper".to_string(),
            email: "grace@navy.mil".to_string(),
            password: "cobol1959".to_string(),
            workspace_name: "Navy".to_string(),
        }
    }

    #[test]
    fn test_email_addresses() {
        assert!(is_valid_email("a.b+tag@example.co.uk"));
        assert!(is_valid_email("  user@host.io "));
        assert!(!is_valid_email("user@host"));
        assert!(!is_valid_email("user.@host.io"));
        assert!(!is_valid_email(".user@host.io"));
        assert!(!is_valid_email("a..b@host.io"));
        assert!(!is_valid_email("no-at-sign.io"));
    }

    #[test]
    fn test_register_reports_every_field() {
        let err = RegisterForm {
            name: "G".to_string(),
            email: "".to_string(),
            password: "short".to_string(),
            workspace_name: " ".to_string(),
        }
        .validate()
        .unwrap_err();

        let Error::Validation(message) = err else {
            panic!("expected a validation error");
        };
        assert!(message.contains("name: Name must be at least 2 characters"));
        assert!(message.contains("email: Email is required"));
        assert!(message.contains("password: Password must be at least 8 characters"));
        assert!(message.contains("workspaceName: Workspace name is required"));
    }

    #[test]
    fn test_register_input_splits_name() {
        let input = form().into_input().unwrap();
        assert_eq!(input.first_name.as_deref(), Some("Grace"));
        assert_eq!(input.last_name.as_deref(), Some("Brewster Hopper"));
        assert_eq!(input.workspace_name.as_deref(), Some("Navy"));

        let single = RegisterForm {
            name: "Grace".to_string(),
            ..form()
        }
        .into_input()
        .unwrap();
        assert_eq!(single.last_name, None);
    }

    #[test]
    fn test_login_and_password_change() {
        assert!(validate_login(&LoginInput {
            email: "a@b.io".to_string(),
            password: "x".to_string(),
        })
        .is_ok());
        assert!(validate_login(&LoginInput {
            email: "a@b.io".to_string(),
            password: String::new(),
        })
        .is_err());

        assert!(validate_change_password(&ChangePasswordInput {
            current_password: "old".to_string(),
            new_password: "1234567".to_string(),
        })
        .is_err());
        assert!(validate_change_password(&ChangePasswordInput {
            current_password: "old".to_string(),
            new_password: "12345678".to_string(),
        })
        .is_ok());
    }

    #[test]
    fn test_profile_avatar() {
        let mut input = UpdateUserInput::default();
        assert!(validate_profile(&input).is_ok());
        input.avatar = Some(String::new());
        assert!(validate_profile(&input).is_ok());
        input.avatar = Some("ftp://host/a.png".to_string());
        assert!(validate_profile(&input).is_err());
        input.avatar = Some("https://cdn.example.com/a.png".to_string());
        assert!(validate_profile(&input).is_ok());
    }

    #[test]
    fn test_collected_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "Workspace name is required");
        errors.add("name", "second");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name"), Some("Workspace name is required"));
        assert!(validate_workspace_name("Docs").is_ok());
        assert!(validate_workspace_name("").is_err());
    }
}
