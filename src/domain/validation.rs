//! Field-level validation rules shared by every buyer form.
//!
//! Each validator returns `None` when the value passes and a stable,
//! user-facing message otherwise. The form-level functions run every
//! applicable validator and collect all failures keyed by field name.

use crate::domain::forms::{
    ForgotPasswordPayload, LoginPayload, RegistrationPayload, SignupPayload, UploadedFile,
};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("name pattern is valid"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^01[0-9]{9}$").expect("phone pattern is valid"));
static LOWERCASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]").expect("lowercase pattern is valid"));

/// Password strength rules. Registration and sign-up deliberately differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPolicy {
    /// 8 to 20 characters with at least one lowercase letter.
    Registration,
    /// At least 6 characters.
    Signup,
    /// Presence only.
    Login,
}

/// Field name to error message. Empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, field: &str, outcome: Option<String>) {
        if let Some(message) = outcome {
            self.0.insert(field.to_string(), message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn validate_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return Some("Name is required.".to_string());
    }
    if !NAME_RE.is_match(name) {
        return Some("Name must contain only letters and spaces.".to_string());
    }
    None
}

pub fn validate_email(email: &str) -> Option<String> {
    let email = email.trim();
    if email.is_empty() {
        return Some("Email is required.".to_string());
    }
    if !EMAIL_RE.is_match(email) {
        return Some("Please enter a valid email address.".to_string());
    }
    None
}

pub fn validate_password(password: &str, policy: PasswordPolicy) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required.".to_string());
    }
    let length = password.chars().count();
    match policy {
        PasswordPolicy::Registration => {
            if length < 8 {
                return Some("Password must be at least 8 characters long.".to_string());
            }
            if length > 20 {
                return Some("Password must be no more than 20 characters long.".to_string());
            }
            if !LOWERCASE_RE.is_match(password) {
                return Some("Password must include at least one lowercase letter.".to_string());
            }
            None
        }
        PasswordPolicy::Signup => {
            if length < 6 {
                return Some("Password must be at least 6 characters long.".to_string());
            }
            None
        }
        PasswordPolicy::Login => None,
    }
}

pub fn validate_confirm_password(password: &str, confirm_password: &str) -> Option<String> {
    if confirm_password.is_empty() {
        return Some("Please confirm your password.".to_string());
    }
    if password != confirm_password {
        return Some("Passwords do not match.".to_string());
    }
    None
}

pub fn validate_phone(phone: &str) -> Option<String> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Some("Phone number is required.".to_string());
    }
    if !PHONE_RE.is_match(phone) {
        return Some("Phone number must start with 01 and be exactly 11 digits.".to_string());
    }
    None
}

pub fn validate_file(file: Option<&UploadedFile>) -> Option<String> {
    let Some(file) = file else {
        return Some("Please upload a PDF file.".to_string());
    };

    let is_pdf_mime = file.content_type.as_deref() == Some("application/pdf");
    let is_pdf_ext = file.file_name.to_ascii_lowercase().ends_with(".pdf");
    if !(is_pdf_mime || is_pdf_ext) {
        return Some("Only PDF files are allowed.".to_string());
    }

    if file.size() > MAX_UPLOAD_BYTES {
        return Some("File size must be less than 5MB.".to_string());
    }
    None
}

pub fn validate_registration_form(form: &RegistrationPayload) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check("name", validate_name(&form.name));
    errors.check("email", validate_email(&form.email));
    errors.check(
        "password",
        validate_password(&form.password, PasswordPolicy::Registration),
    );
    errors.check(
        "confirmPassword",
        validate_confirm_password(&form.password, &form.confirm_password),
    );
    errors.check("phone", validate_phone(&form.phone));
    errors.check("file", validate_file(form.file.as_ref()));
    errors
}

pub fn validate_signup_form(form: &SignupPayload) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check("name", validate_name(&form.name));
    errors.check("email", validate_email(&form.email));
    errors.check(
        "password",
        validate_password(&form.password, PasswordPolicy::Signup),
    );
    errors.check(
        "confirmPassword",
        validate_confirm_password(&form.password, &form.confirm_password),
    );
    errors
}

pub fn validate_login_form(form: &LoginPayload) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check("email", validate_email(&form.email));
    errors.check(
        "password",
        validate_password(&form.password, PasswordPolicy::Login),
    );
    errors
}

pub fn validate_forgot_password_form(form: &ForgotPasswordPayload) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check("email", validate_email(&form.email));
    errors
}

pub fn is_valid_registration_form(form: &RegistrationPayload) -> bool {
    validate_registration_form(form).is_empty()
}

pub fn is_valid_signup_form(form: &SignupPayload) -> bool {
    validate_signup_form(form).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn pdf(size: usize) -> UploadedFile {
        UploadedFile {
            file_name: "cv.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from(vec![0u8; size]),
        }
    }

    fn valid_registration() -> RegistrationPayload {
        RegistrationPayload {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "secretpass".to_string(),
            confirm_password: "secretpass".to_string(),
            phone: "01712345678".to_string(),
            file: Some(pdf(1024)),
        }
    }

    #[test]
    fn test_validate_name_requires_value() {
        assert_eq!(validate_name("   ").as_deref(), Some("Name is required."));
    }

    #[test]
    fn test_validate_name_rejects_digits() {
        assert_eq!(
            validate_name("Jane 2").as_deref(),
            Some("Name must contain only letters and spaces.")
        );
        assert!(validate_name("Jane Doe").is_none());
    }

    #[test]
    fn test_validate_email_accepts_simple_address() {
        assert!(validate_email("a@b.c").is_none());
        assert!(validate_email("  jane@example.com  ").is_none());
    }

    #[test]
    fn test_validate_email_rejects_malformed_addresses() {
        for email in ["plain", "@example.com", "jane@example", "ja ne@example.com", "a@b.c d"] {
            assert_eq!(
                validate_email(email).as_deref(),
                Some("Please enter a valid email address."),
                "{email} should be rejected"
            );
        }
        assert_eq!(validate_email("").as_deref(), Some("Email is required."));
    }

    #[test]
    fn test_registration_password_policy() {
        assert!(validate_password("abcdefgh", PasswordPolicy::Registration).is_none());
        assert_eq!(
            validate_password("ABCDEFGH", PasswordPolicy::Registration).as_deref(),
            Some("Password must include at least one lowercase letter.")
        );
        assert_eq!(
            validate_password("short1", PasswordPolicy::Registration).as_deref(),
            Some("Password must be at least 8 characters long.")
        );
        assert_eq!(
            validate_password(&"a".repeat(21), PasswordPolicy::Registration).as_deref(),
            Some("Password must be no more than 20 characters long.")
        );
        assert!(validate_password(&"a".repeat(20), PasswordPolicy::Registration).is_none());
    }

    #[test]
    fn test_password_length_counts_characters_not_utf16_units() {
        let emoji = |n: usize| format!("a{}", "\u{1F600}".repeat(n));
        // 8 characters but 15 UTF-16 units
        assert_eq!(validate_password(&emoji(7), PasswordPolicy::Registration), None);
        // 20 characters but 39 UTF-16 units
        assert_eq!(validate_password(&emoji(19), PasswordPolicy::Registration), None);
        assert_eq!(
            validate_password(&emoji(20), PasswordPolicy::Registration).as_deref(),
            Some("Password must be no more than 20 characters long.")
        );
        assert_eq!(
            validate_password(&emoji(6), PasswordPolicy::Registration).as_deref(),
            Some("Password must be at least 8 characters long.")
        );
        assert_eq!(validate_password(&emoji(5), PasswordPolicy::Signup), None);
    }

    #[test]
    fn test_signup_password_policy() {
        assert!(validate_password("ABCDEF", PasswordPolicy::Signup).is_none());
        assert_eq!(
            validate_password("abc", PasswordPolicy::Signup).as_deref(),
            Some("Password must be at least 6 characters long.")
        );
        assert_eq!(
            validate_password("", PasswordPolicy::Signup).as_deref(),
            Some("Password is required.")
        );
    }

    #[test]
    fn test_login_password_policy_only_requires_presence() {
        assert!(validate_password("x", PasswordPolicy::Login).is_none());
        assert!(validate_password("", PasswordPolicy::Login).is_some());
    }

    #[test]
    fn test_validate_confirm_password() {
        assert!(validate_confirm_password("p1", "p1").is_none());
        assert_eq!(
            validate_confirm_password("p1", "p2").as_deref(),
            Some("Passwords do not match.")
        );
        assert_eq!(
            validate_confirm_password("p1", "").as_deref(),
            Some("Please confirm your password.")
        );
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("01712345678").is_none());
        assert!(validate_phone(" 01712345678 ").is_none());
        assert!(validate_phone("0171234567").is_some());
        assert!(validate_phone("017123456789").is_some());
        assert!(validate_phone("02712345678").is_some());
        assert_eq!(
            validate_phone("").as_deref(),
            Some("Phone number is required.")
        );
    }

    #[test]
    fn test_validate_file_accepts_small_pdf() {
        assert!(validate_file(Some(&pdf(1024))).is_none());
        assert!(validate_file(Some(&pdf(MAX_UPLOAD_BYTES))).is_none());
    }

    #[test]
    fn test_validate_file_accepts_pdf_extension_without_mime() {
        let file = UploadedFile {
            file_name: "Resume.PDF".to_string(),
            content_type: Some("application/octet-stream".to_string()),
            bytes: Bytes::from_static(b"%PDF"),
        };
        assert!(validate_file(Some(&file)).is_none());
    }

    #[test]
    fn test_validate_file_rejects_text_file() {
        let file = UploadedFile {
            file_name: "doc.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            bytes: Bytes::from_static(b"hello"),
        };
        assert_eq!(
            validate_file(Some(&file)).as_deref(),
            Some("Only PDF files are allowed.")
        );
    }

    #[test]
    fn test_validate_file_rejects_oversized_pdf() {
        assert_eq!(
            validate_file(Some(&pdf(6 * 1024 * 1024))).as_deref(),
            Some("File size must be less than 5MB.")
        );
    }

    #[test]
    fn test_validate_file_requires_upload() {
        assert_eq!(
            validate_file(None).as_deref(),
            Some("Please upload a PDF file.")
        );
    }

    #[test]
    fn test_registration_form_reports_only_failing_field() {
        let mut form = valid_registration();
        form.email = "not-an-email".to_string();

        let errors = validate_registration_form(&form);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email"]);
        assert!(!is_valid_registration_form(&form));
    }

    #[test]
    fn test_registration_form_collects_every_failure() {
        let errors = validate_registration_form(&RegistrationPayload::default());
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["confirmPassword", "email", "file", "name", "password", "phone"]
        );
    }

    #[test]
    fn test_valid_registration_form_has_no_errors() {
        assert!(is_valid_registration_form(&valid_registration()));
    }

    #[test]
    fn test_signup_form_uses_short_password_policy() {
        let form = SignupPayload {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "SECRET".to_string(),
            confirm_password: "SECRET".to_string(),
        };
        assert!(is_valid_signup_form(&form));
    }

    #[test]
    fn test_login_and_forgot_password_forms() {
        let login = LoginPayload {
            email: "bad".to_string(),
            password: String::new(),
        };
        let errors = validate_login_form(&login);
        assert!(errors.get("email").is_some());
        assert_eq!(errors.get("password"), Some("Password is required."));

        let forgot = ForgotPasswordPayload {
            email: "jane@example.com".to_string(),
        };
        assert!(validate_forgot_password_form(&forgot).is_empty());
    }
}
