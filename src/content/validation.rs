use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]{9,20}$").expect("valid phone regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Collected per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Checks the trimmed character count of `value`: at least `min`, and at
    /// most `max.0` when a maximum is given.
    pub fn check_len(
        &mut self,
        field: &'static str,
        value: &str,
        min: usize,
        too_short: &str,
        max: Option<(usize, &str)>,
    ) {
        let len = value.trim().chars().count();
        if len < min {
            self.push(field, too_short);
        } else if let Some((max, too_long)) = max {
            if len > max {
                self.push(field, too_long);
            }
        }
    }

    pub fn messages(self) -> Vec<String> {
        self.0.into_iter().map(|e| e.message).collect()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

pub fn is_valid_url(url: &str) -> bool {
    URL_RE.is_match(url)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Trimmed value, or `None` for a blank field.
pub fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Optional `http(s)` URL field.
pub fn optional_url(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    message: &str,
) -> Option<String> {
    let url = optional(value)?;
    if !is_valid_url(&url) {
        errors.push(field, message);
    }
    Some(url)
}

/// Display order from a form field; blank means 0.
pub fn parse_order(errors: &mut FieldErrors, field: &'static str, value: &str) -> i32 {
    let value = value.trim();
    if value.is_empty() {
        return 0;
    }
    value.parse().unwrap_or_else(|_| {
        errors.push(field, "Neplatné pořadí");
        0
    })
}

/// Comma-separated list, trimmed, blanks dropped.
pub fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn is_checked(value: &Option<String>) -> bool {
    value.as_deref() == Some("on")
}
