//! Form field validators for registration and login input.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_\x{4e00}-\x{9fa5}]{3,20}$").expect("valid username regex")
});

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const MIN_PASSWORD_LEN: usize = 6;
const STRONG_PASSWORD_LEN: usize = 8;

pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// 3 to 20 letters, digits, underscores or CJK ideographs.
pub fn validate_username(username: &str) -> bool {
    USERNAME.is_match(username)
}

/// Outcome of a password check. `strength` ranges over 0..=5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordReport {
    pub valid: bool,
    pub strength: u8,
    pub messages: Vec<String>,
}

pub fn validate_password(password: &str) -> PasswordReport {
    let mut report = PasswordReport {
        valid: true,
        strength: 0,
        messages: Vec::new(),
    };
    // Length in UTF-16 code units, so astral characters count twice.
    let len = password.encode_utf16().count();
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if len < MIN_PASSWORD_LEN {
        report.valid = false;
        report
            .messages
            .push(format!("password must be at least {MIN_PASSWORD_LEN} characters"));
    } else {
        report.strength += 1;
    }
    if len >= STRONG_PASSWORD_LEN {
        report.strength += 1;
    }
    if has_letter {
        report.strength += 1;
    }
    if has_digit {
        report.strength += 1;
    }
    if password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        report.strength += 1;
    }
    if !has_letter || !has_digit {
        report.valid = false;
        report
            .messages
            .push("password must contain letters and numbers".to_string());
    }

    report
}
