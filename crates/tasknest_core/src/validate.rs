//! Form-level input validation utilities.
//!
//! # Responsibility
//! - Score password strength against five independent rules.
//! - Check email shape and form field length limits.
//!
//! # Invariants
//! - These helpers never error; they return report objects with feedback
//!   lists that callers render inline and use to block submission.
//! - Password score equals the count of satisfied rules; validity requires
//!   all five.

use once_cell::sync::Lazy;
use regex::Regex;

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_RULE_COUNT: u8 = 5;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Outcome of a single form-field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Human-readable reasons for each failed rule; empty when valid.
    pub feedback: Vec<String>,
}

impl ValidationReport {
    fn valid() -> Self {
        Self {
            is_valid: true,
            feedback: Vec::new(),
        }
    }

    fn invalid(feedback: Vec<String>) -> Self {
        Self {
            is_valid: false,
            feedback,
        }
    }
}

/// Coarse password strength rating derived from the rule score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLabel {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLabel {
    fn from_score(score: u8) -> Self {
        match score {
            0 | 1 => Self::VeryWeak,
            2 => Self::Weak,
            3 => Self::Fair,
            4 => Self::Good,
            _ => Self::Strong,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryWeak => "Very Weak",
            Self::Weak => "Weak",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Strong => "Strong",
        }
    }
}

impl std::fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Password strength report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    /// Count of satisfied rules, 0..=5.
    pub score: u8,
    /// True iff all five rules are satisfied.
    pub is_valid: bool,
    pub label: StrengthLabel,
    /// One entry per failed rule.
    pub feedback: Vec<String>,
}

/// Scores a password against five independent boolean rules: length >= 8,
/// uppercase, lowercase, digit, special character. One point each.
pub fn password_strength(password: &str) -> PasswordStrength {
    let rules: [(bool, &str); 5] = [
        (
            password.chars().count() >= PASSWORD_MIN_CHARS,
            "use at least 8 characters",
        ),
        (
            password.chars().any(|c| c.is_uppercase()),
            "add an uppercase letter",
        ),
        (
            password.chars().any(|c| c.is_lowercase()),
            "add a lowercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_digit()),
            "add a digit",
        ),
        (
            password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
            "add a special character",
        ),
    ];

    let score = rules.iter().filter(|(passed, _)| *passed).count() as u8;
    let feedback = rules
        .iter()
        .filter(|(passed, _)| !passed)
        .map(|(_, hint)| (*hint).to_string())
        .collect();

    PasswordStrength {
        score,
        is_valid: score == PASSWORD_RULE_COUNT,
        label: StrengthLabel::from_score(score),
        feedback,
    }
}

/// Checks email shape (`local@domain.tld`, no whitespace).
pub fn validate_email(email: &str) -> ValidationReport {
    if EMAIL_RE.is_match(email.trim()) {
        ValidationReport::valid()
    } else {
        ValidationReport::invalid(vec![format!("`{}` is not a valid email address", email.trim())])
    }
}

/// Checks a form field against its character limit.
pub fn validate_length(field: &str, value: &str, max_chars: usize) -> ValidationReport {
    let actual = value.chars().count();
    if actual <= max_chars {
        ValidationReport::valid()
    } else {
        ValidationReport::invalid(vec![format!(
            "{field} must be at most {max_chars} characters (got {actual})"
        )])
    }
}
