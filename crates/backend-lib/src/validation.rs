// ============================
// crates/backend-lib/src/validation.rs
// ============================
//! Field validation for registration and event payloads.
//!
//! Validators run as an ordered rule pipeline: per-field checks first
//! (first failure wins within a field), then the cross-field pass. All
//! violated rules are aggregated into [`ValidationErrors`] rather than
//! short-circuiting, so a response surfaces every applicable error.
//! Every time-dependent rule takes the evaluation instant explicitly.

use chrono::{DateTime, NaiveDateTime, Utc};
use eventhub_common::{EventPayload, RegisterRequest};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

pub const ERROR_EMAIL_INVALID: &str = "Enter a valid email address.";
pub const ERROR_EMAIL_EXISTS: &str = "User with that email already exists";
pub const ERROR_USERNAME_EXISTS: &str = "A user with that username already exists.";
pub const ERROR_PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const ERROR_PASSWORD_REQUIREMENTS: &str =
    "Password must contain at least one uppercase letter and one digit.";
pub const ERROR_CAPACITY_REQUIREMENTS: &str = "Capacity must be a positive integer.";
pub const ERROR_START_DATE_REQUIREMENTS: &str = "Start date cannot be in the past.";
pub const ERROR_END_DATE_REQUIREMENTS: &str = "End date cannot be before the start date.";

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Stable machine-readable codes for field errors
pub mod codes {
    pub const REQUIRED: &str = "REQUIRED";
    pub const EMAIL_INVALID: &str = "EMAIL_INVALID";
    pub const EMAIL_EXISTS: &str = "EMAIL_EXISTS";
    pub const USERNAME_EXISTS: &str = "USERNAME_EXISTS";
    pub const PASSWORD_TOO_SHORT: &str = "PASSWORD_TOO_SHORT";
    pub const PASSWORD_REQUIREMENTS: &str = "PASSWORD_REQUIREMENTS";
    pub const PASSWORD_MISMATCH: &str = "PASSWORD_MISMATCH";
    pub const DATE_INVALID: &str = "DATE_INVALID";
    pub const START_DATE_IN_PAST: &str = "START_DATE_IN_PAST";
    pub const END_DATE_BEFORE_START: &str = "END_DATE_BEFORE_START";
    pub const CAPACITY_NOT_POSITIVE: &str = "CAPACITY_NOT_POSITIVE";
}

/// A single violated rule, scoped to the field that tripped it
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

/// Aggregated set of violated rules for one payload
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn all(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any error for `field` carries `code`
    pub fn has(&self, field: &str, code: &str) -> bool {
        self.0.iter().any(|e| e.field == field && e.code == code)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.code))
            .collect();
        write!(f, "{}", summary.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validated, normalized event fields ready to apply to a record
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub capacity: Option<u32>,
}

/// Validate a registration payload.
///
/// `email_taken` and `username_taken` are uniqueness facts looked up by
/// the caller; the store re-checks both under its write lock when the
/// user is created.
pub fn validate_registration(
    req: &RegisterRequest,
    email_taken: bool,
    username_taken: bool,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    // email: syntactic check, then uniqueness
    if req.email.is_empty()
        || req.email.len() > MAX_EMAIL_LENGTH
        || !EMAIL_REGEX.is_match(&req.email)
    {
        errors.push(FieldError::new(
            "email",
            codes::EMAIL_INVALID,
            ERROR_EMAIL_INVALID,
        ));
    } else if email_taken {
        errors.push(FieldError::new(
            "email",
            codes::EMAIL_EXISTS,
            ERROR_EMAIL_EXISTS,
        ));
    }

    // username
    if req.username.trim().is_empty() {
        errors.push(FieldError::new(
            "username",
            codes::REQUIRED,
            "This field may not be blank.",
        ));
    } else if username_taken {
        errors.push(FieldError::new(
            "username",
            codes::USERNAME_EXISTS,
            ERROR_USERNAME_EXISTS,
        ));
    }

    // password: length is structural and checked before the pattern
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            codes::PASSWORD_TOO_SHORT,
            format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
        ));
    } else if !password_meets_requirements(&req.password) {
        errors.push(FieldError::new(
            "password",
            codes::PASSWORD_REQUIREMENTS,
            ERROR_PASSWORD_REQUIREMENTS,
        ));
    }

    // cross-field pass runs after every field-level check
    if req.password != req.password2 {
        errors.push(FieldError::new(
            "password",
            codes::PASSWORD_MISMATCH,
            ERROR_PASSWORD_MISMATCH,
        ));
    }

    errors.into_result()
}

/// Password complexity: at least one uppercase ASCII letter and one digit
pub fn password_meets_requirements(password: &str) -> bool {
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    has_uppercase && has_digit
}

/// Validate an event payload against the rules detectable from its
/// fields, normalizing dates to UTC instants.
///
/// `require_all` demands the full field set (create and PUT); partial
/// updates validate only the fields present. The per-field end-date rule
/// compares against the raw `start_date` of the same payload; the
/// whole-object pass then re-asserts ordering on the resolved pair,
/// skipped when the per-field check already flagged the end date.
pub fn validate_event(
    payload: &EventPayload,
    now: DateTime<Utc>,
    require_all: bool,
) -> Result<EventDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut draft = EventDraft::default();

    match payload.name.as_deref() {
        Some(name) if !name.trim().is_empty() => draft.name = Some(name.to_string()),
        Some(_) => errors.push(FieldError::new(
            "name",
            codes::REQUIRED,
            "This field may not be blank.",
        )),
        None if require_all => errors.push(FieldError::new(
            "name",
            codes::REQUIRED,
            "This field is required.",
        )),
        None => {},
    }

    match payload.description.as_deref() {
        Some(description) => draft.description = Some(description.to_string()),
        None if require_all => errors.push(FieldError::new(
            "description",
            codes::REQUIRED,
            "This field is required.",
        )),
        None => {},
    }

    // start_date: normalize, then reject instants already in the past
    match payload.start_date.as_deref() {
        Some(raw) => match parse_datetime(raw) {
            Some(start) => {
                if start < now {
                    errors.push(FieldError::new(
                        "start_date",
                        codes::START_DATE_IN_PAST,
                        ERROR_START_DATE_REQUIREMENTS,
                    ));
                } else {
                    draft.start_date = Some(start);
                }
            },
            None => errors.push(FieldError::new(
                "start_date",
                codes::DATE_INVALID,
                "Datetime has wrong format.",
            )),
        },
        None if require_all => errors.push(FieldError::new(
            "start_date",
            codes::REQUIRED,
            "This field is required.",
        )),
        None => {},
    }

    // end_date: the per-field rule only sees the raw, unparsed sibling
    let mut end_date_failed = false;
    match payload.end_date.as_deref() {
        Some(raw) => match parse_datetime(raw) {
            Some(end) => {
                let raw_start = payload.start_date.as_deref().and_then(parse_datetime);
                if let Some(start) = raw_start {
                    if end < start {
                        errors.push(FieldError::new(
                            "end_date",
                            codes::END_DATE_BEFORE_START,
                            ERROR_END_DATE_REQUIREMENTS,
                        ));
                        end_date_failed = true;
                    }
                }
                if !end_date_failed {
                    draft.end_date = Some(end);
                }
            },
            None => {
                errors.push(FieldError::new(
                    "end_date",
                    codes::DATE_INVALID,
                    "Datetime has wrong format.",
                ));
                end_date_failed = true;
            },
        },
        None if require_all => errors.push(FieldError::new(
            "end_date",
            codes::REQUIRED,
            "This field is required.",
        )),
        None => {},
    }

    // whole-object pass
    if let Some(capacity) = payload.capacity {
        match u32::try_from(capacity) {
            Ok(capacity) => draft.capacity = Some(capacity),
            Err(_) => errors.push(FieldError::new(
                "capacity",
                codes::CAPACITY_NOT_POSITIVE,
                ERROR_CAPACITY_REQUIREMENTS,
            )),
        }
    }

    // redundant ordering cross-check over the resolved pair; the
    // per-field rule could only consult the raw unparsed start
    if let (Some(start), Some(end), false) = (draft.start_date, draft.end_date, end_date_failed) {
        if end < start {
            errors.push(FieldError::new(
                "end_date",
                codes::END_DATE_BEFORE_START,
                ERROR_END_DATE_REQUIREMENTS,
            ));
        }
    }

    errors.into_result().map(|()| draft)
}

/// Parse an RFC 3339 datetime, honoring an explicit offset; a naive
/// datetime is interpreted as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}
