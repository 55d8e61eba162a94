//! Field checks for a contact draft before it is sent anywhere.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::api::models::{ContactDraft, Field};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\+?[0-9]{1,4}[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}$")
        .expect("phone pattern is valid")
});

const NAME_MIN_CHARS: usize = 3;

const NAME_REQUIRED: &str = "Name is required.";
const NAME_TOO_SHORT: &str = "Name must be at least 3 characters long.";
const EMAIL_REQUIRED: &str = "Email is required.";
const EMAIL_INVALID: &str = "Please enter a valid email address.";
const PHONE_INVALID: &str = "Please enter a valid phone number (e.g., 123-456-7890).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Required,
    TooShort,
    InvalidFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub message: &'static str,
}

impl FieldError {
    const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }
}

/// Errors keyed by field. Only failing fields have an entry.
pub type FieldErrors = BTreeMap<Field, FieldError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    errors: FieldErrors,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

pub fn validate(draft: &ContactDraft) -> Validation {
    let mut errors = FieldErrors::new();

    let name = draft.name.trim();
    if name.is_empty() {
        errors.insert(Field::Name, FieldError::new(ErrorKind::Required, NAME_REQUIRED));
    } else if name.chars().count() < NAME_MIN_CHARS {
        errors.insert(Field::Name, FieldError::new(ErrorKind::TooShort, NAME_TOO_SHORT));
    }

    let email = draft.email.trim();
    if email.is_empty() {
        errors.insert(Field::Email, FieldError::new(ErrorKind::Required, EMAIL_REQUIRED));
    } else if !EMAIL.is_match(email) {
        errors.insert(Field::Email, FieldError::new(ErrorKind::InvalidFormat, EMAIL_INVALID));
    }

    // Phone is optional; blank never fails.
    let phone = draft.phone.trim();
    if !phone.is_empty() && !PHONE.is_match(phone) {
        errors.insert(Field::Phone, FieldError::new(ErrorKind::InvalidFormat, PHONE_INVALID));
    }

    Validation { errors }
}
