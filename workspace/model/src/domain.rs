//! Validating constructors for everything that enters the ledger.
//!
//! All normalization happens here: textual fields are trimmed before length
//! checks, emails are lowercased before the syntax check, whitespace-only
//! notes collapse to absent, and monetary values are rounded half-even to
//! two fractional digits. A construction call either yields a value that
//! satisfies every invariant or reports the full list of violations.

use chrono::{Months, NaiveDate, Utc};
use common::converters::round_money;
use rust_decimal::Decimal;
use thiserror::Error;
use validator::ValidateEmail;

use crate::entities::transaction::{PaymentMethod, TransactionKind};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_SUBJECT_LEN: usize = 255;
pub const MAX_GROUP_NAME_LEN: usize = 255;

/// Earliest date a ledger row may carry.
pub fn min_transaction_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("constant date")
}

/// A single violated field invariant.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must be non-empty and at most {MAX_NAME_LEN} characters")]
    InvalidName,
    #[error("email is malformed or too long")]
    InvalidEmail,
    #[error("password hash must be non-empty")]
    InvalidPasswordHash,
    #[error("subject must be non-empty and at most {MAX_SUBJECT_LEN} characters")]
    InvalidSubject,
    #[error("amount must be positive and fit numeric(12,2)")]
    InvalidAmount,
    #[error("date must fall between 1900-01-01 and one year from today")]
    InvalidDate,
    #[error("date range start must not exceed its end")]
    InvalidDateRange,
    #[error("unknown transaction kind")]
    InvalidKind,
    #[error("unknown payment method")]
    InvalidPaymentMethod,
    #[error("category id must be positive")]
    InvalidCategoryId,
    #[error("owner id must be positive")]
    InvalidOwnerId,
    #[error("page size is out of range")]
    InvalidPageSize,
}

/// A validated, normalized request to append a row to an owner's ledger.
///
/// `signed_amount` and `cumulative_delta` are not part of the draft; the
/// former is derived from `(kind, amount)` and the latter is owned by the
/// store.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub owner_id: i32,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub subject: String,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub category_id: Option<i32>,
    pub group_id: Option<i32>,
}

impl TransactionDraft {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: i32,
        kind: TransactionKind,
        amount: Decimal,
        date: NaiveDate,
        subject: &str,
        notes: Option<&str>,
        payment_method: PaymentMethod,
        category_id: Option<i32>,
        group_id: Option<i32>,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        if owner_id <= 0 {
            errors.push(ValidationError::InvalidOwnerId);
        }
        let fields = check_transaction_fields(amount, date, subject, notes, category_id, &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }
        let (amount, subject, notes) = fields;
        Ok(Self {
            owner_id,
            kind,
            amount,
            date,
            subject,
            notes,
            payment_method,
            category_id,
            group_id,
        })
    }
}

/// A validated replacement for the mutable fields of an existing row.
/// The row's `owner_id` and `created_at` are preserved by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEdit {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub subject: String,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub category_id: Option<i32>,
    pub group_id: Option<i32>,
}

impl TransactionEdit {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: TransactionKind,
        amount: Decimal,
        date: NaiveDate,
        subject: &str,
        notes: Option<&str>,
        payment_method: PaymentMethod,
        category_id: Option<i32>,
        group_id: Option<i32>,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let fields = check_transaction_fields(amount, date, subject, notes, category_id, &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }
        let (amount, subject, notes) = fields;
        Ok(Self {
            kind,
            amount,
            date,
            subject,
            notes,
            payment_method,
            category_id,
            group_id,
        })
    }
}

/// A validated request to register an owner.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerDraft {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub initial_balance: Decimal,
}

impl OwnerDraft {
    pub fn new(
        name: &str,
        email: &str,
        password_hash: &str,
        initial_balance: Decimal,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let name = match check_name(name, MAX_NAME_LEN) {
            Ok(name) => name,
            Err(err) => {
                errors.push(err);
                String::new()
            }
        };
        let email = match check_email(email) {
            Ok(email) => email,
            Err(err) => {
                errors.push(err);
                String::new()
            }
        };
        if password_hash.is_empty() {
            errors.push(ValidationError::InvalidPasswordHash);
        }
        let initial_balance = match check_balance(initial_balance) {
            Ok(value) => value,
            Err(err) => {
                errors.push(err);
                Decimal::ZERO
            }
        };
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            name,
            email,
            password_hash: password_hash.to_string(),
            initial_balance,
        })
    }
}

/// A validated profile update (name and email) for an existing owner.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerProfile {
    pub name: String,
    pub email: String,
}

impl OwnerProfile {
    pub fn new(name: &str, email: &str) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let name = match check_name(name, MAX_NAME_LEN) {
            Ok(name) => name,
            Err(err) => {
                errors.push(err);
                String::new()
            }
        };
        let email = match check_email(email) {
            Ok(email) => email,
            Err(err) => {
                errors.push(err);
                String::new()
            }
        };
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self { name, email })
    }
}

/// A validated request to create a category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl CategoryDraft {
    pub fn new(
        name: &str,
        description: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Self, Vec<ValidationError>> {
        let name = check_name(name, MAX_NAME_LEN).map_err(|err| vec![err])?;
        Ok(Self {
            name,
            description: normalize_optional_text(description),
            icon: normalize_optional_text(icon),
        })
    }
}

/// A validated request to create a transaction group for an owner.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDraft {
    pub owner_id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl GroupDraft {
    pub fn new(
        owner_id: i32,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        if owner_id <= 0 {
            errors.push(ValidationError::InvalidOwnerId);
        }
        let name = match check_name(name, MAX_GROUP_NAME_LEN) {
            Ok(name) => name,
            Err(err) => {
                errors.push(err);
                String::new()
            }
        };
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            owner_id,
            name,
            description: normalize_optional_text(description),
        })
    }
}

fn check_transaction_fields(
    amount: Decimal,
    date: NaiveDate,
    subject: &str,
    notes: Option<&str>,
    category_id: Option<i32>,
    errors: &mut Vec<ValidationError>,
) -> (Decimal, String, Option<String>) {
    let amount = match check_amount(amount) {
        Ok(amount) => amount,
        Err(err) => {
            errors.push(err);
            Decimal::ZERO
        }
    };
    if let Err(err) = check_date(date) {
        errors.push(err);
    }
    let subject = match check_subject(subject) {
        Ok(subject) => subject,
        Err(err) => {
            errors.push(err);
            String::new()
        }
    };
    if matches!(category_id, Some(id) if id <= 0) {
        errors.push(ValidationError::InvalidCategoryId);
    }
    (amount, subject, normalize_optional_text(notes))
}

/// Rounds to two fractional digits and requires `0 < amount < 10^10`.
pub fn check_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    let rounded = round_money(amount);
    if rounded <= Decimal::ZERO || rounded >= max_magnitude() {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(rounded)
}

/// Rounds a balance to two fractional digits and bounds its magnitude.
/// Unlike transaction amounts, balances may be zero or negative.
pub fn check_balance(value: Decimal) -> Result<Decimal, ValidationError> {
    let rounded = round_money(value);
    if rounded.abs() >= max_magnitude() {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(rounded)
}

pub fn check_date(date: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let latest = Utc::now().date_naive() + Months::new(12);
    if date < min_transaction_date() || date > latest {
        return Err(ValidationError::InvalidDate);
    }
    Ok(date)
}

fn check_subject(subject: &str) -> Result<String, ValidationError> {
    let trimmed = subject.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_SUBJECT_LEN {
        return Err(ValidationError::InvalidSubject);
    }
    Ok(trimmed.to_string())
}

fn check_name(name: &str, max_len: usize) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max_len {
        return Err(ValidationError::InvalidName);
    }
    Ok(trimmed.to_string())
}

fn check_email(email: &str) -> Result<String, ValidationError> {
    let normalized = email.trim().to_lowercase();
    if normalized.chars().count() > MAX_EMAIL_LEN || !normalized.validate_email() {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(normalized)
}

fn normalize_optional_text(text: Option<&str>) -> Option<String> {
    let trimmed = text?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// numeric(12,2) leaves ten integral digits.
fn max_magnitude() -> Decimal {
    Decimal::from(10_000_000_000u64)
}
