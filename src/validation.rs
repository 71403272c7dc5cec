//! Form-boundary checks. Nothing here touches storage; a failure means the
//! operation is never attempted.

use nutype::nutype;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Address;

/// Contact email with a basic shape check.
#[nutype(
    sanitize(trim, lowercase),
    validate(
        not_empty,
        len_char_max = 255,
        regex = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ),
    derive(Debug, Clone, PartialEq, Eq, Hash, Display, AsRef, Deref, Serialize, Deserialize, TryFrom)
)]
pub struct EmailAddress(String);

/// Digits with optional leading `+` and common separators, 7 to 15 digits.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 24, regex = r"^\+?[0-9][0-9 ()-]{5,22}[0-9]$"),
    derive(Debug, Clone, PartialEq, Eq, Display, AsRef, Deref, Serialize, Deserialize)
)]
pub struct PhoneNumber(String);

const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl From<EmailAddressError> for ValidationError {
    fn from(err: EmailAddressError) -> Self {
        match err {
            EmailAddressError::NotEmptyViolated => Self::MissingField("email"),
            other => Self::InvalidEmail(format!("{:?}", other)),
        }
    }
}

impl From<PhoneNumberError> for ValidationError {
    fn from(err: PhoneNumberError) -> Self {
        match err {
            PhoneNumberError::NotEmptyViolated => Self::MissingField("phone"),
            other => Self::InvalidPhone(format!("{:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorInquiry {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub business_type: Option<String>,
    pub message: Option<String>,
}

pub fn validate_email(email: &str) -> Result<EmailAddress, ValidationError> {
    Ok(EmailAddress::try_new(email.to_string())?)
}

/// Checks every required field of a shipping address.
pub fn validate_shipping_address(address: &Address) -> Result<(), ValidationError> {
    required("full_name", &address.full_name)?;
    required("phone", &address.phone)?;
    PhoneNumber::try_new(address.phone.clone())?;
    required("address_line1", &address.address_line1)?;
    required("city", &address.city)?;
    required("state", &address.state)?;
    required("country", &address.country)?;
    Ok(())
}

pub fn validate_contact_form(form: &ContactForm) -> Result<(), ValidationError> {
    required("name", &form.name)?;
    validate_email(&form.email)?;
    if let Some(phone) = form.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        PhoneNumber::try_new(phone.to_string())?;
    }
    required("subject", &form.subject)?;
    required("message", &form.message)?;
    max_chars("message", &form.message, MAX_MESSAGE_CHARS)
}

pub fn validate_distributor_inquiry(form: &DistributorInquiry) -> Result<(), ValidationError> {
    required("company_name", &form.company_name)?;
    required("contact_name", &form.contact_name)?;
    validate_email(&form.email)?;
    PhoneNumber::try_new(form.phone.clone())?;
    required("location", &form.location)?;
    match form.message.as_deref() {
        Some(message) => max_chars("message", message, MAX_MESSAGE_CHARS),
        None => Ok(()),
    }
}

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
