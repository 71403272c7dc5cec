use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A postal address as entered on the checkout or address-book forms.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
    pub country: String,
}

/// An address saved in a user's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAddress {
    pub id: String,
    pub user_id: String,
    pub label: Option<String>,
    pub address: Address,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AddressCreate {
    pub user_id: String,
    pub label: Option<String>,
    pub address: Address,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AddressPatch {
    pub label: Option<String>,
    pub address: Option<Address>,
    pub is_default: Option<bool>,
}
