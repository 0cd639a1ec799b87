// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contacts (the clients a user bills).

use crate::db::Record;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A client billed on invoices, owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address: Address,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Contact {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Postal address embedded in a contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[serde(rename = "address_first_line", default)]
    #[validate(length(max = 200))]
    pub first_line: String,
    #[serde(rename = "address_second_line", default)]
    #[validate(length(max = 200))]
    pub second_line: String,
    #[serde(rename = "address_suburb", default)]
    #[validate(length(max = 100))]
    pub suburb: String,
    #[serde(rename = "address_postcode", default)]
    #[validate(length(max = 20))]
    pub postcode: String,
    #[serde(rename = "address_country", default)]
    #[validate(length(max = 100))]
    pub country: String,
}
