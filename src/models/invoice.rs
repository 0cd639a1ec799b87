// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Invoices and their derived amounts.
//!
//! Only hours and rate are stored. Subtotal, GST and total are always
//! recomputed so they can never drift from the stored inputs.

use crate::db::Record;
use crate::models::{Contact, User};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// New Zealand GST applied to every invoice subtotal.
pub const GST_RATE: f64 = 0.15;

/// An invoice for a single line item of billable hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub contact_id: String,
    /// Object name of the rendered PDF in storage.
    pub pdf_id: String,
    /// Per-user sequence number printed on the invoice.
    pub number: u32,
    pub rate: f64,
    pub hours: f64,
    pub description: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_code: Option<String>,
}

impl Invoice {
    pub fn subtotal(&self) -> f64 {
        self.hours * self.rate
    }

    pub fn gst(&self) -> f64 {
        self.hours * self.rate * GST_RATE
    }

    pub fn total(&self) -> f64 {
        self.subtotal() + self.gst()
    }
}

impl Record for Invoice {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Invoice as returned by the API, with derived amounts filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub subtotal: f64,
    pub gst: f64,
    pub total: f64,
}

impl From<Invoice> for InvoiceView {
    fn from(invoice: Invoice) -> Self {
        Self {
            subtotal: invoice.subtotal(),
            gst: invoice.gst(),
            total: invoice.total(),
            invoice,
        }
    }
}

/// Everything needed to display an invoice: the biller and the client.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: InvoiceView,
    pub user: User,
    pub contact: Contact,
}

impl InvoiceDetail {
    /// The user is sanitized so OAuth material never leaves the server.
    pub fn new(invoice: Invoice, user: &User, contact: Contact) -> Self {
        Self {
            invoice: invoice.into(),
            user: user.sanitize(),
            contact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(hours: f64, rate: f64) -> Invoice {
        Invoice {
            id: "inv1".to_string(),
            user_id: "u1".to_string(),
            contact_id: "c1".to_string(),
            pdf_id: "p1".to_string(),
            number: 1,
            rate,
            hours,
            description: "Consulting".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            paid: false,
            url_code: None,
        }
    }

    #[test]
    fn amounts_follow_hours_and_rate() {
        for (h, r) in [(0.0, 0.0), (1.0, 100.0), (7.5, 85.0), (40.0, 0.0), (12.25, 130.5)] {
            let inv = invoice(h, r);
            assert_eq!(inv.subtotal(), h * r);
            assert_eq!(inv.gst(), h * r * 0.15);
            assert_eq!(inv.total(), inv.subtotal() + inv.gst());
        }
    }

    #[test]
    fn known_totals() {
        let inv = invoice(10.0, 100.0);
        assert!((inv.subtotal() - 1000.0).abs() < 1e-9);
        assert!((inv.gst() - 150.0).abs() < 1e-9);
        assert!((inv.total() - 1150.0).abs() < 1e-9);
    }

    #[test]
    fn view_serializes_flat_with_totals() {
        let view = InvoiceView::from(invoice(2.0, 50.0));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["id"], "inv1");
        assert_eq!(json["issue_date"], "2024-03-01");
        assert_eq!(json["subtotal"], 100.0);
        assert_eq!(json["total"], 115.0);
        assert!(json.get("url_code").is_none());
    }
}
