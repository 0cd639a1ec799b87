// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Invoice PDF rendering.
//!
//! Fixed A4 layout, top to bottom:
//! - Header: biller name and phone
//! - Bill-to block (left) and invoice number/dates (right)
//! - One-row line item table
//! - Subtotal, GST and total
//!
//! Rendering is synchronous, so [`create_invoice_pdf`] runs it on the
//! blocking pool, uploads the file, then removes the local copy.

use crate::error::AppError;
use crate::models::{Contact, Invoice, User};
use crate::services::storage::PdfStorage;
use crate::time_utils::format_invoice_date;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 10.0;
const MARGIN_TOP: f32 = 15.0;
const MARGIN_RIGHT: f32 = 10.0;

const RIGHT_EDGE: f32 = PAGE_WIDTH - MARGIN_RIGHT;
const DETAILS_X: f32 = 150.0;
const QUANTITY_X: f32 = 125.0;
const AMOUNT_X: f32 = 160.0;

const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

const BLUE: (u8, u8, u8) = (10, 10, 150);
const DARK_GRAY: (u8, u8, u8) = (55, 55, 55);
const GRAY: (u8, u8, u8) = (200, 200, 200);
const BLACK: (u8, u8, u8) = (0, 0, 0);

const TABLE_HEADERS: [&str; 3] = ["Description", "Quantity", "Amount($) ex GST"];

fn pdf_err(context: &str, e: impl std::fmt::Debug) -> AppError {
    AppError::Internal(anyhow::anyhow!("{}: {:?}", context, e))
}

/// Drawing helper bundling the page layer and fonts.
struct Page {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Page {
    fn text(&self, text: &str, size: f32, x: f32, y: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    /// Draw text whose right edge sits at `right`.
    fn text_right(&self, text: &str, size: f32, right: f32, y: f32, font: &IndirectFontRef) {
        let width = text.chars().count() as f32 * size * AVG_GLYPH_WIDTH * PT_TO_MM;
        self.text(text, size, right - width, y, font);
    }

    fn color(&self, (r, g, b): (u8, u8, u8)) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            None,
        )));
    }

    fn band(&self, color: (u8, u8, u8), bottom: f32, top: f32) {
        self.color(color);
        self.layer.add_rect(Rect::new(
            Mm(MARGIN_LEFT),
            Mm(bottom),
            Mm(RIGHT_EDGE),
            Mm(top),
        ));
        self.color(BLACK);
    }
}

/// Format a currency amount as printed on the invoice.
pub fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Render the invoice PDF to `path`.
pub fn render(invoice: &Invoice, user: &User, contact: &Contact, path: &Path) -> Result<(), AppError> {
    let (doc, page_index, layer_index) = PdfDocument::new(
        format!("Invoice {}", invoice.number),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Invoice",
    );

    let page = Page {
        layer: doc.get_page(page_index).get_layer(layer_index),
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| pdf_err("could not load font", e))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| pdf_err("could not load font", e))?,
        italic: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| pdf_err("could not load font", e))?,
    };

    let top = PAGE_HEIGHT - MARGIN_TOP;
    draw_header(&page, user, top);
    draw_bill_to(&page, contact, top - 20.0);
    draw_details(&page, invoice, top - 20.0);
    let y = draw_table(&page, invoice, top - 55.0);
    draw_totals(&page, invoice, y - 10.0);

    let file = File::create(path)
        .map_err(|e| pdf_err(&format!("could not create {}", path.display()), e))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| pdf_err("could not save file", e))?;

    tracing::debug!(path = %path.display(), invoice = invoice.number, "Invoice PDF rendered");
    Ok(())
}

fn draw_header(page: &Page, user: &User, top: f32) {
    page.text(&user.full_name(), 12.0, MARGIN_LEFT, top - 5.0, &page.bold);
    if !user.phone.is_empty() {
        page.color(BLUE);
        page.text(&format!("Tel: {}", user.phone), 8.0, MARGIN_LEFT, top - 14.0, &page.italic);
        page.color(BLACK);
    }
}

fn draw_bill_to(page: &Page, contact: &Contact, top: f32) {
    page.text("Bill to", 8.0, MARGIN_LEFT, top - 3.0, &page.bold);
    page.text(&contact.full_name(), 8.0, MARGIN_LEFT, top - 6.0, &page.italic);

    let address = &contact.address;
    let lines = [
        contact.company.as_str(),
        address.first_line.as_str(),
        address.second_line.as_str(),
        address.suburb.as_str(),
        address.postcode.as_str(),
        address.country.as_str(),
    ];

    let mut y = top - 9.0;
    for line in lines.into_iter().filter(|l| !l.is_empty()) {
        page.text(line, 8.0, MARGIN_LEFT, y, &page.regular);
        y -= 3.0;
    }
}

fn draw_details(page: &Page, invoice: &Invoice, top: f32) {
    let rows = [
        ("Invoice number", invoice.number.to_string()),
        ("Issue Date", format_invoice_date(invoice.issue_date)),
        ("Due Date", format_invoice_date(invoice.due_date)),
    ];

    let mut y = top - 3.0;
    for (label, value) in rows {
        page.text(label, 8.0, DETAILS_X, y, &page.bold);
        page.text(&value, 8.0, DETAILS_X, y - 3.5, &page.regular);
        y -= 9.0;
    }
}

/// Draw the line item table; returns the y of its bottom edge.
fn draw_table(page: &Page, invoice: &Invoice, top: f32) -> f32 {
    page.band(DARK_GRAY, top - 2.0, top);

    let header_top = top - 4.0;
    page.band(GRAY, header_top - 7.0, header_top);
    let header_y = header_top - 5.0;
    page.text(TABLE_HEADERS[0], 9.0, MARGIN_LEFT + 2.0, header_y, &page.bold);
    page.text(TABLE_HEADERS[1], 9.0, QUANTITY_X, header_y, &page.bold);
    page.text(TABLE_HEADERS[2], 9.0, AMOUNT_X, header_y, &page.bold);

    let row_y = header_top - 13.0;
    page.text(&invoice.description, 9.0, MARGIN_LEFT + 2.0, row_y, &page.regular);
    page.text(&format!("{:.2}", invoice.hours), 9.0, QUANTITY_X, row_y, &page.regular);
    page.text(&format!("{:.2}", invoice.rate), 9.0, AMOUNT_X, row_y, &page.regular);

    row_y - 3.0
}

fn draw_totals(page: &Page, invoice: &Invoice, top: f32) {
    let rows = [
        ("Subtotal (exc. GST):", invoice.subtotal(), 10.0, false),
        ("GST:", invoice.gst(), 10.0, false),
        ("Total:", invoice.total(), 12.0, true),
    ];

    let mut y = top;
    for (label, amount, size, emphasis) in rows {
        let font = if emphasis { &page.bold } else { &page.regular };
        page.text_right(label, size, AMOUNT_X - 5.0, y, font);
        page.text_right(&money(amount), size, RIGHT_EDGE, y, &page.regular);
        y -= 6.0;
    }
}

/// Render, upload and clean up an invoice PDF. Returns the new PDF id.
///
/// The local file is only removed once the upload has succeeded.
pub async fn create_invoice_pdf(
    storage: &PdfStorage,
    dir: &Path,
    invoice: &Invoice,
    user: &User,
    contact: &Contact,
) -> Result<String, AppError> {
    let pdf_id = Uuid::new_v4().to_string();
    let path: PathBuf = dir.join(format!("{}.pdf", pdf_id));

    let (invoice, user, contact, out) = (invoice.clone(), user.clone(), contact.clone(), path.clone());
    tokio::task::spawn_blocking(move || render(&invoice, &user, &contact, &out))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF render task failed: {}", e)))??;

    storage.upload(&pdf_id, &path).await?;

    tokio::fs::remove_file(&path).await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!("could not remove {}: {}", path.display(), e))
    })?;

    tracing::info!(pdf_id = %pdf_id, "Invoice PDF stored");
    Ok(pdf_id)
}
