use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use wham_invoice::models::{Address, Contact, Invoice, User};
use wham_invoice::services::pdf;

fn fixtures() -> (Invoice, User, Contact) {
    let invoice = Invoice {
        id: "bench".to_string(),
        user_id: "u1".to_string(),
        contact_id: "c1".to_string(),
        pdf_id: String::new(),
        number: 42,
        rate: 120.0,
        hours: 37.5,
        description: "Quarterly bookkeeping and GST return preparation".to_string(),
        issue_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        paid: false,
        url_code: None,
    };
    let user = User {
        id: "u1".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Lee".to_string(),
        email: "ana@example.com".to_string(),
        phone: "021 555 0100".to_string(),
        google_sub: String::new(),
        oauth_token: None,
    };
    let contact = Contact {
        id: "c1".to_string(),
        user_id: "u1".to_string(),
        first_name: "Sam".to_string(),
        last_name: "Ng".to_string(),
        phone: String::new(),
        email: "sam@example.com".to_string(),
        company: "Ng Plumbing".to_string(),
        address: Address {
            first_line: "1 Queen St".to_string(),
            second_line: "Level 2".to_string(),
            suburb: "Auckland CBD".to_string(),
            postcode: "1010".to_string(),
            country: "New Zealand".to_string(),
        },
    };
    (invoice, user, contact)
}

fn benchmark_render(c: &mut Criterion) {
    let (invoice, user, contact) = fixtures();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("bench.pdf");

    c.bench_function("render_invoice_pdf", |b| {
        b.iter(|| {
            pdf::render(
                black_box(&invoice),
                black_box(&user),
                black_box(&contact),
                &path,
            )
            .expect("render failed")
        })
    });

    c.bench_function("money_format", |b| b.iter(|| pdf::money(black_box(1234.5))));
}

criterion_group!(benches, benchmark_render);
criterion_main!(benches);
