use std::fmt::Write;

use crate::api::models::Contact;
use crate::ui::contact_list::{SortDirection, SortField, SortOrder};

fn header(label: &str, field: SortField, sort: Option<SortOrder>) -> String {
    let arrow = match sort {
        Some(SortOrder { field: f, direction: SortDirection::Ascending }) if f == field => "↑",
        Some(SortOrder { field: f, direction: SortDirection::Descending }) if f == field => "↓",
        _ => "↕",
    };
    format!("{label} {arrow}")
}

/// Plain-text table of contacts with one row per contact.
pub fn render(contacts: &[Contact], sort: Option<SortOrder>) -> String {
    let headers = [
        "Id".to_string(),
        header("Name", SortField::Name, sort),
        header("Email", SortField::Email, sort),
        "Phone".to_string(),
    ];
    let rows: Vec<[&str; 4]> = contacts
        .iter()
        .map(|c| [c.id.as_str(), c.name.as_str(), c.email.as_str(), c.phone.as_deref().unwrap_or("")])
        .collect();

    let mut widths = headers.each_ref().map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut line = |cells: [&str; 4]| {
        let text = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", text.trim_end());
    };
    line(headers.each_ref().map(String::as_str));
    line(widths.map(|w| "-".repeat(w)).each_ref().map(String::as_str));
    for row in rows {
        line(row);
    }
    out
}
