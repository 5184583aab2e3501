//! Minimal PDF 1.4 writer for issue reports
//!
//! Produces Letter-size pages of left-aligned text in the standard Helvetica
//! fonts (no embedding), WinAnsi encoded. Characters outside Latin-1 are
//! written as `?`. Output is deterministic for a given issue.

use std::fmt::Write as _;

use super::{IssueRenderer, RenderError};
use crate::models::Issue;

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 72;
const HEADING_SIZE: u32 = 18;
const BODY_SIZE: u32 = 11;
const LEADING: u32 = 15;
/// Roughly what fits in 468pt of 11pt Helvetica
const WRAP_COLUMNS: usize = 88;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN - 36) / LEADING) as usize;

/// Renders issues as plain text reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPdfRenderer;

impl IssueRenderer for PlainPdfRenderer {
    fn render(&self, issue: &Issue) -> Result<Vec<u8>, RenderError> {
        let lines = report_lines(issue);
        let pages: Vec<&[Line]> = lines.chunks(LINES_PER_PAGE).collect();
        let mut streams = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            streams.push(page_stream(page, index == 0)?);
        }
        write_document(&streams)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Bold(String),
    Plain(String),
    Blank,
}

fn report_lines(issue: &Issue) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut field = |label: &str, value: &str| {
        let text = format!("{}: {}", label, value);
        for (i, chunk) in wrap(&text, WRAP_COLUMNS).into_iter().enumerate() {
            lines.push(if i == 0 { Line::Bold(chunk) } else { Line::Plain(chunk) });
        }
    };

    field("Title", &issue.title);
    field("Issue ID", &issue.id.to_string());
    field("Status", issue.status.as_str());
    field("Category", issue.category.as_deref().unwrap_or("Uncategorized"));
    field("Location", issue.location.as_deref().unwrap_or("Not specified"));
    field("Reported", &issue.created_at.format("%Y-%m-%d %H:%M UTC").to_string());

    lines.push(Line::Blank);
    lines.push(Line::Bold("Description".to_owned()));
    for paragraph in issue.description.lines() {
        if paragraph.trim().is_empty() {
            lines.push(Line::Blank);
            continue;
        }
        lines.extend(wrap(paragraph, WRAP_COLUMNS).into_iter().map(Line::Plain));
    }
    lines
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            out.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// PDF string literal body: escapes delimiters, Latin-1 as octal, others `?`.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

fn page_stream(lines: &[Line], first_page: bool) -> Result<String, RenderError> {
    let mut s = String::new();
    let mut top = PAGE_HEIGHT - MARGIN;

    if first_page {
        writeln!(s, "BT /F2 {} Tf {} {} Td ({}) Tj ET", HEADING_SIZE, MARGIN, top, "Civic Issue Report")?;
        top -= 36;
    }

    writeln!(s, "BT {} TL {} {} Td", LEADING, MARGIN, top)?;
    for line in lines {
        match line {
            Line::Bold(text) => writeln!(s, "/F2 {} Tf ({}) Tj T*", BODY_SIZE, escape_text(text))?,
            Line::Plain(text) => writeln!(s, "/F1 {} Tf ({}) Tj T*", BODY_SIZE, escape_text(text))?,
            Line::Blank => writeln!(s, "T*")?,
        }
    }
    writeln!(s, "ET")?;
    Ok(s)
}

/// Assemble catalog, page tree, fonts and pages with a byte-exact xref table.
fn write_document(streams: &[String]) -> Result<Vec<u8>, RenderError> {
    // 1 catalog, 2 page tree, 3-4 fonts, then (page, contents) pairs
    let page_ids: Vec<usize> = (0..streams.len()).map(|i| 5 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, streams.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_owned(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>".to_owned(),
    ];
    for (stream, page_id) in streams.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    let mut xref = String::new();
    writeln!(xref, "xref\n0 {}", objects.len() + 1)?;
    // each entry is exactly 20 bytes
    xref.push_str("0000000000 65535 f \n");
    for offset in &offsets {
        writeln!(xref, "{:010} 00000 n ", offset)?;
    }
    writeln!(xref, "trailer\n<< /Size {} /Root 1 0 R >>", objects.len() + 1)?;
    write!(xref, "startxref\n{}\n%%EOF\n", xref_offset)?;
    out.extend_from_slice(xref.as_bytes());

    Ok(out)
}
