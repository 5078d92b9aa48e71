use anyhow::{Result, anyhow};
use log::warn;
use mailparse::{MailAddr, MailHeaderMap, ParsedMail};
use std::fs;
use std::path::Path;

use crate::mail::decoders::{decode_mime_words, normalize_snippet};
use crate::surface::snapshot::{Row, SnapshotInbox};

const SNIPPET_CHARS: usize = 140;

/// Builds an inbox row from a raw RFC 822 message.
pub fn row_from_rfc822(raw: &[u8]) -> Result<Row> {
    let parsed = mailparse::parse_mail(raw)?;

    let (sender_name, sender_address) = parsed
        .headers
        .get_first_value("From")
        .map(|from| split_from(&from))
        .unwrap_or_default();

    let subject = parsed
        .headers
        .get_first_header("Subject")
        .map(|h| decode_mime_words(h.get_value_raw()))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let body = extract_text_part(&parsed)
        .or_else(|| parsed.get_body().ok())
        .unwrap_or_default();

    Ok(Row::new(
        &sender_name,
        &sender_address,
        &subject,
        &normalize_snippet(&body, SNIPPET_CHARS),
    ))
}

fn split_from(from: &str) -> (String, String) {
    let Ok(list) = mailparse::addrparse(from) else {
        return (String::new(), from.trim().to_string());
    };
    match list.iter().next() {
        Some(MailAddr::Single(info)) => (
            info.display_name.clone().unwrap_or_default(),
            info.addr.clone(),
        ),
        Some(MailAddr::Group(group)) => match group.addrs.first() {
            Some(info) => (
                info.display_name.clone().unwrap_or_default(),
                info.addr.clone(),
            ),
            None => (group.group_name.clone(), String::new()),
        },
        None => (String::new(), String::new()),
    }
}

fn find_part<'a, 'm>(p: &'a ParsedMail<'m>, mimetype: &str) -> Option<&'a ParsedMail<'m>> {
    if p.ctype.mimetype.eq_ignore_ascii_case(mimetype) {
        return Some(p);
    }
    p.subparts.iter().find_map(|sp| find_part(sp, mimetype))
}

/// First text/plain part anywhere in the tree, else the first text/html part rendered as text.
fn extract_text_part(p: &ParsedMail) -> Option<String> {
    if let Some(plain) = find_part(p, "text/plain") {
        return plain.get_body().ok();
    }
    let html = find_part(p, "text/html")?.get_body().ok()?;
    html2text::from_read(html.as_bytes(), 1000).ok()
}

/// Reads every `*.eml` file in `dir` (sorted by name) into a snapshot.
/// Files that fail to parse are skipped with a warning.
pub fn inbox_from_dir(dir: &Path) -> Result<SnapshotInbox> {
    if !dir.is_dir() {
        return Err(anyhow!("{} is not a directory", dir.display()));
    }
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"))
        })
        .collect();
    paths.sort();

    let mut rows = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read(&path)?;
        match row_from_rfc822(&raw) {
            Ok(row) => rows.push(row),
            Err(e) => warn!("skipping {}: {e}", path.display()),
        }
    }
    Ok(SnapshotInbox::from_rows(rows))
}
