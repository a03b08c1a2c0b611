//! Format-preserving printing of a [`Unit`].
//!
//! Only the headers of touched declarations are re-emitted; every other byte
//! of the original source is copied through unchanged.

use crate::model::{Declaration, Header, Unit};

/// Render a unit back to source text.
pub fn print_unit(unit: &Unit) -> String {
    let source = unit.source();
    let mut edits: Vec<(&Header, String)> = unit
        .declarations()
        .filter(|(_, decl)| decl.touched)
        .filter_map(|(_, decl)| decl.header.as_ref().map(|h| (h, render_header(decl, h))))
        .collect();
    edits.sort_by_key(|(header, _)| header.start);

    let mut out = String::with_capacity(source.len() + edits.len() * 32);
    let mut cursor = 0;
    for (header, text) in edits {
        if header.start < cursor || header.end > source.len() {
            continue;
        }
        out.push_str(&source[cursor..header.start]);
        out.push_str(&text);
        cursor = header.end;
    }
    out.push_str(&source[cursor..]);
    out
}

fn render_header(decl: &Declaration, header: &Header) -> String {
    let parts: Vec<String> = decl
        .annotations
        .iter()
        .map(ToString::to_string)
        .chain(header.residue.iter().cloned())
        .collect();

    let inline = !header.separator.contains('\n');
    let mut text = String::new();
    let mut broken = false;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 && !broken {
            text.push_str(&header.separator);
        }
        text.push_str(part);
        // A line comment runs to the end of the line.
        broken = part.starts_with("//") && (inline || i + 1 == parts.len());
        if broken {
            text.push_str(&header.line_break);
        }
    }
    // Without a modifier list the header range is empty and the
    // declaration's first token follows directly.
    if !header.has_modifiers && !text.is_empty() && !broken {
        text.push_str(&header.separator);
    }
    text
}
