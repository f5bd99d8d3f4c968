//! Ruby regex extraction.
//!
//! Recognized sites: regex literals (`/pat/flags`, `%r{pat}flags`) and
//! `Regexp.new` / `Regexp.compile` calls.

use arborium::tree_sitter::{Node, Parser};

use super::delimited;
use crate::inventory::{FlagsText, PatternText, RegexSite};

pub(super) fn sites(source: &str) -> Option<Vec<RegexSite>> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_ruby::language().into())
        .expect("Failed to load Ruby grammar");

    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }

    let mut sites = Vec::new();
    super::collect_sites(source, root, &mut sites, site_at);
    Some(sites)
}

fn site_at(source: &str, node: Node) -> Option<RegexSite> {
    let line = node.start_position().row + 1;

    match node.kind() {
        "regex" => Some(literal_site(source, node, line)),
        "call" => {
            let receiver = node.child_by_field_name("receiver")?;
            if receiver.kind() != "constant" || &source[receiver.byte_range()] != "Regexp" {
                return None;
            }
            let method = node.child_by_field_name("method")?;
            if !matches!(&source[method.byte_range()], "new" | "compile") {
                return None;
            }
            constructor_site(source, node.child_by_field_name("arguments")?, line)
        }
        _ => None,
    }
}

fn literal_site(source: &str, node: Node, line: usize) -> RegexSite {
    if has_interpolation(node) {
        return RegexSite::literal(PatternText::Dynamic, FlagsText::Dynamic, line);
    }

    let raw = &source[node.byte_range()];
    let raw = raw.strip_prefix("%r").unwrap_or(raw);

    match delimited::split(raw) {
        Some((pattern, mut flags)) => {
            // Grammars differ on whether trailing flags land inside the
            // literal node; collect any alphabetic run right after it too
            flags.push_str(&trailing_flags(source, node.end_byte()));
            RegexSite::literal(PatternText::Static(pattern), FlagsText::Static(flags), line)
        }
        None => RegexSite::literal(PatternText::Dynamic, FlagsText::Dynamic, line),
    }
}

fn constructor_site(source: &str, args: Node, line: usize) -> Option<RegexSite> {
    let mut cursor = args.walk();
    let exprs: Vec<Node> = args.named_children(&mut cursor).collect();

    let first = exprs.first()?;
    let pattern = match cooked_string(source, *first) {
        Some(text) => PatternText::Static(text),
        None => PatternText::Dynamic,
    };
    let flags = match exprs.get(1) {
        None => FlagsText::Static(String::new()),
        Some(opts) => flags_from_options(source, *opts),
    };

    Some(RegexSite::constructor(pattern, flags, line))
}

/// `Regexp::IGNORECASE` and friends contribute the constant name as the
/// flags text; any other options expression is runtime-dependent.
fn flags_from_options(source: &str, node: Node) -> FlagsText {
    if node.kind() == "scope_resolution" {
        let scope_is_regexp = node
            .child_by_field_name("scope")
            .map(|scope| &source[scope.byte_range()] == "Regexp")
            .unwrap_or(false);
        if scope_is_regexp {
            if let Some(name) = node.child_by_field_name("name") {
                return FlagsText::Static(source[name.byte_range()].to_string());
            }
        }
    }
    FlagsText::Dynamic
}

/// The value of a string literal, escape sequences decoded. Interpolated
/// strings are not statically known.
fn cooked_string(source: &str, node: Node) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut out = String::new();
    let mut cursor = node.walk();
    for part in node.named_children(&mut cursor) {
        match part.kind() {
            "string_content" => out.push_str(&source[part.byte_range()]),
            "escape_sequence" => out.push_str(&unescape(&source[part.byte_range()])),
            _ => return None,
        }
    }
    Some(out)
}

fn has_interpolation(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|child| child.kind() == "interpolation" || has_interpolation(child))
}

fn trailing_flags(source: &str, end_byte: usize) -> String {
    source[end_byte..]
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect()
}

/// Decode one escape sequence, backslash included. Sequences that don't
/// decode cleanly are kept verbatim.
fn unescape(escape: &str) -> String {
    let body = escape.strip_prefix('\\').unwrap_or(escape);
    let decoded = match body.chars().next() {
        Some('n') if body.len() == 1 => Some('\n'),
        Some('t') if body.len() == 1 => Some('\t'),
        Some('r') if body.len() == 1 => Some('\r'),
        Some('s') if body.len() == 1 => Some(' '),
        Some('0') if body.len() == 1 => Some('\0'),
        Some(c) if body.chars().count() == 1 => Some(c),
        _ => None,
    };

    decoded
        .map(|c| c.to_string())
        .unwrap_or_else(|| escape.to_string())
}
