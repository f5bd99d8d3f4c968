//! PHP regex extraction.
//!
//! PHP has no regex literal; patterns enter the engine as delimited strings
//! handed to the `preg_*` family. A static first argument is split into
//! pattern and flags on its delimiters.

use arborium::tree_sitter::{Node, Parser};

use super::delimited;
use crate::inventory::{FlagsText, PatternText, RegexSite};

/// `preg_*` functions that take the pattern as their first argument.
const PREG_FUNCTIONS: &[&str] = &[
    "preg_filter",
    "preg_grep",
    "preg_match_all",
    "preg_match",
    "preg_replace_callback",
    "preg_replace",
    "preg_split",
];

pub(super) fn sites(source: &str) -> Option<Vec<RegexSite>> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_php::language().into())
        .expect("Failed to load PHP grammar");

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
    if node.kind() != "function_call_expression" {
        return None;
    }

    let function = node.child_by_field_name("function")?;
    if !matches!(function.kind(), "name" | "qualified_name") {
        return None;
    }
    let name = source[function.byte_range()].trim_start_matches('\\');
    let line = node.start_position().row + 1;

    // Patterns live in an array argument keyed by regex; not statically
    // reachable without evaluating the array
    if name == "preg_replace_callback_array" {
        return Some(RegexSite::constructor(
            PatternText::Dynamic,
            FlagsText::Dynamic,
            line,
        ));
    }

    if !PREG_FUNCTIONS.contains(&name) {
        return None;
    }

    let raw = first_argument_string(source, node);
    let site = match raw.as_deref().and_then(delimited::split) {
        Some((pattern, flags)) => RegexSite::constructor(
            PatternText::Static(pattern),
            FlagsText::Static(flags),
            line,
        ),
        None => RegexSite::constructor(PatternText::Dynamic, FlagsText::Dynamic, line),
    };
    Some(site)
}

fn first_argument_string(source: &str, call: Node) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let first = args
        .named_children(&mut cursor)
        .find(|c| c.kind() == "argument")?;

    let mut cursor = first.walk();
    let expr = first.named_children(&mut cursor).next()?;
    cooked_string(source, expr)
}

/// The runtime value of a string literal. Double-quoted strings with
/// interpolation, variables, and concatenations are not statically known.
fn cooked_string(source: &str, node: Node) -> Option<String> {
    if !matches!(node.kind(), "string" | "encapsed_string") {
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

/// Decode one escape sequence, backslash included. Sequences that don't
/// decode cleanly are kept verbatim.
fn unescape(escape: &str) -> String {
    let body = escape.strip_prefix('\\').unwrap_or(escape);
    let decoded = match body.chars().next() {
        Some('n') if body.len() == 1 => Some('\n'),
        Some('t') if body.len() == 1 => Some('\t'),
        Some('r') if body.len() == 1 => Some('\r'),
        Some('v') if body.len() == 1 => Some('\u{000b}'),
        Some('f') if body.len() == 1 => Some('\u{000c}'),
        Some('e') if body.len() == 1 => Some('\u{001b}'),
        Some('x') => u32::from_str_radix(&body[1..], 16)
            .ok()
            .and_then(char::from_u32),
        Some('u') => {
            let hex = body[1..].trim_start_matches('{').trim_end_matches('}');
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        }
        // \\ \' \" \$ stand for themselves
        Some(c) if body.chars().count() == 1 => Some(c),
        _ => None,
    };

    decoded
        .map(|c| c.to_string())
        .unwrap_or_else(|| escape.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::SiteKind;

    fn extract(source: &str) -> Vec<RegexSite> {
        sites(source).expect("source should parse")
    }

    #[test]
    fn test_preg_match_static_pattern() {
        let found = extract("<?php\npreg_match('/ab+c/i', $subject);\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, SiteKind::Constructor);
        assert_eq!(found[0].pattern, PatternText::Static("ab+c".to_string()));
        assert_eq!(found[0].flags, FlagsText::Static("i".to_string()));
        assert_eq!(found[0].line, 2);
    }

    #[test]
    fn test_alternate_delimiters() {
        let found = extract("<?php preg_split('#,\\s*#', $csv);\n");
        assert_eq!(found[0].pattern, PatternText::Static(",\\s*".to_string()));
        assert_eq!(found[0].flags, FlagsText::Static(String::new()));
    }

    #[test]
    fn test_mirrored_delimiters() {
        let found = extract("<?php preg_match('{\\d+}u', $s);\n");
        assert_eq!(found[0].pattern, PatternText::Static("\\d+".to_string()));
        assert_eq!(found[0].flags, FlagsText::Static("u".to_string()));
    }

    #[test]
    fn test_every_preg_function_with_pattern_first() {
        let source = "<?php\n\
                      preg_filter('/a/', 'b', $s);\n\
                      preg_grep('/b/', $arr);\n\
                      preg_match_all('/c/', $s, $m);\n\
                      preg_replace_callback('/d/', $cb, $s);\n\
                      preg_replace('/e/', 'x', $s);\n";
        let found = extract(source);
        let patterns: Vec<_> = found.iter().map(|s| s.pattern.clone()).collect();
        assert_eq!(
            patterns,
            ["a", "b", "c", "d", "e"]
                .map(|p| PatternText::Static(p.to_string()))
        );
    }

    #[test]
    fn test_variable_pattern_is_dynamic() {
        let found = extract("<?php preg_match($pat, $s);\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern, PatternText::Dynamic);
        assert_eq!(found[0].flags, FlagsText::Dynamic);
    }

    #[test]
    fn test_interpolated_pattern_is_dynamic() {
        let found = extract("<?php preg_match(\"/$prefix-\\d/\", $s);\n");
        assert_eq!(found[0].pattern, PatternText::Dynamic);
    }

    #[test]
    fn test_preg_replace_callback_array() {
        let found = extract("<?php preg_replace_callback_array(['/a/' => $f], $s);\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern, PatternText::Dynamic);
    }

    #[test]
    fn test_unrelated_calls_ignored() {
        assert!(extract("<?php strlen($s); str_replace('a', 'b', $s);\n").is_empty());
    }

    #[test]
    fn test_double_quoted_static_pattern() {
        let found = extract("<?php preg_match(\"/end$/\", $s);\n");
        assert_eq!(found[0].pattern, PatternText::Static("end$".to_string()));
    }
}
