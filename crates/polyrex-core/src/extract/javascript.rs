//! JavaScript/TypeScript regex extraction.
//!
//! The typescript grammar parses plain JavaScript too, so both languages
//! share one driver. Recognized sites: regex literals (`/pat/flags`) and
//! `RegExp` construction, with or without `new`.

use arborium::tree_sitter::{Node, Parser};

use crate::inventory::{FlagsText, PatternText, RegexSite};

pub(super) fn sites(source: &str) -> Option<Vec<RegexSite>> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_typescript::language().into())
        .expect("Failed to load TypeScript grammar");

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
        "regex" => {
            let pattern = node
                .child_by_field_name("pattern")
                .map(|p| PatternText::Static(source[p.byte_range()].to_string()))?;
            let flags = node
                .child_by_field_name("flags")
                .map(|f| FlagsText::Static(source[f.byte_range()].to_string()))
                .unwrap_or_else(|| FlagsText::Static(String::new()));
            Some(RegexSite::literal(pattern, flags, line))
        }
        "new_expression" => {
            let constructor = node.child_by_field_name("constructor")?;
            if constructor.kind() != "identifier" || &source[constructor.byte_range()] != "RegExp" {
                return None;
            }
            constructor_site(source, node.child_by_field_name("arguments")?, line)
        }
        // `RegExp(p, f)` without `new` constructs the same object
        "call_expression" => {
            let callee = node.child_by_field_name("function")?;
            if callee.kind() != "identifier" || &source[callee.byte_range()] != "RegExp" {
                return None;
            }
            constructor_site(source, node.child_by_field_name("arguments")?, line)
        }
        _ => None,
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
        Some(arg) => match cooked_string(source, *arg) {
            Some(text) => FlagsText::Static(text),
            None => FlagsText::Dynamic,
        },
    };

    Some(RegexSite::constructor(pattern, flags, line))
}

/// The runtime value of a string literal, escape sequences decoded.
///
/// Anything other than a plain string literal (template strings, variables,
/// concatenations) is not statically known.
fn cooked_string(source: &str, node: Node) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut out = String::new();
    let mut cursor = node.walk();
    for part in node.named_children(&mut cursor) {
        match part.kind() {
            "string_fragment" => out.push_str(&source[part.byte_range()]),
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
        Some('b') if body.len() == 1 => Some('\u{0008}'),
        Some('f') if body.len() == 1 => Some('\u{000c}'),
        Some('v') if body.len() == 1 => Some('\u{000b}'),
        Some('0') if body.len() == 1 => Some('\0'),
        Some('x') => u32::from_str_radix(&body[1..], 16)
            .ok()
            .and_then(char::from_u32),
        Some('u') => {
            let hex = body[1..].trim_start_matches('{').trim_end_matches('}');
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        }
        // \\ \' \" \/ and friends stand for themselves
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
    fn test_regex_literal() {
        let found = extract("var re = /ab+c/;\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, SiteKind::Literal);
        assert_eq!(found[0].pattern, PatternText::Static("ab+c".to_string()));
        assert_eq!(found[0].flags, FlagsText::Static(String::new()));
        assert_eq!(found[0].line, 1);
    }

    #[test]
    fn test_regex_literal_with_flags() {
        let found = extract("x.replace(/a/gi, 'b');\n");
        assert_eq!(found[0].pattern, PatternText::Static("a".to_string()));
        assert_eq!(found[0].flags, FlagsText::Static("gi".to_string()));
    }

    #[test]
    fn test_new_regexp_static() {
        let found = extract("var re = new RegExp('\\\\d+', 'g');\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, SiteKind::Constructor);
        assert_eq!(found[0].pattern, PatternText::Static("\\d+".to_string()));
        assert_eq!(found[0].flags, FlagsText::Static("g".to_string()));
    }

    #[test]
    fn test_new_regexp_without_flags() {
        let found = extract("new RegExp('abc');\n");
        assert_eq!(found[0].flags, FlagsText::Static(String::new()));
    }

    #[test]
    fn test_new_regexp_dynamic_pattern() {
        let found = extract("var re = new RegExp(userInput);\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern, PatternText::Dynamic);
    }

    #[test]
    fn test_new_regexp_dynamic_flags() {
        let found = extract("new RegExp('a', flagVar);\n");
        assert_eq!(found[0].pattern, PatternText::Static("a".to_string()));
        assert_eq!(found[0].flags, FlagsText::Dynamic);
    }

    #[test]
    fn test_concatenated_pattern_is_dynamic() {
        let found = extract("new RegExp('a' + suffix);\n");
        assert_eq!(found[0].pattern, PatternText::Dynamic);
    }

    #[test]
    fn test_regexp_call_without_new() {
        let found = extract("var re = RegExp('xy');\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, SiteKind::Constructor);
        assert_eq!(found[0].pattern, PatternText::Static("xy".to_string()));
    }

    #[test]
    fn test_line_numbers() {
        let found = extract("var a = 1;\nvar re = /x/;\n\nvar re2 = /y/;\n");
        assert_eq!(found[0].line, 2);
        assert_eq!(found[1].line, 4);
    }

    #[test]
    fn test_typescript_source() {
        let found = extract("const re: RegExp = /t[s]+/u;\nfunction f(x: string): boolean { return re.test(x); }\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern, PatternText::Static("t[s]+".to_string()));
        assert_eq!(found[0].flags, FlagsText::Static("u".to_string()));
    }

    #[test]
    fn test_unparseable_source() {
        assert!(sites("var = = = ;;;(((").is_none());
    }

    #[test]
    fn test_no_regexes() {
        assert!(extract("var x = 1 + 2;\n").is_empty());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("\\\\"), "\\");
        assert_eq!(unescape("\\n"), "\n");
        assert_eq!(unescape("\\'"), "'");
        assert_eq!(unescape("\\x41"), "A");
        assert_eq!(unescape("\\u0041"), "A");
        assert_eq!(unescape("\\u{1F600}"), "\u{1F600}");
    }
}
