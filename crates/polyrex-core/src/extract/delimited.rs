//! Delimited-pattern splitting shared by the PHP and Ruby extractors.

/// Split a delimited pattern like `/pat/flags` into `(pattern, flags)`.
///
/// The opening delimiter is whatever the first character is; bracket-style
/// delimiters pair with their mirror (`(` with `)`, `{` with `}`, `[` with
/// `]`, `<` with `>`). The outermost delimiter appearances cannot themselves
/// be escaped, so the closing one is the last occurrence of the end
/// delimiter.
pub fn split(raw: &str) -> Option<(String, String)> {
    let begin = raw.chars().next()?;
    let end = match begin {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    };

    let body_start = begin.len_utf8();
    let end_ix = raw.rfind(end)?;
    if end_ix < body_start {
        return None;
    }

    Some((
        raw[body_start..end_ix].to_string(),
        raw[end_ix + end.len_utf8()..].to_string(),
    ))
}
