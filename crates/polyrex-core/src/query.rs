//! The query/response protocol shared by every host-language runner.
//!
//! A query names one pattern and an ordered list of subject strings. The
//! response is the same document with `validPattern` and per-input `results`
//! attached - additive, never destructive, so caller-supplied bookkeeping
//! fields survive the round trip untouched.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::wire::intbool;

/// A regex query: one pattern, many subject strings.
///
/// `pattern` is the raw pattern text - no enclosing delimiters, no flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub pattern: String,
    pub inputs: Vec<String>,
    /// Caller-supplied fields, echoed back verbatim in the response.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The query document with evaluation results attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(flatten)]
    pub query: Query,
    /// 1 iff the pattern compiled in the host engine.
    #[serde(with = "intbool")]
    pub valid_pattern: bool,
    /// One entry per input, in input order; empty when the pattern never
    /// compiled.
    pub results: Vec<MatchResult>,
}

/// The outcome of matching the pattern against a single subject string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub input: String,
    #[serde(with = "intbool")]
    pub matched: bool,
    pub match_contents: MatchContents,
}

/// What the match covered and captured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchContents {
    /// The full substring covered by the match; `""` on no match.
    pub matched_string: String,
    /// One entry per capturing group, in group-number order. A group that
    /// did not participate in the match is `""`, never null - downstream
    /// comparison across hosts depends on this.
    pub capture_groups: Vec<String>,
}

/// Evaluate `query` against the Rust regex engine.
///
/// Partial-match semantics: the pattern may match anywhere in the subject
/// (leftmost match wins), as opposed to having to cover the whole string.
/// The pattern is compiled with no flags. A pattern the engine rejects is a
/// reportable outcome, not an error: the response carries
/// `valid_pattern == false` and an empty `results`.
///
/// This is a pure transformation - same query in, byte-identical response
/// out.
pub fn evaluate(query: Query) -> Response {
    match Regex::new(&query.pattern) {
        Ok(re) => {
            let results = query
                .inputs
                .iter()
                .map(|input| match_one(&re, input))
                .collect();
            Response {
                query,
                valid_pattern: true,
                results,
            }
        }
        Err(_) => Response {
            query,
            valid_pattern: false,
            results: Vec::new(),
        },
    }
}

fn match_one(re: &Regex, input: &str) -> MatchResult {
    let contents = re.captures(input).map(|caps| MatchContents {
        matched_string: caps
            .get(0)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        capture_groups: caps
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
    });

    MatchResult {
        input: input.to_string(),
        matched: contents.is_some(),
        match_contents: contents.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pattern: &str, inputs: &[&str]) -> Query {
        Query {
            pattern: pattern.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_one_result_per_input() {
        let response = evaluate(query("a", &["a", "b", "aa", ""]));
        assert!(response.valid_pattern);
        assert_eq!(response.results.len(), 4);
        let echoed: Vec<&str> = response.results.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(echoed, ["a", "b", "aa", ""]);
    }

    #[test]
    fn test_partial_match_semantics() {
        let response = evaluate(query("b", &["abc"]));
        assert!(response.results[0].matched);
        assert_eq!(response.results[0].match_contents.matched_string, "b");
    }

    #[test]
    fn test_empty_match_on_empty_input() {
        // "a*" matches the empty string at position 0
        let response = evaluate(query("a*", &[""]));
        let result = &response.results[0];
        assert!(result.matched);
        assert_eq!(result.match_contents.matched_string, "");
        assert!(result.match_contents.capture_groups.is_empty());
    }

    #[test]
    fn test_no_match() {
        let response = evaluate(query("xyz", &["abc"]));
        let result = &response.results[0];
        assert!(!result.matched);
        assert_eq!(result.match_contents.matched_string, "");
        assert!(result.match_contents.capture_groups.is_empty());
    }

    #[test]
    fn test_unused_group_is_empty_string() {
        let response = evaluate(query("(a)|(b)", &["b"]));
        let result = &response.results[0];
        assert!(result.matched);
        assert_eq!(result.match_contents.matched_string, "b");
        assert_eq!(result.match_contents.capture_groups, ["", "b"]);
    }

    #[test]
    fn test_group_count_constant_across_results() {
        let response = evaluate(query("(\\d+)-(\\d+)", &["1-2", "10-20", "33-44"]));
        for result in &response.results {
            assert_eq!(result.match_contents.capture_groups.len(), 2);
        }
    }

    #[test]
    fn test_invalid_pattern() {
        let response = evaluate(query("(", &["anything", "at all"]));
        assert!(!response.valid_pattern);
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_valid_pattern_with_zero_matches() {
        // Validity is about compilation, not about whether anything matched
        let response = evaluate(query("z", &["a", "b"]));
        assert!(response.valid_pattern);
        assert!(response.results.iter().all(|r| !r.matched));
    }

    #[test]
    fn test_idempotent() {
        let q = query("(a+)(b)?", &["aab", "ccc", ""]);
        let first = serde_json::to_string(&evaluate(q.clone())).unwrap();
        let second = serde_json::to_string(&evaluate(q)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let input = r#"{"pattern": "a", "inputs": ["a"], "project": "left-pad", "nAttempts": 3}"#;
        let q: Query = serde_json::from_str(input).unwrap();
        let value = serde_json::to_value(evaluate(q)).unwrap();
        assert_eq!(value["project"], "left-pad");
        assert_eq!(value["nAttempts"], 3);
        assert_eq!(value["validPattern"], 1);
    }

    #[test]
    fn test_wire_shape() {
        let response = evaluate(query("(b)", &["abc", "xyz"]));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "pattern": "(b)",
                "inputs": ["abc", "xyz"],
                "validPattern": 1,
                "results": [
                    {
                        "input": "abc",
                        "matched": 1,
                        "matchContents": {
                            "matchedString": "b",
                            "captureGroups": ["b"],
                        },
                    },
                    {
                        "input": "xyz",
                        "matched": 0,
                        "matchContents": {
                            "matchedString": "",
                            "captureGroups": [],
                        },
                    },
                ],
            })
        );
    }

    #[test]
    fn test_missing_required_field_is_a_parse_error() {
        // Contract violations surface at deserialization, never as
        // validPattern = 0
        assert!(serde_json::from_str::<Query>(r#"{"inputs": ["a"]}"#).is_err());
        assert!(serde_json::from_str::<Query>(r#"{"pattern": "a"}"#).is_err());
    }
}
