//! Fuzzy matching and context-aware suggestions for template errors
//!
//! Uses Levenshtein distance to point users at the closest context variable
//! or filter when a template references something that does not exist.

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// All registered filters in the engine
pub const AVAILABLE_FILTERS: &[&str] = &[
    // Custom filters
    "nix_escape",
    "quote",
    "required",
    "trimprefix",
    "trimsuffix",
    "tolower",
    "toupper",
    // Built-in MiniJinja filters
    "default",
    "upper",
    "lower",
    "title",
    "capitalize",
    "replace",
    "trim",
    "join",
    "first",
    "last",
    "length",
    "reverse",
    "sort",
    "unique",
    "map",
    "select",
    "reject",
    "int",
    "string",
    "list",
    "urlencode",
];

/// Top-level context variables whose names are commonly mistyped
pub const CONTEXT_VARIABLES: &[&str] = &[
    "project_name",
    "version",
    "tag",
    "previous_tag",
    "major",
    "minor",
    "patch",
    "prerelease",
    "is_snapshot",
    "release_url",
    "date",
    "timestamp",
    "env",
    "artifact_name",
    "artifact_id",
    "os",
    "arch",
    "arm",
    "amd64",
];

/// Suggestion result with confidence scoring
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggested correction
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
    /// Category of suggestion
    pub category: SuggestionCategory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuggestionCategory {
    Variable,
    Filter,
}

/// Calculate Levenshtein distance between two strings
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Find closest matches from a list of candidates
pub fn find_closest_matches(
    input: &str,
    candidates: &[&str],
    max_results: usize,
    category: SuggestionCategory,
) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = levenshtein(input, candidate);
            (distance <= MAX_SUGGESTION_DISTANCE && distance > 0).then(|| Suggestion {
                text: candidate.to_string(),
                distance,
                category,
            })
        })
        .collect();

    suggestions.sort_by_key(|s| s.distance);
    suggestions.truncate(max_results);
    suggestions
}

/// Convert a Go-template style name (`Version`, `ProjectName`) to ours
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.trim_start_matches('.').chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Suggest corrections for an undefined variable
///
/// `available_variables` are the keys actually present in the render context.
pub fn suggest_undefined_variable(
    variable_name: &str,
    available_variables: &[String],
) -> Option<String> {
    let candidates: Vec<&str> = if available_variables.is_empty() {
        CONTEXT_VARIABLES.to_vec()
    } else {
        available_variables.iter().map(String::as_str).collect()
    };

    let converted = snake_case(variable_name);
    if converted != variable_name && candidates.contains(&converted.as_str()) {
        return Some(format!(
            "Did you mean `{}`? Context variables are snake_case",
            converted
        ));
    }

    let matches = find_closest_matches(variable_name, &candidates, 3, SuggestionCategory::Variable);
    if matches.is_empty() {
        return None;
    }

    let suggestions: Vec<String> = matches.iter().map(|s| format!("`{}`", s.text)).collect();
    Some(format!("Did you mean {}?", suggestions.join(" or ")))
}

/// Suggest corrections for an unknown filter
pub fn suggest_unknown_filter(filter_name: &str) -> Option<String> {
    let matches = find_closest_matches(filter_name, AVAILABLE_FILTERS, 3, SuggestionCategory::Filter);

    if !matches.is_empty() {
        let suggestions: Vec<String> = matches.iter().map(|s| format!("`{}`", s.text)).collect();
        Some(format!("Did you mean {}?", suggestions.join(" or ")))
    } else {
        Some(format!(
            "Unknown filter `{}`. Common filters: nix_escape, trimprefix, default, lower, replace",
            filter_name
        ))
    }
}

/// Extract variable name from error message
pub fn extract_variable_name(msg: &str) -> Option<String> {
    // "undefined variable `foo`" or "variable 'foo' is undefined"
    let patterns = [("`", "`"), ("'", "'"), ("\"", "\"")];

    for (start, end) in patterns {
        if let Some(start_idx) = msg.find(start) {
            let rest = &msg[start_idx + start.len()..];
            if let Some(end_idx) = rest.find(end) {
                return Some(rest[..end_idx].to_string());
            }
        }
    }
    None
}

/// Extract filter name from error message
pub fn extract_filter_name(msg: &str) -> Option<String> {
    extract_variable_name(msg)
}
