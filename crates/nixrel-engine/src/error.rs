//! Engine error types with source-mapped diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::suggestions::{
    extract_filter_name, extract_variable_name, suggest_undefined_variable,
    suggest_unknown_filter, AVAILABLE_FILTERS,
};

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Context error: {0}")]
    Context(#[from] serde_json::Error),
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    SyntaxError,
    TypeError,
    InvalidOperation,
    Other,
}

impl TemplateErrorKind {
    /// Convert to a code string for diagnostics
    pub fn to_code_string(&self) -> &'static str {
        match self {
            Self::UndefinedVariable => "undefined_variable",
            Self::UnknownFilter => "unknown_filter",
            Self::SyntaxError => "syntax",
            Self::TypeError => "type",
            Self::InvalidOperation => "invalid_operation",
            Self::Other => "render",
        }
    }
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(nixrel::template::render))]
pub struct TemplateError {
    /// Error message
    pub message: String,

    /// Error kind for categorization
    pub kind: TemplateErrorKind,

    /// Template source code
    #[source_code]
    pub src: NamedSource<String>,

    /// Error location in source
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    /// Suggestion for fixing the error
    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    ///
    /// `context` is the serialized render context; its top-level keys feed the
    /// "did you mean" suggestions for undefined variables.
    pub fn from_minijinja(
        err: minijinja::Error,
        template_name: &str,
        template_source: &str,
        context: Option<&serde_json::Value>,
    ) -> Self {
        let (kind, message) = categorize_minijinja_error(&err);
        let span = err
            .line()
            .and_then(|line_num| calculate_span(template_source, line_num));
        let suggestion = generate_suggestion(&err, kind, context);

        Self {
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }

    /// Create a simple error without source mapping
    pub fn simple(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TemplateErrorKind::Other,
            src: NamedSource::new("<unknown>", String::new()),
            span: None,
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Categorize a MiniJinja error into our error kinds
fn categorize_minijinja_error(err: &minijinja::Error) -> (TemplateErrorKind, String) {
    let msg = err.to_string();
    let detailed = format!("{:#}", err);

    let kind = match err.kind() {
        minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => {
            TemplateErrorKind::TypeError
        }
        _ => {
            let msg_lower = msg.to_lowercase();
            if msg_lower.contains("undefined") {
                TemplateErrorKind::UndefinedVariable
            } else if msg_lower.contains("syntax") || msg_lower.contains("expected") {
                TemplateErrorKind::SyntaxError
            } else {
                TemplateErrorKind::Other
            }
        }
    };

    let enhanced_msg = match kind {
        TemplateErrorKind::UndefinedVariable => match extract_expression_from_display(&detailed) {
            Some(expr) => format!("undefined variable `{}`", expr),
            None => msg.replace("undefined value", "undefined variable"),
        },
        _ => msg
            .replace("invalid operation: ", "")
            .replace("syntax error: ", "")
            .replace("undefined value", "undefined variable"),
    };

    (kind, enhanced_msg)
}

/// Extract the problematic expression from MiniJinja's detailed display
///
/// The error line is marked with `>`:
/// ```text
///    1 > {{ nope }}
///      i    ^^^^ undefined value
/// ```
fn extract_expression_from_display(display: &str) -> Option<String> {
    let lines: Vec<&str> = display.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        let candidate = if trimmed.contains(" > ") || trimmed.starts_with("> ") {
            Some(*line)
        } else if line.contains("^^^") && i > 0 {
            Some(lines[i - 1])
        } else {
            None
        };

        if let Some(expr) = candidate.and_then(expression_in_line) {
            return Some(expr);
        }
    }

    None
}

fn expression_in_line(line: &str) -> Option<String> {
    let start = line.find("{{")?;
    let end = line[start..].find("}}")?;
    let expr = line[start + 2..start + end].trim();
    let expr = expr.split('|').next().unwrap_or(expr).trim();
    (!expr.is_empty()).then(|| expr.to_string())
}

/// Calculate the source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (idx, line) in source.lines().enumerate() {
        if idx + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}

fn generate_suggestion(
    err: &minijinja::Error,
    kind: TemplateErrorKind,
    context: Option<&serde_json::Value>,
) -> Option<String> {
    let msg = err.to_string();
    let detailed = format!("{:#}", err);

    match kind {
        TemplateErrorKind::UndefinedVariable => {
            let available = context
                .and_then(|v| v.as_object())
                .map(|obj| obj.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default();

            let var_name = extract_expression_from_display(&detailed)
                .or_else(|| extract_variable_name(&msg))?;
            let root = var_name.split('.').next().unwrap_or(&var_name).to_string();

            suggest_undefined_variable(&root, &available).or_else(|| {
                Some(format!(
                    "Variable `{}` is not defined. Available: {}",
                    root,
                    available.join(", ")
                ))
            })
        }
        TemplateErrorKind::UnknownFilter => match extract_filter_name(&msg) {
            Some(name) => suggest_unknown_filter(&name),
            None => Some(format!(
                "Unknown filter. Available: {}",
                AVAILABLE_FILTERS.join(", ")
            )),
        },
        TemplateErrorKind::SyntaxError => Some(
            "Templates use Jinja syntax: `{{ version }}`, not Go-style `{{ .Version }}`"
                .to_string(),
        ),
        _ => None,
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
