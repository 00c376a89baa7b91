//! Template filters for Nix manifests and release fields

use minijinja::{Error, ErrorKind, Value};

/// Escape a string for use inside a double-quoted Nix string
///
/// Usage: description = "{{ description | nix_escape }}";
#[must_use]
pub fn nix_escape(value: String) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "\\${")
}

/// Quote a string with double quotes
///
/// Usage: {{ name | quote }}
#[must_use]
pub fn quote(value: Value) -> String {
    let s = if let Some(str_val) = value.as_str() {
        str_val.to_string()
    } else {
        value.to_string()
    };
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Require a value, fail if undefined or empty
///
/// Usage: {{ env.NUR_TOKEN | required("NUR_TOKEN is not set") }}
pub fn required(value: Value, message: Option<String>) -> Result<Value, Error> {
    if value.is_undefined() || value.is_none() {
        let msg = message.unwrap_or_else(|| "required value is missing".to_string());
        return Err(Error::new(ErrorKind::InvalidOperation, msg));
    }
    match value.as_str() {
        Some("") => {
            let msg = message.unwrap_or_else(|| "required value is empty".to_string());
            Err(Error::new(ErrorKind::InvalidOperation, msg))
        }
        _ => Ok(value),
    }
}

/// Trim prefix from a string
///
/// Usage: {{ tag | trimprefix("v") }}
pub fn trimprefix(value: String, prefix: String) -> String {
    value.strip_prefix(&prefix).unwrap_or(&value).to_string()
}

/// Trim suffix from a string
///
/// Usage: {{ artifact_name | trimsuffix(".tar.gz") }}
pub fn trimsuffix(value: String, suffix: String) -> String {
    value.strip_suffix(&suffix).unwrap_or(&value).to_string()
}

pub fn tolower(value: String) -> String {
    value.to_lowercase()
}

pub fn toupper(value: String) -> String {
    value.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nix_escape() {
        assert_eq!(nix_escape("plain".to_string()), "plain");
        assert_eq!(nix_escape(r#"a "quoted" word"#.to_string()), r#"a \"quoted\" word"#);
        assert_eq!(nix_escape(r"back\slash".to_string()), r"back\\slash");
        assert_eq!(nix_escape("costs ${price}".to_string()), r"costs \${price}");
        assert_eq!(nix_escape("$HOME".to_string()), "$HOME");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(Value::from("hello")), "\"hello\"");
        assert_eq!(quote(Value::from("say \"hi\"")), "\"say \\\"hi\\\"\"");
        assert_eq!(quote(Value::from(42)), "\"42\"");
    }

    #[test]
    fn test_required() {
        assert!(required(Value::from("x"), None).is_ok());
        assert!(required(Value::from(""), None).is_err());
        assert!(required(Value::UNDEFINED, Some("token missing".to_string())).is_err());
    }

    #[test]
    fn test_trim_affixes() {
        assert_eq!(trimprefix("v1.2.3".to_string(), "v".to_string()), "1.2.3");
        assert_eq!(trimprefix("1.2.3".to_string(), "v".to_string()), "1.2.3");
        assert_eq!(
            trimsuffix("foo.tar.gz".to_string(), ".tar.gz".to_string()),
            "foo"
        );
    }

    #[test]
    fn test_case() {
        assert_eq!(tolower("FooBar".to_string()), "foobar");
        assert_eq!(toupper("FooBar".to_string()), "FOOBAR");
    }
}
