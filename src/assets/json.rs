use std::time::Duration;

use crate::assets::source::{AssetError, AssetSource};

/// Failure modes of [`load_json`].
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum JsonLoadError {
    #[error(transparent)]
    Fetch(#[from] AssetError),

    #[error("request for '{location}' timed out after {after_ms} ms")]
    Timeout { location: String, after_ms: u64 },

    #[error("'{location}' is not valid JSON: {message}")]
    Parse { location: String, message: String },
}

/// Remove `//` line comments and `/* */` block comments that sit outside string literals.
///
/// Newlines inside removed comments are kept so parse errors still point at the right line.
pub fn strip_json_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    prev = skipped;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Fetch `location`, strip comments and parse it as JSON, giving up after `timeout`.
///
/// On timeout the in-flight request future is dropped, which aborts it.
pub async fn load_json(
    source: &dyn AssetSource,
    location: &str,
    timeout: Duration,
) -> Result<serde_json::Value, JsonLoadError> {
    let bytes = match tokio::time::timeout(timeout, source.fetch(location)).await {
        Ok(res) => res?,
        Err(_) => {
            return Err(JsonLoadError::Timeout {
                location: location.to_string(),
                after_ms: timeout.as_millis() as u64,
            });
        }
    };

    let parse_err = |message: String| JsonLoadError::Parse {
        location: location.to_string(),
        message,
    };
    let text = String::from_utf8(bytes).map_err(|e| parse_err(e.to_string()))?;
    serde_json::from_str(&strip_json_comments(&text)).map_err(|e| parse_err(e.to_string()))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/json.rs"]
mod tests;
