//! TOML syntax checker.
//!
//! There is no canonical TOML layout here: a document that parses is left
//! exactly as written.

use crate::plugin::MalformedContent;
use toml_edit::DocumentMut;

pub const NAME: &str = "toml";
pub const EXTENSIONS: &[&str] = &["toml"];

pub fn canonicalize(content: &str) -> Result<String, MalformedContent> {
    content
        .parse::<DocumentMut>()
        .map_err(|err| MalformedContent::new(err.to_string()))?;
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_document_is_unchanged() {
        let input = "[package]\nname   = \"x\"   # odd spacing kept\n";
        assert_eq!(canonicalize(input).unwrap(), input);
    }

    #[test]
    fn test_invalid_document_is_malformed() {
        let err = canonicalize("[package\nname = 1\n").unwrap_err();
        assert!(!err.message.is_empty());
    }
}
