//! Parser for directory-style key/value documents.
//!
//! Hidden-service descriptors (and the nested introduction-point document)
//! use the directory wire format: one keyword per line with the rest of the
//! line as its value, optionally followed by a `-----BEGIN/END-----` block
//! whose base64 body becomes the value of that keyword. Keywords may repeat;
//! [`NetDocument::values`] returns every occurrence in document order.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocParseError {
    #[error("key block without a preceding keyword")]
    OrphanBlock,

    #[error("unterminated key block")]
    UnterminatedBlock,
}

/// A parsed key/value document
#[derive(Debug, Clone)]
pub struct NetDocument {
    entries: Vec<(String, String)>,
}

impl NetDocument {
    pub fn parse(text: &str) -> Result<Self, DocParseError> {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut lines = text.lines();

        while let Some(line) = lines.next() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            if line.starts_with("-----BEGIN") {
                let mut body = String::new();
                let mut terminated = false;
                for block_line in lines.by_ref() {
                    let block_line = block_line.trim_end_matches('\r');
                    if block_line.starts_with("-----END") {
                        terminated = true;
                        break;
                    }
                    body.push_str(block_line.trim());
                }
                if !terminated {
                    return Err(DocParseError::UnterminatedBlock);
                }

                // the block body becomes the value of the keyword just above
                match entries.last_mut() {
                    Some((_, value)) if value.is_empty() => *value = body,
                    _ => return Err(DocParseError::OrphanBlock),
                }
                continue;
            }

            match line.split_once(char::is_whitespace) {
                Some((key, value)) => entries.push((key.to_string(), value.trim().to_string())),
                None => entries.push((line.to_string(), String::new())),
            }
        }

        Ok(Self { entries })
    }

    /// First value recorded for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value recorded for `key`, in document order
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
