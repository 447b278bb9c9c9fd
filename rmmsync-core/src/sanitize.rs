//! Filesystem-safe name derivation.
//!
//! Display names come from the API and may contain path separators or other
//! characters that are invalid on at least one supported filesystem. The
//! stripped set is reported back so the run log shows exactly what changed.

/// Result of sanitizing one display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub name: String,
    /// The characters removed, in input order (`\0` rendered as `\\0`).
    pub removed: Vec<String>,
}

impl Sanitized {
    pub fn was_modified(&self) -> bool {
        !self.removed.is_empty()
    }

    /// `"<, >, /"` — for the "Removed from file name" log line.
    pub fn removed_display(&self) -> String {
        self.removed.join(", ")
    }
}

/// Strip NUL and `<>:"/\|?*` from a display name and trim whitespace.
pub fn sanitize_filename(name: &str) -> Sanitized {
    const INVALID: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    let mut removed = Vec::new();
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch == '\0' {
            removed.push("\\0".to_string());
        } else if INVALID.contains(&ch) {
            removed.push(ch.to_string());
        } else {
            out.push(ch);
        }
    }

    Sanitized {
        name: out.trim().to_string(),
        removed,
    }
}
