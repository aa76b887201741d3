//! Comic identity and directory naming.

use std::fmt;

/// Stable identity of a comic.
///
/// The `id` never changes; the `name` is what users see and what the archive
/// directory is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComicIdentity {
    pub id: u32,
    pub name: String,
}

impl ComicIdentity {
    /// Create a new comic identity.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Directory name for this comic inside the archive root.
    ///
    /// See [`sanitize_dir_name`].
    pub fn dir_name(&self) -> String {
        sanitize_dir_name(self.id, &self.name)
    }
}

impl fmt::Display for ComicIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

/// Turn a comic name into a filesystem path segment.
///
/// Names made only of ASCII alphanumerics, spaces, hyphens and underscores are
/// accepted and have their spaces removed, so `"Adam At Home"` becomes
/// `"AdamAtHome"`. Any other name (empty, all spaces, or containing path
/// separators, dots or non-ASCII characters) falls back to `comic_<id>`.
///
/// # Examples
///
/// ```
/// use stripvault::comic::sanitize_dir_name;
///
/// assert_eq!(sanitize_dir_name(7, "Adam At Home"), "AdamAtHome");
/// assert_eq!(sanitize_dir_name(7, "../etc"), "comic_7");
/// assert_eq!(sanitize_dir_name(7, ""), "comic_7");
/// ```
pub fn sanitize_dir_name(id: u32, name: &str) -> String {
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_';

    if name.chars().all(allowed) {
        let compact: String = name.chars().filter(|c| *c != ' ').collect();
        if !compact.is_empty() {
            return compact;
        }
    }

    format!("comic_{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaces_removed() {
        assert_eq!(sanitize_dir_name(1, "Calvin and Hobbes"), "CalvinandHobbes");
    }

    #[test]
    fn test_hyphen_and_underscore_kept() {
        assert_eq!(sanitize_dir_name(1, "Non-Sequitur_Daily"), "Non-Sequitur_Daily");
    }

    #[test]
    fn test_invalid_characters_fall_back_to_id() {
        assert_eq!(sanitize_dir_name(42, "Dilbert/Classic"), "comic_42");
        assert_eq!(sanitize_dir_name(42, "Mr. Boffo"), "comic_42");
        assert_eq!(sanitize_dir_name(42, "Café"), "comic_42");
    }

    #[test]
    fn test_blank_names_fall_back_to_id() {
        assert_eq!(sanitize_dir_name(3, ""), "comic_3");
        assert_eq!(sanitize_dir_name(3, "   "), "comic_3");
    }

    #[test]
    fn test_identity_dir_name() {
        let comic = ComicIdentity::new(7, "Adam At Home");
        assert_eq!(comic.dir_name(), "AdamAtHome");
        assert_eq!(comic.to_string(), "Adam At Home (#7)");
    }
}
