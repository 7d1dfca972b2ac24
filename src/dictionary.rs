//! Skill dictionary: newline-delimited skill entries grouped by category.
//!
//! Format: `# <Name>` opens a category, other `#` lines are comments, and
//! every remaining non-empty line is a skill belonging to the most recent
//! category. Lookups are case-insensitive. The dictionary is loaded once and
//! immutable afterwards, so it is shared freely across requests.

use std::collections::BTreeMap;
use std::path::Path;

/// Bundled default dictionary.
const BUNDLED: &str = include_str!("../assets/skills_dictionary.txt");

/// Immutable skill → category index.
pub struct SkillsDictionary {
    index: BTreeMap<String, String>,
    by_category: BTreeMap<String, Vec<String>>,
}

impl SkillsDictionary {
    /// Parses a dictionary from its newline-delimited text form.
    pub fn from_str(content: &str) -> Self {
        let mut index = BTreeMap::new();
        let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut current_category: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix("# ") {
                current_category = Some(name.trim().to_string());
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if let Some(category) = &current_category {
                index.insert(line.to_lowercase(), category.clone());
                by_category
                    .entry(category.clone())
                    .or_default()
                    .push(line.to_string());
            }
        }

        Self { index, by_category }
    }

    /// The dictionary shipped with the binary.
    pub fn bundled() -> Self {
        Self::from_str(BUNDLED)
    }

    /// Loads a dictionary from a file. A missing or unreadable file is
    /// non-fatal: a warning is logged and the empty dictionary returned, so
    /// lookups simply miss.
    pub fn from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_str(&content),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load skills dictionary, using empty dict"
                );
                Self::from_str("")
            }
        }
    }

    /// Looks a term up, lowercasing and trimming the query first.
    /// Returns the category on a hit.
    pub fn lookup(&self, term: &str) -> Option<&str> {
        self.index
            .get(&term.trim().to_lowercase())
            .map(String::as_str)
    }

    /// All entries of a category, in dictionary order.
    pub fn category_entries(&self, category: &str) -> &[String] {
        self.by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of indexed skills.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Languages
Go
Rust
Python

## just a comment
# Databases
PostgreSQL
";

    #[test]
    fn parses_categories_and_entries() {
        let dict = SkillsDictionary::from_str(SAMPLE);
        assert_eq!(dict.len(), 4);
        assert_eq!(dict.lookup("rust"), Some("Languages"));
        assert_eq!(dict.lookup("postgresql"), Some("Databases"));
        assert_eq!(dict.category_entries("Languages"), ["Go", "Rust", "Python"]);
    }

    #[test]
    fn lookup_is_case_insensitive_and_trimmed() {
        let dict = SkillsDictionary::from_str(SAMPLE);
        assert_eq!(dict.lookup("  RUST "), Some("Languages"));
        assert_eq!(dict.lookup("PoStGrEsQl"), Some("Databases"));
        assert_eq!(dict.lookup("cobol"), None);
    }

    #[test]
    fn comments_and_orphan_entries_are_skipped() {
        let dict = SkillsDictionary::from_str("orphan\n# Cat\nentry\n#comment\n");
        assert_eq!(dict.lookup("orphan"), None);
        assert_eq!(dict.lookup("entry"), Some("Cat"));
        assert_eq!(dict.lookup("#comment"), None);
    }

    #[test]
    fn missing_file_yields_empty_dictionary() {
        let dict = SkillsDictionary::from_path(Path::new("/nonexistent/skills.txt"));
        assert!(dict.is_empty());
        assert_eq!(dict.lookup("go"), None);
    }

    #[test]
    fn bundled_dictionary_covers_core_stack() {
        let dict = SkillsDictionary::bundled();
        for term in ["golang", "python", "rust", "java", "kubernetes", "docker", "postgresql"] {
            assert!(dict.lookup(term).is_some(), "missing bundled skill: {term}");
        }
    }
}
