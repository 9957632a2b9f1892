//! Generated names: title casing, the per-file name allocator and output
//! file names.

use std::collections::HashSet;

/// Title-cases an identifier: `widget` gives `Widget`, `get_all` gives
/// `GetAll`. Already capitalized words keep their casing. Any character that
/// cannot appear in an identifier separates words, so `Fake-DB` gives
/// `FakeDB`.
pub fn title_case(name: &str) -> String {
    let name = name.strip_prefix("r#").unwrap_or(name);
    let mut out = String::with_capacity(name.len());
    for part in name.split(|c: char| !c.is_alphanumeric()).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Hands out unique names within one generated file.
///
/// The first request for a name gets it unchanged; later requests get `2`,
/// `3`, ... appended, skipping anything already taken.
#[derive(Debug, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}{n}");
            if self.taken.insert(candidate.clone()) {
                tracing::debug!(base, name = %candidate, "renamed colliding name");
                return candidate;
            }
            n += 1;
        }
    }
}

/// The unallocated base name of a mock: `Mock{Prefix}{Title}`.
pub fn mock_base(prefix: Option<&str>, interface: &str) -> String {
    format!("Mock{}{}", prefix.map(title_case).unwrap_or_default(), title_case(interface))
}

/// The per-interface output file name, `<prefix_><name>_mock[_test].rs`,
/// lowercased with `-` mapped to `_`.
pub fn interface_file_name(prefix: Option<&str>, interface: &str, for_test: bool) -> String {
    let prefix = prefix.map(|p| format!("{p}_")).unwrap_or_default();
    let suffix = if for_test { "_mock_test.rs" } else { "_mock.rs" };
    format!("{prefix}{interface}{suffix}")
        .to_lowercase()
        .replace('-', "_")
}

/// Inserts `_test` before the extension of a combined output file name.
pub fn test_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !stem.ends_with("_test") => {
            format!("{stem}_test.{ext}")
        }
        Some(_) => file_name.to_string(),
        None if file_name.ends_with("_test") => file_name.to_string(),
        None => format!("{file_name}_test"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_cases_declared_names() {
        assert_eq!(title_case("widget"), "Widget");
        assert_eq!(title_case("get_all"), "GetAll");
        assert_eq!(title_case("HTTPClient"), "HTTPClient");
        assert_eq!(title_case("r#type"), "Type");
    }

    #[test]
    fn title_case_drops_non_identifier_characters() {
        assert_eq!(title_case("Fake-DB"), "FakeDB");
        assert_eq!(title_case("my.fake prefix"), "MyFakePrefix");
        assert_eq!(title_case("--"), "");
    }

    #[test]
    fn allocator_suffixes_collisions() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate("MockStore2"), "MockStore2");
        assert_eq!(names.allocate("MockStore"), "MockStore");
        assert_eq!(names.allocate("MockStore"), "MockStore3");
        assert_eq!(names.allocate("MockStore"), "MockStore4");
    }

    #[test]
    fn mock_names_include_prefix() {
        assert_eq!(mock_base(None, "widget"), "MockWidget");
        assert_eq!(mock_base(Some("fake"), "Store"), "MockFakeStore");
        assert_eq!(mock_base(Some("Fake-DB"), "Store"), "MockFakeDBStore");
    }

    #[test]
    fn file_names() {
        assert_eq!(interface_file_name(None, "Store", false), "store_mock.rs");
        assert_eq!(interface_file_name(Some("Fake-DB"), "Store", true), "fake_db_store_mock_test.rs");
        assert_eq!(test_file_name("mocks.rs"), "mocks_test.rs");
        assert_eq!(test_file_name("mocks_test.rs"), "mocks_test.rs");
        assert_eq!(test_file_name("mocks"), "mocks_test");
    }
}
