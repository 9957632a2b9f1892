//! Syntactic rules over import paths.

/// Extension of standard-library export files under the stdlib root.
pub const STDLIB_EXPORT_EXTENSION: &str = "mexp";

/// Import paths of the standard-library crates.
pub const STD_CRATES: [&str; 3] = ["std", "core", "alloc"];

/// Reports whether an import path names a standard-library package.
///
/// If the segment before the first `/` contains a `.`, the path is an
/// external package (`github.com/x/y`); otherwise it is standard library.
pub fn is_stdlib_import(path: &str) -> bool {
    let head = match path.find('/') {
        Some(i) => &path[..i],
        None => path,
    };
    !head.contains('.')
}

/// Derives the crate name source code uses to refer to an import path.
///
/// The last `/` segment wins, with `-` and `.` mapped to `_` the way Cargo
/// normalizes package names into crate names.
pub fn crate_name_for(import_path: &str) -> String {
    let last = import_path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(import_path);
    last.replace(['-', '.'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classifies_stdlib_imports() {
        assert!(is_stdlib_import("fmt"));
        assert!(is_stdlib_import("std"));
        assert!(is_stdlib_import("encoding/json"));
        assert!(!is_stdlib_import("github.com/x/y"));
        assert!(!is_stdlib_import("example.org"));
    }

    #[test]
    fn crate_names_follow_last_segment() {
        assert_eq!(crate_name_for("github.com/acme/widget-store"), "widget_store");
        assert_eq!(crate_name_for("std"), "std");
        assert_eq!(crate_name_for("example.org/"), "example_org");
    }

    proptest! {
        #[test]
        fn dotted_host_is_never_stdlib(host in "[a-z]{1,8}\\.[a-z]{2,4}", rest in "(/[a-z]{1,6}){0,3}") {
            let path = format!("{host}{rest}");
            prop_assert!(!is_stdlib_import(&path));
        }

        #[test]
        fn dotless_head_is_stdlib(head in "[a-z]{1,8}", rest in "(/[a-z.]{1,6}){0,3}") {
            let path = format!("{head}{rest}");
            prop_assert!(is_stdlib_import(&path));
        }
    }
}
