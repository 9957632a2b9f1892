//! Errors that know how the user can fix them.

/// An error with concrete remediation steps.
///
/// The driver prints these as `error: <message>` followed by a
/// `Possible solutions:` list.
pub trait Solvable: std::error::Error {
    /// Remediation steps, most likely first. Empty when none apply.
    fn solutions(&self) -> Vec<String>;
}
