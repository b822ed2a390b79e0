//! Dotted version comparison
//!
//! Plugin releases and host SDK builds are identified by plain dotted
//! version strings such as `2.1`, `2.1.0` or `4.10.3.1`. They are not
//! semver: any number of components is allowed and missing trailing
//! components compare as zero, so `1.2` and `1.2.0` are the same version.

use std::cmp::Ordering;
use thiserror::Error;

/// Error raised for version strings that are not dotted base-10 integers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version '{version}': component '{component}' is not a base-10 integer")]
    InvalidComponent { version: String, component: String },
}

fn parse(version: &str) -> Result<Vec<u64>, VersionError> {
    version
        .split('.')
        .map(|part| {
            let invalid = || VersionError::InvalidComponent {
                version: version.to_string(),
                component: part.to_string(),
            };
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        })
        .collect()
}

/// Compare two dotted versions component by component.
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
    if a == b {
        return Ok(Ordering::Equal);
    }

    let left = parse(a)?;
    let right = parse(b)?;

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return Ok(other),
        }
    }

    Ok(Ordering::Equal)
}

/// Returns true iff `b` denotes a strictly greater version than `a`.
///
/// Textually equal strings are never newer and are not parsed at all, so
/// `is_newer("01.2", "01.2")` is `Ok(false)` even though parsing would also
/// normalize the leading zero.
pub fn is_newer(a: &str, b: &str) -> Result<bool, VersionError> {
    if a == b {
        return Ok(false);
    }
    Ok(compare(a, b)? == Ordering::Less)
}
