//! Deny-glob matching for sandbox-relative paths.

use tracing::warn;

/// Returns true if `relative_path` matches any pattern in `patterns`.
///
/// Backslash separators in both the path and each pattern are normalized to
/// forward slashes first, so results are identical across platforms. `**`
/// matches zero or more whole path components, which is what lets the
/// default `**/*.pem` policy pattern catch `secret.pem` at the sandbox root
/// as well as `a/b/secret.pem`.
///
/// Short-circuits on the first match; pattern order never changes the
/// boolean result. A pattern that fails to compile is skipped and never
/// matches.
pub fn matches_any(relative_path: &str, patterns: &[String]) -> bool {
    let path = relative_path.replace('\\', "/");
    for pattern in patterns {
        let pattern = pattern.replace('\\', "/");
        match globset::Glob::new(&pattern) {
            Ok(glob) => {
                if glob.compile_matcher().is_match(&path) {
                    return true;
                }
            }
            Err(error) => {
                warn!(pattern, %error, "skipping unparseable deny-glob");
            }
        }
    }
    false
}
