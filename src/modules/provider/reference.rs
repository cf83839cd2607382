use crate::shared::constants::FILE_RESOURCE_PREFIX;
use crate::shared::validation::FILE_URI_REGEX;

/// Normalize a caller-supplied file reference.
///
/// An `http` reference containing `/files/` is reduced to `files/` plus
/// whatever follows the last `/files/`, so `https://.../v1beta/files/abc123`
/// becomes `files/abc123`. Everything else is returned unchanged, which keeps
/// the function idempotent.
pub fn normalize_file_reference(reference: &str) -> String {
    FILE_URI_REGEX
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| reference.to_string())
}

/// Resource name used in provider API paths: `abc` becomes `files/abc`.
pub fn file_resource_name(reference: &str) -> String {
    let normalized = normalize_file_reference(reference);
    if normalized.starts_with(FILE_RESOURCE_PREFIX) {
        normalized
    } else {
        format!("{}{}", FILE_RESOURCE_PREFIX, normalized)
    }
}
