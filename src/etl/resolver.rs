use crate::etl::location_registry::LocationRegistry;

/// Strip a leading enumeration ("1. ", "a. ") from a label.
///
/// Everything up to and including the first '.' is dropped and the rest is
/// trimmed; labels without a '.' are only trimmed.
pub fn clean_label(raw: &str) -> String {
    match raw.split_once('.') {
        Some((_, rest)) => rest.trim().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Resolve a label (or an existing code) to a registry code.
///
/// Tries the input as a code first, then as a name ignoring case. Blank input
/// and unknown labels resolve to `None`; the caller records the warning.
pub fn resolve_location<'a>(registry: &'a LocationRegistry, label_or_code: &str) -> Option<&'a str> {
    let key = label_or_code.trim();
    if key.is_empty() {
        return None;
    }

    if let Some(location) = registry.get(key) {
        return Some(location.code.as_str());
    }

    registry.code_for_name(key)
}
