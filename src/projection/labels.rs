//! Edge labels derived from free-text crew job and department names.

/// Label used when a crew entry names neither job nor department.
pub const CREW_FALLBACK_LABEL: &str = "crewMember";

/// Converts free text to a lower-camel identifier.
///
/// `_` and `-` are dropped, the text is split on whitespace, the first word is
/// lowercased and every following word gets an uppercase first letter (the
/// rest of the word is left as written). Returns `None` when nothing is left.
/// Text shorter than two characters is returned as is.
///
/// `"Director of Photography"` → `directorOfPhotography`,
/// `"Co-Producer"` → `coproducer`.
pub fn to_lower_camel(text: &str) -> Option<String> {
    if text.chars().count() < 2 {
        return (!text.trim().is_empty()).then(|| text.to_string());
    }
    let cleaned: String = text.chars().filter(|c| *c != '_' && *c != '-').collect();
    let mut words = cleaned.split_whitespace();

    let mut label = words.next()?.to_lowercase();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            label.extend(first.to_uppercase());
            label.push_str(chars.as_str());
        }
    }
    Some(label)
}

/// Label for a crew credit: job, else department, else [`CREW_FALLBACK_LABEL`].
pub fn crew_label(job: Option<&str>, department: Option<&str>) -> String {
    job.and_then(to_lower_camel)
        .or_else(|| department.and_then(to_lower_camel))
        .unwrap_or_else(|| CREW_FALLBACK_LABEL.to_string())
}
