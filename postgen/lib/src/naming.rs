//! Go identifier naming for generated groups.

/// Suffix appended to tag and path group names.
pub const SERVICE_SUFFIX: &str = "Service";

/// Suffix appended to single-method group names.
pub const HANDLER_SUFFIX: &str = "Handler";

/// Converts arbitrary text into an exported Go identifier.
///
/// Every non-alphanumeric character separates words; the first letter of a
/// word is upper-cased, a capital directly following another capital is
/// lower-cased (`ID` becomes `Id`) and a digit starts a new word.
pub fn to_camel(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut cap_next = true;
    let mut prev_upper = false;

    for ch in input.trim().chars() {
        if ch.is_ascii_alphabetic() {
            let upper = ch.is_ascii_uppercase();
            let rendered = if cap_next {
                ch.to_ascii_uppercase()
            } else if prev_upper && upper {
                ch.to_ascii_lowercase()
            } else {
                ch
            };
            out.push(rendered);
            prev_upper = upper;
            cap_next = false;
        } else if ch.is_ascii_digit() {
            out.push(ch);
            prev_upper = false;
            cap_next = true;
        } else {
            prev_upper = false;
            cap_next = true;
        }
    }

    out
}

/// `pet-store` becomes `PetStoreService`.
pub fn tag_group_name(tag: &str) -> String {
    format!("{}{SERVICE_SUFFIX}", to_camel(tag))
}

/// Camel-cases each slash-separated segment of `path` and concatenates them.
pub fn path_group_name(path: &str) -> String {
    let joined: String = path.split('/').map(to_camel).collect();
    format!("{joined}{SERVICE_SUFFIX}")
}

pub fn method_group_name(method: &str) -> String {
    format!("{method}{HANDLER_SUFFIX}")
}
