use std::collections::HashSet;

use crate::spec::field::FieldNode;

/// Derive the `camelCaseName` of a human-readable name.
///
/// The name is lower-cased, stripped of every character that is neither
/// alphanumeric nor whitespace, split on whitespace, and joined with every
/// word after the first capitalized.
pub fn to_camel_case(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect();

    let mut out = String::with_capacity(cleaned.len());
    for (idx, word) in cleaned.split_whitespace().enumerate() {
        if idx == 0 {
            out.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Whether `camel_case_name` is already used among `siblings`.
pub fn is_taken<'a>(
    siblings: impl IntoIterator<Item = &'a FieldNode>,
    camel_case_name: &str,
) -> bool {
    siblings
        .into_iter()
        .any(|field| field.camel_case_name == camel_case_name)
}

/// camelCaseNames that occur more than once among `siblings`.
pub fn duplicates<'a>(siblings: impl IntoIterator<Item = &'a FieldNode>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for field in siblings {
        if field.camel_case_name.is_empty() {
            continue;
        }
        if !seen.insert(field.camel_case_name.as_str()) && !dupes.contains(&field.camel_case_name)
        {
            dupes.push(field.camel_case_name.clone());
        }
    }
    dupes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_strips_punctuation() {
        assert_eq!(to_camel_case("Enter Full Name!!"), "enterFullName");
    }

    #[test]
    fn camel_case_of_blank_is_empty() {
        assert_eq!(to_camel_case(""), "");
        assert_eq!(to_camel_case("   "), "");
    }

    #[test]
    fn camel_case_keeps_single_token_lowercase() {
        assert_eq!(to_camel_case("already_snake"), "alreadysnake");
        assert_eq!(to_camel_case("Email"), "email");
    }

    #[test]
    fn camel_case_collapses_whitespace() {
        assert_eq!(to_camel_case("  first   LAST\tname "), "firstLastName");
    }
}
