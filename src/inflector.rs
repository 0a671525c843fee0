//! English inflections used to derive element and collection names.
//!
//! Case conversion is delegated to [`heck`]; pluralization follows a small
//! rule table with irregular and uncountable words checked first.
//!
//! # Example
//!
//! ```rust
//! use remote_resource::inflector::{pluralize, singularize, element_name_for};
//!
//! assert_eq!(element_name_for("StreetAddress"), "street_address");
//! assert_eq!(pluralize("person"), "people");
//! assert_eq!(singularize("addresses"), "address");
//! ```

use heck::{ToSnakeCase, ToUpperCamelCase};

const IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("ox", "oxen"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
];

const UNCOUNTABLES: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
    "news",
];

/// Stems whose plural `ses` comes from a singular `sis`.
const SIS_STEMS: &[&str] = &["analy", "diagno", "parenthe", "progno", "synop", "the"];

/// Words ending in `us` whose plural adds `es`.
const US_WORDS: &[&str] = &["status", "bus", "virus", "campus", "census", "octopus"];

/// Returns the underscored element name for a resource type name.
///
/// Only the last `::` segment is used, so `Customer::Friend` becomes `friend`.
#[must_use]
pub fn element_name_for(type_name: &str) -> String {
    demodulize(type_name).to_snake_case()
}

/// Returns the last `::` segment of a qualified type name.
#[must_use]
pub fn demodulize(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

/// Converts an attribute key such as `street_address` into a type name
/// such as `StreetAddress`.
#[must_use]
pub fn camelize(word: &str) -> String {
    word.to_upper_camel_case()
}

/// Returns the plural form of an underscored word.
#[must_use]
pub fn pluralize(word: &str) -> String {
    inflect(word, |last| {
        if let Some(&(_, plural)) = IRREGULARS.iter().find(|(singular, _)| *singular == last) {
            return plural.to_string();
        }
        pluralize_regular(last)
    })
}

/// Returns the singular form of an underscored word.
#[must_use]
pub fn singularize(word: &str) -> String {
    inflect(word, |last| {
        if let Some(&(singular, _)) = IRREGULARS.iter().find(|(_, plural)| *plural == last) {
            return singular.to_string();
        }
        singularize_regular(last)
    })
}

/// Applies `rule` to the last underscore-separated segment, leaving
/// uncountable words untouched.
fn inflect(word: &str, rule: impl Fn(&str) -> String) -> String {
    let (head, last) = word
        .rfind('_')
        .map_or(("", word), |index| (&word[..=index], &word[index + 1..]));
    let lower = last.to_lowercase();
    if lower.is_empty() || UNCOUNTABLES.contains(&lower.as_str()) {
        return word.to_string();
    }
    format!("{head}{}", rule(&lower))
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn pluralize_regular(word: &str) -> String {
    let before = |suffix: &str| {
        word.strip_suffix(suffix)
            .and_then(|stem| stem.chars().last())
    };

    if word.ends_with("quiz") {
        return format!("{word}zes");
    }
    if let Some(stem) = word.strip_suffix("us") {
        return format!("{stem}uses");
    }
    if let Some(stem) = word.strip_suffix("sis") {
        return format!("{stem}ses");
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }
    if let Some(c) = before("y") {
        if !is_vowel(c) {
            return format!("{}ies", &word[..word.len() - 1]);
        }
    }
    if let Some(c) = before("fe") {
        if c != 'f' {
            return format!("{}ves", &word[..word.len() - 2]);
        }
    }
    if let Some(c) = before("f") {
        if c == 'l' || c == 'r' {
            return format!("{}ves", &word[..word.len() - 1]);
        }
    }
    format!("{word}s")
}

fn singularize_regular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("quizzes") {
        return format!("{stem}quiz");
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("ves") {
        return match stem.chars().last() {
            Some('l' | 'r') => format!("{stem}f"),
            Some(_) => format!("{stem}fe"),
            None => word.to_string(),
        };
    }
    if let Some(us_word) = US_WORDS
        .iter()
        .find(|us_word| word.ends_with(&format!("{us_word}es")))
    {
        return format!("{}{us_word}", &word[..word.len() - us_word.len() - 2]);
    }
    if let Some(stem) = word.strip_suffix("ses") {
        if stem.ends_with('s') {
            return format!("{stem}s");
        }
        if SIS_STEMS.iter().any(|sis| stem.ends_with(sis)) {
            return format!("{stem}sis");
        }
    }
    for suffix in ["xes", "zes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") {
        return word.to_string();
    }
    word.strip_suffix('s').map_or_else(|| word.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_name_for_uses_last_segment() {
        assert_eq!(element_name_for("Person"), "person");
        assert_eq!(element_name_for("StreetAddress"), "street_address");
        assert_eq!(element_name_for("Customer::Friend"), "friend");
    }

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("friend"), "Friend");
        assert_eq!(camelize("street_address"), "StreetAddress");
    }

    #[test]
    fn test_pluralize_regular_words() {
        assert_eq!(pluralize("comment"), "comments");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("wolf"), "wolves");
        assert_eq!(pluralize("knife"), "knives");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("analysis"), "analyses");
    }

    #[test]
    fn test_pluralize_irregular_and_uncountable() {
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("child"), "children");
        assert_eq!(pluralize("sheep"), "sheep");
        assert_eq!(pluralize("street_address"), "street_addresses");
        assert_eq!(pluralize("sales_person"), "sales_people");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("friends"), "friend");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("wolves"), "wolf");
        assert_eq!(singularize("knives"), "knife");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("analyses"), "analysis");
        assert_eq!(singularize("houses"), "house");
        assert_eq!(singularize("cases"), "case");
        assert_eq!(singularize("glass"), "glass");
        assert_eq!(singularize("series"), "series");
    }

    #[test]
    fn test_singularize_inverts_pluralize() {
        for word in ["comment", "address", "category", "person", "child", "match", "wolf"] {
            assert_eq!(singularize(&pluralize(word)), word, "word: {word}");
        }
    }
}
