//! Fact extraction from raw user text.
//!
//! A deliberately small heuristic: it recognises a customer introducing
//! themselves ("I'm Jane Smith", "My name is Jane Smith") or a message that
//! is just a capitalised first and last name. Anything else is ignored, and
//! the agent falls back to asking.

use cardwise_core::session::FactMap;
use regex_lite::Regex;
use std::sync::LazyLock;

/// "I'm / I am / My name is / This is" followed by two capitalised words.
static INTRODUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:\bI'm|\bI’m|\bI am|\bMy name is|\bThis is)\s+([A-Z][a-z]+)\s+([A-Z][a-z]+)")
        .expect("introduction pattern compiles")
});

/// A message consisting of exactly two capitalised words.
static BARE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][a-z]+) ([A-Z][a-z]+)$").expect("bare name pattern compiles")
});

/// Update `facts` from `text`. Returns `true` if anything matched.
///
/// Matching evidence overwrites earlier values. Running this twice on the
/// same text leaves the map as a single run would.
pub fn extract(facts: &mut FactMap, text: &str) -> bool {
    let captures = INTRODUCTION
        .captures(text)
        .or_else(|| BARE_NAME.captures(text.trim()));

    let Some(captures) = captures else {
        return false;
    };

    let (Some(name), Some(surname)) = (captures.get(1), captures.get(2)) else {
        return false;
    };
    facts.insert("name".into(), name.as_str().to_string());
    facts.insert("surname".into(), surname.as_str().to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts_from(text: &str) -> FactMap {
        let mut facts = FactMap::new();
        extract(&mut facts, text);
        facts
    }

    #[test]
    fn introduction_forms() {
        for text in [
            "Hi, I'm Jane Smith.",
            "I am Jane Smith and I'd like a card",
            "my name is Jane Smith",
            "Hello! This is Jane Smith speaking",
        ] {
            let facts = facts_from(text);
            assert_eq!(facts.get("name").map(String::as_str), Some("Jane"), "{text}");
            assert_eq!(facts.get("surname").map(String::as_str), Some("Smith"), "{text}");
        }
    }

    #[test]
    fn bare_name_line() {
        let facts = facts_from("  Jane Smith ");
        assert_eq!(facts.get("name").map(String::as_str), Some("Jane"));
        assert_eq!(facts.get("surname").map(String::as_str), Some("Smith"));
    }

    #[test]
    fn unmatched_text_is_noop() {
        assert!(facts_from("I'm interested in a travel card").is_empty());
        assert!(facts_from("what cards do you have?").is_empty());
        assert!(facts_from("").is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let mut once = FactMap::new();
        extract(&mut once, "Hi, I'm Jane Smith.");

        let mut twice = FactMap::new();
        extract(&mut twice, "Hi, I'm Jane Smith.");
        extract(&mut twice, "Hi, I'm Jane Smith.");

        assert_eq!(once, twice);
    }

    #[test]
    fn later_evidence_overwrites() {
        let mut facts = FactMap::new();
        extract(&mut facts, "I'm Jane Smith");
        extract(&mut facts, "Sorry, my name is John Doe");
        assert_eq!(facts.get("name").map(String::as_str), Some("John"));
        assert_eq!(facts.get("surname").map(String::as_str), Some("Doe"));
    }

    #[test]
    fn unrelated_message_keeps_known_facts() {
        let mut facts = FactMap::new();
        extract(&mut facts, "I'm Jane Smith");
        assert!(!extract(&mut facts, "show me the bonuses"));
        assert_eq!(facts.len(), 2);
    }
}
