//! Company name normalization and similarity

use once_cell::sync::Lazy;
use regex::Regex;

/// Legal-entity and trade tokens that carry no identity, matched as whole words
static LEGAL_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:ltda|ltd|inc|corp|corporation|llc|sa|cia|company|distribuidora|comercial)\b|\bs\.a\.",
    )
    .expect("legal token pattern is valid")
});

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Normalize a raw company name for comparison
///
/// Lowercases, drops legal-entity tokens, strips punctuation and collapses
/// whitespace: `"Acme Inc."` and `"ACME"` both become `"acme"`.
pub fn normalize_company_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let without_tokens = LEGAL_TOKENS.replace_all(&lowered, "");
    let without_punctuation = PUNCTUATION.replace_all(&without_tokens, "");
    WHITESPACE
        .replace_all(&without_punctuation, " ")
        .trim()
        .to_string()
}

/// Decides whether two raw company names refer to the same company
pub trait NameMatcher: Send + Sync {
    fn is_same_company(&self, a: &str, b: &str) -> bool;
}

impl<F> NameMatcher for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn is_same_company(&self, a: &str, b: &str) -> bool {
        self(a, b)
    }
}

/// Symmetric substring containment on normalized names
///
/// Loose for very short names: `"ab"` contains-matches any longer name that
/// includes it. A name that normalizes to nothing only matches another such name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentMatcher;

impl NameMatcher for ContainmentMatcher {
    fn is_same_company(&self, a: &str, b: &str) -> bool {
        let a = normalize_company_name(a);
        let b = normalize_company_name(b);
        if a.is_empty() || b.is_empty() {
            return a.is_empty() && b.is_empty();
        }
        a.contains(&b) || b.contains(&a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_legal_tokens() {
        assert_eq!(normalize_company_name("Acme Inc."), "acme");
        assert_eq!(normalize_company_name("ACME Corporation"), "acme");
        assert_eq!(normalize_company_name("Copapel Distribuidora Ltda"), "copapel");
        assert_eq!(normalize_company_name("Globex S.A."), "globex");
        assert_eq!(normalize_company_name("Cia. Hering"), "hering");
    }

    #[test]
    fn test_normalize_keeps_tokens_inside_words() {
        // "sa" and "inc" only go when they stand alone
        assert_eq!(normalize_company_name("Samsung"), "samsung");
        assert_eq!(normalize_company_name("Incredible Foods"), "incredible foods");
    }

    #[test]
    fn test_normalize_collapses_whitespace_and_punctuation() {
        assert_eq!(
            normalize_company_name("  Kimberly-Clark   Brasil! "),
            "kimberlyclark brasil"
        );
        assert_eq!(normalize_company_name("Papelaria São José"), "papelaria são josé");
    }

    #[test]
    fn test_normalize_pure_punctuation_is_empty() {
        assert_eq!(normalize_company_name("?!."), "");
        assert_eq!(normalize_company_name("LLC"), "");
    }

    #[test]
    fn test_containment_is_symmetric() {
        let m = ContainmentMatcher;
        assert!(m.is_same_company("Acme", "Acme Industries Inc"));
        assert!(m.is_same_company("Acme Industries Inc", "Acme"));
        assert!(!m.is_same_company("Acme", "Globex"));
    }

    #[test]
    fn test_empty_normalized_names_only_match_each_other() {
        let m = ContainmentMatcher;
        assert!(m.is_same_company("...", "LLC"));
        assert!(!m.is_same_company("...", "Acme"));
        assert!(!m.is_same_company("Acme", "Inc."));
    }

    #[test]
    fn test_closure_matcher() {
        let exact = |a: &str, b: &str| a == b;
        assert!(exact.is_same_company("Acme", "Acme"));
        assert!(!exact.is_same_company("Acme", "Acme Inc"));
    }
}
