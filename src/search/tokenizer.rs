use std::collections::HashSet;

use crate::models::Domain;

const MENSWEAR_TERMS: [&str; 4] = ["menswear", "mens", "men", "men's"];
const WOMENSWEAR_TERMS: [&str; 4] = ["womenswear", "womens", "women", "women's"];

/// Tokens and inferred market segment for a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub tokens: Vec<String>,
    pub domain: Option<Domain>,
}

/// Normalize a raw query. Total over every input string.
pub fn normalize(raw: &str) -> NormalizedQuery {
    let tokens = tokenize(raw);
    let domain = detect_domain(&tokens);
    NormalizedQuery { tokens, domain }
}

/// Lowercase, fold apostrophe variants to `'`, blank out everything outside
/// `[a-z0-9' ]` and split on whitespace.
pub fn tokenize(raw: &str) -> Vec<String> {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '\u{02BC}' | '\'' => '\'',
            'a'..='z' | '0'..='9' => c,
            c if c.is_whitespace() => c,
            _ => ' ',
        })
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Menswear is checked first and wins if both sets ever match.
pub fn detect_domain(tokens: &[String]) -> Option<Domain> {
    let set: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    if MENSWEAR_TERMS.iter().any(|t| set.contains(t)) {
        Some(Domain::Menswear)
    } else if WOMENSWEAR_TERMS.iter().any(|t| set.contains(t)) {
        Some(Domain::Womenswear)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mens_collection() {
        let q = normalize("Mens Collection");
        assert_eq!(q.tokens, vec!["mens", "collection"]);
        assert_eq!(q.domain, Some(Domain::Menswear));
    }

    #[test]
    fn test_empty_input() {
        let q = normalize("");
        assert!(q.tokens.is_empty());
        assert_eq!(q.domain, None);
    }

    #[test]
    fn test_punctuation_becomes_separator() {
        assert_eq!(
            tokenize("floral/botanical, sand-navy!"),
            vec!["floral", "botanical", "sand", "navy"]
        );
    }

    #[test]
    fn test_curly_apostrophe_folds() {
        let q = normalize("Women\u{2019}s resort prints");
        assert_eq!(q.tokens, vec!["women's", "resort", "prints"]);
        assert_eq!(q.domain, Some(Domain::Womenswear));
    }

    #[test]
    fn test_accented_letters_are_dropped() {
        // Non-ASCII letters fall outside [a-z0-9'] and split the word
        assert_eq!(tokenize("café noir"), vec!["caf", "noir"]);
    }

    #[test]
    fn test_menswear_wins_tie() {
        let q = normalize("men and women");
        assert_eq!(q.domain, Some(Domain::Menswear));
    }

    #[test]
    fn test_substring_is_not_a_domain_match() {
        // "mensuration" contains "mens" but is a different token
        assert_eq!(normalize("mensuration stripes").domain, None);
    }

    #[test]
    fn test_tokens_only_contain_allowed_chars() {
        let inputs = [
            "ÄÖÜ ß 東京 🌍 \u{0000}\t\n'quoted'",
            "\u{feff}zero\u{200b}width",
            "İstanbul ǅ ﬁ",
            "MiXeD 123 !!! ???",
            "",
            "   \u{3000}  ",
        ];
        for input in inputs {
            for token in tokenize(input) {
                assert!(!token.is_empty());
                assert!(
                    token
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\''),
                    "unexpected token {token:?} from {input:?}"
                );
            }
        }
    }

    #[test]
    fn test_pseudo_random_unicode_never_panics() {
        // Deterministic xorshift walk over the scalar value space
        let mut state: u32 = 0x9E37_79B9;
        for _ in 0..200 {
            let mut s = String::new();
            for _ in 0..32 {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                if let Some(c) = char::from_u32(state % 0x11_0000) {
                    s.push(c);
                }
            }
            for token in normalize(&s).tokens {
                assert!(token
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\''));
            }
        }
    }
}
