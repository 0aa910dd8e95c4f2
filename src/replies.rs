use std::collections::HashMap;

/// Fixed phrase-to-reply table, decided at startup.
///
/// Lookups are exact after normalization (lowercase, trimmed); there is no
/// substring or fuzzy matching.
#[derive(Debug, Clone)]
pub struct ReplyTable {
    rules: HashMap<String, String>,
}

impl ReplyTable {
    /// Build a table from phrase/reply pairs, normalizing the phrases.
    pub fn new<I, K, V>(rules: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|(phrase, reply)| (normalize(&phrase.into()), reply.into()))
            .collect();
        Self { rules }
    }

    /// Reply for `content`, if its normalized form matches a phrase exactly.
    pub fn lookup(&self, content: &str) -> Option<&str> {
        self.rules.get(&normalize(content)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ReplyTable {
    fn default() -> Self {
        Self::new([
            ("hi", "hello"),
            ("whats your name", "iam a bot i dont have any specific name"),
            ("how are you", "fine"),
            ("how is your day", "it is great how about you"),
            ("hi this is santhosshe", "hello this is discord bot"),
            (
                "who is our current prime minister",
                "Our current Prime Mininster is Mr. Narendra Modi",
            ),
        ])
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_trimmed() {
        let table = ReplyTable::default();
        assert_eq!(table.lookup("hi"), Some("hello"));
        assert_eq!(table.lookup("HI"), Some("hello"));
        assert_eq!(table.lookup(" Hi "), Some("hello"));
    }

    #[test]
    fn lookup_is_exact_not_substring() {
        let table = ReplyTable::default();
        assert_eq!(table.lookup("hi there"), None);
        assert_eq!(table.lookup("how are you doing"), None);
        assert_eq!(table.lookup(""), None);
    }

    #[test]
    fn phrases_are_normalized_at_construction() {
        let table = ReplyTable::new([("  PING  ", "pong")]);
        assert_eq!(table.lookup("ping"), Some("pong"));
        assert_eq!(table.lookup(" PING\n"), Some("pong"));
    }

    #[test]
    fn default_table_covers_original_phrases() {
        let table = ReplyTable::default();
        assert_eq!(table.len(), 6);
        assert_eq!(table.lookup("how are you"), Some("fine"));
    }
}
