//! Word tokenization and token frequency maps

use std::collections::HashMap;

/// Strip everything that is not a word character or whitespace, then lowercase.
///
/// Word characters are Unicode alphanumerics and `_`. A token made only of
/// punctuation normalizes to the empty string.
pub fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split message text on whitespace and normalize each piece.
///
/// Empty tokens are kept; callers decide whether to count them.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(normalize_token)
}

/// Token counts that remember first-seen order.
///
/// Iteration order is insertion order, which is what rankings use to break
/// ties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenCounts {
    order: Vec<String>,
    counts: HashMap<String, u64>,
}

impl TokenCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence.
    pub fn add(&mut self, token: &str) {
        self.add_count(token, 1);
    }

    /// Count `n` occurrences.
    pub fn add_count(&mut self, token: &str, n: u64) {
        match self.counts.get_mut(token) {
            Some(count) => *count += n,
            None => {
                self.order.push(token.to_string());
                self.counts.insert(token.to_string(), n);
            }
        }
    }

    pub fn get(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Tokens and counts in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.order
            .iter()
            .map(|token| (token.as_str(), self.counts.get(token).copied().unwrap_or(0)))
    }
}

impl<S: AsRef<str>> FromIterator<(S, u64)> for TokenCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut counts = TokenCounts::new();
        for (token, n) in iter {
            counts.add_count(token.as_ref(), n);
        }
        counts
    }
}

/// A fixed vocabulary checked by set membership.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    words: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl WatchList {
    /// Build from configured words; entries are normalized like tokens and
    /// deduplicated, keeping the first occurrence.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = WatchList::default();
        for word in words {
            let word = normalize_token(word.as_ref());
            if word.is_empty() {
                continue;
            }
            if !list.lookup.contains_key(&word) {
                list.lookup.insert(word.clone(), list.words.len());
                list.words.push(word);
            }
        }
        list
    }

    /// Index of `token` in [`Self::words`], if watched.
    pub fn position(&self, token: &str) -> Option<usize> {
        self.lookup.get(token).copied()
    }

    /// Words in configured order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_lowercases() {
        assert_eq!(normalize_token("Hello!"), "hello");
        assert_eq!(normalize_token("don't"), "dont");
        assert_eq!(normalize_token("snake_case"), "snake_case");
        assert_eq!(normalize_token("Ça"), "ça");
        assert_eq!(normalize_token("?!"), "");
    }

    #[test]
    fn test_tokenize_keeps_empty_tokens() {
        let tokens: Vec<String> = tokenize("I said... !! YOU").collect();
        assert_eq!(tokens, vec!["i", "said", "", "you"]);
    }

    #[test]
    fn test_token_counts_preserve_first_seen_order() {
        let mut counts = TokenCounts::new();
        counts.add("b");
        counts.add("a");
        counts.add("b");

        let items: Vec<(&str, u64)> = counts.iter().collect();
        assert_eq!(items, vec![("b", 2), ("a", 1)]);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get("zzz"), 0);
    }

    #[test]
    fn test_watch_list_membership() {
        let list = WatchList::new(["LOL", "haha", "lol", "!!"]);
        assert_eq!(list.words(), &["lol".to_string(), "haha".to_string()]);
        assert_eq!(list.position("lol"), Some(0));
        assert_eq!(list.position("LOL"), None);
        assert_eq!(list.position("lo"), None);
        assert_eq!(list.position("haha"), Some(1));
    }
}
