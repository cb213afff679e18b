//! Term based text search over taxonomy titles and definitions

use std::cmp::Reverse;
use std::collections::HashSet;

use super::types::Searchable;

const TITLE_WEIGHT: u32 = 3;
const DEFINITION_WEIGHT: u32 = 1;
const MIN_TERM_LEN: usize = 2;

/// A parsed free-text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    terms: Vec<String>,
}

impl Query {
    pub fn parse(input: &str) -> Self {
        let mut seen = HashSet::new();
        let terms = input
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() >= MIN_TERM_LEN)
            .filter(|t| seen.insert(t.to_string()))
            .map(str::to_string)
            .collect();
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Relevance of one entity; zero means no match
    pub fn score(&self, title: &str, definition: Option<&str>) -> u32 {
        let title = title.to_lowercase();
        let definition = definition.map(str::to_lowercase).unwrap_or_default();

        self.terms
            .iter()
            .map(|term| {
                let mut score = 0;
                if title.contains(term.as_str()) {
                    score += TITLE_WEIGHT;
                }
                if definition.contains(term.as_str()) {
                    score += DEFINITION_WEIGHT;
                }
                score
            })
            .sum()
    }
}

/// Score, order and de-duplicate candidates.
///
/// Ordering is descending score, then ascending code. Each code appears at
/// most once and at most `limit` items are returned.
pub fn rank<'a, T, I>(query: &Query, candidates: I, limit: usize) -> Vec<T>
where
    T: Searchable + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    if query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(u32, &T)> = candidates
        .into_iter()
        .map(|item| (query.score(item.title(), item.definition()), item))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|(sa, a), (sb, b)| (Reverse(*sa), a.code()).cmp(&(Reverse(*sb), b.code())));

    let mut seen = HashSet::new();
    scored
        .into_iter()
        .filter(|(_, item)| seen.insert(item.code().clone()))
        .take(limit)
        .map(|(_, item)| item.clone())
        .collect()
}
