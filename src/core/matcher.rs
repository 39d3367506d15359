//! Query tokenization, scoring and ranking.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::core::catalog::Catalog;
use crate::core::record::IconRecord;
use crate::error::{AppError, Result};

const EXACT_WEIGHT: f64 = 1.0;
const PARTIAL_WEIGHT: f64 = 0.5;
const FUZZY_WEIGHT: f64 = 0.25;
const FUZZY_THRESHOLD: f64 = 0.92;
const NAME_BONUS: f64 = 0.5;
const MIN_PARTIAL_LEN: usize = 2;

/// Lowercase and split on anything that is not alphanumeric, dropping duplicates
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
    {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// A search request
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub text: String,
    /// Maximum number of candidates; `None` uses the matcher default
    pub limit: Option<usize>,
    /// Number of ranked candidates to skip
    pub start: usize,
    pub category: Option<String>,
    /// Restrict to these collection prefixes
    pub prefixes: Vec<String>,
}

#[cfg_attr(not(test), allow(dead_code))]
impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A scored record
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub record: IconRecord,
    pub score: f64,
}

/// One page of ranked candidates
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<Candidate>,
    /// Matching records before pagination
    pub total: usize,
    pub start: usize,
    pub limit: usize,
}

/// Relevance heuristic for a tokenized query against one record
pub trait Scorer: Send + Sync {
    fn score(&self, tokens: &[String], record: &IconRecord) -> f64;
}

/// Token overlap with partial containment and typo tolerance
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenOverlapScorer;

impl TokenOverlapScorer {
    fn token_score(token: &str, tags: &[String], name_tokens: &[String]) -> f64 {
        let mut best: f64 = 0.0;
        for tag in tags.iter().chain(name_tokens) {
            if tag == token {
                return EXACT_WEIGHT;
            }
            if token.chars().count() >= MIN_PARTIAL_LEN
                && tag.chars().count() >= MIN_PARTIAL_LEN
                && (tag.contains(token) || token.contains(tag.as_str()))
            {
                best = best.max(PARTIAL_WEIGHT);
            } else if strsim::jaro_winkler(token, tag) >= FUZZY_THRESHOLD {
                best = best.max(FUZZY_WEIGHT);
            }
        }
        best
    }
}

impl Scorer for TokenOverlapScorer {
    fn score(&self, tokens: &[String], record: &IconRecord) -> f64 {
        let name_tokens = tokenize(&record.name);
        let mut score: f64 = tokens
            .iter()
            .map(|t| Self::token_score(t, &record.tags, &name_tokens))
            .sum();

        if score > 0.0 && tokens == name_tokens.as_slice() {
            score += NAME_BONUS;
        }
        score
    }
}

/// Ranks catalog records against queries
pub struct Matcher {
    scorer: Box<dyn Scorer>,
    aliases: BTreeMap<String, Vec<String>>,
    default_limit: usize,
    max_limit: usize,
}

impl Matcher {
    pub fn new(default_limit: usize, max_limit: usize) -> Self {
        Self {
            scorer: Box::new(TokenOverlapScorer),
            aliases: BTreeMap::new(),
            default_limit: default_limit.max(1),
            max_limit: max_limit.max(1),
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.default_limit, config.max_limit).with_aliases(config.query_aliases.clone())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    #[must_use]
    pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    /// Install term expansions; keys are normalized the same way as queries
    #[must_use]
    pub fn with_aliases(mut self, aliases: BTreeMap<String, Vec<String>>) -> Self {
        self.aliases = aliases
            .into_iter()
            .map(|(term, expansion)| (term.to_lowercase(), expansion))
            .collect();
        self
    }

    /// Tokenize the query text and apply alias expansion
    pub fn query_tokens(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidQuery("query is empty".into()));
        }

        let mut tokens: Vec<String> = Vec::new();
        for token in tokenize(text) {
            let expanded = match self.aliases.get(&token) {
                Some(expansion) => expansion.iter().flat_map(|e| tokenize(e)).collect(),
                None => vec![token],
            };
            for t in expanded {
                if !tokens.contains(&t) {
                    tokens.push(t);
                }
            }
        }

        if tokens.is_empty() {
            return Err(AppError::InvalidQuery(format!(
                "no searchable terms in \"{}\"",
                text.trim()
            )));
        }
        Ok(tokens)
    }

    /// Rank the catalog against a query
    pub fn search(&self, catalog: &Catalog, query: &Query) -> Result<SearchOutcome> {
        let tokens = self.query_tokens(&query.text)?;
        let limit = query
            .limit
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
            .max(1);

        let category = query.category.as_deref().map(str::to_lowercase);

        let mut scored: Vec<(&IconRecord, f64)> = catalog
            .iter()
            .filter(|r| r.is_matchable())
            .filter(|r| match &category {
                Some(c) => r.category.as_deref().is_some_and(|rc| rc.to_lowercase() == *c),
                None => true,
            })
            .filter(|r| {
                query.prefixes.is_empty()
                    || r
                        .collection
                        .as_deref()
                        .is_some_and(|p| query.prefixes.iter().any(|q| q.eq_ignore_ascii_case(p)))
            })
            .map(|r| (r, self.scorer.score(&tokens, r)))
            .filter(|(_, score)| score.is_finite() && *score > 0.0)
            .collect();

        // Stable sort: equal scores keep catalog order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let total = scored.len();
        let results = scored
            .into_iter()
            .skip(query.start)
            .take(limit)
            .map(|(record, score)| Candidate {
                record: record.clone(),
                score,
            })
            .collect();

        tracing::debug!(query = %query.text, ?tokens, total, "search complete");

        Ok(SearchOutcome {
            results,
            total,
            start: query.start,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::IconContent;

    fn record(id: &str, name: &str, tags: &[&str]) -> IconRecord {
        IconRecord::new(
            id,
            name,
            tags.iter().map(ToString::to_string),
            IconContent::Inline(format!("<svg id=\"{id}\"/>")),
        )
    }

    fn sample_catalog() -> Catalog {
        Catalog::from_records(vec![
            record("pay-01", "Payment Card", &["pay", "payment", "card"]),
            record("home-01", "Home", &["home", "house"]),
            record("home-02", "Home Outline", &["home", "house", "outline"]),
            record("cart-01", "Shopping Cart", &["cart", "shopping", "buy"]),
            record("user-01", "User", &["user", "account", "person"]),
            record("cog-01", "Settings", &["settings", "cog", "gear"]),
            record("mail-01", "Mail", &["mail", "email", "envelope"]),
            record("trash-01", "Trash", &["trash", "delete", "bin"]),
            record("star-01", "Star", &["star", "favorite"]),
            record("bell-01", "Bell", &["bell", "notification"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Home, sweet-HOME!"), vec!["home", "sweet"]);
        assert_eq!(tokenize("付款 icon"), vec!["付款", "icon"]);
        assert!(tokenize("  --- ").is_empty());
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let matcher = Matcher::new(10, 100);
        let outcome = matcher
            .search(&sample_catalog(), &Query::new("zeppelin"))
            .unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.total, 0);
    }

    #[test]
    fn test_empty_query_is_invalid() {
        let matcher = Matcher::new(10, 100);
        let err = matcher.search(&sample_catalog(), &Query::new("   ")).unwrap_err();
        assert!(matches!(err, AppError::InvalidQuery(_)));

        let err = matcher.search(&sample_catalog(), &Query::new("?!")).unwrap_err();
        assert!(matches!(err, AppError::InvalidQuery(_)));
    }

    #[test]
    fn test_results_bounded_and_sorted() {
        let matcher = Matcher::new(10, 100);
        let outcome = matcher
            .search(&sample_catalog(), &Query::new("home house outline card").limit(2))
            .unwrap();
        assert!(outcome.results.len() <= 2);
        assert!(outcome
            .results
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
        assert_eq!(outcome.results[0].record.id, "home-02");
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog = Catalog::from_records(vec![
            record("b", "Bravo", &["shared"]),
            record("a", "Alpha", &["shared"]),
            record("c", "Charlie", &["shared"]),
        ])
        .unwrap();
        let outcome = Matcher::new(10, 100)
            .search(&catalog, &Query::new("shared"))
            .unwrap();
        let ids: Vec<&str> = outcome.results.iter().map(|c| c.record.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_alias_expansion() {
        let aliases = BTreeMap::from([("付款".to_string(), vec!["payment".to_string()])]);
        let matcher = Matcher::new(10, 100).with_aliases(aliases);
        let outcome = matcher.search(&sample_catalog(), &Query::new("付款")).unwrap();
        assert_eq!(outcome.results[0].record.id, "pay-01");
        assert!(outcome.results[0].score > 0.0);
    }

    #[test]
    fn test_partial_and_fuzzy_matches() {
        let matcher = Matcher::new(10, 100);
        let catalog = sample_catalog();

        let partial = matcher.search(&catalog, &Query::new("notif")).unwrap();
        assert_eq!(partial.results[0].record.id, "bell-01");
        assert!((partial.results[0].score - PARTIAL_WEIGHT).abs() < f64::EPSILON);

        let typo = matcher.search(&catalog, &Query::new("setings")).unwrap();
        assert_eq!(typo.results[0].record.id, "cog-01");
    }

    #[test]
    fn test_exact_name_bonus() {
        let outcome = Matcher::new(10, 100)
            .search(&sample_catalog(), &Query::new("home"))
            .unwrap();
        assert_eq!(outcome.results[0].record.id, "home-01");
        assert!(outcome.results[0].score > outcome.results[1].score);
    }

    #[test]
    fn test_pagination_and_limits() {
        let matcher = Matcher::new(2, 3);
        let catalog = sample_catalog();

        let first = matcher.search(&catalog, &Query::new("home house")).unwrap();
        assert_eq!(first.limit, 2);
        assert_eq!(first.total, 2);

        let mut query = Query::new("home house").limit(50);
        query.start = 1;
        let second = matcher.search(&catalog, &query).unwrap();
        assert_eq!(second.limit, 3);
        assert_eq!(second.results.len(), 1);
        assert_eq!(second.total, 2);
    }

    #[test]
    fn test_category_and_prefix_filters() {
        let catalog = Catalog::from_records(vec![
            record("mdi:home", "home", &[]).with_collection("mdi").with_category("Buildings"),
            record("lucide:home", "home", &[]).with_collection("lucide"),
        ])
        .unwrap();
        let matcher = Matcher::new(10, 100);

        let mut query = Query::new("home");
        query.prefixes = vec!["LUCIDE".into()];
        let outcome = matcher.search(&catalog, &query).unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].record.id, "lucide:home");

        let mut query = Query::new("home");
        query.category = Some("buildings".into());
        let outcome = matcher.search(&catalog, &query).unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].record.id, "mdi:home");
    }

    #[test]
    fn test_custom_scorer() {
        struct IdLength;
        impl Scorer for IdLength {
            #[allow(clippy::cast_precision_loss)]
            fn score(&self, _tokens: &[String], record: &IconRecord) -> f64 {
                record.id.len() as f64
            }
        }

        let outcome = Matcher::new(3, 10)
            .with_scorer(IdLength)
            .search(&sample_catalog(), &Query::new("anything"))
            .unwrap();
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.results[0].record.id, "trash-01");
    }
}
