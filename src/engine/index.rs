//! In-memory trigram index over searchable records.
//!
//! Two maps live behind a single `RwLock` so they change together:
//!
//! - the document store, `id -> record`, used to materialize results;
//! - the inverted index, `trigram -> {id}`, used to find candidates.
//!
//! Every id in a posting set is also in the document store. Searches take a
//! shared lock; `build_index` and `update_item` take the exclusive lock only
//! after the trigram extraction work is done.
//!
//! # Scoring
//!
//! A query of `Q` trigram occurrences (duplicates counted) gives each
//! candidate a counter that is bumped once per query trigram whose posting
//! set contains it. The score is `counter / Q`, always in `(0, 1]`.
//!
//! # Stale postings
//!
//! `update_item` only adds. If a record's text changes, trigrams from the
//! old text keep pointing at it until the next `build_index`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::normalize::Normalizer;
use super::trigram::{text_trigrams, Trigram};
use crate::record::Searchable;

/// Default minimum score for a record to be returned.
///
/// Deliberately low: callers that want strict matching pass their own.
pub const DEFAULT_THRESHOLD: f64 = 0.05;

/// A search hit with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord<R> {
    /// The matched record.
    pub record: R,
    /// Fraction of query trigram occurrences this record matched.
    pub score: f64,
}

/// Size and freshness of an index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
    /// Records in the document store.
    pub documents: usize,
    /// Distinct trigrams in the inverted index.
    pub trigrams: usize,
    /// Sum of all posting set sizes.
    pub postings: usize,
    /// When the last full build finished.
    pub built_at: Option<DateTime<Utc>>,
}

struct IndexState<R: Searchable> {
    documents: HashMap<R::Id, R>,
    postings: HashMap<Trigram, HashSet<R::Id>>,
    built_at: Option<DateTime<Utc>>,
}

impl<R: Searchable> IndexState<R> {
    fn new() -> Self {
        Self {
            documents: HashMap::new(),
            postings: HashMap::new(),
            built_at: None,
        }
    }

    fn clear(&mut self) {
        self.documents.clear();
        self.postings.clear();
    }

    fn insert(&mut self, record: R, trigrams: HashSet<Trigram>) {
        let id = record.id();
        for trigram in trigrams {
            self.postings.entry(trigram).or_default().insert(id.clone());
        }
        self.documents.insert(id, record);
    }
}

/// Fuzzy full-text index over a fixed set of record fields.
pub struct TrigramIndex<R: Searchable> {
    fields: Vec<String>,
    normalizer: Normalizer,
    state: RwLock<IndexState<R>>,
}

impl<R: Searchable> TrigramIndex<R> {
    /// Create an empty index over the given fields.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_normalizer(fields, Normalizer::default())
    }

    /// Create an empty index with a custom normalizer.
    pub fn with_normalizer<I, S>(fields: I, normalizer: Normalizer) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            normalizer,
            state: RwLock::new(IndexState::new()),
        }
    }

    /// Create an index over the given fields and build it from `records`.
    pub fn from_records<I, F, S>(records: I, fields: F) -> Self
    where
        I: IntoIterator<Item = R>,
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = Self::new(fields);
        index.build_index(records);
        index
    }

    /// The fields this index reads from each record, in order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The normalizer shared by indexing and querying.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Replace the whole index with `records`.
    ///
    /// Both maps are cleared first. Trigram extraction runs before the write
    /// lock is taken, so concurrent searches only wait for the swap.
    pub fn build_index<I>(&self, records: I)
    where
        I: IntoIterator<Item = R>,
    {
        let prepared: Vec<(R, HashSet<Trigram>)> = records
            .into_iter()
            .map(|record| {
                let trigrams = self.record_trigrams(&record);
                (record, trigrams)
            })
            .collect();
        let count = prepared.len();

        let mut state = self.write();
        state.clear();
        for (record, trigrams) in prepared {
            state.insert(record, trigrams);
        }
        state.built_at = Some(Utc::now());

        tracing::debug!(
            records = count,
            documents = state.documents.len(),
            trigrams = state.postings.len(),
            "built trigram index"
        );
    }

    /// Add or replace one record without touching other records' postings.
    ///
    /// Postings contributed by a previous version of the same record are not
    /// removed.
    pub fn update_item(&self, record: R) {
        let trigrams = self.record_trigrams(&record);
        let mut state = self.write();
        state.insert(record, trigrams);
    }

    /// Search with [`DEFAULT_THRESHOLD`].
    pub fn search(&self, query: &str) -> Vec<ScoredRecord<R>> {
        self.search_with_threshold(query, DEFAULT_THRESHOLD)
    }

    /// Rank records against a free-text query.
    ///
    /// Returns records scoring at least `threshold`, best first. Ties keep no
    /// particular order. Blank queries and queries with no token of three or
    /// more characters return nothing.
    pub fn search_with_threshold(&self, query: &str, threshold: f64) -> Vec<ScoredRecord<R>> {
        let query_trigrams = text_trigrams(&self.normalizer, query);
        if query_trigrams.is_empty() {
            return Vec::new();
        }
        let total = query_trigrams.len() as f64;

        let state = self.read();
        let mut counts: HashMap<&R::Id, usize> = HashMap::new();
        for trigram in &query_trigrams {
            if let Some(ids) = state.postings.get(trigram) {
                for id in ids {
                    *counts.entry(id).or_insert(0) += 1;
                }
            }
        }
        let candidates = counts.len();

        let mut results: Vec<ScoredRecord<R>> = counts
            .into_iter()
            .filter_map(|(id, count)| {
                let score = count as f64 / total;
                if score < threshold {
                    return None;
                }
                match state.documents.get(id) {
                    Some(record) => Some(ScoredRecord {
                        record: record.clone(),
                        score,
                    }),
                    None => {
                        tracing::debug!(id = ?id, "posting without document, skipping");
                        None
                    }
                }
            })
            .collect();
        drop(state);

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        tracing::debug!(
            query_trigrams = query_trigrams.len(),
            candidates,
            results = results.len(),
            "trigram search"
        );

        results
    }

    /// Look up a stored record by id.
    pub fn get(&self, id: &R::Id) -> Option<R> {
        self.read().documents.get(id).cloned()
    }

    /// Number of records in the document store.
    pub fn len(&self) -> usize {
        self.read().documents.len()
    }

    /// Whether the document store is empty.
    pub fn is_empty(&self) -> bool {
        self.read().documents.is_empty()
    }

    /// Current size and build time.
    pub fn stats(&self) -> IndexStats {
        let state = self.read();
        IndexStats {
            documents: state.documents.len(),
            trigrams: state.postings.len(),
            postings: state.postings.values().map(HashSet::len).sum(),
            built_at: state.built_at,
        }
    }

    fn record_trigrams(&self, record: &R) -> HashSet<Trigram> {
        let text = record.searchable_text(&self.fields);
        text_trigrams(&self.normalizer, &text).into_iter().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexState<R>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState<R>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::trigram::{generate_trigrams, tokenize};
    use crate::record::{Document, RecordId};

    fn job(id: &str, title: &str) -> Document {
        Document::new(id).with_field("title", title)
    }

    fn developers() -> TrigramIndex<Document> {
        TrigramIndex::from_records(
            vec![
                job("1", "Senior React Developer"),
                job("2", "Backend Node.js Developer"),
            ],
            ["title"],
        )
    }

    fn ids(results: &[ScoredRecord<Document>]) -> Vec<String> {
        results.iter().map(|r| r.record.id.to_string()).collect()
    }

    #[test]
    fn test_common_word_matches_both_equally() {
        let index = developers();
        let results = index.search("Developer");

        assert_eq!(results.len(), 2);
        let mut found = ids(&results);
        found.sort();
        assert_eq!(found, vec!["1", "2"]);
        assert!((results[0].score - results[1].score).abs() < f64::EPSILON);
        assert!((results[0].score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_typo_still_matches_and_ranks_first() {
        let index = developers();
        let results = index.search("Reactt");

        assert!(!results.is_empty());
        assert_eq!(results[0].record.id, RecordId::from("1"));
        assert!(results[0].score >= DEFAULT_THRESHOLD);
        if let Some(other) = results.iter().find(|r| r.record.id == RecordId::from("2")) {
            assert!(other.score < results[0].score);
        }
    }

    #[test]
    fn test_typo_score_is_fraction_of_query_trigrams() {
        let index = developers();
        // " reactt " -> " re" "rea" "eac" "act" "ctt" "tt "; the first four
        // also occur in " react ".
        let results = index.search("reactt");
        assert!((results[0].score - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_overlap_returns_nothing() {
        let index = developers();
        assert!(index.search("xyz123").is_empty());
    }

    #[test]
    fn test_blank_queries_return_nothing() {
        let index = developers();
        assert!(index.search("").is_empty());
        assert!(index.search("   ").is_empty());
    }

    #[test]
    fn test_query_without_long_tokens_returns_nothing() {
        let index = developers();
        assert!(index.search("js").is_empty());
        assert!(index.search("a b c").is_empty());
        assert!(index.search("...!!!").is_empty());
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index: TrigramIndex<Document> = TrigramIndex::new(["title"]);
        assert!(index.is_empty());
        assert!(index.search("developer").is_empty());
    }

    #[test]
    fn test_repeated_query_trigrams_count_with_multiplicity() {
        let index = TrigramIndex::from_records(vec![job("1", "cat")], ["title"]);
        // Query "cat cats": 3 + 4 = 7 trigrams. Record "cat" has " ca", "cat",
        // "at ". Matches: " ca" x2, "cat" x2, "at " x1 = 5.
        let results = index.search("cat cats");
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 5.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_excludes_low_scores() {
        let index = developers();
        let loose = index.search_with_threshold("reactt", 0.0);
        assert!(!loose.is_empty());

        let strict = index.search_with_threshold("reactt", 0.9);
        assert!(strict.is_empty());
    }

    #[test]
    fn test_results_sorted_descending() {
        let index = TrigramIndex::from_records(
            vec![
                job("a", "rust"),
                job("b", "rusty"),
                job("c", "crust"),
            ],
            ["title"],
        );
        let results = index.search_with_threshold("rust", 0.0);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(results[0].record.id, RecordId::from("a"));
    }

    #[test]
    fn test_multiple_fields_indexed() {
        let index = TrigramIndex::from_records(
            vec![Document::new("1")
                .with_field("title", "Engineer")
                .with_field("company", "Yandex")],
            ["title", "company"],
        );
        assert_eq!(index.search("yandex").len(), 1);
        assert_eq!(index.search("engineer").len(), 1);
    }

    #[test]
    fn test_unlisted_fields_not_indexed() {
        let index = TrigramIndex::from_records(
            vec![Document::new("1")
                .with_field("title", "Engineer")
                .with_field("secret", "hidden")],
            ["title"],
        );
        assert!(index.search("hidden").is_empty());
    }

    #[test]
    fn test_cyrillic_yo_folding_matches() {
        let index = TrigramIndex::from_records(vec![job("1", "Ёлочный дизайнер")], ["title"]);
        let results = index.search("елочный");
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_posting_sets_have_no_duplicates() {
        let index = TrigramIndex::from_records(vec![job("1", "data data data")], ["title"]);
        let stats = index.stats();
        // " da", "dat", "ata", "ta " once each.
        assert_eq!(stats.trigrams, 4);
        assert_eq!(stats.postings, 4);
    }

    #[test]
    fn test_build_index_clears_previous_state() {
        let index = developers();
        index.build_index(vec![job("3", "Python Engineer")]);

        assert_eq!(index.len(), 1);
        assert!(index.get(&RecordId::from("1")).is_none());
        assert!(index.search("react").is_empty());
        assert_eq!(index.search("python").len(), 1);
    }

    #[test]
    fn test_build_index_sets_built_at() {
        let index: TrigramIndex<Document> = TrigramIndex::new(["title"]);
        assert!(index.stats().built_at.is_none());
        index.build_index(Vec::new());
        assert!(index.stats().built_at.is_some());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let records = vec![
            job("1", "Senior React Developer"),
            job("2", "Backend Node.js Developer"),
        ];
        let index = TrigramIndex::new(["title"]);
        index.build_index(records.clone());
        let first = index.stats();
        let mut before = ids(&index.search("developer"));
        index.build_index(records);
        let mut after = ids(&index.search("developer"));
        before.sort();
        after.sort();

        assert_eq!(before, after);
        assert_eq!(first.documents, index.stats().documents);
        assert_eq!(first.postings, index.stats().postings);
    }

    #[test]
    fn test_update_item_adds_new_record() {
        let index = developers();
        index.update_item(job("3", "Python Engineer"));

        assert_eq!(index.len(), 3);
        assert_eq!(ids(&index.search("python")), vec!["3"]);

        // "engineer" shares only "er " with "developer": 1 of 9 trigrams.
        let hits = index.search("developer");
        assert_eq!(hits.len(), 3);
        assert!((hits[0].score - 1.0).abs() < f64::EPSILON);
        assert!((hits[1].score - 1.0).abs() < f64::EPSILON);
        assert_eq!(hits[2].record.id, RecordId::from("3"));
        assert!((hits[2].score - 1.0 / 9.0).abs() < 1e-9);

        // Above that overlap, the original records are all that remain.
        let strict = index.search_with_threshold("developer", 0.5);
        let mut strict_ids = ids(&strict);
        strict_ids.sort();
        assert_eq!(strict_ids, vec!["1", "2"]);
    }

    #[test]
    fn test_update_item_keeps_stale_postings_until_rebuild() {
        let index = developers();
        let replacement = job("1", "Python Engineer");
        index.update_item(replacement.clone());

        // Document store holds the new version.
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&RecordId::from("1")), Some(replacement.clone()));

        // New text is searchable.
        assert_eq!(ids(&index.search("python")), vec!["1"]);

        // Old text still matches through stale postings, returning the new record.
        let stale = index.search("react");
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].record, replacement);

        // A full rebuild drops the stale postings.
        index.build_index(vec![replacement, job("2", "Backend Node.js Developer")]);
        assert!(index.search("react").is_empty());
        assert_eq!(ids(&index.search("python")), vec!["1"]);
    }

    #[test]
    fn test_missing_document_is_skipped() {
        let index = developers();
        {
            let mut state = index.write();
            state
                .postings
                .entry(Trigram::new([' ', 'g', 'h']))
                .or_default()
                .insert(RecordId::from("ghost"));
        }
        let results = index.search_with_threshold("gho", 0.0);
        assert!(results.is_empty());
    }

    #[test]
    fn test_integer_ids() {
        let index = TrigramIndex::from_records(
            vec![
                Document::new(10i64).with_field("title", "Designer"),
                Document::new(20i64).with_field("title", "Developer"),
            ],
            ["title"],
        );
        let results = index.search("designer");
        assert_eq!(results[0].record.id, RecordId::Int(10));
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        use std::sync::Arc;
        use std::thread;

        let index = Arc::new(developers());
        let mut handles = Vec::new();

        for i in 0..8 {
            let index = Arc::clone(&index);
            handles.push(thread::spawn(move || {
                if i % 4 == 0 {
                    index.update_item(job(&format!("w{}", i), "Rust Developer"));
                }
                for _ in 0..50 {
                    let results = index.search("developer");
                    assert!(results.len() >= 2);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.len(), 4);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_titles() -> impl Strategy<Value = Vec<String>> {
            prop::collection::vec("[a-zа-я]{1,8}( [a-zа-я]{1,8}){0,3}", 1..8)
        }

        fn build(titles: &[String]) -> TrigramIndex<Document> {
            let records = titles
                .iter()
                .enumerate()
                .map(|(i, t)| Document::new(i as i64).with_field("title", t.as_str()));
            TrigramIndex::from_records(records, ["title"])
        }

        proptest! {
            #[test]
            fn prop_scores_in_range_and_above_threshold(
                titles in arb_titles(),
                query in "[a-zа-я ]{0,16}",
                threshold in 0.0f64..1.0,
            ) {
                let index = build(&titles);
                for hit in index.search_with_threshold(&query, threshold) {
                    prop_assert!(hit.score > 0.0);
                    prop_assert!(hit.score <= 1.0);
                    prop_assert!(hit.score >= threshold);
                }
            }

            #[test]
            fn prop_every_indexed_token_finds_its_record(titles in arb_titles()) {
                let index = build(&titles);
                let normalizer = Normalizer::default();
                for (i, title) in titles.iter().enumerate() {
                    for token in tokenize(&normalizer, title) {
                        prop_assert!(!generate_trigrams(&token).is_empty());
                        let hits = index.search(&token);
                        let hit = hits.iter().find(|h| h.record.id == RecordId::Int(i as i64));
                        prop_assert!(hit.is_some_and(|h| h.score > 0.0));
                    }
                }
            }

            #[test]
            fn prop_rebuild_gives_identical_results(
                titles in arb_titles(),
                query in "[a-zа-я ]{0,16}",
            ) {
                let index = build(&titles);
                let collect = |index: &TrigramIndex<Document>| {
                    let mut hits: Vec<(String, u64)> = index
                        .search(&query)
                        .into_iter()
                        .map(|h| (h.record.id.to_string(), h.score.to_bits()))
                        .collect();
                    hits.sort();
                    hits
                };
                let before = collect(&index);
                let records: Vec<Document> = titles
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Document::new(i as i64).with_field("title", t.as_str()))
                    .collect();
                index.build_index(records);
                prop_assert_eq!(before, collect(&index));
            }
        }
    }
}
