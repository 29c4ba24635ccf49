//! TF-IDF text vectorization over word n-grams.
//!
//! ## Pipeline
//! 1. Lowercase, split into tokens of 2+ word characters (letters, digits, `_`)
//! 2. Build n-grams over the token sequence, joined by a single space
//! 3. Drop terms found in fewer than `min_df` documents
//! 4. Keep the `max_features` terms with the highest corpus frequency
//! 5. Weight raw counts by smooth idf `ln((1 + n) / (1 + df)) + 1`
//! 6. L2-normalize each document row
//!
//! Vocabulary columns are assigned in alphabetical term order, so a fitted
//! vocabulary depends only on the corpus and the settings.

use anyhow::{bail, Result};
use sprs::{CsMat, TriMat};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Shortest token kept by the tokenizer
const MIN_TOKEN_CHARS: usize = 2;

/// Configurable TF-IDF vectorizer (builder style)
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfVectorizer {
    ngram_range: (usize, usize),
    min_df: usize,
    max_features: Option<usize>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfVectorizer {
    /// Unigrams only, every term kept
    pub fn new() -> Self {
        Self {
            ngram_range: (1, 1),
            min_df: 1,
            max_features: None,
        }
    }

    /// Inclusive n-gram range, e.g. `(1, 2)` for unigrams and bigrams
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    /// Minimum number of documents a term must appear in (default: 1)
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    /// Cap on vocabulary size (default: unlimited)
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Learn the vocabulary and idf weights from a corpus
    pub fn fit<S: AsRef<str>>(&self, documents: &[S]) -> Result<TfidfVocabulary> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            bail!("Invalid n-gram range ({}, {})", min_n, max_n);
        }
        if documents.is_empty() {
            bail!("Cannot fit TF-IDF on an empty corpus");
        }

        let n_docs = documents.len();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let counts = term_counts(doc.as_ref(), self.ngram_range);
            for (term, count) in counts {
                *term_freq.entry(term.clone()).or_insert(0) += count;
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.min_df)
            .collect();

        if let Some(limit) = self.max_features {
            if kept.len() > limit {
                kept.sort_by(|(a, _), (b, _)| term_freq[b].cmp(&term_freq[a]).then(a.cmp(b)));
                kept.truncate(limit);
            }
        }

        if kept.is_empty() {
            bail!(
                "No terms left after pruning (min_df = {}, {} documents)",
                self.min_df,
                n_docs
            );
        }

        // BTreeMap iterates alphabetically
        let by_term: BTreeMap<String, usize> = kept.into_iter().collect();
        let mut terms = Vec::with_capacity(by_term.len());
        let mut idf = Vec::with_capacity(by_term.len());
        for (term, df) in by_term {
            idf.push(smooth_idf(n_docs, df));
            terms.push(term);
        }

        let index = terms
            .iter()
            .enumerate()
            .map(|(column, term)| (term.clone(), column))
            .collect();

        debug!(documents = n_docs, vocabulary = terms.len(), "TF-IDF vocabulary fitted");

        Ok(TfidfVocabulary {
            terms,
            index,
            idf,
            ngram_range: self.ngram_range,
        })
    }

    /// Fit on a corpus and return its document-term matrix
    pub fn fit_transform<S: AsRef<str>>(
        &self,
        documents: &[S],
    ) -> Result<(TfidfVocabulary, CsMat<f64>)> {
        let vocabulary = self.fit(documents)?;
        let matrix = vocabulary.transform(documents);
        Ok((vocabulary, matrix))
    }
}

/// A fitted vocabulary with idf weights
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfVocabulary {
    /// Terms in column order (alphabetical)
    terms: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_range: (usize, usize),
}

impl TfidfVocabulary {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Vectorize documents against this vocabulary.
    ///
    /// Terms outside the vocabulary are ignored; a document with none of
    /// the known terms becomes an empty row.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> CsMat<f64> {
        let mut triplets = TriMat::new((documents.len(), self.terms.len()));

        for (row, doc) in documents.iter().enumerate() {
            let weights: Vec<(usize, f64)> = term_counts(doc.as_ref(), self.ngram_range)
                .into_iter()
                .filter_map(|(term, count)| {
                    let column = self.column(&term)?;
                    Some((column, count as f64 * self.idf[column]))
                })
                .collect();

            let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm == 0.0 {
                continue;
            }
            for (column, weight) in weights {
                triplets.add_triplet(row, column, weight / norm);
            }
        }

        triplets.to_csr()
    }
}

/// Cosine similarity of a dense `profile` to every row of `matrix`.
///
/// Rows (or a profile) with zero norm score 0.
pub fn cosine_similarity(profile: &[f64], matrix: &CsMat<f64>) -> Vec<f64> {
    let profile_norm = profile.iter().map(|v| v * v).sum::<f64>().sqrt();

    matrix
        .outer_iterator()
        .map(|row| {
            let mut dot = 0.0;
            let mut row_norm = 0.0;
            for (column, &value) in row.iter() {
                dot += value * profile.get(column).copied().unwrap_or(0.0);
                row_norm += value * value;
            }
            let denominator = profile_norm * row_norm.sqrt();
            if denominator == 0.0 {
                0.0
            } else {
                dot / denominator
            }
        })
        .collect()
}

fn smooth_idf(n_docs: usize, df: usize) -> f64 {
    ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0
}

/// Lowercased word tokens of at least `MIN_TOKEN_CHARS` characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Raw n-gram counts for one document
fn term_counts(text: &str, (min_n, max_n): (usize, usize)) -> HashMap<String, usize> {
    let tokens = tokenize(text);
    let mut counts = HashMap::new();

    for n in min_n..=max_n {
        if n == 0 {
            continue;
        }
        for window in tokens.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    counts
}
