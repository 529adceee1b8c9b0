//! Reference retrieval over a chunked source document.
//!
//! The pipeline only sees the [`Retriever`] trait. [`ChunkRetriever`] is the
//! built-in implementation: recursive character chunking plus term-frequency
//! cosine scoring.

use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use async_trait::async_trait;

use crate::log::Fragment;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fragments relevant to `query`, best first.
    async fn retrieve(&self, query: &str) -> Result<Vec<Fragment>>;
}

/// Chunking parameters, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunking {
    pub size: usize,
    pub overlap: usize,
}

impl Default for Chunking {
    fn default() -> Self {
        Self {
            size: 1000,
            overlap: 200,
        }
    }
}

const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl Chunking {
    /// Split `text` into chunks of at most `size` characters, preferring
    /// paragraph, then line, then word boundaries, with up to `overlap`
    /// characters carried between neighbours.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let rest = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if rest.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, rest));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        let join = |current: &VecDeque<&str>| -> Option<String> {
            let joined = current.iter().copied().collect::<Vec<_>>().join(separator);
            let trimmed = joined.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        for piece in pieces {
            let len = char_len(piece);
            let joining = if current.is_empty() { 0 } else { sep_len };
            if total + len + joining > self.size && !current.is_empty() {
                chunks.extend(join(&current));
                // Drop from the front until only the overlap is carried over.
                loop {
                    let joining = if current.is_empty() { 0 } else { sep_len };
                    let oversized = total > 0 && total + len + joining > self.size;
                    if total <= self.overlap && !oversized {
                        break;
                    }
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    let joined = if current.is_empty() { 0 } else { sep_len };
                    total = total.saturating_sub(char_len(first) + joined);
                }
            }
            current.push_back(piece);
            if current.len() > 1 {
                total += sep_len;
            }
            total += len;
        }
        chunks.extend(join(&current));
        chunks
    }
}

fn terms(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        *counts.entry(word.to_lowercase()).or_insert(0.0) += 1.0;
    }
    counts
}

fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm = |v: &HashMap<String, f64>| v.values().map(|x| x * x).sum::<f64>().sqrt();
    let denom = norm(a) * norm(b);
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// In-memory retriever over the chunks of one document.
pub struct ChunkRetriever {
    chunks: Vec<(String, HashMap<String, f64>)>,
    top_k: usize,
}

impl ChunkRetriever {
    pub fn from_text(text: &str, chunking: Chunking, top_k: usize) -> Self {
        let chunks: Vec<_> = chunking
            .split(text)
            .into_iter()
            .map(|chunk| {
                let vector = terms(&chunk);
                (chunk, vector)
            })
            .collect();
        tracing::info!(chunks = chunks.len(), top_k, "Indexed source document");
        Self { chunks, top_k }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl Retriever for ChunkRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Fragment>> {
        let query = terms(query);
        let mut scored: Vec<(usize, f64)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, (_, vector))| (i, cosine(&query, vector)))
            .collect();
        // Stable sort keeps document order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.top_k);
        tracing::debug!(?scored, "Retrieval scores");

        Ok(scored
            .into_iter()
            .map(|(chunk, _)| Fragment {
                chunk,
                content: self.chunks[chunk].0.clone(),
            })
            .collect())
    }
}
