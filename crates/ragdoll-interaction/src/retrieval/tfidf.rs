//! TF-IDF vectorizer and cosine similarity.
//!
//! The vocabulary is learned once from the chunk corpus of a document and then
//! frozen, so query vectors share the chunk vectors' dimensions.

use std::collections::{HashMap, HashSet};

/// Maximum vocabulary size (number of unique tokens tracked).
const MAX_VOCAB_SIZE: usize = 16384;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "did", "do", "does", "for", "from",
    "had", "has", "have", "he", "her", "his", "how", "in", "is", "it", "its", "of", "on", "or",
    "she", "that", "the", "their", "them", "they", "this", "to", "was", "were", "what", "when",
    "where", "which", "who", "whom", "why", "with",
];

#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    token_to_idx: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfIdfVectorizer {
    /// Learns the vocabulary and inverse document frequencies of `corpus`.
    pub fn fit(corpus: &[String]) -> Self {
        let num_docs = corpus.len().max(1);

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let unique: HashSet<String> = tokenize(doc).into_iter().collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        let mut entries: Vec<(String, usize)> = doc_freq.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(MAX_VOCAB_SIZE);

        let mut token_to_idx = HashMap::with_capacity(entries.len());
        let mut idf = Vec::with_capacity(entries.len());
        for (idx, (token, freq)) in entries.into_iter().enumerate() {
            token_to_idx.insert(token, idx);
            // log(N / df) + 1 keeps tokens present in every chunk above zero
            idf.push(((num_docs as f32) / (freq as f32)).ln() + 1.0);
        }

        Self { token_to_idx, idf }
    }

    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// L2-normalised TF-IDF vector of `text`.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let dim = self.dimension();
        if dim == 0 {
            return Vec::new();
        }

        let tokens = tokenize(text);
        let total = tokens.len().max(1) as f32;

        let mut vector = vec![0.0f32; dim];
        for token in &tokens {
            if let Some(&idx) = self.token_to_idx.get(token) {
                vector[idx] += 1.0 / total;
            }
        }
        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let magnitude = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }
        vector
    }
}

/// Cosine similarity; 0.0 when either vector is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut mag_a, mut mag_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Lowercased alphanumeric words of two or more characters, minus stop words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 2 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "Arthas Menethil was the crown prince of Lordaeron.".to_string(),
            "Frostmourne is a runeblade forged by the Lich King.".to_string(),
            "Jaina Proudmoore studied magic in Dalaran.".to_string(),
        ]
    }

    #[test]
    fn tokenizer_drops_stop_words_and_short_tokens() {
        assert_eq!(tokenize("Who is Arthas? A prince!"), vec!["arthas", "prince"]);
    }

    #[test]
    fn query_is_closest_to_matching_chunk() {
        let corpus = corpus();
        let vectorizer = TfIdfVectorizer::fit(&corpus);
        let query = vectorizer.transform("Tell me about Frostmourne");

        let scores: Vec<f32> = corpus
            .iter()
            .map(|doc| cosine_similarity(&query, &vectorizer.transform(doc)))
            .collect();

        assert!(scores[1] > scores[0]);
        assert!(scores[1] > scores[2]);
    }

    #[test]
    fn vectors_are_normalised() {
        let vectorizer = TfIdfVectorizer::fit(&corpus());
        let vector = vectorizer.transform("Arthas prince Lordaeron");
        let magnitude: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }

    #[test]
    fn unknown_words_give_zero_similarity() {
        let vectorizer = TfIdfVectorizer::fit(&corpus());
        let query = vectorizer.transform("zeppelin");
        let doc = vectorizer.transform(&corpus()[0]);
        assert_eq!(cosine_similarity(&query, &doc), 0.0);
    }

    #[test]
    fn cosine_handles_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
