use anyhow::{Context, Result};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

use super::SummaryProvider;

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "also", "because", "been", "before", "being", "could", "does",
    "doing", "from", "have", "having", "here", "into", "just", "more", "most", "only", "other",
    "over", "same", "should", "some", "such", "than", "that", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "very", "want", "were", "what", "when", "where",
    "which", "while", "will", "with", "would", "your", "yeah", "okay", "right", "think", "know",
];

/// Local summarizer: keeps the highest scoring sentences in their original
/// order, scoring each sentence by the frequency of its content words.
pub struct ExtractiveProvider {
    max_sentences: usize,
}

impl ExtractiveProvider {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }

    pub fn summarize_text(&self, text: &str) -> String {
        let sentences = split_sentences(text);
        if sentences.len() <= self.max_sentences {
            return sentences.join(" ");
        }

        let frequencies = word_frequencies(&sentences);
        let mut scored: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(index, sentence)| (index, score_sentence(sentence, &frequencies)))
            .collect();

        // Highest score first, earlier sentence wins ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut keep: Vec<usize> = scored
            .into_iter()
            .take(self.max_sentences)
            .map(|(index, _)| index)
            .collect();
        keep.sort_unstable();

        debug!(
            "Kept {} of {} sentences for summary",
            keep.len(),
            sentences.len()
        );

        keep.into_iter()
            .map(|index| sentences[index].as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl SummaryProvider for ExtractiveProvider {
    fn name(&self) -> &'static str {
        "Extractive summarizer"
    }

    fn summarize<'a>(
        &'a self,
        transcript: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let text = transcript.to_string();
            let provider = Self::new(self.max_sentences);
            tokio::task::spawn_blocking(move || provider.summarize_text(&text))
                .await
                .context("Extractive summarizer task failed")
        })
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        for ch in line.trim().chars() {
            current.push(ch);
            if matches!(ch, '.' | '!' | '?') {
                push_sentence(&mut sentences, &mut current);
            }
        }
        // A segment boundary ends a sentence even without punctuation.
        push_sentence(&mut sentences, &mut current);
    }

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if sentence.chars().any(char::is_alphanumeric) {
        sentences.push(sentence.to_string());
    }
    current.clear();
}

fn content_words(sentence: &str) -> impl Iterator<Item = String> + '_ {
    sentence
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|word| word.to_lowercase())
        .filter(|word| word.chars().count() > 3 && !STOP_WORDS.contains(&word.as_str()))
}

fn word_frequencies(sentences: &[String]) -> HashMap<String, usize> {
    let mut frequencies = HashMap::new();
    for sentence in sentences {
        for word in content_words(sentence) {
            *frequencies.entry(word).or_insert(0) += 1;
        }
    }
    frequencies
}

fn score_sentence(sentence: &str, frequencies: &HashMap<String, usize>) -> f64 {
    let words: Vec<String> = content_words(sentence).collect();
    if words.is_empty() {
        return 0.0;
    }
    let total: usize = words
        .iter()
        .map(|word| frequencies.get(word).copied().unwrap_or(0))
        .sum();
    total as f64 / words.len() as f64
}
