//! Splits a document into overlapping, sentence-aligned chunks.

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default overlap carried from the end of one chunk into the next, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Splits `text` into chunks of at most `chunk_size` characters.
///
/// Paragraphs are split into sentences and sentences are packed greedily.
/// Trailing sentences of a chunk that fit in `overlap` characters are repeated
/// at the start of the next chunk. A single sentence longer than `chunk_size`
/// is hard-split on character boundaries.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size / 2);

    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0;

    for sentence in segments(text, chunk_size) {
        let len = sentence.chars().count();
        if current_len + len > chunk_size && !current.is_empty() {
            chunks.push(current.join(" "));

            let carried = tail_within(&current, overlap);
            current_len = carried.iter().map(|s| s.chars().count() + 1).sum();
            current = carried;
            if current_len + len > chunk_size {
                current.clear();
                current_len = 0;
            }
        }
        current_len += len + 1;
        current.push(sentence);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Sentences of every paragraph, each at most `max_chars` long.
fn segments(text: &str, max_chars: usize) -> Vec<String> {
    text.split("\n\n")
        .flat_map(split_sentences)
        .flat_map(|sentence| hard_split(&sentence, max_chars))
        .collect()
}

fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = paragraph.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(if c == '\n' { ' ' } else { c });
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|next| next.is_whitespace());
        if at_boundary {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, sentence: &str) {
    let trimmed = sentence.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

fn hard_split(sentence: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = sentence.chars().collect();
    if chars.len() <= max_chars {
        return vec![sentence.to_string()];
    }
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect::<String>().trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn tail_within(sentences: &[String], budget: usize) -> Vec<String> {
    let mut tail = Vec::new();
    let mut used = 0;
    for sentence in sentences.iter().rev() {
        let len = sentence.chars().count() + 1;
        if used + len > budget {
            break;
        }
        used += len;
        tail.push(sentence.clone());
    }
    tail.reverse();
    tail
}
