//! Splitting of free text into bounded pieces for services with input limits.

const SENTENCE_TERMINATORS: [char; 7] = ['.', '!', '?', ';', '…', '।', '。'];

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Sentences are kept together when they fit; longer sentences break at
/// whitespace, and single words longer than the limit are cut. Pieces keep
/// the original word order and never start or end with whitespace.
pub fn split_into_batches(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut batches = Vec::new();
    let mut current = String::new();

    for piece in sentences(text)
        .into_iter()
        .flat_map(|sentence| fit_to_limit(sentence, max_chars))
    {
        if !current.is_empty() && char_len(&current) + 1 + char_len(&piece) > max_chars {
            batches.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&piece);
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn sentences(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !SENTENCE_TERMINATORS.contains(&c) {
            continue;
        }
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            result.push(text[start..end].trim());
            start = end;
        }
    }
    result.push(text[start..].trim());

    result.retain(|sentence| !sentence.is_empty());
    result
}

fn fit_to_limit(sentence: &str, max_chars: usize) -> Vec<String> {
    if char_len(sentence) <= max_chars {
        return vec![sentence.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in sentence.split_whitespace() {
        if char_len(word) > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(chars.chunks(max_chars).map(|chunk| chunk.iter().collect::<String>()));
            continue;
        }
        if !current.is_empty() && char_len(&current) + 1 + char_len(word) > max_chars {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
