//! Highlighted snippet generation under a fixed word budget.

use crate::crawler::clean_document;
use crate::lemmatizer::TextNormalizer;

/// Total word budget of one snippet.
const SNIPPET_WORD_BUDGET: usize = 40;
/// Streams at most this long are emitted whole; the match counter is also
/// capped here.
const MAX_TAGGED_WORDS: usize = 8;

/// Build a snippet for a page from its stored content snapshot, bolding
/// tokens that morphologically match a query lemma.
pub fn build_snippet(normalizer: &TextNormalizer, content: &str, lemmas: &[String]) -> String {
    let text = clean_document(content);
    let mut tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();

    let mut matches = 0usize;
    for token in tokens.iter_mut() {
        if lemmas.iter().any(|lemma| confirms(normalizer, token, lemma)) {
            *token = format!("<b>{}</b>", token);
            matches += 1;
        }
    }
    if matches == 0 {
        return String::new();
    }
    if tokens.len() <= MAX_TAGGED_WORDS {
        return tokens.join(" ");
    }

    let matches = matches.min(MAX_TAGGED_WORDS);
    let window = (SNIPPET_WORD_BUDGET - matches) / matches;

    // One window per bolded token: the token plus up to `window` following
    // tokens, clipped at the stream's end, concatenated in document order.
    let mut out: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].starts_with("<b>") {
            let end = (i + window + 1).min(tokens.len());
            for token in &tokens[i..end] {
                out.push(token);
            }
            i = end;
        } else {
            i += 1;
        }
    }
    out.join(" ").trim().to_string()
}

/// Cheap two-character prefix pre-filter, then morphological
/// confirmation: the stripped token's normal forms contain the lemma, or
/// the stripped token starts with it.
fn confirms(normalizer: &TextNormalizer, token: &str, lemma: &str) -> bool {
    let token_prefix: Vec<char> = token.to_lowercase().chars().take(2).collect();
    let lemma_prefix: Vec<char> = lemma.chars().take(2).collect();
    if token_prefix.len() < 2 || lemma_prefix.len() < 2 || token_prefix != lemma_prefix {
        return false;
    }
    let stripped: String = token
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    if stripped.is_empty() {
        return false;
    }
    normalizer.normal_forms(&stripped).iter().any(|f| f == lemma)
        || stripped.starts_with(lemma)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<html><head><title>T</title></head><body>{}</body></html>", body)
    }

    fn lemmas(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn no_match_yields_empty_snippet() {
        let normalizer = TextNormalizer::new();
        let snippet = build_snippet(&normalizer, &page("nothing relevant here"), &lemmas(&["cat"]));
        assert!(snippet.is_empty());
    }

    #[test]
    fn short_stream_is_emitted_whole() {
        let normalizer = TextNormalizer::new();
        // Title token plus three body tokens: four in total.
        let snippet = build_snippet(&normalizer, &page("big cat sleeps"), &lemmas(&["cat"]));
        assert_eq!(snippet, "T big <b>cat</b> sleeps");
    }

    #[test]
    fn inflected_forms_are_bolded() {
        let normalizer = TextNormalizer::new();
        let snippet = build_snippet(&normalizer, &page("many cats sleep"), &lemmas(&["cat"]));
        assert!(snippet.contains("<b>cats</b>"));
    }

    #[test]
    fn long_stream_emits_windows_around_matches() {
        let normalizer = TextNormalizer::new();
        let filler = "one two three four five six seven eight nine ten";
        let body = format!("{filler} dog {filler}");
        let snippet = build_snippet(&normalizer, &page(&body), &lemmas(&["dog"]));
        // Output starts at the bolded token, not at the stream start.
        assert!(snippet.starts_with("<b>dog</b>"));
        assert!(snippet.contains("one"));
    }

    #[test]
    fn many_matches_shrink_the_windows() {
        let normalizer = TextNormalizer::new();
        let body = "dog x ".repeat(30);
        let snippet = build_snippet(&normalizer, &page(&body), &lemmas(&["dog"]));
        assert!(snippet.contains("<b>dog</b>"));
        // Budget holds: window = (40 - 8) / 8 = 4 following tokens per match.
        let words: Vec<&str> = snippet.split_whitespace().collect();
        assert!(words.len() <= 31 * 5);
    }

    #[test]
    fn punctuated_tokens_still_confirm() {
        let normalizer = TextNormalizer::new();
        let snippet = build_snippet(&normalizer, &page("see the dog, it runs"), &lemmas(&["dog"]));
        assert!(snippet.contains("<b>dog,</b>"));
    }
}
