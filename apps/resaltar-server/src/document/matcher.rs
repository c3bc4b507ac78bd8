//! Phrase matcher
//!
//! Streaming multi-word match over the OCR word sequence. The phrase is
//! split on single spaces; each phrase word must appear, in order, as a
//! lowercase substring of a document word. Progress lives in a match
//! buffer that is cleared at every page boundary and on any mismatch, so
//! matches never span pages and overlapping candidates are not revisited.

use crate::ocr::{OcrPage, OcrWord};

/// One completed match: consecutive words on a single page
#[derive(Debug)]
pub struct PhraseMatch<'a> {
    pub page_index: usize,
    pub words: Vec<&'a OcrWord>,
}

/// Find every occurrence of `phrase` across the document.
///
/// An empty phrase matches nothing. A mismatch drops the buffered words
/// outright and the current word is only reconsidered as a fresh start of
/// the phrase; earlier buffer positions are never re-tried.
pub fn match_phrase<'a>(pages: &'a [OcrPage], phrase: &str) -> Vec<PhraseMatch<'a>> {
    if phrase.is_empty() {
        return Vec::new();
    }
    let targets: Vec<String> = phrase.split(' ').map(|word| word.to_lowercase()).collect();

    let mut matches = Vec::new();
    for (page_index, page) in pages.iter().enumerate() {
        let mut buffer: Vec<&OcrWord> = Vec::new();

        for paragraph in &page.paragraphs {
            for line in &paragraph.lines {
                for word in &line.words {
                    let lowered = word.text.to_lowercase();
                    let hit = targets
                        .get(buffer.len())
                        .map(|target| lowered.contains(target.as_str()))
                        .unwrap_or(false);

                    if hit {
                        buffer.push(word);
                    } else {
                        buffer.clear();
                        if let Some(first) = targets.first() {
                            if lowered.contains(first.as_str()) {
                                buffer.push(word);
                            }
                        }
                    }

                    if buffer.len() == targets.len() {
                        matches.push(PhraseMatch {
                            page_index,
                            words: std::mem::take(&mut buffer),
                        });
                    }
                }
            }
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::flatten::fixtures::pages;

    fn matched_texts<'a>(m: &'a PhraseMatch<'a>) -> Vec<&'a str> {
        m.words.iter().map(|word| word.text.as_str()).collect()
    }

    #[test]
    fn test_match_is_case_insensitive_substring_per_word() {
        let pages = pages(&[&[&["The", "Category", "dogma", "rests"]]]);
        let matches = match_phrase(&pages, "cat dog");

        assert_eq!(matches.len(), 1);
        assert_eq!(matched_texts(&matches[0]), vec!["Category", "dogma"]);
    }

    #[test]
    fn test_single_word_phrase_matches_every_containing_word() {
        let pages = pages(&[&[&["cat", "catalog", "dog", "scatter"]]]);
        let matches = match_phrase(&pages, "cat");

        assert_eq!(matches.len(), 3);
        assert_eq!(matched_texts(&matches[0]), vec!["cat"]);
        assert_eq!(matched_texts(&matches[1]), vec!["catalog"]);
        assert_eq!(matched_texts(&matches[2]), vec!["scatter"]);
    }

    #[test]
    fn test_matches_never_span_pages() {
        let pages = pages(&[&[&["linger", "hidden"]], &[&["treasure", "map"]]]);
        assert!(match_phrase(&pages, "hidden treasure").is_empty());
    }

    #[test]
    fn test_matches_cross_paragraphs_within_a_page() {
        let pages = pages(&[&[&["ends", "with", "hidden"], &["treasure", "inside"]]]);
        let matches = match_phrase(&pages, "hidden treasure");

        assert_eq!(matches.len(), 1);
        assert_eq!(matched_texts(&matches[0]), vec!["hidden", "treasure"]);
    }

    #[test]
    fn test_failed_partial_match_restarts_at_current_word() {
        let pages = pages(&[&[&["a", "a", "b"]]]);
        let matches = match_phrase(&pages, "a b");

        // the first "a" is discarded; the match anchors at the second
        assert_eq!(matches.len(), 1);
        let anchored = &matches[0];
        assert_eq!(matched_texts(anchored), vec!["a", "b"]);
        let second_a = &pages[0].paragraphs[0].lines[0].words[1];
        assert!(std::ptr::eq(anchored.words[0], second_a));
    }

    #[test]
    fn test_overlapping_candidates_are_not_found() {
        // "a a" occurs twice if overlaps were allowed (words 0-1 and 1-2);
        // the buffer consumes words, so only the first is reported
        let pages = pages(&[&[&["a", "a", "a"]]]);
        let matches = match_phrase(&pages, "a a");

        assert_eq!(matches.len(), 1);
        let first = &pages[0].paragraphs[0].lines[0].words[0];
        assert!(std::ptr::eq(matches[0].words[0], first));
    }

    #[test]
    fn test_empty_phrase_matches_nothing() {
        let pages = pages(&[&[&["anything", "at", "all"]]]);
        assert!(match_phrase(&pages, "").is_empty());
    }

    #[test]
    fn test_repeated_phrase_found_multiple_times() {
        let pages = pages(&[
            &[&["ping", "pong", "ping", "pong"]],
            &[&["ping", "pong"]],
        ]);
        let matches = match_phrase(&pages, "ping pong");

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].page_index, 0);
        assert_eq!(matches[2].page_index, 1);
    }

    #[test]
    fn test_phrase_longer_than_page_never_completes() {
        let pages = pages(&[&[&["uno", "dos"]]]);
        assert!(match_phrase(&pages, "uno dos tres").is_empty());
    }
}
