//! Context assembly for the completion prompt.

use std::collections::HashSet;

use super::types::Citation;
use crate::index::SearchHit;

const SYSTEM_PREAMBLE: &str =
    "You are an AI assistant that answers questions based on the following document content.";
const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Answer returned when the provider produced no text.
pub(crate) const NO_ANSWER: &str = "No answer generated.";

/// Render ranked hits as `Page {n}: {text}` blocks.
pub(crate) fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("Page {}: {}", hit.entry.page_number, hit.entry.text))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Grounding system message for the completion call.
pub(crate) fn system_prompt(context: &str) -> String {
    format!("{SYSTEM_PREAMBLE}\n{context}")
}

/// Distinct cited pages in first-appearance order.
pub(crate) fn collect_citations(hits: &[SearchHit]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    hits.iter()
        .map(|hit| hit.entry.page_number)
        .filter(|page| seen.insert(*page))
        .map(|page| Citation { page })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VectorEntry;

    fn hit(page_number: u32, text: &str, score: f32) -> SearchHit {
        SearchHit {
            score,
            entry: VectorEntry {
                embedding: vec![1.0],
                page_number,
                text: text.into(),
            },
        }
    }

    #[test]
    fn context_keeps_ranked_order() {
        let hits = vec![hit(3, "Cherries are red.", 0.9), hit(1, "Apples are red.", 0.5)];
        assert_eq!(
            build_context(&hits),
            "Page 3: Cherries are red.\n---\nPage 1: Apples are red."
        );
    }

    #[test]
    fn empty_hits_render_empty_context() {
        assert_eq!(build_context(&[]), "");
        assert!(system_prompt("").starts_with(SYSTEM_PREAMBLE));
    }

    #[test]
    fn system_prompt_appends_context_after_preamble() {
        let prompt = system_prompt("Page 1: hello");
        assert_eq!(prompt, format!("{SYSTEM_PREAMBLE}\nPage 1: hello"));
    }

    #[test]
    fn citations_are_deduplicated_in_first_seen_order() {
        let hits = vec![
            hit(4, "d", 0.9),
            hit(2, "b", 0.8),
            hit(4, "d again", 0.7),
            hit(1, "a", 0.6),
            hit(2, "b again", 0.5),
        ];
        let pages: Vec<u32> = collect_citations(&hits)
            .into_iter()
            .map(|citation| citation.page)
            .collect();
        assert_eq!(pages, vec![4, 2, 1]);
    }
}
