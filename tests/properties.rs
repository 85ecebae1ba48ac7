//! Property tests for the invariants the highlighting pipeline relies on:
//! segmentation is lossless, normalization is idempotent, and a highlight
//! only ever adds one marker element around existing markup.

use proptest::prelude::*;
use wikifix::config::subsystems::{HighlighterConfig, SegmenterConfig};
use wikifix::highlighter::tree::MarkupTree;
use wikifix::{MatchCandidate, MatchTier, Segmenter, SpanHighlighter, TextNormalizer};

const WORDS: [&str; 7] = ["alpha", "beta", "gamma", "delta", "moon", "orbit", "1969"];

const FRAGMENTS: [&str; 18] = [
    "<p>", "</p>", "<div class=\"x\">", "</div>", "<a href=\"/wiki/A\">", "</a>",
    "<br>", "<!-- note -->", "Hello there. ", "It works! ", "why? ", "&amp; ",
    "<li>", "</li>", "x < y ", "<script>var a = '<p>';</script>", "<", "Ünïcødé. ",
];

fn markup_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS.to_vec()), 0..40)
        .prop_map(|pieces| pieces.concat())
}

/// Paragraphs of words, each word plain, bold or linked.
fn document_strategy() -> impl Strategy<Value = Vec<Vec<(usize, u8)>>> {
    prop::collection::vec(prop::collection::vec((0..WORDS.len(), 0u8..3), 1..8), 1..4)
}

fn render(paragraphs: &[Vec<(usize, u8)>]) -> String {
    let mut html = String::from("<html><body>");
    for words in paragraphs {
        html.push_str("<p>");
        let rendered: Vec<String> = words
            .iter()
            .map(|&(w, style)| match style {
                0 => WORDS[w].to_string(),
                1 => format!("<b>{}</b>", WORDS[w]),
                _ => format!("<a href=\"/wiki/{0}\" title=\"{0}\">{0}</a>", WORDS[w]),
            })
            .collect();
        html.push_str(&rendered.join(" "));
        html.push_str("</p>");
    }
    html.push_str("</body></html>");
    html
}

fn segmenter() -> Segmenter {
    Segmenter::new(SegmenterConfig::default())
}

proptest! {
    #[test]
    fn proptest_segmentation_is_lossless(doc in markup_strategy()) {
        let segments = segmenter().split(&doc);
        let rebuilt: String = segments.iter().map(|s| s.text).collect();
        prop_assert_eq!(rebuilt, doc.clone());

        let mut expected_start = 0;
        for segment in &segments {
            prop_assert_eq!(segment.range.start, expected_start);
            prop_assert_eq!(&doc[segment.range.clone()], segment.text);
            expected_start = segment.range.end;
        }
    }

    #[test]
    fn proptest_arbitrary_text_is_lossless(doc in "\\PC{0,200}") {
        let rebuilt: String = segmenter().split(&doc).iter().map(|s| s.text).collect();
        prop_assert_eq!(rebuilt, doc);
    }

    #[test]
    fn proptest_normalization_is_idempotent(text in "[a-zA-Z0-9 .,;:'\"()\\[\\]-]{0,80}") {
        let normalizer = TextNormalizer::new();
        let once = normalizer.normalize(&text);
        prop_assert_eq!(normalizer.normalize(&once), once.clone());
        prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
        prop_assert!(!once.contains("  "));
    }

    #[test]
    fn proptest_highlight_only_adds_one_marker(
        paragraphs in document_strategy(),
        pick in (0usize..4, 0usize..8, 1usize..4),
    ) {
        let doc = render(&paragraphs);
        let (p, start, len) = pick;
        let words = &paragraphs[p % paragraphs.len()];
        let start = start % words.len();
        let end = (start + len).min(words.len());
        let target: Vec<&str> = words[start..end].iter().map(|&(w, _)| WORDS[w]).collect();

        let highlighter = SpanHighlighter::new(HighlighterConfig {
            inject_assets: false,
            ..HighlighterConfig::default()
        });
        let candidate = MatchCandidate::new(target.join(" "), MatchTier::Exact, Some(1.0));
        let (marked, ok) = highlighter.highlight(&doc, &candidate);

        // The target is present, so a highlight is always placed
        prop_assert!(ok);

        let open = format!(
            "<span class=\"{}\" id=\"{}\">",
            highlighter.config().class_exact,
            highlighter.element_id(&candidate)
        );
        prop_assert_eq!(marked.matches(&open).count(), 1);
        prop_assert_eq!(marked.matches("</span>").count(), 1);

        let restored = marked.replacen(&open, "", 1).replacen("</span>", "", 1);
        prop_assert_eq!(restored, doc);

        let tree = MarkupTree::parse(&marked, 512);
        prop_assert!(tree.is_ok());
        let tree = tree.unwrap();
        let span = tree.elements_named("span").next();
        prop_assert!(span.is_some());
        let span = span.unwrap();
        prop_assert!(span.close.is_some());
    }
}
