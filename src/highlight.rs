use std::borrow::Cow;

use article_analyst_contract::Language;
use kuchiki::{NodeData, NodeRef};

use crate::color::color_for_label;
use crate::dom::{has_class, new_element, tag_is};

pub const MARKER_CLASS: &str = "analyst-highlight";
pub const TOOLTIP_ATTR: &str = "data-tooltip";

// Content that is never visible text, plus markers we already inserted.
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "iframe", "noscript"];

/// One literal text to wrap, with the label it is shown under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightTarget {
    pub label: String,
    pub text: String,
    pub color: &'static str,
}

impl HighlightTarget {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        let label = label.into();
        let color = color_for_label(&label);
        Self {
            label,
            text: text.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSummary {
    pub targets: usize,
    pub markers: usize,
    pub missed: Vec<HighlightTarget>,
}

/// Rhetoric items first (label `type`, texts `text`/`text2`), then pattern items
/// (label `name`, texts `examples`), each in source order.
pub fn collect_targets(language: &Language) -> Vec<HighlightTarget> {
    let rhetoric = language.rhetoric.iter().flat_map(|item| {
        item.highlight_texts()
            .into_iter()
            .map(|text| HighlightTarget::new(item.label.as_str(), text))
    });
    let patterns = language.patterns.iter().flat_map(|item| {
        item.highlight_texts()
            .into_iter()
            .map(|text| HighlightTarget::new(item.label.as_str(), text))
    });
    rhetoric.chain(patterns).collect()
}

pub fn highlight_targets(root: &NodeRef, targets: &[HighlightTarget]) -> HighlightSummary {
    let mut summary = HighlightSummary {
        targets: targets.len(),
        ..HighlightSummary::default()
    };
    for target in targets {
        let markers = highlight_node(root, &target.text, &target.label, target.color);
        if markers == 0 {
            summary.missed.push(target.clone());
        }
        summary.markers += markers;
    }
    summary
}

pub fn highlight_language(root: &NodeRef, language: &Language) -> HighlightSummary {
    highlight_targets(root, &collect_targets(language))
}

/// Wraps every occurrence of `text` below `node` in a marker span.
/// Returns whether at least one occurrence was wrapped.
pub fn highlight_text(node: &NodeRef, text: &str, label: &str, color: &str) -> bool {
    highlight_node(node, text, label, color) > 0
}

fn highlight_node(node: &NodeRef, text: &str, label: &str, color: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    match node.data() {
        NodeData::Text(_) => wrap_text_node(node, text, label, color),
        NodeData::Element(_) => {
            if SKIPPED_TAGS.iter().any(|skip| tag_is(node, skip)) || has_class(node, MARKER_CLASS)
            {
                return 0;
            }
            highlight_children(node, text, label, color)
        }
        NodeData::Document(_) | NodeData::DocumentFragment => {
            highlight_children(node, text, label, color)
        }
        _ => 0,
    }
}

fn highlight_children(node: &NodeRef, text: &str, label: &str, color: &str) -> usize {
    // Wrapping inserts siblings; walk a snapshot, not the live chain.
    let children: Vec<NodeRef> = node.children().collect();
    children
        .iter()
        .map(|child| highlight_node(child, text, label, color))
        .sum()
}

fn wrap_text_node(node: &NodeRef, text: &str, label: &str, color: &str) -> usize {
    let mut current = node.clone();
    let mut markers = 0usize;
    loop {
        let Some(cell) = current.as_text() else {
            return markers;
        };
        let value = {
            let mut value = cell.borrow_mut();
            if let Cow::Owned(normalized) = normalize_whitespace(&value) {
                *value = normalized;
            }
            value.clone()
        };
        let Some(idx) = value.find(text) else {
            return markers;
        };
        let after = &value[idx + text.len()..];
        *cell.borrow_mut() = value[..idx].to_string();

        let marker = highlight_marker(text, label, color);
        current.insert_after(marker.clone());
        markers += 1;
        if after.is_empty() {
            return markers;
        }
        let remainder = NodeRef::new_text(after);
        marker.insert_after(remainder.clone());
        current = remainder;
    }
}

pub fn highlight_marker(text: &str, label: &str, color: &str) -> NodeRef {
    let tooltip = format!("Pattern: {label}");
    let style = format!("background-color: {color};");
    let marker = new_element(
        "span",
        &[
            ("class", MARKER_CLASS),
            ("style", style.as_str()),
            (TOOLTIP_ATTR, tooltip.as_str()),
        ],
    );
    marker.append(NodeRef::new_text(text));
    marker
}

/// Collapses every whitespace run (newlines included) to a single space.
/// Whitespace is the ECMAScript `\s` class, so pages fold the same way in the browser.
pub fn normalize_whitespace(text: &str) -> Cow<'_, str> {
    let needs_work = text
        .char_indices()
        .any(|(idx, ch)| is_js_space(ch) && (ch != ' ' || next_is_space(text, idx)));
    if !needs_work {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if is_js_space(ch) {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    Cow::Owned(out)
}

// Unicode White_Space minus U+0085, plus U+FEFF.
fn is_js_space(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' ' | '\u{A0}' | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}' | '\u{2029}' | '\u{202F}' | '\u{205F}' | '\u{3000}' | '\u{FEFF}'
    )
}

fn next_is_space(text: &str, idx: usize) -> bool {
    text[idx + 1..]
        .chars()
        .next()
        .map(is_js_space)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{get_attr, select_node};
    use article_analyst_contract::{PatternItem, RhetoricItem};
    use kuchiki::traits::TendrilSink;

    fn parse(body: &str) -> NodeRef {
        kuchiki::parse_html().one(format!("<html><head></head><body>{body}</body></html>"))
    }

    fn body_of(doc: &NodeRef) -> NodeRef {
        select_node(doc, "body").expect("body")
    }

    fn plain_texts(node: &NodeRef) -> Vec<String> {
        node.children()
            .filter_map(|child| child.as_text().map(|t| t.borrow().clone()))
            .filter(|text| !text.is_empty())
            .collect()
    }

    fn markers(root: &NodeRef) -> Vec<NodeRef> {
        root.select(".analyst-highlight")
            .map(|sel| sel.map(|el| el.as_node().clone()).collect())
            .unwrap_or_default()
    }

    fn sample_language() -> Language {
        Language {
            rhetoric: vec![RhetoricItem {
                label: "Dramatisierung".to_string(),
                text: Some("ein Desaster".to_string()),
                text2: Some("Untergang".to_string()),
                ..RhetoricItem::default()
            }],
            patterns: vec![PatternItem {
                label: "Framing".to_string(),
                examples: vec!["Heizhammer".to_string(), "Desaster".to_string()],
                ..PatternItem::default()
            }],
        }
    }

    #[test]
    fn wraps_every_occurrence_in_one_text_node() {
        let doc = parse("<p>A quick brown fox. A quick brown fox.</p>");
        let p = select_node(&doc, "p").expect("p");
        assert!(highlight_text(&body_of(&doc), "quick brown fox", "Framing", "#C1F4FF"));

        let found = markers(&doc);
        assert_eq!(found.len(), 2);
        for marker in &found {
            assert_eq!(marker.text_contents(), "quick brown fox");
            assert_eq!(get_attr(marker, TOOLTIP_ATTR).as_deref(), Some("Pattern: Framing"));
            assert_eq!(
                get_attr(marker, "style").as_deref(),
                Some("background-color: #C1F4FF;")
            );
        }
        assert_eq!(plain_texts(&p), vec!["A ", ". A ", "."]);
        assert_eq!(p.text_contents(), "A quick brown fox. A quick brown fox.");
    }

    #[test]
    fn whitespace_runs_collapse_before_matching() {
        assert_eq!(normalize_whitespace("line one\n   line two"), "line one line two");
        assert!(matches!(normalize_whitespace("one two"), Cow::Borrowed(_)));
        assert_eq!(normalize_whitespace("a\tb"), "a b");
        assert_eq!(normalize_whitespace("a\u{a0}\u{2003} b"), "a b");

        let doc = parse("<p>line one\n   line two</p>");
        let p = select_node(&doc, "p").expect("p");
        assert!(highlight_text(&p, "one line", "Framing", "#C1F4FF"));
        assert_eq!(p.text_contents(), "line one line two");
        assert_eq!(markers(&doc).len(), 1);
    }

    #[test]
    fn whitespace_class_follows_the_browser_regex() {
        assert_eq!(normalize_whitespace("a\u{feff}\u{feff}b"), "a b");
        assert!(matches!(normalize_whitespace("a\u{85}b"), Cow::Borrowed(_)));
        assert!(is_js_space('\u{feff}'));
        assert!(!is_js_space('\u{85}'));
        assert!(!is_js_space('\u{200b}'));
    }

    #[test]
    fn normalization_applies_even_without_a_match() {
        let doc = parse("<p>line one\n   line two</p>");
        let p = select_node(&doc, "p").expect("p");
        assert!(!highlight_text(&p, "absent", "Framing", "#C1F4FF"));
        assert_eq!(p.text_contents(), "line one line two");
    }

    #[test]
    fn missing_text_leaves_tree_unchanged() {
        let doc = parse("<div><p>Some <em>plain</em> text.</p><p>More text.</p></div>");
        let before_html = doc.to_string();
        let before_nodes = doc.descendants().count();
        assert!(!highlight_text(&doc, "not present", "Framing", "#C1F4FF"));
        assert_eq!(doc.to_string(), before_html);
        assert_eq!(doc.descendants().count(), before_nodes);
    }

    #[test]
    fn matches_do_not_span_tag_boundaries() {
        let doc = parse("<p>quick <b>brown</b> fox</p>");
        assert!(!highlight_text(&doc, "quick brown", "Framing", "#C1F4FF"));
        assert!(markers(&doc).is_empty());
    }

    #[test]
    fn non_content_elements_are_skipped() {
        let doc = parse(
            "<script>var t = 'Heizhammer';</script><style>.Heizhammer{}</style>\
             <noscript>Heizhammer</noscript><iframe>Heizhammer</iframe><p>Heizhammer</p>",
        );
        assert!(highlight_text(&doc, "Heizhammer", "Framing", "#C1F4FF"));
        let found = markers(&doc);
        assert_eq!(found.len(), 1);
        let parent = found[0].parent().expect("parent");
        assert!(tag_is(&parent, "p"));
    }

    #[test]
    fn markers_are_never_reentered() {
        let doc = parse("<p>A quick brown fox.</p><p>brown bear</p>");
        assert!(highlight_text(&doc, "quick brown fox", "Framing", "#C1F4FF"));
        assert!(highlight_text(&doc, "brown", "Ironie", "#D4FFC1"));
        assert_eq!(markers(&doc).len(), 2);
        let nested = doc
            .select(".analyst-highlight .analyst-highlight")
            .map(|sel| sel.count())
            .unwrap_or(0);
        assert_eq!(nested, 0);
        let second = select_node(&doc, "p + p .analyst-highlight").expect("second marker");
        assert_eq!(second.text_contents(), "brown");
    }

    #[test]
    fn tooltip_attribute_text_is_not_searched() {
        let doc = parse("<p>Heizhammer</p>");
        assert!(highlight_text(&doc, "Heizhammer", "Framing", "#C1F4FF"));
        assert!(!highlight_text(&doc, "Pattern", "Ironie", "#D4FFC1"));
        assert_eq!(markers(&doc).len(), 1);
    }

    #[test]
    fn empty_search_text_is_a_no_op() {
        let doc = parse("<p>text</p>");
        assert!(!highlight_text(&doc, "", "Framing", "#C1F4FF"));
        assert!(markers(&doc).is_empty());
    }

    #[test]
    fn targets_follow_item_then_text_order() {
        let targets = collect_targets(&sample_language());
        let pairs: Vec<(&str, &str)> = targets
            .iter()
            .map(|t| (t.label.as_str(), t.text.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Dramatisierung", "ein Desaster"),
                ("Dramatisierung", "Untergang"),
                ("Framing", "Heizhammer"),
                ("Framing", "Desaster"),
            ]
        );
        assert_eq!(targets[0].color, "#90ee90");
        assert_eq!(targets[2].color, color_for_label("Framing"));
    }

    #[test]
    fn batch_reports_markers_and_misses() {
        let doc = parse("<p>Das ist ein Desaster, ein Desaster!</p><p>Der Heizhammer kommt.</p>");
        let summary = highlight_language(&doc, &sample_language());
        assert_eq!(summary.targets, 4);
        assert_eq!(summary.markers, 3);
        let missed: Vec<&str> = summary.missed.iter().map(|t| t.text.as_str()).collect();
        // "Desaster" only occurs inside the earlier "ein Desaster" markers.
        assert_eq!(missed, vec!["Untergang", "Desaster"]);
    }

    #[test]
    fn batch_on_fresh_copies_is_reproducible() {
        let page = "<article><h1>Titel</h1><p>Das ist\n  ein Desaster.</p>\
                    <p>Heizhammer und Heizhammer.</p></article>";
        let first = parse(page);
        let second = parse(page);
        highlight_language(&first, &sample_language());
        highlight_language(&second, &sample_language());
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(markers(&first).len(), 3);
    }
}
