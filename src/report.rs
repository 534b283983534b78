//! Sidebar report document.
//!
//! The sidebar is a standalone HTML document loaded into the host frame. It is built as a
//! `kuchiki` tree and serialized, so every text and attribute value is escaped by the
//! serializer rather than by string formatting.

use article_analyst_contract::{
    AnalysisRecord, Argumentation, Context, Language, PatternItem, Quote, RhetoricItem,
};
use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;

use crate::color::color_for_label;
use crate::dom::{add_class, element_with_text, get_attr, new_element, remove_class, select_node};
use crate::feedback::{FeedbackStore, Vote, current_vote, storage_key};
use crate::message::SidebarMessage;

const SKELETON: &str = "<!DOCTYPE html><html lang=\"de\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>Article Analyst</title></head><body></body></html>";

const ACTIVE_CLASS: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTab {
    Argumentation,
    Language,
    Quotes,
    Context,
}

impl ReportTab {
    pub const ALL: [ReportTab; 4] = [
        ReportTab::Argumentation,
        ReportTab::Language,
        ReportTab::Quotes,
        ReportTab::Context,
    ];

    /// Section key, also used in feedback storage keys.
    pub fn key(&self) -> &'static str {
        match self {
            ReportTab::Argumentation => "argumentation",
            ReportTab::Language => "language",
            ReportTab::Quotes => "quotes",
            ReportTab::Context => "context",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportTab::Argumentation => "Argumentation",
            ReportTab::Language => "Sprache",
            ReportTab::Quotes => "Zitate",
            ReportTab::Context => "Kontext",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.key() == raw.trim())
    }

    fn panel_id(&self) -> String {
        format!("panel-{}", self.key())
    }
}

/// What the sidebar has to show for the requested article.
#[derive(Debug, Clone, Copy)]
pub enum SidebarContent<'a> {
    Report(&'a AnalysisRecord),
    Missing,
    LoadError(&'a str),
}

pub fn render_sidebar(
    article_id: &str,
    content: SidebarContent<'_>,
    feedback: &dyn FeedbackStore,
    stylesheet: &str,
) -> String {
    build_sidebar(article_id, content, feedback, stylesheet).to_string()
}

pub fn build_sidebar(
    article_id: &str,
    content: SidebarContent<'_>,
    feedback: &dyn FeedbackStore,
    stylesheet: &str,
) -> NodeRef {
    let document = kuchiki::parse_html().one(SKELETON);
    if let Some(head) = select_node(&document, "head") {
        head.append(element_with_text("style", &[], stylesheet));
    }
    let Some(body) = select_node(&document, "body") else {
        return document;
    };
    body.append(header(article_id, content));

    match content {
        SidebarContent::Report(record) => {
            body.append(tab_bar());
            for tab in ReportTab::ALL {
                body.append(panel(article_id, tab, record, feedback));
            }
        }
        SidebarContent::Missing => {
            body.append(element_with_text(
                "p",
                &[("class", "notice")],
                "Für diesen Artikel liegt noch keine Analyse vor.",
            ));
        }
        SidebarContent::LoadError(message) => {
            body.append(element_with_text(
                "p",
                &[("class", "error-message")],
                &format!("Die Analysedaten konnten nicht geladen werden: {message}"),
            ));
        }
    }
    document
}

/// Marks `tab` and its panel active and deactivates the others.
/// Returns `false` when the document has no such panel (error documents).
pub fn activate_tab(document: &NodeRef, tab: ReportTab) -> bool {
    if select_node(document, &format!("#{}", tab.panel_id())).is_none() {
        return false;
    }
    for other in ReportTab::ALL {
        let button = select_node(document, &format!(".tab-button[data-tab=\"{}\"]", other.key()));
        let panel = select_node(document, &format!("#{}", other.panel_id()));
        for node in button.iter().chain(panel.iter()) {
            if other == tab {
                add_class(node, ACTIVE_CLASS);
            } else {
                remove_class(node, ACTIVE_CLASS);
            }
        }
    }
    true
}

pub fn active_tab(document: &NodeRef) -> Option<ReportTab> {
    let button = select_node(document, ".tab-button.active")?;
    get_attr(&button, "data-tab").and_then(|key| ReportTab::from_key(&key))
}

fn header(article_id: &str, content: SidebarContent<'_>) -> NodeRef {
    let header = new_element("header", &[("class", "sidebar-header"), ("data-article", article_id)]);
    let title = new_element("div", &[]);
    title.append(element_with_text("h1", &[], "Article Analyst"));
    if let SidebarContent::Report(record) = content {
        let meta = new_element("div", &[("class", "meta")]);
        for value in [&record.metadata.text_type, &record.metadata.topic]
            .into_iter()
            .flatten()
        {
            meta.append(element_with_text("span", &[], value));
        }
        title.append(meta);
    }
    header.append(title);

    let close_message = SidebarMessage::CloseSidebar.to_json();
    header.append(element_with_text(
        "button",
        &[
            ("class", "close-button"),
            ("type", "button"),
            ("aria-label", "Schließen"),
            ("data-message", close_message.as_str()),
        ],
        "×",
    ));
    header
}

fn tab_bar() -> NodeRef {
    let bar = new_element("nav", &[("class", "tab-bar"), ("role", "tablist")]);
    for (idx, tab) in ReportTab::ALL.iter().enumerate() {
        let class = if idx == 0 { "tab-button active" } else { "tab-button" };
        bar.append(element_with_text(
            "button",
            &[("class", class), ("type", "button"), ("data-tab", tab.key())],
            tab.title(),
        ));
    }
    bar
}

fn panel(
    article_id: &str,
    tab: ReportTab,
    record: &AnalysisRecord,
    feedback: &dyn FeedbackStore,
) -> NodeRef {
    let class = if tab == ReportTab::ALL[0] {
        "tab-panel active"
    } else {
        "tab-panel"
    };
    let panel_id = tab.panel_id();
    let panel = new_element("section", &[("id", panel_id.as_str()), ("class", class)]);
    match tab {
        ReportTab::Argumentation => argumentation_panel(&panel, &record.argumentation),
        ReportTab::Language => language_panel(&panel, &record.language),
        ReportTab::Quotes => quotes_panel(&panel, &record.quotes),
        ReportTab::Context => context_panel(&panel, &record.context),
    }
    panel.append(feedback_widget(article_id, tab, feedback));
    panel
}

fn argumentation_panel(panel: &NodeRef, argumentation: &Argumentation) {
    labelled(panel, "thesis", "These", argumentation.thesis.as_deref());
    if !argumentation.arguments.is_empty() {
        panel.append(element_with_text("h2", &[], "Argumente"));
        let list = new_element("ul", &[("class", "arguments")]);
        for argument in &argumentation.arguments {
            let class = format!("card strength-{}", argument.strength.as_str());
            let item = new_element("li", &[("class", class.as_str())]);
            item.append(element_with_text("span", &[], &argument.text));
            item.append(element_with_text(
                "span",
                &[("class", "strength-badge")],
                strength_label(argument.strength.as_str()),
            ));
            if let Some(issue) = argument.issue.as_deref().filter(|s| !s.is_empty()) {
                item.append(element_with_text("p", &[("class", "argument-issue")], issue));
            }
            list.append(item);
        }
        panel.append(list);
    }
    labelled(panel, "conclusion", "Schlussfolgerung", argumentation.conclusion.as_deref());
}

fn strength_label(key: &str) -> &'static str {
    match key {
        "strong" => "stark",
        "medium" => "mittel",
        "weak" => "schwach",
        _ => "unbekannt",
    }
}

fn language_panel(panel: &NodeRef, language: &Language) {
    let labels = legend_labels(language);
    if !labels.is_empty() {
        let legend = new_element("ul", &[("class", "legend")]);
        for label in labels {
            let style = format!("background-color: {};", color_for_label(label));
            let item = new_element("li", &[("data-label", label)]);
            item.append(new_element("span", &[("class", "swatch"), ("style", style.as_str())]));
            item.append(NodeRef::new_text(label));
            legend.append(item);
        }
        panel.append(legend);
    }

    if !language.rhetoric.is_empty() {
        panel.append(element_with_text("h2", &[], "Rhetorische Mittel"));
        for item in &language.rhetoric {
            panel.append(rhetoric_card(item));
        }
    }
    if !language.patterns.is_empty() {
        panel.append(element_with_text("h2", &[], "Sprachmuster"));
        for item in &language.patterns {
            panel.append(pattern_card(item));
        }
    }
}

/// Distinct labels in highlight order: rhetoric first, then patterns.
fn legend_labels(language: &Language) -> Vec<&str> {
    let mut labels: Vec<&str> = Vec::new();
    let all = language
        .rhetoric
        .iter()
        .map(|item| item.label.as_str())
        .chain(language.patterns.iter().map(|item| item.label.as_str()));
    for label in all {
        if !label.is_empty() && !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

fn labelled_card(label: &str) -> NodeRef {
    let style = format!("border-left-color: {};", color_for_label(label));
    let card = new_element("article", &[("class", "card"), ("style", style.as_str())]);
    card.append(element_with_text("h3", &[], label));
    card
}

fn rhetoric_card(item: &RhetoricItem) -> NodeRef {
    let card = labelled_card(&item.label);
    for text in item.highlight_texts() {
        card.append(element_with_text("blockquote", &[], text));
    }
    card_details(&card, &item.description, &item.effect, &item.glossary);
    card
}

fn pattern_card(item: &PatternItem) -> NodeRef {
    let card = labelled_card(&item.label);
    let examples = item.highlight_texts();
    if !examples.is_empty() {
        let list = new_element("ul", &[("class", "examples")]);
        for example in examples {
            list.append(element_with_text("li", &[], example));
        }
        card.append(list);
    }
    card_details(&card, &item.description, &item.effect, &item.glossary);
    card
}

fn card_details(
    card: &NodeRef,
    description: &Option<String>,
    effect: &Option<String>,
    glossary: &Option<String>,
) {
    labelled(card, "description", "Beschreibung", description.as_deref());
    labelled(card, "effect", "Wirkung", effect.as_deref());
    labelled(card, "glossary", "Glossar", glossary.as_deref());
}

fn quotes_panel(panel: &NodeRef, quotes: &[Quote]) {
    if quotes.is_empty() {
        panel.append(element_with_text("p", &[("class", "empty")], "Keine Zitate gefunden."));
        return;
    }
    for quote in quotes {
        let card = new_element("figure", &[("class", "card quote")]);
        card.append(element_with_text("blockquote", &[], &quote.text));
        if let Some(source) = quote.source.as_deref().filter(|s| !s.is_empty()) {
            card.append(element_with_text("figcaption", &[], source));
        }
        labelled(&card, "effect", "Wirkung", quote.effect.as_deref());
        panel.append(card);
    }
}

fn context_panel(panel: &NodeRef, context: &Context) {
    if let Some(author) = &context.author {
        let card = new_element("div", &[("class", "card author")]);
        card.append(element_with_text("h2", &[], "Autor"));
        labelled(&card, "name", "Name", author.name.as_deref());
        labelled(&card, "description", "Profil", author.description.as_deref());
        panel.append(card);
    }

    if let Some(medium) = &context.medium {
        let card = new_element("div", &[("class", "card medium")]);
        card.append(element_with_text("h2", &[], "Medium"));
        labelled(&card, "name", "Name", medium.name.as_deref());
        labelled(&card, "description", "Profil", medium.description.as_deref());
        for metric in &medium.bias {
            card.append(bias_meter(&metric.label, metric.value));
        }
        labelled(&card, "reasoning", "Begründung", medium.reasoning.as_deref());
        panel.append(card);
    }

    if !context.related_articles.is_empty() {
        panel.append(element_with_text("h2", &[], "Weitere Artikel"));
        let list = new_element("ul", &[("class", "related")]);
        for article in &context.related_articles {
            let item = new_element("li", &[]);
            match article.url.as_deref().filter(|u| !u.is_empty()) {
                Some(url) => item.append(element_with_text(
                    "a",
                    &[("href", url), ("target", "_blank"), ("rel", "noopener noreferrer")],
                    &article.title,
                )),
                None => item.append(element_with_text("span", &[], &article.title)),
            }
            if let Some(source) = article.source.as_deref().filter(|s| !s.is_empty()) {
                item.append(element_with_text("span", &[("class", "source")], source));
            }
            list.append(item);
        }
        panel.append(list);
    }
}

/// Bias values are a 0-100 scale; out-of-range and non-finite values are clamped.
pub fn clamp_bias(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn bias_meter(label: &str, value: f64) -> NodeRef {
    let value = clamp_bias(value);
    let percent = format!("{value}");
    let style = format!("width: {value}%;");
    let meter = new_element("div", &[("class", "bias"), ("data-label", label)]);
    meter.append(element_with_text("span", &[("class", "bias-label")], label));
    let track = new_element(
        "div",
        &[
            ("class", "bias-track"),
            ("role", "meter"),
            ("aria-valuemin", "0"),
            ("aria-valuemax", "100"),
            ("aria-valuenow", percent.as_str()),
        ],
    );
    track.append(new_element("div", &[("class", "bias-fill"), ("style", style.as_str())]));
    meter.append(track);
    meter
}

fn feedback_widget(article_id: &str, tab: ReportTab, store: &dyn FeedbackStore) -> NodeRef {
    let key = storage_key(article_id, tab.key());
    let selected = current_vote(store, article_id, tab.key());
    let widget = new_element(
        "div",
        &[
            ("class", "feedback"),
            ("data-section", tab.key()),
            ("data-storage-key", key.as_str()),
        ],
    );
    widget.append(element_with_text("span", &[], "War diese Analyse hilfreich?"));
    for (vote, glyph, label) in [(Vote::Up, "👍", "Hilfreich"), (Vote::Down, "👎", "Nicht hilfreich")] {
        let class = if selected == Some(vote) {
            "feedback-button selected"
        } else {
            "feedback-button"
        };
        widget.append(element_with_text(
            "button",
            &[
                ("class", class),
                ("type", "button"),
                ("aria-label", label),
                ("data-vote", vote.as_str()),
            ],
            glyph,
        ));
    }
    widget
}

fn labelled(parent: &NodeRef, class: &str, label: &str, value: Option<&str>) {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return;
    };
    let paragraph = new_element("p", &[("class", class)]);
    paragraph.append(element_with_text("strong", &[], &format!("{label}: ")));
    paragraph.append(NodeRef::new_text(value));
    parent.append(paragraph);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{has_class, style_property};
    use crate::feedback::{MemoryFeedbackStore, cast_vote};
    use article_analyst_contract::AnalysisDataset;

    const PAYLOAD: &str = r#"{
        "article_5": {
            "metadata": {"textType": "Kommentar", "topic": "Heizungsgesetz"},
            "argumentation": {
                "thesis": "Das Gesetz ist überhastet.",
                "conclusion": "Es braucht mehr Zeit.",
                "arguments": [
                    {"text": "Kosten steigen", "strength": "stark"},
                    {"text": "Alle sind dagegen", "strength": "weak", "issue": "Pauschalisierung"}
                ]
            },
            "language": {
                "rhetoric": [{"type": "Dramatisierung", "text": "ein Desaster"}],
                "patterns": [
                    {"name": "Framing", "examples": ["Heizhammer"]},
                    {"name": "Dramatisierung", "examples": ["Untergang"]}
                ]
            },
            "quotes": [{"text": "Wir <müssen> handeln", "source": "Ministerin"}],
            "context": {
                "author": {"name": "A. Autor"},
                "medium": {
                    "name": "Tagesblatt",
                    "bias": [{"label": "links-rechts", "value": 140}, {"label": "Boulevard", "value": -5}],
                    "reasoning": "Eigentümerstruktur"
                },
                "relatedArticles": [
                    {"title": "Hintergrund", "url": "https://news.example/h"},
                    {"title": "Ohne Link", "source": "Archiv"}
                ]
            }
        }
    }"#;

    fn dataset() -> AnalysisDataset {
        AnalysisDataset::from_json_str(PAYLOAD).expect("payload")
    }

    fn count(doc: &NodeRef, selector: &str) -> usize {
        doc.select(selector).map(|s| s.count()).unwrap_or(0)
    }

    #[test]
    fn report_has_four_tabs_with_first_active() {
        let data = dataset();
        let record = data.get("article_5").expect("record");
        let doc = build_sidebar(
            "article_5",
            SidebarContent::Report(record),
            &MemoryFeedbackStore::new(),
            "body{margin:0}",
        );
        assert_eq!(count(&doc, ".tab-button"), 4);
        assert_eq!(count(&doc, ".tab-panel"), 4);
        assert_eq!(count(&doc, ".tab-panel.active"), 1);
        assert_eq!(active_tab(&doc), Some(ReportTab::Argumentation));
        assert!(select_node(&doc, "#panel-argumentation.active").is_some());
        assert_eq!(count(&doc, ".feedback"), 4);
        let meta = select_node(&doc, ".meta").expect("meta");
        assert_eq!(meta.text_contents(), "KommentarHeizungsgesetz");
    }

    #[test]
    fn arguments_carry_strength_classes_and_issues() {
        let data = dataset();
        let record = data.get("article_5").expect("record");
        let doc = build_sidebar("article_5", SidebarContent::Report(record), &MemoryFeedbackStore::new(), "");
        assert_eq!(count(&doc, ".arguments .strength-strong"), 1);
        let weak = select_node(&doc, ".arguments .strength-weak").expect("weak");
        let issue = select_node(&weak, ".argument-issue").expect("issue");
        assert_eq!(issue.text_contents(), "Pauschalisierung");
        let badge = select_node(&weak, ".strength-badge").expect("badge");
        assert_eq!(badge.text_contents(), "schwach");
    }

    #[test]
    fn legend_lists_each_label_once_with_host_colour() {
        let data = dataset();
        let record = data.get("article_5").expect("record");
        let doc = build_sidebar("article_5", SidebarContent::Report(record), &MemoryFeedbackStore::new(), "");
        let labels: Vec<String> = doc
            .select(".legend li")
            .map(|items| {
                items
                    .map(|item| item.attributes.borrow().get("data-label").unwrap_or("").to_string())
                    .collect()
            })
            .unwrap_or_default();
        assert_eq!(labels, vec!["Dramatisierung", "Framing"]);
        let swatch = select_node(&doc, ".legend li[data-label=\"Framing\"] .swatch").expect("swatch");
        assert_eq!(
            style_property(&swatch, "background-color").as_deref(),
            Some(color_for_label("Framing"))
        );
        let reserved = select_node(&doc, ".legend li .swatch").expect("first swatch");
        assert_eq!(style_property(&reserved, "background-color").as_deref(), Some("#90ee90"));
    }

    #[test]
    fn bias_meters_are_clamped() {
        assert_eq!(clamp_bias(140.0), 100.0);
        assert_eq!(clamp_bias(-5.0), 0.0);
        assert_eq!(clamp_bias(f64::NAN), 0.0);
        assert_eq!(clamp_bias(42.5), 42.5);

        let data = dataset();
        let record = data.get("article_5").expect("record");
        let doc = build_sidebar("article_5", SidebarContent::Report(record), &MemoryFeedbackStore::new(), "");
        let fills: Vec<Option<String>> = doc
            .select(".bias-fill")
            .map(|fills| fills.map(|f| style_property(f.as_node(), "width")).collect())
            .unwrap_or_default();
        assert_eq!(fills, vec![Some("100%".to_string()), Some("0%".to_string())]);
    }

    #[test]
    fn related_articles_link_only_with_url() {
        let data = dataset();
        let record = data.get("article_5").expect("record");
        let doc = build_sidebar("article_5", SidebarContent::Report(record), &MemoryFeedbackStore::new(), "");
        assert_eq!(count(&doc, ".related li"), 2);
        let link = select_node(&doc, ".related a").expect("link");
        assert_eq!(get_attr(&link, "href").as_deref(), Some("https://news.example/h"));
        assert_eq!(count(&doc, ".related a"), 1);
    }

    #[test]
    fn stored_votes_are_preselected() {
        let data = dataset();
        let record = data.get("article_5").expect("record");
        let mut store = MemoryFeedbackStore::new();
        cast_vote(&mut store, "article_5", "quotes", Vote::Down).expect("vote");
        let doc = build_sidebar("article_5", SidebarContent::Report(record), &store, "");

        let widget = select_node(&doc, ".feedback[data-section=\"quotes\"]").expect("widget");
        assert_eq!(
            get_attr(&widget, "data-storage-key").as_deref(),
            Some("feedback_article_5_quotes")
        );
        let down = select_node(&widget, "[data-vote=\"down\"]").expect("down");
        let up = select_node(&widget, "[data-vote=\"up\"]").expect("up");
        assert!(has_class(&down, "selected"));
        assert!(!has_class(&up, "selected"));
        assert_eq!(count(&doc, ".feedback-button.selected"), 1);
    }

    #[test]
    fn serialized_document_escapes_content_and_posts_close_message() {
        let data = dataset();
        let record = data.get("article_5").expect("record");
        let html = render_sidebar("article_5", SidebarContent::Report(record), &MemoryFeedbackStore::new(), "");
        assert!(html.contains("Wir &lt;müssen&gt; handeln"), "{html}");

        let doc = kuchiki::parse_html().one(html);
        let close = select_node(&doc, ".close-button").expect("close");
        let message = get_attr(&close, "data-message").expect("data-message");
        assert_eq!(SidebarMessage::parse(&message), Some(SidebarMessage::CloseSidebar));
    }

    #[test]
    fn switching_tabs_moves_the_active_class() {
        let data = dataset();
        let record = data.get("article_5").expect("record");
        let doc = build_sidebar("article_5", SidebarContent::Report(record), &MemoryFeedbackStore::new(), "");
        assert!(activate_tab(&doc, ReportTab::Context));
        assert_eq!(active_tab(&doc), Some(ReportTab::Context));
        assert_eq!(count(&doc, ".tab-panel.active"), 1);
        assert!(select_node(&doc, "#panel-context.active").is_some());
        assert_eq!(ReportTab::from_key(" quotes "), Some(ReportTab::Quotes));
    }

    #[test]
    fn missing_and_failed_loads_render_notices() {
        let store = MemoryFeedbackStore::new();
        let missing = build_sidebar("article_9", SidebarContent::Missing, &store, "");
        assert_eq!(count(&missing, ".notice"), 1);
        assert_eq!(count(&missing, ".tab-panel"), 0);
        assert!(!activate_tab(&missing, ReportTab::Quotes));
        assert!(select_node(&missing, ".close-button").is_some());

        let failed = build_sidebar("article_9", SidebarContent::LoadError("HTTP 404"), &store, "");
        let error = select_node(&failed, ".error-message").expect("error");
        assert!(error.text_contents().ends_with("HTTP 404"));
    }
}
