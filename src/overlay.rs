use article_analyst_contract::AnalysisRecord;
use kuchiki::NodeRef;

use crate::dom::{add_class, element_with_text, new_element, remove_class, select_node, set_style_property};
use crate::error::AnalystError;
use crate::highlight::{HighlightSummary, highlight_language};
use crate::message::SidebarMessage;
use crate::resize::Viewport;

pub const TRIGGER_ID: &str = "article-analyst-owl-trigger";
pub const SIDEBAR_HOST_ID: &str = "article-analyst-sidebar-host";
pub const RESIZE_HANDLE_ID: &str = "article-analyst-resize-handle";
pub const STYLE_ID: &str = "article-analyst-style";

const OPEN_CLASS: &str = "open";
const VISIBLE_CLASS: &str = "visible";

/// What the injected chrome points at.
#[derive(Debug, Clone)]
pub struct OverlayChrome {
    pub icon_src: String,
    pub sidebar_url: String,
    pub stylesheet: String,
}

/// Appends trigger, sidebar host frame and resize handle to `<body>` and the overlay
/// stylesheet to `<head>`. Returns `Ok(false)` when the page already carries the overlay.
pub fn inject_overlay(
    document: &NodeRef,
    article_id: &str,
    chrome: &OverlayChrome,
) -> Result<bool, AnalystError> {
    let body = select_node(document, "body").ok_or(AnalystError::MissingBody)?;
    if select_node(document, &format!("#{SIDEBAR_HOST_ID}")).is_some() {
        return Ok(false);
    }

    let style = element_with_text("style", &[("id", STYLE_ID)], &chrome.stylesheet);
    match select_node(document, "head") {
        Some(head) => head.append(style),
        None => body.append(style),
    }

    // The entrance animation has already finished in a rendered page.
    let trigger = new_element("div", &[("id", TRIGGER_ID), ("class", VISIBLE_CLASS)]);
    trigger.append(new_element(
        "img",
        &[("src", chrome.icon_src.as_str()), ("alt", "Article Analyst")],
    ));
    body.append(trigger);

    let src = format!("{}?id={}", chrome.sidebar_url, article_id);
    body.append(new_element(
        "iframe",
        &[
            ("id", SIDEBAR_HOST_ID),
            ("src", src.as_str()),
            ("style", "border: none;"),
        ],
    ));
    body.append(new_element("div", &[("id", RESIZE_HANDLE_ID)]));
    Ok(true)
}

/// Where the host page stands with its analysis payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    Pending,
    Ready(Box<AnalysisRecord>),
    Missing,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// `highlights` is set only for the opening that ran the highlight batch.
    Opened { highlights: Option<HighlightSummary> },
    Closed,
    Ignored,
}

/// Trigger/sidebar state of one host page.
#[derive(Debug, Clone)]
pub struct HostOverlay {
    article_id: String,
    analysis: AnalysisState,
    viewport: Viewport,
    is_open: bool,
    has_highlighted: bool,
}

impl HostOverlay {
    pub fn new(article_id: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            article_id: article_id.into(),
            analysis: AnalysisState::Pending,
            viewport,
            is_open: false,
            has_highlighted: false,
        }
    }

    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    pub fn analysis(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn has_highlighted(&self) -> bool {
        self.has_highlighted
    }

    /// Resolves the load. Does not highlight by itself; the next opening does.
    pub fn set_analysis(&mut self, analysis: AnalysisState) {
        self.analysis = analysis;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Trigger click.
    pub fn toggle(&mut self, document: &NodeRef) -> Result<OverlayEvent, AnalystError> {
        if self.is_open {
            self.close(document)?;
            return Ok(OverlayEvent::Closed);
        }
        self.open(document)
    }

    /// Raw payload posted by the sidebar frame; only `closeSidebar` is acted on.
    pub fn handle_message(
        &mut self,
        document: &NodeRef,
        raw: &str,
    ) -> Result<OverlayEvent, AnalystError> {
        match SidebarMessage::parse(raw) {
            Some(SidebarMessage::CloseSidebar) => {
                self.close(document)?;
                Ok(OverlayEvent::Closed)
            }
            None => Ok(OverlayEvent::Ignored),
        }
    }

    fn open(&mut self, document: &NodeRef) -> Result<OverlayEvent, AnalystError> {
        let (sidebar, handle, body) = overlay_nodes(document)?;
        self.is_open = true;
        add_class(&sidebar, OPEN_CLASS);
        add_class(&handle, VISIBLE_CLASS);
        if self.viewport.is_mobile() {
            set_style_property(&body, "overflow", Some("hidden"));
        }

        let mut highlights = None;
        if !self.has_highlighted {
            if let AnalysisState::Ready(record) = &self.analysis {
                highlights = Some(highlight_language(&body, &record.language));
                self.has_highlighted = true;
            }
        }
        Ok(OverlayEvent::Opened { highlights })
    }

    fn close(&mut self, document: &NodeRef) -> Result<(), AnalystError> {
        let (sidebar, handle, body) = overlay_nodes(document)?;
        self.is_open = false;
        remove_class(&sidebar, OPEN_CLASS);
        remove_class(&handle, VISIBLE_CLASS);
        set_style_property(&body, "overflow", None);
        Ok(())
    }
}

fn overlay_nodes(document: &NodeRef) -> Result<(NodeRef, NodeRef, NodeRef), AnalystError> {
    let body = select_node(document, "body").ok_or(AnalystError::MissingBody)?;
    let sidebar = select_node(document, &format!("#{SIDEBAR_HOST_ID}"))
        .ok_or(AnalystError::OverlayNotInjected)?;
    let handle = select_node(document, &format!("#{RESIZE_HANDLE_ID}"))
        .ok_or(AnalystError::OverlayNotInjected)?;
    Ok((sidebar, handle, body))
}
