mod article_id;
mod assets;
mod color;
mod debug;
mod dom;
mod error;
mod feedback;
mod highlight;
mod message;
mod overlay;
mod perf;
mod report;
mod resize;

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

pub use article_analyst_contract::{
    AnalysisDataset, AnalysisRecord, ContractError, DEFAULT_ARTICLE_ID,
    payload_fingerprint_sha256,
};
pub use article_id::{article_id_from_param, resolve_article_id};
pub use assets::{Asset, AssetBundle, AssetKind, OVERLAY_CSS, SIDEBAR_CSS, minify_css};
pub use color::{PALETTE, RESERVED_COLOR, RESERVED_LABEL, color_for_label, label_hash};
use debug::DebugLogger;
pub use error::AnalystError;
pub use feedback::{
    FeedbackStore, FileFeedbackStore, MemoryFeedbackStore, Vote, cast_vote, current_vote,
    storage_key,
};
pub use highlight::{
    HighlightSummary, HighlightTarget, MARKER_CLASS, TOOLTIP_ATTR, collect_targets,
    highlight_language, highlight_marker, highlight_targets, highlight_text,
    normalize_whitespace,
};
pub use message::SidebarMessage;
pub use overlay::{
    AnalysisState, HostOverlay, OverlayChrome, OverlayEvent, RESIZE_HANDLE_ID,
    SIDEBAR_HOST_ID, STYLE_ID, TRIGGER_ID, inject_overlay,
};
use perf::PerfLogger;
pub use report::{
    ReportTab, SidebarContent, activate_tab, active_tab, build_sidebar, clamp_bias, render_sidebar,
};
pub use resize::{
    Pointer, PointerEvent, ResizeHandle, SidebarDimension, Viewport, sidebar_dimension,
};
use serde_json::json;
use sha2::{Digest, Sha256};

use kuchiki::traits::TendrilSink;

const DEFAULT_SIDEBAR_URL: &str = "../sidebar/index.html";
const DEFAULT_ICON_SRC: &str = "../assets/owl_icon.png";
const DEFAULT_ANALYSIS_PATH: &str = "data/analysis_data.json";

/// Host page after overlay injection and, when the sidebar was opened, highlighting.
#[derive(Debug, Clone)]
pub struct HostRender {
    pub article_id: String,
    pub html: String,
    pub sidebar_open: bool,
    /// `None` when no highlight batch ran (sidebar closed, data missing or failed).
    pub highlights: Option<HighlightSummary>,
    pub sha256: String,
}

enum AnalysisSource {
    Path(PathBuf),
    Json(String),
    Dataset(AnalysisDataset),
}

pub struct ArticleAnalyst {
    dataset: Result<AnalysisDataset, String>,
    chrome: OverlayChrome,
    sidebar_stylesheet: String,
    viewport: Viewport,
    open_sidebar: bool,
    debug: Option<Arc<DebugLogger>>,
    perf: Option<Arc<PerfLogger>>,
}

pub struct ArticleAnalystBuilder {
    source: AnalysisSource,
    sidebar_url: String,
    icon_src: Option<String>,
    viewport: Viewport,
    open_sidebar: bool,
    debug_path: Option<PathBuf>,
    perf_path: Option<PathBuf>,
    asset_bundle: AssetBundle,
    asset_paths: Vec<(PathBuf, AssetKind)>,
}

impl ArticleAnalyst {
    pub fn builder() -> ArticleAnalystBuilder {
        ArticleAnalystBuilder::new()
    }

    pub fn dataset(&self) -> Option<&AnalysisDataset> {
        self.dataset.as_ref().ok()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.dataset.as_ref().err().map(String::as_str)
    }

    pub fn chrome(&self) -> &OverlayChrome {
        &self.chrome
    }

    /// Load outcome for one article, as the host page sees it.
    pub fn analysis_state(&self, article_id: &str) -> AnalysisState {
        match &self.dataset {
            Err(message) => AnalysisState::Failed(message.clone()),
            Ok(dataset) => match dataset.get(article_id) {
                Some(record) => AnalysisState::Ready(Box::new(record.clone())),
                None => AnalysisState::Missing,
            },
        }
    }

    /// Injects the overlay into `html` and, when configured to open the sidebar, runs the
    /// first-open highlight batch for the article addressed by `page_url`.
    pub fn render_host_page(&self, html: &str, page_url: &str) -> Result<HostRender, AnalystError> {
        let article_id = resolve_article_id(page_url);
        let document = kuchiki::parse_html().one(html);
        inject_overlay(&document, &article_id, &self.chrome)?;

        let mut overlay = HostOverlay::new(article_id.as_str(), self.viewport);
        let state = self.analysis_state(&article_id);
        if state == AnalysisState::Missing {
            self.warn_missing(&article_id);
        }
        overlay.set_analysis(state);

        let mut highlights = None;
        if self.open_sidebar {
            let started = std::time::Instant::now();
            if let OverlayEvent::Opened { highlights: summary } = overlay.toggle(&document)? {
                highlights = summary;
            }
            // Only an opening that ran the batch is timed.
            if let (Some(perf), Some(_)) = (self.perf.as_deref(), &highlights) {
                perf.log_span_ms(
                    "highlight.batch",
                    Some(&article_id),
                    started.elapsed().as_secs_f64() * 1000.0,
                );
            }
            self.log_toggle(&article_id, &overlay, highlights.as_ref());
        }
        if let Some(summary) = &highlights {
            self.log_misses(&article_id, summary);
        }

        let html = document.to_string();
        let sha256 = sha256_hex(html.as_bytes());
        Ok(HostRender {
            article_id,
            html,
            sidebar_open: overlay.is_open(),
            highlights,
            sha256,
        })
    }

    pub fn render_sidebar(&self, article_id: &str, feedback: &dyn FeedbackStore) -> String {
        let started = std::time::Instant::now();
        let html = match &self.dataset {
            Err(message) => render_sidebar(
                article_id,
                SidebarContent::LoadError(message),
                feedback,
                &self.sidebar_stylesheet,
            ),
            Ok(dataset) => {
                let content = match dataset.get(article_id) {
                    Some(record) => SidebarContent::Report(record),
                    None => {
                        self.warn_missing(article_id);
                        SidebarContent::Missing
                    }
                };
                render_sidebar(article_id, content, feedback, &self.sidebar_stylesheet)
            }
        };
        if let Some(perf) = self.perf.as_deref() {
            perf.log_span_ms(
                "report.render",
                Some(article_id),
                started.elapsed().as_secs_f64() * 1000.0,
            );
        }
        html
    }

    /// Sidebar for the frame URL the host overlay points at (`<sidebar_url>?id=<id>`).
    pub fn render_sidebar_for_url(&self, frame_url: &str, feedback: &dyn FeedbackStore) -> String {
        self.render_sidebar(&resolve_article_id(frame_url), feedback)
    }

    // Parallel batch rendering: each job parses its own tree, results come back in input order.
    pub fn render_many_parallel(
        &self,
        jobs: &[(String, String)],
    ) -> Result<Vec<HostRender>, AnalystError> {
        use rayon::prelude::*;

        let mut results: Vec<(usize, Result<HostRender, AnalystError>)> = jobs
            .par_iter()
            .enumerate()
            .map(|(idx, (html, page_url))| (idx, self.render_host_page(html, page_url)))
            .collect();
        results.sort_by_key(|(idx, _)| *idx);

        let mut renders = Vec::with_capacity(results.len());
        for (_, res) in results {
            renders.push(res?);
        }
        Ok(renders)
    }

    pub fn flush(&self) {
        if let Some(logger) = self.debug.as_deref() {
            logger.emit_summary("article_analyst");
            logger.flush();
        }
        if let Some(perf) = self.perf.as_deref() {
            perf.flush();
        }
    }

    fn warn_missing(&self, article_id: &str) {
        eprintln!("[article_analyst][data] no analysis data found for id {article_id}");
        if let Some(logger) = self.debug.as_deref() {
            logger.log_event("analysis.missing", json!({ "article_id": article_id }));
            logger.increment("analysis.missing", 1);
        }
    }

    fn log_toggle(&self, article_id: &str, overlay: &HostOverlay, summary: Option<&HighlightSummary>) {
        let Some(logger) = self.debug.as_deref() else {
            return;
        };
        logger.log_event(
            "overlay.toggle",
            json!({
                "article_id": article_id,
                "open": overlay.is_open(),
                "highlighted": summary.is_some(),
                "markers": summary.map(|s| s.markers).unwrap_or(0),
            }),
        );
        logger.increment("overlay.toggle", 1);
    }

    fn log_misses(&self, article_id: &str, summary: &HighlightSummary) {
        if summary.missed.is_empty() {
            return;
        }
        eprintln!(
            "[article_analyst][highlight] {article_id}: {} of {} texts not found in page",
            summary.missed.len(),
            summary.targets
        );
        if let Some(logger) = self.debug.as_deref() {
            for target in &summary.missed {
                logger.log_event(
                    "highlight.miss",
                    json!({
                        "article_id": article_id,
                        "label": target.label,
                        "text": target.text,
                    }),
                );
            }
            logger.increment("highlight.miss", summary.missed.len() as u64);
            logger.increment("highlight.marker", summary.markers as u64);
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

impl Default for ArticleAnalystBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleAnalystBuilder {
    pub fn new() -> Self {
        Self {
            source: AnalysisSource::Path(PathBuf::from(DEFAULT_ANALYSIS_PATH)),
            sidebar_url: DEFAULT_SIDEBAR_URL.to_string(),
            icon_src: None,
            viewport: Viewport::default(),
            open_sidebar: true,
            debug_path: None,
            perf_path: None,
            asset_bundle: AssetBundle::default(),
            asset_paths: Vec::new(),
        }
    }

    /// Analysis payload file, read at `build()` (default `data/analysis_data.json`). A read
    /// or parse failure does not fail the build; it surfaces as a failed load in the overlay
    /// and sidebar.
    pub fn analysis_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = AnalysisSource::Path(path.into());
        self
    }

    pub fn analysis_json(mut self, raw: impl Into<String>) -> Self {
        self.source = AnalysisSource::Json(raw.into());
        self
    }

    pub fn dataset(mut self, dataset: AnalysisDataset) -> Self {
        self.source = AnalysisSource::Dataset(dataset);
        self
    }

    pub fn sidebar_url(mut self, url: impl Into<String>) -> Self {
        self.sidebar_url = url.into();
        self
    }

    pub fn icon_src(mut self, src: impl Into<String>) -> Self {
        self.icon_src = Some(src.into());
        self
    }

    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    // Offline renders default to the opened state so highlights land in the output.
    pub fn open_sidebar(mut self, open: bool) -> Self {
        self.open_sidebar = open;
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn perf_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.perf_path = Some(path.into());
        self
    }

    /// Extra CSS appended to the overlay styles; the first image becomes the trigger icon
    /// unless `icon_src` is set.
    pub fn register_bundle(mut self, bundle: AssetBundle) -> Self {
        self.asset_bundle = bundle;
        self
    }

    /// Asset file read at `build()` and appended to the registered bundle.
    pub fn asset_path(mut self, path: impl Into<PathBuf>, kind: AssetKind) -> Self {
        self.asset_paths.push((path.into(), kind));
        self
    }

    pub fn build(self) -> Result<ArticleAnalyst, AnalystError> {
        if self.sidebar_url.trim().is_empty() {
            return Err(AnalystError::InvalidConfiguration(
                "sidebar_url must not be empty".to_string(),
            ));
        }
        let Viewport { width, height } = self.viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(AnalystError::InvalidConfiguration(
                "viewport requires width > 0 and height > 0".to_string(),
            ));
        }
        let debug = if let Some(path) = self.debug_path {
            Some(Arc::new(DebugLogger::new(path)?))
        } else {
            None
        };
        let perf = if let Some(path) = self.perf_path {
            Some(Arc::new(PerfLogger::new(path)?))
        } else {
            None
        };

        let dataset = load_dataset(self.source);
        if let Err(message) = &dataset {
            eprintln!("[article_analyst][data] error loading analysis data: {message}");
            if let Some(logger) = debug.as_deref() {
                logger.log_event("analysis.load_failed", json!({ "error": message }));
            }
        }

        let mut asset_bundle = self.asset_bundle;
        for (path, kind) in &self.asset_paths {
            let asset = Asset::from_path(path, *kind)?;
            if let Some(logger) = debug.as_deref() {
                logger.log_event(
                    "asset.loaded",
                    json!({
                        "name": asset.name,
                        "kind": kind.as_str(),
                        "bytes": asset.bytes_len(),
                    }),
                );
            }
            asset_bundle.add(asset);
        }

        let mut overlay_css = OVERLAY_CSS.to_string();
        let extra_css = asset_bundle.css_text();
        if !extra_css.is_empty() {
            overlay_css.push('\n');
            overlay_css.push_str(&extra_css);
        }
        let icon_src = match self.icon_src {
            Some(src) => src,
            None => asset_bundle
                .first_image()
                .map(Asset::data_uri)
                .unwrap_or_else(|| DEFAULT_ICON_SRC.to_string()),
        };

        Ok(ArticleAnalyst {
            dataset,
            chrome: OverlayChrome {
                icon_src,
                sidebar_url: self.sidebar_url,
                stylesheet: minify_css(&overlay_css)?,
            },
            sidebar_stylesheet: minify_css(SIDEBAR_CSS)?,
            viewport: self.viewport,
            open_sidebar: self.open_sidebar,
            debug,
            perf,
        })
    }
}

fn load_dataset(source: AnalysisSource) -> Result<AnalysisDataset, String> {
    match source {
        AnalysisSource::Dataset(dataset) => Ok(dataset),
        AnalysisSource::Json(raw) => {
            AnalysisDataset::from_json_str(&raw).map_err(|err| err.to_string())
        }
        AnalysisSource::Path(path) => {
            let raw = std::fs::read(&path).map_err(|err| format!("{}: {err}", path.display()))?;
            AnalysisDataset::from_json_slice(&raw).map_err(|err| err.to_string())
        }
    }
}
