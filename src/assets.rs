use std::path::Path;

use base64::Engine;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

use crate::error::AnalystError;

/// Styles injected into the host page: trigger, sidebar host frame, resize handle, markers.
pub const OVERLAY_CSS: &str = r#"
#article-analyst-owl-trigger {
  position: fixed;
  right: 24px;
  bottom: 24px;
  width: 56px;
  height: 56px;
  border-radius: 50%;
  background: #ffffff;
  box-shadow: 0 4px 14px rgba(0, 0, 0, 0.18);
  cursor: pointer;
  z-index: 2147483646;
  opacity: 0;
  transform: translateY(16px);
  transition: opacity 0.3s ease, transform 0.3s ease;
}

#article-analyst-owl-trigger.visible {
  opacity: 1;
  transform: translateY(0);
}

#article-analyst-owl-trigger img {
  width: 100%;
  height: 100%;
  border-radius: 50%;
}

#article-analyst-sidebar-host {
  position: fixed;
  top: 0;
  right: 0;
  width: 350px;
  height: 100vh;
  background: #ffffff;
  box-shadow: -4px 0 18px rgba(0, 0, 0, 0.15);
  transform: translateX(100%);
  transition: transform 0.3s ease;
  z-index: 2147483647;
}

#article-analyst-sidebar-host.open {
  transform: translateX(0);
}

#article-analyst-sidebar-host.resizing {
  transition: none;
  pointer-events: none;
}

#article-analyst-resize-handle {
  display: none;
  position: fixed;
  top: 0;
  right: 350px;
  width: 8px;
  height: 100vh;
  cursor: ew-resize;
  z-index: 2147483647;
}

#article-analyst-resize-handle.visible {
  display: block;
}

.analyst-highlight {
  position: relative;
  border-radius: 3px;
  padding: 0 2px;
  cursor: help;
}

.analyst-highlight:hover::after {
  content: attr(data-tooltip);
  position: absolute;
  left: 0;
  bottom: 100%;
  padding: 4px 8px;
  border-radius: 4px;
  background: #222222;
  color: #ffffff;
  font-size: 12px;
  white-space: nowrap;
}

@media (max-width: 768px) {
  #article-analyst-sidebar-host {
    top: auto;
    bottom: 0;
    width: 100%;
    height: 60vh;
    transform: translateY(100%);
  }

  #article-analyst-sidebar-host.open {
    transform: translateY(0);
  }

  #article-analyst-resize-handle {
    top: auto;
    right: 0;
    bottom: 60vh;
    width: 100%;
    height: 12px;
    cursor: ns-resize;
  }
}
"#;

/// Styles of the sidebar report document.
pub const SIDEBAR_CSS: &str = r#"
body {
  margin: 0;
  font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
  font-size: 14px;
  color: #1f2933;
  background: #fafafa;
}

.sidebar-header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  padding: 12px 16px;
  background: #ffffff;
  border-bottom: 1px solid #e4e7eb;
}

.sidebar-header h1 {
  margin: 0;
  font-size: 16px;
}

.meta span + span::before {
  content: " · ";
}

.close-button {
  border: none;
  background: transparent;
  font-size: 20px;
  cursor: pointer;
}

.tab-bar {
  display: flex;
  border-bottom: 1px solid #e4e7eb;
  background: #ffffff;
}

.tab-button {
  flex: 1;
  padding: 10px 4px;
  border: none;
  background: transparent;
  cursor: pointer;
}

.tab-button.active {
  border-bottom: 2px solid #3b82f6;
  font-weight: 600;
}

.tab-panel {
  display: none;
  padding: 16px;
}

.tab-panel.active {
  display: block;
}

.card {
  margin-bottom: 12px;
  padding: 12px;
  border-left: 4px solid #cbd2d9;
  border-radius: 6px;
  background: #ffffff;
}

.swatch {
  display: inline-block;
  width: 12px;
  height: 12px;
  margin-right: 6px;
  border-radius: 3px;
  vertical-align: middle;
}

.legend {
  display: flex;
  flex-wrap: wrap;
  gap: 8px;
  padding: 0;
  list-style: none;
}

.strength-badge {
  margin-left: 6px;
  padding: 1px 6px;
  border-radius: 8px;
  font-size: 11px;
  background: #e4e7eb;
}

.strength-strong .strength-badge {
  background: #c6f6d5;
}

.strength-medium .strength-badge {
  background: #fefcbf;
}

.strength-weak .strength-badge {
  background: #fed7d7;
}

.argument-issue {
  color: #b42318;
  font-size: 12px;
}

.bias-track {
  height: 8px;
  border-radius: 4px;
  background: #e4e7eb;
}

.bias-fill {
  height: 100%;
  border-radius: 4px;
  background: #3b82f6;
}

.feedback {
  display: flex;
  align-items: center;
  gap: 8px;
  margin-top: 16px;
  color: #52606d;
}

.feedback-button.selected {
  outline: 2px solid #3b82f6;
}

.error-message {
  color: #b42318;
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Css,
    Image,
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Image => "image",
            AssetKind::Other => "other",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "css" => Some(AssetKind::Css),
            "image" => Some(AssetKind::Image),
            "other" => Some(AssetKind::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub name: String,
    pub kind: AssetKind,
    pub data: Vec<u8>,
}

impl Asset {
    pub fn new(name: impl Into<String>, kind: AssetKind, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            data,
        }
    }

    pub fn from_path(path: impl AsRef<Path>, kind: AssetKind) -> Result<Self, AnalystError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("asset")
            .to_string();
        Ok(Self::new(name, kind, data))
    }

    pub fn mime_type(&self) -> &'static str {
        mime_for_name(&self.name)
    }

    pub fn data_uri(&self) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{payload}", self.mime_type())
    }

    pub fn bytes_len(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    pub assets: Vec<Asset>,
}

impl AssetBundle {
    pub fn add(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    /// Extra CSS appended after the built-in overlay styles, in registration order.
    pub fn css_text(&self) -> String {
        let mut out = String::new();
        for asset in &self.assets {
            if asset.kind != AssetKind::Css {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
                out.push('\n');
            }
            out.push_str(&String::from_utf8_lossy(&asset.data));
        }
        out
    }

    pub fn first_image(&self) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|asset| asset.kind == AssetKind::Image)
    }
}

pub fn mime_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "css" => "text/css",
        _ => "application/octet-stream",
    }
}

pub fn minify_css(css: &str) -> Result<String, AnalystError> {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|err| AnalystError::Stylesheet(err.to_string()))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|err| AnalystError::Stylesheet(err.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|err| AnalystError::Stylesheet(err.to_string()))?;
    Ok(printed.code)
}
