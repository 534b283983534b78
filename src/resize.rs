use kuchiki::NodeRef;

use crate::dom::{add_class, remove_class, select_node, set_style_property};
use crate::overlay::{RESIZE_HANDLE_ID, SIDEBAR_HOST_ID};

/// Widths at or below this use the bottom-sheet layout.
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;
pub const MIN_SIDEBAR_WIDTH_PX: f64 = 250.0;
pub const MAX_SIDEBAR_WIDTH_PX: f64 = 400.0;
pub const MIN_SIDEBAR_HEIGHT_RATIO: f64 = 0.3;
pub const MAX_SIDEBAR_HEIGHT_RATIO: f64 = 0.9;

const RESIZING_CLASS: &str = "resizing";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_mobile(&self) -> bool {
        self.width <= MOBILE_BREAKPOINT_PX
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pointer {
    /// `button` is the button that changed, `buttons` the bitmask held during a move.
    Mouse { button: u16, buttons: u16 },
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: Pointer,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SidebarDimension {
    Width(f64),
    Height(f64),
}

/// Desktop drags the sidebar's left edge, mobile drags the sheet's top edge.
pub fn sidebar_dimension(viewport: Viewport, x: f64, y: f64) -> SidebarDimension {
    if viewport.is_mobile() {
        let min = viewport.height * MIN_SIDEBAR_HEIGHT_RATIO;
        let max = viewport.height * MAX_SIDEBAR_HEIGHT_RATIO;
        SidebarDimension::Height((viewport.height - y).min(max).max(min))
    } else {
        SidebarDimension::Width(
            (viewport.width - x)
                .min(MAX_SIDEBAR_WIDTH_PX)
                .max(MIN_SIDEBAR_WIDTH_PX),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResizeHandle {
    resizing: bool,
}

impl ResizeHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resizing(&self) -> bool {
        self.resizing
    }

    /// Only the primary mouse button or a touch starts a resize.
    pub fn begin(&mut self, document: &NodeRef, event: PointerEvent) -> bool {
        if let Pointer::Mouse { button, .. } = event.pointer {
            if button != 0 {
                return false;
            }
        }
        self.resizing = true;
        for id in [RESIZE_HANDLE_ID, SIDEBAR_HOST_ID] {
            if let Some(node) = select_node(document, &format!("#{id}")) {
                add_class(&node, RESIZING_CLASS);
            }
        }
        if let Some(body) = select_node(document, "body") {
            set_style_property(&body, "user-select", Some("none"));
        }
        true
    }

    pub fn drag(
        &mut self,
        document: &NodeRef,
        event: PointerEvent,
        viewport: Viewport,
    ) -> Option<SidebarDimension> {
        if !self.resizing {
            return None;
        }
        // The button can be released outside the window without an "up" event.
        if let Pointer::Mouse { buttons, .. } = event.pointer {
            if buttons & 1 != 1 {
                self.end(document);
                return None;
            }
        }
        let dimension = sidebar_dimension(viewport, event.x, event.y);
        apply_dimension(document, dimension);
        Some(dimension)
    }

    pub fn end(&mut self, document: &NodeRef) {
        if !self.resizing {
            return;
        }
        self.resizing = false;
        for id in [RESIZE_HANDLE_ID, SIDEBAR_HOST_ID] {
            if let Some(node) = select_node(document, &format!("#{id}")) {
                remove_class(&node, RESIZING_CLASS);
            }
        }
        if let Some(body) = select_node(document, "body") {
            set_style_property(&body, "user-select", None);
        }
    }
}

fn apply_dimension(document: &NodeRef, dimension: SidebarDimension) {
    let sidebar = select_node(document, &format!("#{SIDEBAR_HOST_ID}"));
    let handle = select_node(document, &format!("#{RESIZE_HANDLE_ID}"));
    let (size_prop, edge_prop, stale_size, stale_edge, px) = match dimension {
        SidebarDimension::Width(px) => ("width", "right", "height", "bottom", px),
        SidebarDimension::Height(px) => ("height", "bottom", "width", "right", px),
    };
    let value = format!("{px}px");
    if let Some(sidebar) = sidebar {
        set_style_property(&sidebar, size_prop, Some(&value));
        set_style_property(&sidebar, stale_size, None);
    }
    if let Some(handle) = handle {
        set_style_property(&handle, edge_prop, Some(&value));
        set_style_property(&handle, stale_edge, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{has_class, style_property};
    use kuchiki::traits::TendrilSink;

    fn overlay_doc() -> NodeRef {
        kuchiki::parse_html().one(
            "<html><body><p>text</p>\
             <iframe id=\"article-analyst-sidebar-host\" style=\"border: none; height: 500px;\"></iframe>\
             <div id=\"article-analyst-resize-handle\"></div></body></html>",
        )
    }

    fn mouse(button: u16, buttons: u16, x: f64, y: f64) -> PointerEvent {
        PointerEvent {
            pointer: Pointer::Mouse { button, buttons },
            x,
            y,
        }
    }

    #[test]
    fn desktop_width_is_clamped() {
        let viewport = Viewport::new(1200.0, 800.0);
        assert_eq!(sidebar_dimension(viewport, 900.0, 0.0), SidebarDimension::Width(300.0));
        assert_eq!(sidebar_dimension(viewport, 1100.0, 0.0), SidebarDimension::Width(250.0));
        assert_eq!(sidebar_dimension(viewport, 10.0, 0.0), SidebarDimension::Width(400.0));
    }

    #[test]
    fn mobile_height_is_clamped_to_viewport_share() {
        let viewport = Viewport::new(400.0, 1000.0);
        assert_eq!(sidebar_dimension(viewport, 0.0, 500.0), SidebarDimension::Height(500.0));
        assert_eq!(sidebar_dimension(viewport, 0.0, 950.0), SidebarDimension::Height(300.0));
        assert_eq!(sidebar_dimension(viewport, 0.0, 0.0), SidebarDimension::Height(900.0));
    }

    #[test]
    fn secondary_button_does_not_start_a_resize() {
        let doc = overlay_doc();
        let mut handle = ResizeHandle::new();
        assert!(!handle.begin(&doc, mouse(2, 2, 0.0, 0.0)));
        assert!(!handle.is_resizing());
        assert_eq!(handle.drag(&doc, mouse(0, 1, 900.0, 0.0), Viewport::default()), None);
    }

    #[test]
    fn drag_updates_sidebar_and_handle_styles() {
        let doc = overlay_doc();
        let sidebar = select_node(&doc, "#article-analyst-sidebar-host").expect("sidebar");
        let grip = select_node(&doc, "#article-analyst-resize-handle").expect("handle");
        let body = select_node(&doc, "body").expect("body");
        let mut handle = ResizeHandle::new();

        assert!(handle.begin(&doc, mouse(0, 1, 900.0, 0.0)));
        assert!(has_class(&sidebar, "resizing"));
        assert_eq!(style_property(&body, "user-select").as_deref(), Some("none"));

        let dim = handle.drag(&doc, mouse(0, 1, 920.0, 0.0), Viewport::new(1280.0, 800.0));
        assert_eq!(dim, Some(SidebarDimension::Width(360.0)));
        assert_eq!(style_property(&sidebar, "width").as_deref(), Some("360px"));
        assert_eq!(style_property(&sidebar, "height"), None);
        assert_eq!(style_property(&sidebar, "border").as_deref(), Some("none"));
        assert_eq!(style_property(&grip, "right").as_deref(), Some("360px"));

        handle.end(&doc);
        assert!(!has_class(&grip, "resizing"));
        assert_eq!(style_property(&body, "user-select"), None);
    }

    #[test]
    fn move_without_primary_button_ends_the_resize() {
        let doc = overlay_doc();
        let mut handle = ResizeHandle::new();
        let touch = PointerEvent {
            pointer: Pointer::Touch,
            x: 0.0,
            y: 400.0,
        };
        assert!(handle.begin(&doc, touch));
        assert_eq!(
            handle.drag(&doc, touch, Viewport::new(375.0, 800.0)),
            Some(SidebarDimension::Height(400.0))
        );
        assert_eq!(handle.drag(&doc, mouse(0, 0, 0.0, 300.0), Viewport::default()), None);
        assert!(!handle.is_resizing());
    }
}
