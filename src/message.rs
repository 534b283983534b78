use serde::Deserialize;
use serde_json::json;

/// Messages the sidebar frame posts to the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SidebarMessage {
    CloseSidebar,
}

impl SidebarMessage {
    /// Anything that is not a known message shape is `None` and must be ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn action(&self) -> &'static str {
        match self {
            SidebarMessage::CloseSidebar => "closeSidebar",
        }
    }

    pub fn to_json(&self) -> String {
        json!({ "action": self.action() }).to_string()
    }
}
