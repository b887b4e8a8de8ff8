use serde::{Deserialize, Serialize};

/// Kind of a snapshotted channel. Other live channel kinds (forums, stages,
/// threads) are not captured and are never touched by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Text,
    Voice,
}

/// A captured category: name plus its sort position. Positions are opaque
/// sort/equality keys; gaps are preserved, never renormalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    pub name: String,
    pub position: i32,
}

/// A captured channel. `platform_id` is the stable platform handle used for
/// identity matching on load; names are display-only and may collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub platform_id: Option<String>,
    pub name: String,
    pub kind: ChannelKind,
    /// Name of the parent category, or None for a top-level channel.
    pub category: Option<String>,
}

/// The structural state of a server at save time. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    pub server_name: String,
    pub server_icon: Option<String>,
    pub server_banner: Option<String>,
    pub categories: Vec<CategorySnapshot>,
    pub channels: Vec<ChannelSnapshot>,
}

/// A named snapshot stored in a server's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub data: ServerSnapshot,
}
