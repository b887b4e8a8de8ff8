pub mod rest;

use anyhow::Result;

use crate::snapshot::ChannelKind;

/// A category as it currently exists on the platform.
#[derive(Debug, Clone)]
pub struct LiveCategory {
    pub id: String,
    pub name: String,
    pub position: i32,
}

/// A channel as it currently exists on the platform.
#[derive(Debug, Clone)]
pub struct LiveChannel {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    /// Platform id of the parent category, if any.
    pub category_id: Option<String>,
}

/// The live structure of one server, as read from the platform.
#[derive(Debug, Clone)]
pub struct GuildStructure {
    pub name: String,
    pub icon_url: Option<String>,
    pub banner_url: Option<String>,
    pub categories: Vec<LiveCategory>,
    pub channels: Vec<LiveChannel>,
}

/// The chat-platform boundary for a single server. All calls are fallible
/// async I/O; rate limiting is the client layer's concern, not modeled here.
///
/// An implementation is scoped to one server: none of the operations take a
/// server id. `rest::RestGuild` is the production implementation; tests use
/// an in-memory fake.
pub trait GuildPlatform {
    /// Read the server's current structure. Pure read.
    async fn guild_structure(&self) -> Result<GuildStructure>;

    async fn rename_guild(&self, name: &str) -> Result<()>;

    async fn set_guild_icon(&self, bytes: &[u8]) -> Result<()>;

    async fn set_guild_banner(&self, bytes: &[u8]) -> Result<()>;

    /// Create a category; returns its new platform id.
    async fn create_category(&self, name: &str, position: i32) -> Result<String>;

    async fn edit_category(&self, category_id: &str, position: i32) -> Result<()>;

    /// Create a channel; returns its new platform id. `parent_id` of None
    /// creates a top-level channel.
    async fn create_channel(
        &self,
        kind: ChannelKind,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String>;

    /// Set a channel's name and parent in one call. `parent_id` of None
    /// detaches the channel from any category.
    async fn edit_channel(
        &self,
        channel_id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<()>;
}
