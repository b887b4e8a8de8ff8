use anyhow::{Context, Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{GuildPlatform, GuildStructure, LiveCategory, LiveChannel};
use crate::snapshot::ChannelKind;

const CDN_BASE: &str = "https://cdn.discordapp.com";

// Discord channel type tags
const TYPE_TEXT: u8 = 0;
const TYPE_VOICE: u8 = 2;
const TYPE_CATEGORY: u8 = 4;

/// Authenticated Discord REST client, shared across servers.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl RestClient {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// Scope this client to one guild.
    pub fn guild(&self, guild_id: impl Into<String>) -> RestGuild {
        RestGuild {
            client: self.clone(),
            guild_id: guild_id.into(),
        }
    }

    async fn request(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.api_base, path);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .header("Authorization", format!("Bot {}", self.token));
        if let Some(body) = &body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("{method} {path}: request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(anyhow!("{method} {path}: platform returned {status}: {detail}"));
        }

        debug!(%method, path, "platform call ok");
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        resp.json()
            .await
            .with_context(|| format!("{method} {path}: invalid response body"))
    }
}

#[derive(Deserialize)]
struct GuildResponse {
    name: String,
    icon: Option<String>,
    banner: Option<String>,
}

#[derive(Deserialize)]
struct ChannelResponse {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    position: i32,
    parent_id: Option<String>,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

/// `GuildPlatform` implementation over the Discord REST API, scoped to one
/// guild. Retry/backoff on 429 is handled by the platform's client layer
/// semantics and not re-implemented here.
pub struct RestGuild {
    client: RestClient,
    guild_id: String,
}

impl RestGuild {
    fn image_data_uri(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    fn cdn_url(&self, kind: &str, hash: &str) -> String {
        format!("{CDN_BASE}/{kind}/{}/{hash}.png?size=1024", self.guild_id)
    }

    async fn patch_guild(&self, body: Value) -> Result<()> {
        self.client
            .request(
                reqwest::Method::PATCH,
                &format!("/guilds/{}", self.guild_id),
                Some(body),
            )
            .await?;
        Ok(())
    }
}

impl GuildPlatform for RestGuild {
    async fn guild_structure(&self) -> Result<GuildStructure> {
        let guild: GuildResponse = serde_json::from_value(
            self.client
                .request(
                    reqwest::Method::GET,
                    &format!("/guilds/{}", self.guild_id),
                    None,
                )
                .await?,
        )
        .context("unexpected guild payload")?;

        let rows: Vec<ChannelResponse> = serde_json::from_value(
            self.client
                .request(
                    reqwest::Method::GET,
                    &format!("/guilds/{}/channels", self.guild_id),
                    None,
                )
                .await?,
        )
        .context("unexpected channel list payload")?;

        let mut categories = Vec::new();
        let mut channels = Vec::new();
        for row in rows {
            match row.kind {
                TYPE_CATEGORY => categories.push(LiveCategory {
                    id: row.id,
                    name: row.name,
                    position: row.position,
                }),
                TYPE_TEXT => channels.push(LiveChannel {
                    id: row.id,
                    name: row.name,
                    kind: ChannelKind::Text,
                    category_id: row.parent_id,
                }),
                TYPE_VOICE => channels.push(LiveChannel {
                    id: row.id,
                    name: row.name,
                    kind: ChannelKind::Voice,
                    category_id: row.parent_id,
                }),
                // Threads, forums, stages: not part of snapshots
                _ => {}
            }
        }

        Ok(GuildStructure {
            name: guild.name,
            icon_url: guild.icon.map(|h| self.cdn_url("icons", &h)),
            banner_url: guild.banner.map(|h| self.cdn_url("banners", &h)),
            categories,
            channels,
        })
    }

    async fn rename_guild(&self, name: &str) -> Result<()> {
        self.patch_guild(json!({ "name": name })).await
    }

    async fn set_guild_icon(&self, bytes: &[u8]) -> Result<()> {
        self.patch_guild(json!({ "icon": Self::image_data_uri(bytes) }))
            .await
    }

    async fn set_guild_banner(&self, bytes: &[u8]) -> Result<()> {
        self.patch_guild(json!({ "banner": Self::image_data_uri(bytes) }))
            .await
    }

    async fn create_category(&self, name: &str, position: i32) -> Result<String> {
        let created: CreatedResponse = serde_json::from_value(
            self.client
                .request(
                    reqwest::Method::POST,
                    &format!("/guilds/{}/channels", self.guild_id),
                    Some(json!({ "name": name, "type": TYPE_CATEGORY, "position": position })),
                )
                .await?,
        )
        .context("unexpected create-category payload")?;
        Ok(created.id)
    }

    async fn edit_category(&self, category_id: &str, position: i32) -> Result<()> {
        self.client
            .request(
                reqwest::Method::PATCH,
                &format!("/channels/{category_id}"),
                Some(json!({ "position": position })),
            )
            .await?;
        Ok(())
    }

    async fn create_channel(
        &self,
        kind: ChannelKind,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String> {
        let type_tag = match kind {
            ChannelKind::Text => TYPE_TEXT,
            ChannelKind::Voice => TYPE_VOICE,
        };
        let created: CreatedResponse = serde_json::from_value(
            self.client
                .request(
                    reqwest::Method::POST,
                    &format!("/guilds/{}/channels", self.guild_id),
                    Some(json!({ "name": name, "type": type_tag, "parent_id": parent_id })),
                )
                .await?,
        )
        .context("unexpected create-channel payload")?;
        Ok(created.id)
    }

    async fn edit_channel(
        &self,
        channel_id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<()> {
        self.client
            .request(
                reqwest::Method::PATCH,
                &format!("/channels/{channel_id}"),
                Some(json!({ "name": name, "parent_id": parent_id })),
            )
            .await?;
        Ok(())
    }
}
