use std::collections::HashMap;

use crate::error::ThemeError;
use crate::platform::GuildPlatform;
use crate::snapshot::{CategorySnapshot, ChannelSnapshot, ServerSnapshot};

/// Capture the live server's structural state as a snapshot. Pure read: the
/// only failure mode is the platform being unreachable, in which case the
/// save is aborted with nothing persisted.
pub async fn capture<P: GuildPlatform>(platform: &P) -> Result<ServerSnapshot, ThemeError> {
    let live = platform.guild_structure().await?;

    let category_names: HashMap<&str, &str> = live
        .categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let categories = live
        .categories
        .iter()
        .map(|c| CategorySnapshot {
            name: c.name.clone(),
            position: c.position,
        })
        .collect();

    let channels = live
        .channels
        .iter()
        .map(|ch| ChannelSnapshot {
            platform_id: Some(ch.id.clone()),
            name: ch.name.clone(),
            kind: ch.kind,
            category: ch
                .category_id
                .as_deref()
                .and_then(|id| category_names.get(id))
                .map(|name| name.to_string()),
        })
        .collect();

    Ok(ServerSnapshot {
        server_name: live.name,
        server_icon: live.icon_url,
        server_banner: live.banner_url,
        categories,
        channels,
    })
}
