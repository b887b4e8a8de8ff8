//! The reconciliation engine: converges a live server's structure toward a
//! target snapshot in four ordered phases. Branding first (non-fatal), then
//! categories, then channels, then the completion report. The engine only
//! ever adds or repositions live structure; anything live that the target
//! does not reference is left untouched.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::ThemeError;
use crate::fetch::fetch_resource;
use crate::platform::{GuildPlatform, GuildStructure, LiveCategory, LiveChannel};
use crate::snapshot::{CategorySnapshot, ChannelSnapshot, ServerSnapshot};

/// What happened to one target entity during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Repositioned,
    Edited,
    Unchanged,
}

/// Per-entity ledger entry, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct ReconcileEntry {
    pub name: String,
    pub outcome: Outcome,
}

/// Aggregate result of one `apply` run.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Set when phase 1 (name/icon/banner) failed. Never aborts the run.
    pub branding_warning: Option<String>,
    pub categories: Vec<ReconcileEntry>,
    pub channels: Vec<ReconcileEntry>,
}

impl ApplyReport {
    pub fn mutations(&self) -> usize {
        self.categories
            .iter()
            .chain(&self.channels)
            .filter(|e| e.outcome != Outcome::Unchanged)
            .count()
    }
}

/// Matches target categories to live ones by exact, case-sensitive name.
/// Category names are the stable key here; platform ids are only learned
/// once a category is matched or created.
pub struct CategoryMatcher<'a> {
    by_name: HashMap<&'a str, &'a LiveCategory>,
}

impl<'a> CategoryMatcher<'a> {
    pub fn new(live: &'a [LiveCategory]) -> Self {
        Self {
            by_name: live.iter().map(|c| (c.name.as_str(), c)).collect(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&'a LiveCategory> {
        self.by_name.get(name).copied()
    }
}

/// Matches target channels to live ones by platform identifier, never by
/// name: names may collide or change, ids are stable platform handles.
pub struct ChannelMatcher<'a> {
    by_id: HashMap<&'a str, &'a LiveChannel>,
}

impl<'a> ChannelMatcher<'a> {
    pub fn new(live: &'a [LiveChannel]) -> Self {
        Self {
            by_id: live.iter().map(|c| (c.id.as_str(), c)).collect(),
        }
    }

    pub fn find(&self, platform_id: &str) -> Option<&'a LiveChannel> {
        self.by_id.get(platform_id).copied()
    }
}

/// Converge the live server toward `target`.
///
/// Phase 1 failures are reported as a warning on the returned report. A
/// failure in phases 2 or 3 aborts the remaining operations of that phase
/// and surfaces as an error; whatever was already applied stays applied
/// (there is no rollback).
pub async fn apply<P: GuildPlatform>(
    platform: &P,
    target: &ServerSnapshot,
) -> Result<ApplyReport, ThemeError> {
    let live = platform.guild_structure().await?;
    let mut report = ApplyReport::default();

    // Phase 1: identity and branding. Non-fatal.
    if let Err(e) = apply_branding(platform, target, &live).await {
        warn!(error = ?e, "branding update failed, continuing with structure");
        report.branding_warning = Some(e.to_string());
    }

    let result = reconcile_structure(platform, target, &live, &mut report).await;
    if result.is_err() {
        warn!(
            categories = report.categories.len(),
            channels = report.channels.len(),
            "reconciliation aborted after partial application"
        );
    }
    result?;

    info!(
        mutations = report.mutations(),
        categories = report.categories.len(),
        channels = report.channels.len(),
        branding_warning = report.branding_warning.is_some(),
        "theme applied"
    );
    Ok(report)
}

/// Phase 1: rename the server and re-apply icon/banner from their stored
/// resource locators. A locator whose fetch returns non-200 is skipped
/// silently; any hard failure aborts only this phase.
async fn apply_branding<P: GuildPlatform>(
    platform: &P,
    target: &ServerSnapshot,
    live: &GuildStructure,
) -> anyhow::Result<()> {
    if !target.server_name.is_empty() && live.name != target.server_name {
        platform.rename_guild(&target.server_name).await?;
    }
    if let Some(url) = &target.server_icon
        && let Some(bytes) = fetch_resource(url).await?
    {
        platform.set_guild_icon(&bytes).await?;
    }
    if let Some(url) = &target.server_banner
        && let Some(bytes) = fetch_resource(url).await?
    {
        platform.set_guild_banner(&bytes).await?;
    }
    Ok(())
}

/// Phases 2 and 3. Categories must be resolved before channels so that
/// parent references can attach to ids that actually exist.
async fn reconcile_structure<P: GuildPlatform>(
    platform: &P,
    target: &ServerSnapshot,
    live: &GuildStructure,
    report: &mut ApplyReport,
) -> Result<(), ThemeError> {
    let category_ids = reconcile_categories(platform, &target.categories, live, report).await?;
    reconcile_channels(platform, &target.channels, live, &category_ids, report).await
}

/// Phase 2: process target categories in ascending position order, matching
/// live categories by name. Returns the name → live-id mapping that phase 3
/// uses to resolve channel parents.
async fn reconcile_categories<P: GuildPlatform>(
    platform: &P,
    targets: &[CategorySnapshot],
    live: &GuildStructure,
    report: &mut ApplyReport,
) -> Result<HashMap<String, String>, ThemeError> {
    let matcher = CategoryMatcher::new(&live.categories);
    let mut ordered: Vec<&CategorySnapshot> = targets.iter().collect();
    ordered.sort_by_key(|c| c.position);

    let mut category_ids = HashMap::new();
    for cat in ordered {
        let (id, outcome) = match matcher.find(&cat.name) {
            Some(existing) if existing.position == cat.position => {
                (existing.id.clone(), Outcome::Unchanged)
            }
            Some(existing) => {
                platform.edit_category(&existing.id, cat.position).await?;
                (existing.id.clone(), Outcome::Repositioned)
            }
            None => {
                let id = platform.create_category(&cat.name, cat.position).await?;
                (id, Outcome::Created)
            }
        };
        category_ids.insert(cat.name.clone(), id);
        report.categories.push(ReconcileEntry {
            name: cat.name.clone(),
            outcome,
        });
    }
    Ok(category_ids)
}

/// Phase 3: match target channels to live ones by platform id. A target
/// whose `category` name did not resolve in phase 2 (malformed snapshot)
/// falls back to no parent rather than failing.
async fn reconcile_channels<P: GuildPlatform>(
    platform: &P,
    targets: &[ChannelSnapshot],
    live: &GuildStructure,
    category_ids: &HashMap<String, String>,
    report: &mut ApplyReport,
) -> Result<(), ThemeError> {
    let matcher = ChannelMatcher::new(&live.channels);

    for ch in targets {
        let parent_id = ch
            .category
            .as_deref()
            .and_then(|name| category_ids.get(name))
            .map(String::as_str);

        let matched = ch.platform_id.as_deref().and_then(|id| matcher.find(id));
        let outcome = match matched {
            Some(existing) => {
                if existing.name != ch.name || existing.category_id.as_deref() != parent_id {
                    platform.edit_channel(&existing.id, &ch.name, parent_id).await?;
                    Outcome::Edited
                } else {
                    Outcome::Unchanged
                }
            }
            None => {
                platform.create_channel(ch.kind, &ch.name, parent_id).await?;
                Outcome::Created
            }
        };
        report.channels.push(ReconcileEntry {
            name: ch.name.clone(),
            outcome,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ChannelKind;
    use crate::testutil::{Call, FakeGuild};

    fn snapshot(
        name: &str,
        categories: Vec<CategorySnapshot>,
        channels: Vec<ChannelSnapshot>,
    ) -> ServerSnapshot {
        ServerSnapshot {
            server_name: name.to_string(),
            server_icon: None,
            server_banner: None,
            categories,
            channels,
        }
    }

    fn cat(name: &str, position: i32) -> CategorySnapshot {
        CategorySnapshot {
            name: name.to_string(),
            position,
        }
    }

    fn chan(id: Option<&str>, name: &str, kind: ChannelKind, category: Option<&str>) -> ChannelSnapshot {
        ChannelSnapshot {
            platform_id: id.map(String::from),
            name: name.to_string(),
            kind,
            category: category.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let guild = FakeGuild::new("srv");
        let target = snapshot(
            "srv",
            vec![cat("Info", 0), cat("Misc", 1)],
            vec![
                chan(None, "general", ChannelKind::Text, Some("Info")),
                chan(None, "lounge", ChannelKind::Voice, None),
            ],
        );

        let report = apply(&guild, &target).await.unwrap();
        assert_eq!(report.mutations(), 4);

        // Second pass against the converged server issues zero mutations.
        // The target's channels carry no platform ids, so re-match them by
        // capturing the now-live state.
        let converged = crate::capture::capture(&guild).await.unwrap();
        guild.clear_calls();
        let report = apply(&guild, &converged).await.unwrap();
        assert_eq!(guild.mutation_count(), 0);
        assert_eq!(report.mutations(), 0);
    }

    #[tokio::test]
    async fn test_category_created_before_dependent_channel() {
        let guild = FakeGuild::new("srv");
        let target = snapshot(
            "srv",
            vec![cat("Info", 0)],
            vec![chan(None, "general", ChannelKind::Text, Some("Info"))],
        );

        apply(&guild, &target).await.unwrap();

        let calls = guild.calls();
        let cat_idx = calls
            .iter()
            .position(|c| matches!(c, Call::CreateCategory { .. }))
            .unwrap();
        let chan_idx = calls
            .iter()
            .position(|c| matches!(c, Call::CreateChannel { .. }))
            .unwrap();
        assert!(cat_idx < chan_idx);

        // The channel attached to the freshly created category.
        match &calls[chan_idx] {
            Call::CreateChannel { parent_id, .. } => assert!(parent_id.is_some()),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_categories_processed_in_position_order() {
        let guild = FakeGuild::new("srv");
        // Declared out of order, with a position gap
        let target = snapshot(
            "srv",
            vec![cat("Last", 7), cat("First", 0), cat("Mid", 3)],
            vec![],
        );

        apply(&guild, &target).await.unwrap();

        let created: Vec<(String, i32)> = guild
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateCategory { name, position } => Some((name, position)),
                _ => None,
            })
            .collect();
        assert_eq!(
            created,
            vec![
                ("First".to_string(), 0),
                ("Mid".to_string(), 3),
                ("Last".to_string(), 7)
            ]
        );
    }

    #[tokio::test]
    async fn test_matched_category_repositioned_not_recreated() {
        let guild = FakeGuild::new("srv");
        let info = guild.add_category("Info", 5);
        let target = snapshot("srv", vec![cat("Info", 0)], vec![]);

        apply(&guild, &target).await.unwrap();

        assert_eq!(
            guild.calls(),
            vec![Call::EditCategory {
                id: info.clone(),
                position: 0
            }]
        );
        assert_eq!(guild.category_position(&info), 0);
    }

    #[tokio::test]
    async fn test_channel_reattach_issues_single_edit() {
        let guild = FakeGuild::new("srv");
        let info = guild.add_category("Info", 0);
        let misc = guild.add_category("Misc", 1);
        let general = guild.add_channel("general", ChannelKind::Text, Some(&misc));

        let target = snapshot(
            "srv",
            vec![cat("Info", 0), cat("Misc", 1)],
            vec![chan(Some(&general), "general", ChannelKind::Text, Some("Info"))],
        );

        apply(&guild, &target).await.unwrap();

        assert_eq!(
            guild.calls(),
            vec![Call::EditChannel {
                id: general.clone(),
                name: "general".to_string(),
                parent_id: Some(info.clone()),
            }]
        );
        assert_eq!(guild.channel(&general).category_id, Some(info));
    }

    #[tokio::test]
    async fn test_unreferenced_live_structure_left_untouched() {
        let guild = FakeGuild::new("srv");
        guild.add_category("Keep Me", 9);
        let stray = guild.add_channel("off-topic", ChannelKind::Text, None);

        let target = snapshot(
            "srv",
            vec![cat("Info", 0)],
            vec![chan(None, "general", ChannelKind::Text, Some("Info"))],
        );

        apply(&guild, &target).await.unwrap();

        // No call ever names the stray channel or the unmatched category.
        for call in guild.calls() {
            match call {
                Call::EditChannel { id, .. } => assert_ne!(id, stray),
                Call::EditCategory { id, .. } => assert_ne!(id, stray),
                _ => {}
            }
        }
        assert_eq!(guild.channel(&stray).name, "off-topic");
    }

    #[tokio::test]
    async fn test_unresolved_category_name_falls_back_to_no_parent() {
        let guild = FakeGuild::new("srv");
        // Malformed snapshot: channel references a category the snapshot
        // itself does not declare.
        let target = snapshot(
            "srv",
            vec![],
            vec![chan(None, "general", ChannelKind::Text, Some("Ghost"))],
        );

        apply(&guild, &target).await.unwrap();

        assert_eq!(
            guild.calls(),
            vec![Call::CreateChannel {
                kind: ChannelKind::Text,
                name: "general".to_string(),
                parent_id: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_rename_skipped_when_name_matches() {
        let guild = FakeGuild::new("srv");
        let target = snapshot("srv", vec![], vec![]);

        apply(&guild, &target).await.unwrap();
        assert_eq!(guild.mutation_count(), 0);

        let renamed = snapshot("new-name", vec![], vec![]);
        apply(&guild, &renamed).await.unwrap();
        assert_eq!(guild.calls(), vec![Call::RenameGuild("new-name".to_string())]);
    }

    #[tokio::test]
    async fn test_structure_failure_surfaces_as_error() {
        let guild = FakeGuild::new("srv");
        guild.fail_mutations();

        let target = snapshot("srv", vec![cat("Info", 0)], vec![]);
        let err = apply(&guild, &target).await.unwrap_err();
        assert!(matches!(err, ThemeError::Platform(_)));
    }

    #[tokio::test]
    async fn test_branding_failure_does_not_abort_structure() {
        let guild = FakeGuild::new("srv");
        guild.fail_mutations();

        // Target with only a rename: the rename fails, but apply still
        // completes and reports the warning instead of erroring.
        let target = snapshot("other", vec![], vec![]);
        let report = apply(&guild, &target).await.unwrap();
        assert!(report.branding_warning.is_some());
    }

    #[test]
    fn test_channel_matcher_ignores_names() {
        let live = vec![LiveChannel {
            id: "42".to_string(),
            name: "renamed-live".to_string(),
            kind: ChannelKind::Text,
            category_id: None,
        }];
        let matcher = ChannelMatcher::new(&live);
        assert!(matcher.find("42").is_some());
        assert!(matcher.find("renamed-live").is_none());
    }

    #[test]
    fn test_category_matcher_is_case_sensitive() {
        let live = vec![LiveCategory {
            id: "1".to_string(),
            name: "Info".to_string(),
            position: 0,
        }];
        let matcher = CategoryMatcher::new(&live);
        assert!(matcher.find("Info").is_some());
        assert!(matcher.find("info").is_none());
    }
}
