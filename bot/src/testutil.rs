//! In-memory fake of the chat-platform boundary for tests. Records every
//! mutation call so tests can assert on exactly which operations were issued
//! and in what order.

use std::sync::Mutex;

use anyhow::{Result, anyhow};

use crate::platform::{GuildPlatform, GuildStructure, LiveCategory, LiveChannel};
use crate::snapshot::ChannelKind;

/// One recorded mutation against the fake platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RenameGuild(String),
    SetIcon,
    SetBanner,
    CreateCategory { name: String, position: i32 },
    EditCategory { id: String, position: i32 },
    CreateChannel { kind: ChannelKind, name: String, parent_id: Option<String> },
    EditChannel { id: String, name: String, parent_id: Option<String> },
}

struct FakeState {
    name: String,
    icon_url: Option<String>,
    banner_url: Option<String>,
    categories: Vec<LiveCategory>,
    channels: Vec<LiveChannel>,
    calls: Vec<Call>,
    next_id: u64,
    fail_mutations: bool,
}

pub struct FakeGuild {
    state: Mutex<FakeState>,
}

impl FakeGuild {
    pub fn new(name: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                name: name.to_string(),
                icon_url: None,
                banner_url: None,
                categories: Vec::new(),
                channels: Vec::new(),
                calls: Vec::new(),
                next_id: 1,
                fail_mutations: false,
            }),
        }
    }

    /// Seed a live category; returns its id.
    pub fn add_category(&self, name: &str, position: i32) -> String {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id.to_string();
        s.next_id += 1;
        s.categories.push(LiveCategory {
            id: id.clone(),
            name: name.to_string(),
            position,
        });
        id
    }

    /// Seed a live channel; returns its id.
    pub fn add_channel(&self, name: &str, kind: ChannelKind, category_id: Option<&str>) -> String {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id.to_string();
        s.next_id += 1;
        s.channels.push(LiveChannel {
            id: id.clone(),
            name: name.to_string(),
            kind,
            category_id: category_id.map(String::from),
        });
        id
    }

    /// Make every subsequent mutation call fail.
    pub fn fail_mutations(&self) {
        self.state.lock().unwrap().fail_mutations = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn rename_channel_directly(&self, id: &str, name: &str) {
        let mut s = self.state.lock().unwrap();
        let ch = s.channels.iter_mut().find(|c| c.id == id).unwrap();
        ch.name = name.to_string();
    }

    pub fn move_category_directly(&self, id: &str, position: i32) {
        let mut s = self.state.lock().unwrap();
        let cat = s.categories.iter_mut().find(|c| c.id == id).unwrap();
        cat.position = position;
    }

    pub fn category_position(&self, id: &str) -> i32 {
        let s = self.state.lock().unwrap();
        s.categories.iter().find(|c| c.id == id).unwrap().position
    }

    pub fn channel(&self, id: &str) -> LiveChannel {
        let s = self.state.lock().unwrap();
        s.channels.iter().find(|c| c.id == id).unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.fail_mutations {
            return Err(anyhow!("simulated platform failure"));
        }
        s.calls.push(call);
        Ok(())
    }
}

impl GuildPlatform for FakeGuild {
    async fn guild_structure(&self) -> Result<GuildStructure> {
        let s = self.state.lock().unwrap();
        Ok(GuildStructure {
            name: s.name.clone(),
            icon_url: s.icon_url.clone(),
            banner_url: s.banner_url.clone(),
            categories: s.categories.clone(),
            channels: s.channels.clone(),
        })
    }

    async fn rename_guild(&self, name: &str) -> Result<()> {
        self.record(Call::RenameGuild(name.to_string()))?;
        self.state.lock().unwrap().name = name.to_string();
        Ok(())
    }

    async fn set_guild_icon(&self, _bytes: &[u8]) -> Result<()> {
        self.record(Call::SetIcon)
    }

    async fn set_guild_banner(&self, _bytes: &[u8]) -> Result<()> {
        self.record(Call::SetBanner)
    }

    async fn create_category(&self, name: &str, position: i32) -> Result<String> {
        self.record(Call::CreateCategory {
            name: name.to_string(),
            position,
        })?;
        Ok(self.add_category(name, position))
    }

    async fn edit_category(&self, category_id: &str, position: i32) -> Result<()> {
        self.record(Call::EditCategory {
            id: category_id.to_string(),
            position,
        })?;
        let mut s = self.state.lock().unwrap();
        if let Some(cat) = s.categories.iter_mut().find(|c| c.id == category_id) {
            cat.position = position;
        }
        Ok(())
    }

    async fn create_channel(
        &self,
        kind: ChannelKind,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String> {
        self.record(Call::CreateChannel {
            kind,
            name: name.to_string(),
            parent_id: parent_id.map(String::from),
        })?;
        Ok(self.add_channel(name, kind, parent_id))
    }

    async fn edit_channel(
        &self,
        channel_id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<()> {
        self.record(Call::EditChannel {
            id: channel_id.to_string(),
            name: name.to_string(),
            parent_id: parent_id.map(String::from),
        })?;
        let mut s = self.state.lock().unwrap();
        if let Some(ch) = s.channels.iter_mut().find(|c| c.id == channel_id) {
            ch.name = name.to_string();
            ch.category_id = parent_id.map(String::from);
        }
        Ok(())
    }
}
