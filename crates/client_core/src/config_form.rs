//! Editable form state for the sync configuration and its conversion to the
//! JSON body `POST /api/config` expects.

use shared::protocol::{Playlist, SyncConfig};

pub const LAST_RUN_PREFIX: &str = "최근 실행: ";
pub const NO_LAST_RUN: &str = "기록 없음";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistDraft {
    pub name: String,
    pub url: String,
    pub folder: String,
    pub metube_folder: String,
}

impl PlaylistDraft {
    pub fn from_playlist(playlist: &Playlist) -> Self {
        Self {
            name: playlist.name.clone(),
            url: playlist.url.clone(),
            folder: playlist.folder.clone(),
            metube_folder: playlist.metube_folder.clone().unwrap_or_default(),
        }
    }

    /// `None` when name, url or folder is blank after trimming.
    pub fn to_playlist(&self) -> Option<Playlist> {
        let name = self.name.trim();
        let url = self.url.trim();
        let folder = self.folder.trim();
        if name.is_empty() || url.is_empty() || folder.is_empty() {
            return None;
        }

        let metube_folder = self.metube_folder.trim();
        Some(Playlist {
            name: name.to_string(),
            url: url.to_string(),
            folder: folder.to_string(),
            metube_folder: (!metube_folder.is_empty()).then(|| metube_folder.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDraft {
    pub metube_url: String,
    pub schedule_interval: String,
    pub last_run: Option<String>,
    pub playlists: Vec<PlaylistDraft>,
}

impl ConfigDraft {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            metube_url: config.metube_url.clone(),
            schedule_interval: config.schedule_interval.to_string(),
            last_run: config.last_run.clone(),
            playlists: config
                .playlists
                .iter()
                .map(PlaylistDraft::from_playlist)
                .collect(),
        }
    }

    pub fn last_run_label(&self) -> String {
        match self.last_run.as_deref().filter(|v| !v.is_empty()) {
            Some(last_run) => format!("{LAST_RUN_PREFIX}{last_run}"),
            None => format!("{LAST_RUN_PREFIX}{NO_LAST_RUN}"),
        }
    }

    pub fn interval(&self) -> u64 {
        parse_interval(&self.schedule_interval)
    }

    pub fn set_interval_input(&mut self, raw: &str) {
        self.schedule_interval = sanitize_interval_input(raw);
    }

    pub fn increment_interval(&mut self) {
        self.schedule_interval = self.interval().saturating_add(1).to_string();
    }

    pub fn decrement_interval(&mut self) {
        let value = self.interval();
        if value > 0 {
            self.schedule_interval = (value - 1).to_string();
        }
    }

    pub fn add_playlist(&mut self, playlist: PlaylistDraft) {
        self.playlists.push(playlist);
    }

    pub fn remove_playlist(&mut self, index: usize) -> Option<PlaylistDraft> {
        (index < self.playlists.len()).then(|| self.playlists.remove(index))
    }

    /// Index of the first playlist whose trimmed name matches.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.playlists.iter().position(|p| p.name.trim() == name)
    }

    /// Builds the body to submit. Incomplete playlist rows are dropped and
    /// `last_run` is never sent back.
    pub fn to_config(&self) -> SyncConfig {
        SyncConfig {
            metube_url: self.metube_url.trim().to_string(),
            schedule_interval: self.interval(),
            last_run: None,
            playlists: self
                .playlists
                .iter()
                .filter_map(PlaylistDraft::to_playlist)
                .collect(),
        }
    }
}

pub fn sanitize_interval_input(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Leading-digit parse; anything unparseable counts as 0.
pub fn parse_interval(raw: &str) -> u64 {
    let raw = raw.trim();
    let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
#[path = "tests/config_form_tests.rs"]
mod tests;
