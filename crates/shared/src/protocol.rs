use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::error::ApiError;

/// Data of the final event the run stream emits once the job is over.
pub const RUN_CLOSE_SENTINEL: &str = "close";
/// Phrase the service writes when the sync process exits.
pub const PROCESS_TERMINATED_MARKER: &str = "[시스템] 프로세스 종료";

/// The service writes blank YAML keys as `null`; read those as empty values.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub folder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metube_folder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metube_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedule_interval: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveConfigResponse {
    Success,
    Error(ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Stopped,
    NoProcess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StopStatus>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub filename: String,
}

/// Body of `GET /api/history`: a JSON object of id -> filename, kept in the
/// order the service wrote it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryRecords(pub Vec<HistoryEntry>);

impl HistoryRecords {
    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.0
    }
}

impl Serialize for HistoryRecords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.id, &entry.filename)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for HistoryRecords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordsVisitor;

        impl<'de> Visitor<'de> for RecordsVisitor {
            type Value = HistoryRecords;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping history ids to filenames")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, filename)) = access.next_entry::<String, String>()? {
                    entries.push(HistoryEntry { id, filename });
                }
                Ok(HistoryRecords(entries))
            }
        }

        deserializer.deserialize_map(RecordsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_tolerates_missing_optional_fields() {
        let config: SyncConfig = serde_json::from_str(
            r#"{"metube_url":"http://metube:8081","schedule_interval":6,
                "playlists":[{"name":"mix","url":"https://y/pl","folder":"/music/mix"}]}"#,
        )
        .expect("config");

        assert_eq!(config.last_run, None);
        assert_eq!(config.playlists[0].metube_folder, None);
        assert_eq!(config.schedule_interval, 6);
    }

    #[test]
    fn config_reads_null_fields_as_empty() {
        let config: SyncConfig = serde_json::from_str(
            r#"{"metube_url":null,"schedule_interval":null,"last_run":null,"playlists":null}"#,
        )
        .expect("config");
        assert_eq!(config, SyncConfig::default());

        let config: SyncConfig = serde_json::from_str(
            r#"{"metube_url":"http://metube","schedule_interval":3,
                "playlists":[{"name":"mix","url":null,"folder":null,"metube_folder":null}]}"#,
        )
        .expect("config");
        assert_eq!(
            config.playlists,
            vec![Playlist {
                name: "mix".into(),
                ..Playlist::default()
            }]
        );
    }

    #[test]
    fn config_serialization_omits_absent_options() {
        let config = SyncConfig {
            metube_url: "http://metube".into(),
            schedule_interval: 0,
            last_run: None,
            playlists: vec![Playlist {
                name: "a".into(),
                url: "b".into(),
                folder: "c".into(),
                metube_folder: None,
            }],
        };
        let json = serde_json::to_value(&config).expect("json");
        assert!(json.get("last_run").is_none());
        assert!(json["playlists"][0].get("metube_folder").is_none());
    }

    #[test]
    fn save_response_variants_follow_status_tag() {
        let ok: SaveConfigResponse = serde_json::from_str(r#"{"status":"success"}"#).expect("ok");
        assert_eq!(ok, SaveConfigResponse::Success);

        let err: SaveConfigResponse =
            serde_json::from_str(r#"{"status":"error","error":"bad yaml"}"#).expect("err");
        assert_eq!(err, SaveConfigResponse::Error(ApiError::new("bad yaml")));
    }

    #[test]
    fn stop_response_accepts_missing_status() {
        let res: StopResponse = serde_json::from_str(r#"{"message":"done"}"#).expect("stop");
        assert_eq!(res.status, None);

        let res: StopResponse =
            serde_json::from_str(r#"{"status":"no_process","message":"idle"}"#).expect("stop");
        assert_eq!(res.status, Some(StopStatus::NoProcess));
    }

    #[test]
    fn history_keeps_server_order() {
        let records: HistoryRecords =
            serde_json::from_str(r#"{"zeta":"z.m4a","alpha":"a.m4a","mid":"m.m4a"}"#)
                .expect("history");
        let ids: Vec<_> = records.0.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["zeta", "alpha", "mid"]);
    }
}
