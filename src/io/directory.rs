//! Reference directory loading.
//!
//! Each list is read from a JSON or YAML file holding either a bare array of
//! entries or the provider's response envelope:
//!
//! | List | Envelope key |
//! |------|--------------|
//! | dial numbers | none (bare array) |
//! | users | `data` |
//! | queues | `queues` |
//! | phone numbers | `phoneNumbers` |
//!
//! A list without a configured path is empty. YAML scalars keep their
//! literal text, so an unquoted `+15551234` stays a string.

use crate::models::{
    DialNumberEntry, PhoneNumberEntry, QueueNumberEntry, ReferenceDirectory, UserEntry,
};
use crate::{Error, Result};
use serde::de::{DeserializeOwned, DeserializeSeed, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::instrument;

use super::formats::Format;

/// Paths to the four reference lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryPaths {
    /// Contact center dial numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dial_numbers: Option<PathBuf>,
    /// Contact center users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<PathBuf>,
    /// Call queues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queues: Option<PathBuf>,
    /// Platform phone numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<PathBuf>,
}

/// Loads one reference list from a file.
///
/// `envelope` names the key holding the array when the file is a provider
/// response object.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or does not hold
/// a list of entries.
pub fn load_list<T: DeserializeOwned>(
    path: &Path,
    directory: &'static str,
    envelope: Option<&str>,
) -> Result<Vec<T>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_directory".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;

    let value: Value = match Format::from_path(path).unwrap_or_default() {
        Format::Yaml => {
            if let Some(entries) = parse_yaml_list(&contents, envelope) {
                return Ok(entries);
            }
            serde_yaml_ng::from_str(&contents).map_err(|e| Error::OperationFailed {
                operation: "parse_directory".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?
        },
        Format::Json | Format::Csv => {
            serde_json::from_str(&contents).map_err(|e| Error::OperationFailed {
                operation: "parse_directory".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?
        },
    };

    parse_list(value, directory, envelope)
}

/// Deserializes a YAML list straight into entries.
///
/// Going through [`Value`] would resolve plain scalars to numbers and drop
/// leading `+` and `0` digits. Returns `None` when the document does not
/// have the expected shape; the caller then reports the problem from the
/// generic value.
fn parse_yaml_list<T: DeserializeOwned>(contents: &str, envelope: Option<&str>) -> Option<Vec<T>> {
    if let Ok(entries) = serde_yaml_ng::from_str::<Vec<T>>(contents) {
        return Some(entries);
    }
    let key = envelope?;
    Envelope {
        key,
        entries: PhantomData,
    }
    .deserialize(serde_yaml_ng::Deserializer::from_str(contents))
    .ok()
    .flatten()
}

/// Reads the array under `key` of a response object, skipping other keys.
struct Envelope<'a, T> {
    key: &'a str,
    entries: PhantomData<T>,
}

impl<'de, T: DeserializeOwned> DeserializeSeed<'de> for Envelope<'_, T> {
    type Value = Option<Vec<T>>;

    fn deserialize<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, T: DeserializeOwned> Visitor<'de> for Envelope<'_, T> {
    type Value = Option<Vec<T>>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a mapping with a '{}' list", self.key)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = None;
        while let Some(key) = map.next_key::<String>()? {
            if entries.is_none() && key == self.key {
                entries = Some(map.next_value::<Vec<T>>()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(entries)
    }
}

/// Extracts a list of entries from a bare array or an envelope object.
///
/// # Errors
///
/// Returns [`Error::InvalidDirectory`] if the value holds no list or an
/// entry does not match the expected shape.
pub fn parse_list<T: DeserializeOwned>(
    value: Value,
    directory: &'static str,
    envelope: Option<&str>,
) -> Result<Vec<T>> {
    let items = match (value, envelope) {
        (Value::Array(items), _) => items,
        (Value::Object(mut map), Some(key)) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::InvalidDirectory {
                    directory,
                    reason: format!("expected an array under '{key}'"),
                });
            },
        },
        _ => {
            return Err(Error::InvalidDirectory {
                directory,
                reason: "expected an array of entries".to_string(),
            });
        },
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| Error::InvalidDirectory {
                directory,
                reason: format!("entry {index}: {e}"),
            })
        })
        .collect()
}

fn load_optional<T: DeserializeOwned>(
    path: Option<&Path>,
    directory: &'static str,
    envelope: Option<&str>,
) -> Result<Vec<T>> {
    match path {
        Some(path) => {
            let entries = load_list(path, directory, envelope)?;
            tracing::debug!(
                directory,
                path = %path.display(),
                entries = entries.len(),
                "Loaded reference list"
            );
            Ok(entries)
        },
        None => Ok(Vec::new()),
    }
}

/// Loads the reference directory from the configured paths.
///
/// # Errors
///
/// Returns an error if any configured file cannot be loaded.
#[instrument(skip(paths), fields(operation = "load_directory"))]
pub fn load_directory(paths: &DirectoryPaths) -> Result<ReferenceDirectory> {
    let dial_numbers: Vec<DialNumberEntry> =
        load_optional(paths.dial_numbers.as_deref(), "dial_numbers", None)?;
    let users: Vec<UserEntry> = load_optional(paths.users.as_deref(), "users", Some("data"))?;
    let queue_numbers: Vec<QueueNumberEntry> =
        load_optional(paths.queues.as_deref(), "queues", Some("queues"))?;
    let phone_numbers: Vec<PhoneNumberEntry> = load_optional(
        paths.phone_numbers.as_deref(),
        "phone_numbers",
        Some("phoneNumbers"),
    )?;

    Ok(ReferenceDirectory::new()
        .with_dial_numbers(dial_numbers)
        .with_users(users)
        .with_queue_numbers(queue_numbers)
        .with_phone_numbers(phone_numbers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_array() {
        let entries: Vec<DialNumberEntry> = parse_list(
            json!([{"dialledNumber": "100"}, {"name": "no number"}]),
            "dial_numbers",
            None,
        )
        .unwrap();
        assert_eq!(entries[0].dialled_number.as_deref(), Some("100"));
        assert_eq!(entries[1].dialled_number, None);
    }

    #[test]
    fn test_parse_envelope() {
        let users: Vec<UserEntry> = parse_list(
            json!({"data": [
                {"ciUserId": "a", "agentProfileId": "p"},
                {"ciUserId": "b", "agentProfileId": null},
                {"ciUserId": "c"}
            ]}),
            "users",
            Some("data"),
        )
        .unwrap();
        assert!(users[0].is_agent());
        assert!(users[1].is_agent());
        assert!(!users[2].is_agent());
    }

    #[test]
    fn test_missing_envelope_key() {
        let err = parse_list::<QueueNumberEntry>(json!({"items": []}), "queues", Some("queues"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDirectory { directory: "queues", .. }));
    }

    #[test]
    fn test_user_without_id_is_invalid() {
        let err =
            parse_list::<UserEntry>(json!([{"email": "x@example.com"}]), "users", None).unwrap_err();
        assert!(err.to_string().contains("entry 0"));
    }

    #[test]
    fn test_yaml_numbers_keep_their_text() {
        let dir = tempfile::tempdir().unwrap();
        let dial_numbers = dir.path().join("dial_numbers.yaml");
        std::fs::write(&dial_numbers, "- dialledNumber: +15551234\n- dialledNumber: 0123\n")
            .unwrap();
        let phone_numbers = dir.path().join("numbers.yml");
        std::fs::write(
            &phone_numbers,
            "meta: {page: 0}\nphoneNumbers:\n  - phoneNumber: +15550000\n    owner:\n      type: PEOPLE\n",
        )
        .unwrap();

        let directory = load_directory(&DirectoryPaths {
            dial_numbers: Some(dial_numbers),
            phone_numbers: Some(phone_numbers),
            ..DirectoryPaths::default()
        })
        .unwrap();

        let dialled: Vec<_> = directory
            .dial_numbers
            .iter()
            .map(|d| d.dialled_number.as_deref())
            .collect();
        assert_eq!(dialled, [Some("+15551234"), Some("0123")]);
        assert_eq!(
            directory.phone_numbers[0].phone_number.as_deref(),
            Some("+15550000")
        );
        assert_eq!(directory.phone_numbers[0].owner_type(), Some("PEOPLE"));
    }

    #[test]
    fn test_yaml_envelope_without_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let queues = dir.path().join("queues.yaml");
        std::fs::write(&queues, "items: []\n").unwrap();

        let err = load_list::<QueueNumberEntry>(&queues, "queues", Some("queues")).unwrap_err();
        assert!(matches!(err, Error::InvalidDirectory { directory: "queues", .. }));
    }

    #[test]
    fn test_no_paths_yields_empty_directory() {
        let directory = load_directory(&DirectoryPaths::default()).unwrap();
        assert!(directory.is_empty());
    }

    #[test]
    fn test_missing_file_fails() {
        let paths = DirectoryPaths {
            users: Some(PathBuf::from("/nonexistent/users.json")),
            ..DirectoryPaths::default()
        };
        assert!(load_directory(&paths).is_err());
    }
}
