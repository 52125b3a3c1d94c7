use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A versioned configuration value.
///
/// This is the unit returned by every store read, whether it came from a
/// local override file or from the remote key-value store. The serde field
/// names match the on-disk override format: `{"Key": .., "Val": .., "Ver": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Item {
    /// Logical key, without the namespace tag.
    #[serde(rename = "Key", default)]
    pub key: String,

    /// Raw value, usually a JSON document.
    #[serde(rename = "Val", default)]
    pub value: String,

    /// Optimistic-concurrency stamp assigned by the remote store.
    ///
    /// Zero means the key does not exist upstream.
    #[serde(rename = "Ver", default)]
    pub version: i64,
}

impl Item {
    /// Creates a new item.
    pub fn new(key: impl Into<String>, value: impl Into<String>, version: i64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            version,
        }
    }

    /// Whether this item can stand in as a local override.
    ///
    /// Items with an empty key, an empty value or a zero version are ignored.
    pub fn is_valid(&self) -> bool {
        !self.key.is_empty() && !self.value.is_empty() && self.version != 0
    }

    /// Decodes the JSON value into `T`.
    ///
    /// An empty value decodes to `T::default()`.
    ///
    /// # Errors
    /// Returns the underlying decode error if the value is not valid JSON for `T`.
    pub fn decode<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned + Default,
    {
        decode_value(&self.value)
    }
}

/// Where an [`Item`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemSource {
    /// A local override file.
    Local,
    /// The remote key-value store.
    Remote,
}

/// Decodes a raw JSON value, treating an empty string as the default instance.
pub(crate) fn decode_value<T>(raw: &str) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned + Default,
{
    if raw.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(raw)
}
