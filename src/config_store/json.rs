use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// A type that can be stored under a configuration key.
///
/// Values are encoded as JSON. Types generated from message schemas set
/// [`OMIT_DEFAULTS`](Self::OMIT_DEFAULTS) so that fields still holding their
/// default value are left out of the stored document, matching how such
/// messages are usually rendered.
pub trait ConfigValue: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Leave default-valued fields out of the encoded document.
    const OMIT_DEFAULTS: bool = false;

    /// Encodes the value for storage.
    ///
    /// # Errors
    /// Returns the encoder error if the value cannot be represented as JSON.
    fn to_config_json(&self) -> Result<String, serde_json::Error> {
        if Self::OMIT_DEFAULTS {
            to_json_omit_defaults(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl ConfigValue for Value {}

/// Encodes `value` as JSON, dropping every object field equal to the same
/// field of `T::default()`. Nested objects are pruned field by field.
///
/// # Errors
/// Returns the encoder error if the value cannot be represented as JSON.
pub fn to_json_omit_defaults<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: Serialize + Default,
{
    let mut encoded = serde_json::to_value(value)?;
    let defaults = serde_json::to_value(T::default())?;

    prune_defaults(&mut encoded, &defaults);
    serde_json::to_string(&encoded)
}

fn prune_defaults(value: &mut Value, defaults: &Value) {
    let (Value::Object(fields), Value::Object(default_fields)) = (value, defaults) else {
        return;
    };

    fields.retain(|name, field| match default_fields.get(name) {
        Some(default) => *field != *default,
        None => !field.is_null(),
    });

    for (name, field) in fields.iter_mut() {
        if let Some(default) = default_fields.get(name) {
            prune_defaults(field, default);
        }
    }
}

