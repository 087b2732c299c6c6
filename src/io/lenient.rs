//! Field deserializers for saved snapshots that degrade per item instead of
//! rejecting the whole document.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes a list, dropping elements that do not parse.
///
/// A non-array value yields an empty list.
pub(crate) fn skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            warn!("expected a list of {}, found {other}", short_name::<T>());
            return Ok(Vec::new());
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(v) => out.push(v),
            Err(e) => warn!("skipping unreadable {} #{i}: {e}", short_name::<T>()),
        }
    }
    Ok(out)
}

/// Deserializes a single value, falling back to its default if it does not parse.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("resetting unreadable {}: {e}", short_name::<T>());
        T::default()
    }))
}

fn short_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Holder {
        #[serde(deserialize_with = "super::skip_invalid")]
        numbers: Vec<u8>,
        #[serde(deserialize_with = "super::or_default")]
        marker: Option<i64>,
    }

    #[test]
    fn bad_elements_are_dropped() {
        let h: Holder = serde_json::from_str(r#"{"numbers": [1, "x", 300, 4]}"#).expect("parse");
        assert_eq!(h.numbers, vec![1, 4]);
    }

    #[test]
    fn non_list_becomes_empty() {
        let h: Holder = serde_json::from_str(r#"{"numbers": {"a": 1}}"#).expect("parse");
        assert!(h.numbers.is_empty());
        let h: Holder = serde_json::from_str(r#"{"numbers": null}"#).expect("parse");
        assert!(h.numbers.is_empty());
    }

    #[test]
    fn bad_scalar_resets() {
        let h: Holder = serde_json::from_str(r#"{"marker": "soon"}"#).expect("parse");
        assert_eq!(h.marker, None);
        let h: Holder = serde_json::from_str(r#"{"marker": 17}"#).expect("parse");
        assert_eq!(h.marker, Some(17));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let h: Holder = serde_json::from_str("{}").expect("parse");
        assert!(h.numbers.is_empty());
        assert_eq!(h.marker, None);
    }
}
