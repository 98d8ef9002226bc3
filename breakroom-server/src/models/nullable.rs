//! Distinguish an absent JSON field from an explicit `null`
//!
//! Use with `#[serde(default, deserialize_with = "nullable::deserialize")]`
//! on an `Option<Option<T>>`: missing = `None`, `null` = `Some(None)`,
//! value = `Some(Some(v))`.

use serde::{Deserialize, Deserializer};

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "super::deserialize")]
        song_id: Option<Option<i64>>,
    }

    #[test]
    fn absent_null_and_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.song_id, None);

        let null: Patch = serde_json::from_str(r#"{"song_id": null}"#).unwrap();
        assert_eq!(null.song_id, Some(None));

        let set: Patch = serde_json::from_str(r#"{"song_id": 7}"#).unwrap();
        assert_eq!(set.song_id, Some(Some(7)));
    }
}
