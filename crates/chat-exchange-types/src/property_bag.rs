// property_bag.rs: case-insensitive, insertion-ordered extension data carried by every entity.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: String,
    value: Value,
}

/// An ordered, case-insensitive string-keyed map for provider-specific data.
///
/// Lookups fold case; the casing of the first write for a key is kept for
/// iteration and serialization, while the value follows last-write-wins.
/// `clone()` yields an independent bag, so attach a clone whenever a bag is
/// handed to a second owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: IndexMap<String, Entry>,
}

fn fold_key(key: &str) -> String {
    key.to_lowercase()
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value. Returns the previous value, if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.get_mut(&fold_key(&key)) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value)),
            None => {
                self.entries.insert(fold_key(&key), Entry { key, value });
                None
            }
        }
    }

    /// Builder-style variant of [`PropertyBag::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&fold_key(key)).map(|e| &e.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold_key(key))
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(&fold_key(key)).map(|e| e.value)
    }

    /// Best-effort typed extraction.
    ///
    /// The stored value is first deserialized as `T` directly. When that fails
    /// and the value is a scalar, string/number/bool re-interpretations are
    /// tried (`"42"` as an integer, `7` as a string, `"true"` as a bool).
    /// Failure is reported as `None`, never as an error.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        if let Ok(v) = T::deserialize(value) {
            return Some(v);
        }
        scalar_reinterpretations(value)
            .into_iter()
            .find_map(|candidate| T::deserialize(&candidate).ok())
    }

    /// Upsert every entry of `other` into this bag (key-wise last-write-wins).
    pub fn merge_from(&mut self, other: &PropertyBag) {
        for (key, value) in other.iter() {
            self.set(key, value.clone());
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.values().map(|e| (e.key.as_str(), &e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn scalar_reinterpretations(value: &Value) -> Vec<Value> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            let mut out = Vec::new();
            if let Ok(i) = trimmed.parse::<i64>() {
                out.push(Value::from(i));
            } else if let Ok(u) = trimmed.parse::<u64>() {
                out.push(Value::from(u));
            }
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    out.push(Value::from(f));
                }
            }
            if trimmed.eq_ignore_ascii_case("true") {
                out.push(Value::Bool(true));
            } else if trimmed.eq_ignore_ascii_case("false") {
                out.push(Value::Bool(false));
            }
            out
        }
        Value::Number(n) => {
            let mut out = vec![Value::String(n.to_string())];
            // 3.0 should satisfy an integer request
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    out.push(Value::from(f as i64));
                }
            }
            out
        }
        Value::Bool(b) => vec![Value::String(b.to_string())],
        _ => Vec::new(),
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        for (k, v) in iter {
            bag.set(k, v);
        }
        bag
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for PropertyBag {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl Serialize for PropertyBag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyBag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::deserialize(deserializer)?;
        Ok(map.into_iter().collect())
    }
}

/// Upsert `source` into the optional bag `target`, creating it when absent.
pub fn merge_into(target: &mut Option<PropertyBag>, source: &PropertyBag) {
    target.get_or_insert_with(PropertyBag::new).merge_from(source);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut bag = PropertyBag::new();
        bag.set("Region", "eu-west");
        assert_eq!(bag.get("region"), Some(&json!("eu-west")));
        assert_eq!(bag.get("REGION"), Some(&json!("eu-west")));
        assert!(bag.contains_key("rEgIoN"));
    }

    #[test]
    fn test_last_write_wins_and_keeps_position() {
        let mut bag = PropertyBag::new();
        bag.set("a", 1);
        bag.set("B", 2);
        let previous = bag.set("A", 3);
        assert_eq!(previous, Some(json!(1)));
        assert_eq!(bag.len(), 2);
        let entries: Vec<_> = bag.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        assert_eq!(
            entries,
            vec![("a".to_string(), json!(3)), ("B".to_string(), json!(2))]
        );
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut bag: PropertyBag = [("x", 1), ("y", 2), ("z", 3)].into_iter().collect();
        assert_eq!(bag.remove("Y"), Some(json!(2)));
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["x", "z"]);
        assert_eq!(bag.remove("missing"), None);
    }

    #[test]
    fn test_get_as_exact_type() {
        let bag = PropertyBag::new().with("count", 5).with("name", "alpha");
        assert_eq!(bag.get_as::<i64>("count"), Some(5));
        assert_eq!(bag.get_as::<String>("name"), Some("alpha".to_string()));
    }

    #[test]
    fn test_get_as_converts_scalars() {
        let bag = PropertyBag::new()
            .with("numeric_string", "42")
            .with("number", 7)
            .with("flag", "TRUE")
            .with("whole_float", 3.0)
            .with("bool", false);
        assert_eq!(bag.get_as::<i32>("numeric_string"), Some(42));
        assert_eq!(bag.get_as::<f64>("numeric_string"), Some(42.0));
        assert_eq!(bag.get_as::<String>("number"), Some("7".to_string()));
        assert_eq!(bag.get_as::<bool>("flag"), Some(true));
        assert_eq!(bag.get_as::<i64>("whole_float"), Some(3));
        assert_eq!(bag.get_as::<String>("bool"), Some("false".to_string()));
    }

    #[test]
    fn test_get_as_failure_is_none() {
        let bag = PropertyBag::new()
            .with("text", "not a number")
            .with("object", json!({"a": 1}));
        assert_eq!(bag.get_as::<i64>("text"), None);
        assert_eq!(bag.get_as::<i64>("object"), None);
        assert_eq!(bag.get_as::<i64>("missing"), None);
        assert_eq!(bag.get_as::<u8>("text"), None);
    }

    #[test]
    fn test_get_as_structured_value() {
        #[derive(Deserialize, PartialEq, Debug)]
        struct Region {
            name: String,
        }
        let bag = PropertyBag::new().with("region", json!({"name": "eu"}));
        assert_eq!(
            bag.get_as::<Region>("REGION"),
            Some(Region {
                name: "eu".to_string()
            })
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let original = PropertyBag::new().with("k", 1);
        let mut copy = original.clone();
        copy.set("k", 2);
        copy.set("other", true);
        assert_eq!(original.get("k"), Some(&json!(1)));
        assert_eq!(original.len(), 1);
    }

    #[test]
    fn test_merge_into_creates_and_upserts() {
        let mut target: Option<PropertyBag> = None;
        merge_into(&mut target, &PropertyBag::new().with("a", 1));
        merge_into(&mut target, &PropertyBag::new().with("A", 2).with("b", 3));
        let bag = target.unwrap();
        assert_eq!(bag.get("a"), Some(&json!(2)));
        assert_eq!(bag.get("b"), Some(&json!(3)));
    }

    #[test]
    fn test_serializes_as_flat_object_in_order() {
        let bag = PropertyBag::new().with("zeta", 1).with("Alpha", "x");
        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(json, r#"{"zeta":1,"Alpha":"x"}"#);
        let back: PropertyBag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bag);
        assert_eq!(back.get("alpha"), Some(&json!("x")));
    }
}
