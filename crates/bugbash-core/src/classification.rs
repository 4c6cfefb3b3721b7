// Classification tree types
//
// A fix event reports its classified fixes as an arbitrary-depth label tree
// (tool → rule → ...), whose leaves carry fix counts. On the wire it is a JSON
// object; here it is decoded into a typed tree so the aggregator can match on
// the variant instead of inspecting runtime JSON types.
//
// Entries that are neither numbers nor objects do not fail the decode. They
// are kept as `ClassificationValue::Malformed` so the aggregator can report
// them per entry while still scoring their siblings.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One node of a classification tree: label → value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationTree {
    entries: BTreeMap<String, ClassificationValue>,
}

/// Value stored under a classification label
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationValue {
    /// Leaf: number of fixes for this label
    Count(f64),
    /// Nested classification level
    Nested(ClassificationTree),
    /// Anything else found on the wire (string, bool, array, null)
    Malformed(Value),
}

impl ClassificationTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf count
    pub fn with_count(mut self, label: impl Into<String>, count: f64) -> Self {
        self.insert(label, ClassificationValue::Count(count));
        self
    }

    /// Add a nested level
    pub fn with_nested(mut self, label: impl Into<String>, tree: ClassificationTree) -> Self {
        self.insert(label, ClassificationValue::Nested(tree));
        self
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, label: impl Into<String>, value: ClassificationValue) {
        self.entries.insert(label.into(), value);
    }

    pub fn get(&self, label: &str) -> Option<&ClassificationValue> {
        self.entries.get(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClassificationValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ClassificationValue {
    /// Name of the JSON kind a malformed value was decoded from
    pub fn kind(&self) -> &'static str {
        match self {
            ClassificationValue::Count(_) => "number",
            ClassificationValue::Nested(_) => "object",
            ClassificationValue::Malformed(value) => json_kind(value),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Value> for ClassificationValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(count) => ClassificationValue::Count(count),
                None => ClassificationValue::Malformed(Value::Number(n)),
            },
            Value::Object(map) => ClassificationValue::Nested(ClassificationTree::from(map)),
            other => ClassificationValue::Malformed(other),
        }
    }
}

impl From<Map<String, Value>> for ClassificationTree {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(label, value)| (label, ClassificationValue::from(value)))
                .collect(),
        }
    }
}

impl FromIterator<(String, ClassificationValue)> for ClassificationTree {
    fn from_iter<I: IntoIterator<Item = (String, ClassificationValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ClassificationTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ClassificationTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(ClassificationTree::from)
    }
}

impl Serialize for ClassificationValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ClassificationValue::Count(count) => serializer.serialize_f64(*count),
            ClassificationValue::Nested(tree) => tree.serialize(serializer),
            ClassificationValue::Malformed(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ClassificationValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ClassificationValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_nested_tree() {
        let tree: ClassificationTree = serde_json::from_value(json!({
            "G104": 1,
            "ShellCheck": 1,
            "opt": {"semgrep": {"sprintf-host-port": 2}}
        }))
        .unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get("G104"), Some(&ClassificationValue::Count(1.0)));

        let Some(ClassificationValue::Nested(opt)) = tree.get("opt") else {
            panic!("expected nested opt");
        };
        let Some(ClassificationValue::Nested(semgrep)) = opt.get("semgrep") else {
            panic!("expected nested semgrep");
        };
        assert_eq!(
            semgrep.get("sprintf-host-port"),
            Some(&ClassificationValue::Count(2.0))
        );
    }

    #[test]
    fn test_decode_keeps_malformed_entries() {
        let tree: ClassificationTree = serde_json::from_value(json!({
            "myBadBugType": "bogusValueType",
            "listed": [1, 2],
            "nothing": null,
            "good": 2
        }))
        .unwrap();

        assert_eq!(tree.get("myBadBugType").unwrap().kind(), "string");
        assert_eq!(tree.get("listed").unwrap().kind(), "array");
        assert_eq!(tree.get("nothing").unwrap().kind(), "null");
        assert_eq!(tree.get("good"), Some(&ClassificationValue::Count(2.0)));
    }

    #[test]
    fn test_top_level_must_be_object() {
        let result = serde_json::from_value::<ClassificationTree>(json!([1, 2, 3]));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_preserves_shape() {
        let tree = ClassificationTree::new()
            .with_count("G104", 1.0)
            .with_nested("opt", ClassificationTree::new().with_count("rule-x", 2.0));

        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value, json!({"G104": 1.0, "opt": {"rule-x": 2.0}}));
    }
}
