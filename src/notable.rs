//! Suggested comparison fields derived from a benchmark template
//!
//! A benchmark's `json_template` marks leaves worth comparing across results
//! by prefixing their key with `!`:
//!
//! ```text
//! { "meta": { "!threads": 4, "!os": "linux" }, "score": 99 }
//! ```
//!
//! yields `meta.threads` and `meta.os`. The marker only applies to leaves; a
//! marked key holding an object is walked like any other branch.

use serde_json::Value;
use tracing::warn;

/// Prefix marking a notable key
pub const NOTABLE_MARKER: char = '!';

/// Template tree as seen by the extractor
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Object members or array elements, in document order.
    /// Array elements are keyed by their index.
    Branch(Vec<(String, TemplateNode)>),
    /// Anything that is not a container, `null` included
    Leaf,
}

impl From<&Value> for TemplateNode {
    fn from(value: &Value) -> Self {
        match value {
            Value::Object(map) => TemplateNode::Branch(
                map.iter()
                    .map(|(k, v)| (k.clone(), TemplateNode::from(v)))
                    .collect(),
            ),
            Value::Array(items) => TemplateNode::Branch(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), TemplateNode::from(v)))
                    .collect(),
            ),
            _ => TemplateNode::Leaf,
        }
    }
}

/// Strip the marker from a key, if present
fn notable_name(key: &str) -> Option<&str> {
    key.strip_prefix(NOTABLE_MARKER)
}

/// Extract the dotted paths of every notable leaf, depth-first in document order.
///
/// Templates that are not objects (including `null` or a missing template)
/// have no suggestions.
pub fn extract(template: &Value) -> Vec<String> {
    if !template.is_object() {
        if !template.is_null() {
            warn!("Benchmark template is not an object, no fields suggested");
        }
        return Vec::new();
    }

    let mut paths = Vec::new();
    if let TemplateNode::Branch(children) = TemplateNode::from(template) {
        for (key, child) in &children {
            collect(key, child, "", &mut paths);
        }
    }
    paths
}

fn collect(key: &str, node: &TemplateNode, prefix: &str, out: &mut Vec<String>) {
    match (notable_name(key), node) {
        (Some(name), TemplateNode::Leaf) => out.push(join(prefix, name)),
        (_, TemplateNode::Branch(children)) => {
            let prefix = join(prefix, key);
            for (child_key, child) in children {
                collect(child_key, child, &prefix, out);
            }
        }
        (None, TemplateNode::Leaf) => {}
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_extract_nested_leaves_in_order() {
        let template = json!({ "meta": { "!threads": 4, "!os": "linux" }, "score": 99 });
        assert_eq!(extract(&template), vec!["meta.threads", "meta.os"]);
    }

    #[test]
    fn test_extract_without_markers_is_empty() {
        let template = json!({ "a": { "b": 1, "c": [1, 2, { "d": "x" }] }, "e": null });
        assert!(extract(&template).is_empty());
    }

    #[test]
    fn test_marked_branch_is_not_emitted() {
        let template = json!({ "!config": { "!cores": 8, "name": "n" } });
        assert_eq!(extract(&template), vec!["!config.cores"]);
    }

    #[test]
    fn test_top_level_marked_leaf() {
        let template = json!({ "!score": 1.0, "other": true });
        assert_eq!(extract(&template), vec!["score"]);
    }

    #[test]
    fn test_marked_path_emitted_once() {
        let template = json!({ "a": { "!b": 1, "c": { "!b": 2 } } });
        let paths = extract(&template);
        assert_eq!(paths.iter().filter(|p| *p == "a.b").count(), 1);
        assert_eq!(paths, vec!["a.b", "a.c.b"]);
    }

    #[test]
    fn test_empty_and_malformed_templates() {
        assert!(extract(&json!({})).is_empty());
        assert!(extract(&json!({ "a": {}, "b": [] })).is_empty());
        assert!(extract(&Value::Null).is_empty());
        assert!(extract(&json!([{ "!x": 1 }])).is_empty());
        assert!(extract(&json!("text")).is_empty());
    }

    #[test]
    fn test_marked_null_and_array_values() {
        let template = json!({
            "!nothing": null,
            "!list": [ { "!inner": 3 } ],
        });
        assert_eq!(extract(&template), vec!["nothing", "!list.0.inner"]);
    }
}
