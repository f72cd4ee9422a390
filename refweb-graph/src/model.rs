// Corpus records as they arrive from the snapshot collaborator

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Forward references, in the order the document cites them
    #[serde(default, deserialize_with = "lenient_ids")]
    pub refs: Vec<String>,
    /// Back-references, only ever used for discovery
    #[serde(default, deserialize_with = "lenient_ids")]
    pub pingback: Vec<String>,
    #[serde(default, deserialize_with = "lenient_ids")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub karma: Option<f64>,
    #[serde(default, rename = "upvoteCount", deserialize_with = "lenient_number")]
    pub upvote_count: Option<f64>,
    #[serde(default, rename = "commentCount", deserialize_with = "lenient_number")]
    pub comment_count: Option<f64>,
}

impl Document {
    /// The name a document is requested by: its title without surrounding whitespace
    pub fn name(&self) -> &str {
        self.title.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "postId")]
    pub post_id: String,
    #[serde(default, rename = "parentCommentId", deserialize_with = "lenient_id")]
    pub parent_comment_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub author_id: Option<String>,
    #[serde(default, rename = "htmlBody")]
    pub html_body: Option<String>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_comment_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub display_name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub karma: Option<f64>,
    #[serde(default)]
    pub slug: String,
}

/// Coerce a metric cell to a number. Numeric strings are parsed; null,
/// booleans, garbage and non-finite values become `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

/// Identifiers sometimes arrive as empty strings instead of null
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Id lists may be null or missing; blank entries are dropped
fn lenient_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Vec<Option<String>>>::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_are_coerced() {
        let doc: Document = serde_json::from_str(
            r#"{"_id":"P1","title":" Hello ","karma":"12","upvoteCount":"n/a","commentCount":null}"#,
        )
        .unwrap();

        assert_eq!(doc.id, "P1");
        assert_eq!(doc.name(), "Hello");
        assert_eq!(doc.karma, Some(12.0));
        assert_eq!(doc.upvote_count, None);
        assert_eq!(doc.comment_count, None);
        assert!(doc.refs.is_empty());
    }

    #[test]
    fn test_null_reference_lists() {
        let doc: Document =
            serde_json::from_str(r#"{"_id":"P1","refs":null,"pingback":["P2","",null]}"#).unwrap();

        assert!(doc.refs.is_empty());
        assert_eq!(doc.pingback, vec!["P2".to_string()]);
    }

    #[test]
    fn test_comment_parent_blank_is_top_level() {
        let comment: Comment = serde_json::from_str(
            r#"{"_id":"C1","postId":"P1","parentCommentId":"","author_id":"U1","htmlBody":"<p>hi</p>"}"#,
        )
        .unwrap();

        assert!(comment.is_top_level());
        assert_eq!(comment.author_id.as_deref(), Some("U1"));
    }
}
