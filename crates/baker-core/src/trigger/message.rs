//! Inbound message-bus messages

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Topic suffix of tag events.
pub const TAG_TOPIC_SUFFIX: &str = "buildsys.tag";

/// A message as delivered by the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    #[serde(default)]
    pub body: Value,
}

impl Message {
    pub fn new(topic: impl Into<String>, body: Value) -> Self {
        Self {
            topic: topic.into(),
            body,
        }
    }

    /// Parse one JSON line.
    pub fn from_json(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn is_tag_event(&self) -> bool {
        self.topic.ends_with(TAG_TOPIC_SUFFIX)
    }
}

/// A component was tagged into a build tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEvent {
    pub component: String,
    pub tag: String,
}

impl TagEvent {
    /// Extract `name` and `tag` from a tag message body.
    pub fn from_message(message: &Message) -> Result<Self> {
        let field = |key: &str| {
            message
                .body
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::Event {
                    message: format!("body of {} has no string '{}'", message.topic, key),
                })
        };
        Ok(Self {
            component: field("name")?,
            tag: field("tag")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_line() {
        let message = Message::from_json(
            r#"{"topic": "org.fedoraproject.prod.buildsys.tag", "body": {"name": "bash", "tag": "f39-updates-candidate", "version": "5.2"}}"#,
        )
        .unwrap();
        assert!(message.is_tag_event());

        let event = TagEvent::from_message(&message).unwrap();
        assert_eq!(event.component, "bash");
        assert_eq!(event.tag, "f39-updates-candidate");
    }

    #[test]
    fn test_other_topics_are_not_tag_events() {
        let message = Message::new("org.fedoraproject.prod.buildsys.untag", json!({}));
        assert!(!message.is_tag_event());
    }

    #[test]
    fn test_missing_tag_field() {
        let message = Message::new("x.buildsys.tag", json!({"name": "bash"}));
        let err = TagEvent::from_message(&message).unwrap_err();
        assert!(err.to_string().contains("'tag'"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Message::from_json("{not json"), Err(Error::Json(_))));
    }
}
