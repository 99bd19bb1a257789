//! Message payload, routing hints, and endpoint resolution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message kind assumed when the payload does not specify one.
pub const DEFAULT_KIND: &str = "text";

/// Message kind that triggers the attachment upload step.
pub const FILE_KIND: &str = "file";

/// Routing endpoint of the Compass send API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    UserSend,
    GroupSend,
    ThreadSend,
}

impl Endpoint {
    /// Path fragment appended to the API base URL
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::UserSend => "user/send",
            Endpoint::GroupSend => "group/send",
            Endpoint::ThreadSend => "thread/send",
        }
    }
}

/// Routing hint resolved from the recipient for the `compass` channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RouteHint {
    /// No routing information
    #[default]
    None,
    /// Direct user target
    User(i64),
    /// Group target
    Group(String),
    /// Key/value overrides merged over the payload, hint keys winning
    Overrides(Map<String, Value>),
}

impl RouteHint {
    /// Coerces a loosely-typed routing value into a hint.
    ///
    /// Objects become overrides, numbers a user target, non-empty strings a
    /// group target. Everything else carries no routing information.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => RouteHint::Overrides(map.clone()),
            Value::Number(n) => n.as_i64().map(RouteHint::User).unwrap_or(RouteHint::None),
            Value::String(s) if !s.is_empty() => RouteHint::Group(s.clone()),
            _ => RouteHint::None,
        }
    }
}

/// Open message payload: typed known fields plus arbitrary passthrough keys.
///
/// Unknown keys survive a round trip untouched via the flattened `extra` map,
/// so notification authors can use API fields this crate does not model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Direct user target; wins over all other targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// Group target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// Thread target: id of the message being replied to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Message kind, wire name `type`; effectively defaults to `text`
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,

    /// Message text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Local path of an attachment; consumed by the upload step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Identifier of an already-uploaded attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,

    /// Credential-set selector; stripped before transmission
    #[serde(default, skip_serializing)]
    pub bot: Option<String>,

    /// Passthrough for keys this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessagePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload addressed to a user
    pub fn to_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Payload addressed to a group
    pub fn to_group(group_id: impl Into<String>) -> Self {
        Self {
            group_id: Some(group_id.into()),
            ..Self::default()
        }
    }

    /// Payload replying to a thread
    pub fn to_thread(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }

    pub fn with_bot(mut self, bot: impl Into<String>) -> Self {
        self.bot = Some(bot.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Effective message kind, defaulting to `text`
    pub fn kind_or_default(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_KIND)
    }

    /// Whether the attachment upload step applies
    pub fn is_file(&self) -> bool {
        self.kind_or_default() == FILE_KIND
    }

    /// Routing endpoint by fixed priority: user, then group, then thread.
    pub fn endpoint(&self) -> Option<Endpoint> {
        if self.user_id.is_some() {
            Some(Endpoint::UserSend)
        } else if self.group_id.is_some() {
            Some(Endpoint::GroupSend)
        } else if self.message_id.is_some() {
            Some(Endpoint::ThreadSend)
        } else {
            None
        }
    }

    /// Applies a routing hint resolved from the recipient.
    ///
    /// Override maps win over existing payload keys; user and group hints
    /// only fill the target when it is not already set.
    pub fn apply_hint(&mut self, hint: RouteHint) {
        match hint {
            RouteHint::None => {}
            RouteHint::User(id) => {
                self.user_id.get_or_insert(id);
            }
            RouteHint::Group(group) => {
                if !group.is_empty() && self.group_id.is_none() {
                    self.group_id = Some(group);
                }
            }
            RouteHint::Overrides(map) => {
                for (key, value) in map {
                    self.set_field(key, value);
                }
            }
        }
    }

    /// Sets a field by wire name, routing known keys to their typed slots.
    ///
    /// Values that do not match the slot's type land in `extra` untouched,
    /// preserving the open-payload passthrough.
    pub fn set_field(&mut self, key: String, value: Value) {
        if key == "user_id" {
            if let Some(id) = value.as_i64() {
                self.user_id = Some(id);
                return;
            }
            self.extra.insert(key, value);
            return;
        }

        let slot = match key.as_str() {
            "group_id" => Some(&mut self.group_id),
            "message_id" => Some(&mut self.message_id),
            "type" => Some(&mut self.kind),
            "text" => Some(&mut self.text),
            "file" => Some(&mut self.file),
            "file_id" => Some(&mut self.file_id),
            "bot" => Some(&mut self.bot),
            _ => None,
        };

        match (slot, value) {
            (Some(slot), Value::String(s)) => *slot = Some(s),
            (_, value) => {
                self.extra.insert(key, value);
            }
        }
    }
}
