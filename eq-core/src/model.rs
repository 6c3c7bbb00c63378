use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Fresh unique id carrying the record's conventional prefix.
            pub fn fresh() -> Self {
                Self(format!(concat!($prefix, "-{}"), Uuid::new_v4()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

id_type!(OwnerId, "owner");
id_type!(StableId, "stable");
id_type!(HorseId, "horse");
id_type!(AppointmentId, "apt");
id_type!(TaskId, "task");
id_type!(AttachmentId, "att");
id_type!(MessageId, "msg");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    pub name: String,
    /// E.164 phone number; the sender key for inbound messages.
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stable {
    pub id: StableId,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    None,
    Weekly,
    Monthly,
    Annually,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub title: String,
    pub date: DateTime<Utc>,
    pub recurring: Recurrence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub due_date: DateTime<Utc>,
    /// Only field that may change after creation.
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Medical,
    Passport,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub url: String,
    pub kind: AttachmentKind,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horse {
    pub id: HorseId,
    pub name: String,
    pub stable_id: StableId,
    pub owners: Vec<Owner>,
    pub appointments: Vec<Appointment>,
    pub tasks: Vec<Task>,
    pub attachments: Vec<Attachment>,
    pub image_url: String,
}

/// A message waiting in the pending inbox. Created externally (the inbound
/// channel), removed exactly once when actioned or ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: MessageId,
    /// Sender phone number.
    pub from: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_prefixed_and_unique() {
        let a = AppointmentId::fresh();
        let b = AppointmentId::fresh();
        assert!(a.as_str().starts_with("apt-"));
        assert_ne!(a, b);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = HorseId::new("horse-1");
        let json = serde_json::to_string(&id).expect("serialize id");
        assert_eq!(json, "\"horse-1\"");
        let back: HorseId = serde_json::from_str(&json).expect("deserialize id");
        assert_eq!(back, id);
    }

    #[test]
    fn recurrence_uses_snake_case_tags() {
        let json = serde_json::to_string(&Recurrence::Annually).expect("serialize");
        assert_eq!(json, "\"annually\"");
    }
}
