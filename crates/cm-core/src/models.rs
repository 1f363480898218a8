//! # Domain Models
//!
//! These structs represent the core entities of Community Hub.
//! A `Community` is an aggregate: its members, announcements and events are
//! embedded in the same document and mutated through `CommunityUpdate`.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Never serialized to clients; see `UserProfile`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Login key, stored trimmed and lowercased.
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The client-facing view of a `User`, without credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// A user's membership entry inside a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// The member's user id. Membership identity is this field alone.
    pub id: Uuid,
    pub admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    pub id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub creator: Creator,
    pub date: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    /// Free-form time of day as supplied by the client (e.g. "18:30").
    pub time: String,
    pub address: String,
}

/// The mutable subset of an `Event`. Identity and address are never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventChanges {
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub time: String,
}

/// The community aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner: Uuid,
    pub members: Vec<Member>,
    pub announcements: Vec<Announcement>,
    pub events: Vec<Event>,
    pub created_at: DateTime<Utc>,
}

impl Community {
    /// Builds a fresh aggregate whose only member is the owner, as admin.
    pub fn new(name: String, description: String, owner: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            name,
            description,
            owner,
            members: vec![Member {
                id: owner,
                admin: true,
            }],
            announcements: Vec::new(),
            events: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner == user_id
    }
}
