//! # Community Update Operators
//!
//! Every mutation of a community's embedded collections is one of these
//! operators. A `CommunityRepo` applies an operator to a single community
//! document atomically and reports whether the document changed; the guard
//! listed on each variant is evaluated in the same atomic step as the write.

use uuid::Uuid;

use crate::models::{Announcement, Event, EventChanges, Member};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommunityUpdate {
    /// Push onto `members`. Guard: no member with the same user id.
    AddMember(Member),
    /// Pull every member with this user id. Guard: at least one match.
    RemoveMember { user_id: Uuid },
    /// Push onto `announcements`. Guard: none beyond the community existing.
    AddAnnouncement(Announcement),
    /// Pull the announcement with this id whose creator is `creator_id`.
    RemoveAnnouncement {
        announcement_id: Uuid,
        creator_id: Uuid,
    },
    /// Push onto `events`. Guard: the community's owner is `owner_id`.
    AddEvent { event: Event, owner_id: Uuid },
    /// Pull the event with this id. Guard: owner is `owner_id`, event present.
    RemoveEvent { event_id: Uuid, owner_id: Uuid },
    /// Set the mutable fields of the event with this id in place.
    /// Guard: owner is `owner_id`, event present.
    SetEvent {
        event_id: Uuid,
        owner_id: Uuid,
        changes: EventChanges,
    },
}

impl CommunityUpdate {
    pub fn join(user_id: Uuid) -> Self {
        Self::AddMember(Member {
            id: user_id,
            admin: false,
        })
    }

    pub fn leave(user_id: Uuid) -> Self {
        Self::RemoveMember { user_id }
    }

    pub fn retract_announcement(announcement_id: Uuid, creator_id: Uuid) -> Self {
        Self::RemoveAnnouncement {
            announcement_id,
            creator_id,
        }
    }

    pub fn schedule_event(event: Event, owner_id: Uuid) -> Self {
        Self::AddEvent { event, owner_id }
    }

    pub fn cancel_event(event_id: Uuid, owner_id: Uuid) -> Self {
        Self::RemoveEvent { event_id, owner_id }
    }

    pub fn reschedule_event(event_id: Uuid, owner_id: Uuid, changes: EventChanges) -> Self {
        Self::SetEvent {
            event_id,
            owner_id,
            changes,
        }
    }

    /// Short operator name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddMember(_) => "add_member",
            Self::RemoveMember { .. } => "remove_member",
            Self::AddAnnouncement(_) => "add_announcement",
            Self::RemoveAnnouncement { .. } => "remove_announcement",
            Self::AddEvent { .. } => "add_event",
            Self::RemoveEvent { .. } => "remove_event",
            Self::SetEvent { .. } => "set_event",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_adds_a_non_admin_member() {
        let user = Uuid::now_v7();
        assert_eq!(
            CommunityUpdate::join(user),
            CommunityUpdate::AddMember(Member {
                id: user,
                admin: false
            })
        );
    }

    #[test]
    fn leave_and_join_address_the_same_user() {
        let user = Uuid::now_v7();
        assert_eq!(CommunityUpdate::leave(user), CommunityUpdate::RemoveMember { user_id: user });
        assert_eq!(CommunityUpdate::join(user).kind(), "add_member");
        assert_eq!(CommunityUpdate::leave(user).kind(), "remove_member");
    }
}
