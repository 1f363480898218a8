use std::sync::Arc;

use uuid::Uuid;

use super::{parse_timestamp, required};
use crate::error::{AppError, Result};
use crate::models::{Announcement, Community, Creator, Event, EventChanges};
use crate::traits::CommunityRepo;
use crate::updates::CommunityUpdate;

#[derive(Debug, Clone)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub community_id: Uuid,
    /// Display name credited on the announcement.
    pub name: String,
    pub message: String,
    /// RFC 3339 timestamp as supplied by the client.
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub community_id: Uuid,
    pub name: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct EventUpdate {
    pub community_id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub description: String,
    pub date: String,
    pub time: String,
}

/// Reads and guarded mutations of community aggregates.
///
/// Every mutation is a single `CommunityUpdate` handed to the repository,
/// so membership and ownership rules hold at the point of the write rather
/// than at a separate read. When an operator reports no change, the
/// aggregate is read once more only to tell the caller why.
pub struct CommunityService {
    repo: Arc<dyn CommunityRepo>,
}

impl CommunityService {
    pub fn new(repo: Arc<dyn CommunityRepo>) -> Self {
        Self { repo }
    }

    pub async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Community>> {
        Ok(self.repo.list_by_member(user_id).await?)
    }

    /// Creates a community owned by `owner`, who becomes its first admin.
    pub async fn create(&self, owner: Uuid, input: NewCommunity) -> Result<Uuid> {
        let community = Community::new(
            required("name", input.name)?,
            required("description", input.description)?,
            owner,
        );
        let id = community.id;
        self.repo.insert_community(community).await?;
        log::info!("community {id} created by {owner}");
        Ok(id)
    }

    /// The query is matched verbatim; surrounding spaces are part of it.
    pub async fn search(&self, query: &str) -> Result<Vec<Community>> {
        Ok(self.repo.search_by_name(query).await?)
    }

    /// Adds the caller as a regular member. A caller who is already a member
    /// (admin or not) is rejected with `AlreadyMember`.
    pub async fn join(&self, community_id: Uuid, user_id: Uuid) -> Result<()> {
        if self
            .repo
            .apply(community_id, CommunityUpdate::join(user_id))
            .await?
        {
            log::info!("user {user_id} joined community {community_id}");
            return Ok(());
        }
        match self.repo.get_community(community_id).await? {
            None => Err(community_not_found(community_id)),
            Some(_) => Err(AppError::AlreadyMember),
        }
    }

    /// Removes the caller's membership. Not being a member is not an error.
    pub async fn leave(&self, community_id: Uuid, user_id: Uuid) -> Result<()> {
        let removed = self
            .repo
            .apply(community_id, CommunityUpdate::leave(user_id))
            .await?;
        if removed {
            log::info!("user {user_id} left community {community_id}");
        } else {
            log::debug!("leave of {community_id} by non-member {user_id} ignored");
        }
        Ok(())
    }

    pub async fn create_announcement(&self, user_id: Uuid, input: NewAnnouncement) -> Result<Uuid> {
        let announcement = Announcement {
            id: Uuid::now_v7(),
            creator: Creator {
                name: required("name", input.name)?,
                id: user_id,
            },
            date: parse_timestamp("date", &input.date)?,
            message: required("message", input.message)?,
        };
        let id = announcement.id;

        let update = CommunityUpdate::AddAnnouncement(announcement);
        if !self.repo.apply(input.community_id, update).await? {
            return Err(community_not_found(input.community_id));
        }
        log::info!("announcement {id} posted to {} by {user_id}", input.community_id);
        Ok(id)
    }

    /// Removes an announcement only when the caller created it. A missing
    /// announcement and someone else's announcement both succeed silently.
    pub async fn delete_announcement(
        &self,
        community_id: Uuid,
        announcement_id: Uuid,
        user_id: Uuid,
    ) -> Result<()> {
        let update = CommunityUpdate::retract_announcement(announcement_id, user_id);
        if self.repo.apply(community_id, update).await? {
            log::info!("announcement {announcement_id} deleted from {community_id}");
        } else {
            log::debug!("announcement {announcement_id} delete by {user_id} matched nothing");
        }
        Ok(())
    }

    /// Adds an event. Only the community owner may schedule events.
    pub async fn create_event(&self, user_id: Uuid, input: NewEvent) -> Result<Uuid> {
        let event = Event {
            id: Uuid::now_v7(),
            name: required("name", input.name)?,
            description: input.description.trim().to_string(),
            date: parse_timestamp("date", &input.date)?,
            time: input.time.trim().to_string(),
            address: input.address.trim().to_string(),
        };
        let id = event.id;

        let update = CommunityUpdate::schedule_event(event, user_id);
        if !self.repo.apply(input.community_id, update).await? {
            return Err(self.explain_refusal(input.community_id, user_id, None).await);
        }
        log::info!("event {id} added to {}", input.community_id);
        Ok(id)
    }

    /// Removes an event when the caller owns the community; otherwise no-op.
    pub async fn delete_event(&self, community_id: Uuid, event_id: Uuid, user_id: Uuid) -> Result<()> {
        let update = CommunityUpdate::cancel_event(event_id, user_id);
        if self.repo.apply(community_id, update).await? {
            log::info!("event {event_id} deleted from {community_id}");
        } else {
            log::debug!("event {event_id} delete by {user_id} matched nothing");
        }
        Ok(())
    }

    /// Overwrites name, description, date and time of one event in place.
    /// Identity and address are left as they were.
    pub async fn update_event(&self, user_id: Uuid, input: EventUpdate) -> Result<()> {
        let changes = EventChanges {
            name: required("name", input.name)?,
            description: input.description.trim().to_string(),
            date: parse_timestamp("date", &input.date)?,
            time: input.time.trim().to_string(),
        };

        let update = CommunityUpdate::reschedule_event(input.event_id, user_id, changes);
        if !self.repo.apply(input.community_id, update).await? {
            return Err(self
                .explain_refusal(input.community_id, user_id, Some(input.event_id))
                .await);
        }
        log::info!("event {} updated in {}", input.event_id, input.community_id);
        Ok(())
    }

    /// Works out why an owner-guarded operator changed nothing.
    async fn explain_refusal(&self, community_id: Uuid, user_id: Uuid, event_id: Option<Uuid>) -> AppError {
        match self.repo.get_community(community_id).await {
            Err(e) => AppError::Storage(e),
            Ok(None) => community_not_found(community_id),
            Ok(Some(c)) if !c.is_owner(user_id) => {
                AppError::Forbidden("only the community owner can manage events".into())
            }
            Ok(Some(_)) => match event_id {
                Some(event_id) => AppError::NotFound("event", event_id.to_string()),
                None => community_not_found(community_id),
            },
        }
    }
}

fn community_not_found(id: Uuid) -> AppError {
    AppError::NotFound("community", id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Member;
    use crate::traits::MockCommunityRepo;
    use mockall::predicate::eq;

    const DATE: &str = "2024-05-01T18:00:00Z";

    fn owned_by(owner: Uuid) -> Community {
        Community::new("C1".into(), "first".into(), owner)
    }

    fn service(repo: MockCommunityRepo) -> CommunityService {
        CommunityService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn create_makes_owner_sole_admin() {
        let owner = Uuid::now_v7();
        let mut repo = MockCommunityRepo::new();
        repo.expect_insert_community()
            .withf(move |c| {
                c.owner == owner
                    && c.members == vec![Member { id: owner, admin: true }]
                    && c.announcements.is_empty()
                    && c.events.is_empty()
            })
            .times(1)
            .returning(|_| Ok(()));

        let input = NewCommunity {
            name: " C1 ".into(),
            description: "first".into(),
        };
        service(repo).create(owner, input).await.unwrap();
    }

    #[tokio::test]
    async fn create_requires_name_and_description() {
        let svc = service(MockCommunityRepo::new());
        let missing_description = NewCommunity {
            name: "C1".into(),
            description: "".into(),
        };
        let err = svc.create(Uuid::now_v7(), missing_description).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn join_of_missing_community_is_not_found() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply().returning(|_, _| Ok(false));
        repo.expect_get_community().returning(|_| Ok(None));

        let err = service(repo).join(Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("community", _)));
    }

    #[tokio::test]
    async fn join_by_existing_admin_is_already_member() {
        let owner = Uuid::now_v7();
        let community = owned_by(owner);
        let id = community.id;
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply()
            .with(eq(id), eq(CommunityUpdate::join(owner)))
            .returning(|_, _| Ok(false));
        repo.expect_get_community()
            .returning(move |_| Ok(Some(community.clone())));

        let err = service(repo).join(id, owner).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyMember));
    }

    #[tokio::test]
    async fn leave_as_non_member_succeeds() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply().returning(|_, _| Ok(false));
        repo.expect_get_community().never();

        service(repo).leave(Uuid::now_v7(), Uuid::now_v7()).await.unwrap();
    }

    #[tokio::test]
    async fn announcement_credits_the_caller() {
        let caller = Uuid::now_v7();
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply()
            .withf(move |_, update| match update {
                CommunityUpdate::AddAnnouncement(a) => {
                    a.creator.id == caller && a.creator.name == "Ada" && a.message == "hello"
                }
                _ => false,
            })
            .returning(|_, _| Ok(true));

        let input = NewAnnouncement {
            community_id: Uuid::now_v7(),
            name: "Ada".into(),
            message: "hello".into(),
            date: DATE.into(),
        };
        service(repo).create_announcement(caller, input).await.unwrap();
    }

    #[tokio::test]
    async fn announcement_with_bad_date_never_reaches_storage() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply().never();

        let input = NewAnnouncement {
            community_id: Uuid::now_v7(),
            name: "Ada".into(),
            message: "hello".into(),
            date: "tomorrow".into(),
        };
        let err = service(repo)
            .create_announcement(Uuid::now_v7(), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn announcement_requires_a_display_name() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply().never();

        let input = NewAnnouncement {
            community_id: Uuid::now_v7(),
            name: "  ".into(),
            message: "hello".into(),
            date: DATE.into(),
        };
        let err = service(repo)
            .create_announcement(Uuid::now_v7(), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "name is required"));
    }

    #[tokio::test]
    async fn delete_announcement_no_match_is_silent() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply().returning(|_, _| Ok(false));
        service(repo)
            .delete_announcement(Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_event_by_non_owner_is_forbidden() {
        let owner = Uuid::now_v7();
        let community = owned_by(owner);
        let id = community.id;
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply().returning(|_, _| Ok(false));
        repo.expect_get_community()
            .returning(move |_| Ok(Some(community.clone())));

        let input = NewEvent {
            community_id: id,
            name: "Meetup".into(),
            description: "monthly".into(),
            date: DATE.into(),
            time: "18:00".into(),
            address: "Main St".into(),
        };
        let err = service(repo).create_event(Uuid::now_v7(), input).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn update_of_missing_event_is_not_found() {
        let owner = Uuid::now_v7();
        let community = owned_by(owner);
        let id = community.id;
        let event_id = Uuid::now_v7();
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply().returning(|_, _| Ok(false));
        repo.expect_get_community()
            .returning(move |_| Ok(Some(community.clone())));

        let input = EventUpdate {
            community_id: id,
            event_id,
            name: "Renamed".into(),
            description: "".into(),
            date: DATE.into(),
            time: "19:00".into(),
        };
        let err = service(repo).update_event(owner, input).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("event", found) if found == event_id.to_string()));
    }

    #[tokio::test]
    async fn search_passes_the_query_through_untouched() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_search_by_name()
            .with(eq(" b"))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        service(repo).search(" b").await.unwrap();
    }

    #[tokio::test]
    async fn announcement_on_missing_community_is_not_found() {
        let community_id = Uuid::now_v7();
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply().returning(|_, _| Ok(false));

        let input = NewAnnouncement {
            community_id,
            name: "Ada".into(),
            message: "hello".into(),
            date: DATE.into(),
        };
        let err = service(repo)
            .create_announcement(Uuid::now_v7(), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("community", found) if found == community_id.to_string()));
    }

    #[tokio::test]
    async fn event_on_missing_community_is_not_found() {
        let community_id = Uuid::now_v7();
        let mut repo = MockCommunityRepo::new();
        repo.expect_apply().returning(|_, _| Ok(false));
        repo.expect_get_community()
            .with(eq(community_id))
            .returning(|_| Ok(None));

        let input = NewEvent {
            community_id,
            name: "Meetup".into(),
            description: "monthly".into(),
            date: DATE.into(),
            time: "18:00".into(),
            address: "Main St".into(),
        };
        let err = service(repo).create_event(Uuid::now_v7(), input).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("community", found) if found == community_id.to_string()));
    }

    #[tokio::test]
    async fn storage_failures_surface_as_storage_errors() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_search_by_name()
            .returning(|_| Err(anyhow::anyhow!("database is locked")));

        let err = service(repo).search("c").await.unwrap_err();
        assert!(err.is_internal());
    }
}
