//! Translation of `CommunityUpdate` operators into single SQL statements.
//!
//! Each operator becomes exactly one `UPDATE communities ... WHERE id = ?`
//! whose guard sits in the `WHERE` clause, so SQLite evaluates the guard and
//! the array rewrite atomically. `rows_affected() == 0` means the community
//! is missing or the guard failed.

use chrono::{DateTime, SecondsFormat, Utc};
use cm_core::updates::CommunityUpdate;
use uuid::Uuid;

use crate::uuid_to_blob;

/// A value bound to one `?` placeholder, in textual order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Bind {
    Text(String),
    Blob(Vec<u8>),
}

#[derive(Debug)]
pub(crate) struct Statement {
    pub sql: String,
    pub binds: Vec<Bind>,
}

/// Appends one JSON element to an array column.
fn push(column: &str, guard: &str) -> String {
    format!(
        "UPDATE communities SET {column} = json_insert({column}, '$[#]', json(?)) \
         WHERE id = ?{guard}"
    )
}

/// Rebuilds an array column element by element, in array order.
/// `element` maps each `value` to its replacement; `keep` filters elements.
/// Needs SQLite 3.44+ for the ordered aggregate.
fn rebuild(column: &str, element: &str, keep: &str) -> String {
    format!(
        "(SELECT json_group_array(json({element}) ORDER BY key) \
          FROM json_each(communities.{column}) WHERE {keep})"
    )
}

fn any_element(column: &str, predicate: &str) -> String {
    format!(" AND EXISTS (SELECT 1 FROM json_each(communities.{column}) WHERE {predicate})")
}

fn no_element(column: &str, predicate: &str) -> String {
    format!(" AND NOT EXISTS (SELECT 1 FROM json_each(communities.{column}) WHERE {predicate})")
}

const ID_MATCHES: &str = "json_extract(value, '$.id') = ?";
const ID_DIFFERS: &str = "json_extract(value, '$.id') <> ?";
const OWNER_MATCHES: &str = " AND owner = ?";

/// Matches the JSON encoding serde uses for `DateTime<Utc>`.
fn json_timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn text(id: Uuid) -> Bind {
    Bind::Text(id.to_string())
}

pub(crate) fn compile(community_id: Uuid, update: &CommunityUpdate) -> anyhow::Result<Statement> {
    let community = Bind::Blob(uuid_to_blob(community_id));

    let statement = match update {
        CommunityUpdate::AddMember(member) => Statement {
            sql: push("members", &no_element("members", ID_MATCHES)),
            binds: vec![
                Bind::Text(serde_json::to_string(member)?),
                community,
                text(member.id),
            ],
        },
        CommunityUpdate::RemoveMember { user_id } => Statement {
            sql: format!(
                "UPDATE communities SET members = {} WHERE id = ?{}",
                rebuild("members", "value", ID_DIFFERS),
                any_element("members", ID_MATCHES),
            ),
            binds: vec![text(*user_id), community, text(*user_id)],
        },
        CommunityUpdate::AddAnnouncement(announcement) => Statement {
            sql: push("announcements", ""),
            binds: vec![Bind::Text(serde_json::to_string(announcement)?), community],
        },
        CommunityUpdate::RemoveAnnouncement {
            announcement_id,
            creator_id,
        } => {
            let target =
                "json_extract(value, '$.id') = ? AND json_extract(value, '$.creator.id') = ?";
            Statement {
                sql: format!(
                    "UPDATE communities SET announcements = {} WHERE id = ?{}",
                    rebuild("announcements", "value", &format!("NOT ({target})")),
                    any_element("announcements", target),
                ),
                binds: vec![
                    text(*announcement_id),
                    text(*creator_id),
                    community,
                    text(*announcement_id),
                    text(*creator_id),
                ],
            }
        }
        CommunityUpdate::AddEvent { event, owner_id } => Statement {
            sql: push("events", OWNER_MATCHES),
            binds: vec![
                Bind::Text(serde_json::to_string(event)?),
                community,
                Bind::Blob(uuid_to_blob(*owner_id)),
            ],
        },
        CommunityUpdate::RemoveEvent { event_id, owner_id } => Statement {
            sql: format!(
                "UPDATE communities SET events = {} WHERE id = ?{OWNER_MATCHES}{}",
                rebuild("events", "value", ID_DIFFERS),
                any_element("events", ID_MATCHES),
            ),
            binds: vec![
                text(*event_id),
                community,
                Bind::Blob(uuid_to_blob(*owner_id)),
                text(*event_id),
            ],
        },
        CommunityUpdate::SetEvent {
            event_id,
            owner_id,
            changes,
        } => {
            let element = "CASE WHEN json_extract(value, '$.id') = ? \
                 THEN json_set(value, '$.name', ?, '$.description', ?, '$.date', ?, '$.time', ?) \
                 ELSE value END";
            Statement {
                sql: format!(
                    "UPDATE communities SET events = {} WHERE id = ?{OWNER_MATCHES}{}",
                    rebuild("events", element, "1"),
                    any_element("events", ID_MATCHES),
                ),
                binds: vec![
                    text(*event_id),
                    Bind::Text(changes.name.clone()),
                    Bind::Text(changes.description.clone()),
                    Bind::Text(json_timestamp(&changes.date)),
                    Bind::Text(changes.time.clone()),
                    community,
                    Bind::Blob(uuid_to_blob(*owner_id)),
                    text(*event_id),
                ],
            }
        }
    };
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_core::models::{Announcement, Creator, Event, EventChanges};

    fn every_operator() -> Vec<CommunityUpdate> {
        let id = Uuid::now_v7();
        let date = Utc::now();
        vec![
            CommunityUpdate::join(id),
            CommunityUpdate::leave(id),
            CommunityUpdate::AddAnnouncement(Announcement {
                id,
                creator: Creator {
                    name: "Ada".into(),
                    id,
                },
                date,
                message: "hello".into(),
            }),
            CommunityUpdate::retract_announcement(id, id),
            CommunityUpdate::schedule_event(
                Event {
                    id,
                    name: "Meetup".into(),
                    description: String::new(),
                    date,
                    time: "18:00".into(),
                    address: "Main St".into(),
                },
                id,
            ),
            CommunityUpdate::cancel_event(id, id),
            CommunityUpdate::reschedule_event(
                id,
                id,
                EventChanges {
                    name: "Renamed".into(),
                    description: String::new(),
                    date,
                    time: "19:00".into(),
                },
            ),
        ]
    }

    #[test]
    fn placeholders_match_binds() {
        for update in every_operator() {
            let statement = compile(Uuid::now_v7(), &update).unwrap();
            let placeholders = statement.sql.matches('?').count();
            assert_eq!(
                placeholders,
                statement.binds.len(),
                "{}: {}",
                update.kind(),
                statement.sql
            );
        }
    }

    #[test]
    fn join_is_guarded_against_existing_ids() {
        let statement = compile(Uuid::now_v7(), &CommunityUpdate::join(Uuid::now_v7())).unwrap();
        assert!(statement.sql.contains("AND NOT EXISTS"));
    }

    #[test]
    fn rebuilt_arrays_are_ordered_by_index() {
        let statement = compile(Uuid::now_v7(), &CommunityUpdate::leave(Uuid::now_v7())).unwrap();
        assert!(statement.sql.contains("json_group_array(json(value) ORDER BY key)"));
    }

    #[test]
    fn owner_guarded_operators_bind_the_owner() {
        let owner = Uuid::now_v7();
        let update = CommunityUpdate::cancel_event(Uuid::now_v7(), owner);
        let statement = compile(Uuid::now_v7(), &update).unwrap();
        assert!(statement.sql.contains("owner = ?"));
        assert!(statement.binds.contains(&Bind::Blob(uuid_to_blob(owner))));
    }

    #[test]
    fn timestamps_match_serde_encoding() {
        let date = DateTime::parse_from_rfc3339("2024-05-01T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let via_serde = serde_json::to_value(date).unwrap();
        assert_eq!(via_serde, serde_json::Value::String(json_timestamp(&date)));
    }
}
