//! community-hub/crates/cm-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Community Hub.

pub mod error;
pub mod models;
pub mod services;
pub mod traits;
pub mod updates;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
pub use updates::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn new_community_has_owner_as_only_admin() {
        let owner = Uuid::now_v7();
        let community = Community::new("C1".into(), "first".into(), owner);
        assert!(community.is_owner(owner));
        assert_eq!(community.members, vec![Member { id: owner, admin: true }]);
        assert!(!community.is_member(Uuid::now_v7()));
    }

    #[test]
    fn community_serializes_with_document_id() {
        let community = Community::new("C1".into(), "first".into(), Uuid::now_v7());
        let json = serde_json::to_value(&community).unwrap();
        assert_eq!(json["_id"], community.id.to_string());
        assert_eq!(json["members"][0]["admin"], true);
        assert!(json["events"].as_array().unwrap().is_empty());
    }
}
