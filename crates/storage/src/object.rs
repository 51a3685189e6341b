//! Stored object types.

use chrono::{DateTime, Utc};
use policy::{Capability, PolicyMap, Protected, UserId, Viewer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// An object in the store, guarded by its capability policies.
///
/// The owner, when set, automatically holds every capability the object
/// declares a policy for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: ObjectId,
    pub title: String,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub policies: PolicyMap,
}

impl StoredObject {
    pub fn new(title: impl Into<String>, policies: PolicyMap) -> Self {
        Self {
            id: ObjectId::new(),
            title: title.into(),
            owner: None,
            created_at: Utc::now(),
            policies,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(UserId::new(owner));
        self
    }
}

impl Protected for StoredObject {
    fn policies(&self) -> &PolicyMap {
        &self.policies
    }

    fn has_automatic_capability(&self, _capability: Capability, viewer: &Viewer) -> bool {
        match (&self.owner, viewer.user_id()) {
            (Some(owner), Some(user)) => owner == user,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::{PolicyConfig, PolicyValue, can_view};

    #[test]
    fn test_owner_sees_no_one_object() {
        let object = StoredObject::new(
            "Quarterly plan",
            PolicyMap::new().with(Capability::View, PolicyValue::NoOne),
        )
        .with_owner("alice");
        let view = [Capability::View];
        let config = PolicyConfig::default();

        assert!(can_view(&Viewer::user("alice"), &object, &view, &config));
        assert!(!can_view(&Viewer::admin("bob"), &object, &view, &config));
        assert!(!can_view(&Viewer::public(), &object, &view, &config));
    }

    #[test]
    fn test_owner_cannot_use_undeclared_capability() {
        let object = StoredObject::new(
            "Standup notes",
            PolicyMap::new().with(Capability::View, PolicyValue::User),
        )
        .with_owner("alice");
        let config = PolicyConfig::default();

        assert!(can_view(&Viewer::user("alice"), &object, &[Capability::View], &config));
        assert!(!can_view(&Viewer::user("alice"), &object, &[Capability::Edit], &config));
    }

    #[test]
    fn test_object_id_parse() {
        let id = ObjectId::new();
        assert_eq!(id.to_string().parse::<ObjectId>().unwrap(), id);
        assert!("not-a-uuid".parse::<ObjectId>().is_err());
    }
}
