//! SQLite object store implementation.

use crate::{Error, ObjectId, Result, StoredObject};
use chrono::{DateTime, SecondsFormat, Utc};
use policy::{Capability, PolicyMap, PolicyValue, UserId};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT id, title, owner, created_at, policies FROM objects";

/// SQLite-backed object store.
pub struct ObjectStore {
    conn: Connection,
}

/// Raw column values, converted after the statement is done with the row.
type RawRow = (String, String, Option<String>, String, String);

impl ObjectStore {
    /// Open or create an object store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory object store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS objects (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                owner TEXT,
                created_at TEXT NOT NULL,
                policies TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_objects_created
                ON objects(created_at, id);
            "#,
        )?;
        Ok(())
    }

    /// Insert an object.
    pub fn insert(&self, object: &StoredObject) -> Result<()> {
        self.conn.execute(
            "INSERT INTO objects (id, title, owner, created_at, policies)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                object.id.to_string(),
                object.title,
                object.owner.as_ref().map(UserId::as_str),
                object.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
                serde_json::to_string(&object.policies)?,
            ],
        )?;
        tracing::info!(id = %object.id, title = %object.title, "stored object");
        Ok(())
    }

    /// Load one object by ID.
    pub fn get(&self, id: ObjectId) -> Result<Option<StoredObject>> {
        let raw = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id.to_string()],
                read_row,
            )
            .optional()?;
        raw.map(parse_row).transpose()
    }

    /// Load every object, oldest first.
    ///
    /// This is the candidate order a [`policy::Query`] pages over.
    pub fn list(&self) -> Result<Vec<StoredObject>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at, id"))?;

        let rows = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(parse_row).collect()
    }

    /// Set the policy for one capability of an existing object.
    pub fn set_policy(
        &self,
        id: ObjectId,
        capability: Capability,
        policy: PolicyValue,
    ) -> Result<()> {
        let mut object = self
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        object.policies.insert(capability, policy.clone());

        self.conn.execute(
            "UPDATE objects SET policies = ?1 WHERE id = ?2",
            params![serde_json::to_string(&object.policies)?, id.to_string()],
        )?;
        tracing::info!(%id, %capability, %policy, "updated policy");
        Ok(())
    }

    /// Delete an object. Returns whether it existed.
    pub fn delete(&self, id: ObjectId) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM objects WHERE id = ?1", [id.to_string()])?;
        Ok(removed > 0)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn parse_row((id, title, owner, created_at, policies): RawRow) -> Result<StoredObject> {
    let corrupt = |reason: String| Error::Corrupt {
        id: id.clone(),
        reason,
    };

    let object_id = id.parse::<Uuid>().map_err(|e| corrupt(e.to_string()))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| corrupt(e.to_string()))?
        .with_timezone(&Utc);
    let policies: PolicyMap = serde_json::from_str(&policies)?;

    Ok(StoredObject {
        id: ObjectId(object_id),
        title,
        owner: owner.map(UserId),
        created_at,
        policies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn object(title: &str, view: PolicyValue) -> StoredObject {
        StoredObject::new(title, PolicyMap::new().with(Capability::View, view))
    }

    #[test]
    fn test_insert_and_get() {
        let store = ObjectStore::in_memory().unwrap();
        let obj = object("Design review", PolicyValue::User).with_owner("alice");
        store.insert(&obj).unwrap();

        let loaded = store.get(obj.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Design review");
        assert_eq!(loaded.owner, Some(UserId::new("alice")));
        assert_eq!(loaded.policies, obj.policies);
        assert_eq!(loaded.created_at, obj.created_at);

        assert!(store.get(ObjectId::new()).unwrap().is_none());
    }

    #[test]
    fn test_list_is_ordered_by_creation() {
        let store = ObjectStore::in_memory().unwrap();
        let mut later = object("later", PolicyValue::User);
        let earlier = object("earlier", PolicyValue::User);
        later.created_at = earlier.created_at + Duration::seconds(5);

        store.insert(&later).unwrap();
        store.insert(&earlier).unwrap();

        let titles: Vec<_> = store.list().unwrap().into_iter().map(|o| o.title).collect();
        assert_eq!(titles, vec!["earlier", "later"]);
    }

    #[test]
    fn test_unknown_policy_survives_round_trip() {
        let store = ObjectStore::in_memory().unwrap();
        let obj = object("odd", PolicyValue::parse("the cow goes moo"));
        store.insert(&obj).unwrap();

        let loaded = store.get(obj.id).unwrap().unwrap();
        assert_eq!(
            loaded.policies.get(Capability::View),
            Some(&PolicyValue::Unrecognized("the cow goes moo".into()))
        );
    }

    #[test]
    fn test_set_policy() {
        let store = ObjectStore::in_memory().unwrap();
        let obj = object("doc", PolicyValue::User);
        store.insert(&obj).unwrap();

        store
            .set_policy(obj.id, Capability::Edit, PolicyValue::Admin)
            .unwrap();
        let loaded = store.get(obj.id).unwrap().unwrap();
        assert_eq!(loaded.policies.get(Capability::Edit), Some(&PolicyValue::Admin));
        assert_eq!(loaded.policies.get(Capability::View), Some(&PolicyValue::User));

        assert!(matches!(
            store.set_policy(ObjectId::new(), Capability::View, PolicyValue::User),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let store = ObjectStore::in_memory().unwrap();
        let obj = object("doc", PolicyValue::User);
        store.insert(&obj).unwrap();

        assert!(store.delete(obj.id).unwrap());
        assert!(!store.delete(obj.id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_capability_in_row_is_rejected() {
        let store = ObjectStore::in_memory().unwrap();
        let obj = object("doc", PolicyValue::User);
        store.insert(&obj).unwrap();
        store
            .conn
            .execute(
                "UPDATE objects SET policies = ?1",
                [r#"{"teleport":"users"}"#],
            )
            .unwrap();

        assert!(matches!(store.get(obj.id), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.db");
        let obj = object("persisted", PolicyValue::Public);

        ObjectStore::open(&path).unwrap().insert(&obj).unwrap();
        let reopened = ObjectStore::open(&path).unwrap();
        assert_eq!(reopened.list().unwrap().len(), 1);
    }
}
