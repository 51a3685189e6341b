//! SQLite-backed object storage for Warden.
//!
//! This crate is the storage layer that supplies policy-aware queries with
//! their ordered candidate sequence. Each row is a [`StoredObject`]: a title,
//! an optional owner, a creation timestamp and a [`PolicyMap`](policy::PolicyMap)
//! holding one policy per capability.
//!
//! The store never filters. Visibility is decided afterwards by a
//! [`policy::Query`], so offsets and limits count visible objects only.
//!
//! # Example
//!
//! ```no_run
//! use policy::{Capability, PolicyMap, PolicyValue, Query, Viewer};
//! use storage::{ObjectStore, StoredObject};
//!
//! let store = ObjectStore::open("objects.db")?;
//!
//! let policies = PolicyMap::new().with(Capability::View, PolicyValue::User);
//! store.insert(&StoredObject::new("Sprint planning", policies).with_owner("alice"))?;
//!
//! let visible = Query::new(Viewer::user("bob"))
//!     .with_candidates(store.list()?)
//!     .with_limit(20)
//!     .execute();
//! for object in visible {
//!     println!("{}: {}", object.id, object.title);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod object;
mod store;

pub use error::{Error, Result};
pub use object::{ObjectId, StoredObject};
pub use store::ObjectStore;
