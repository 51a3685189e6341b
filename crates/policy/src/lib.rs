//! Policy-based visibility filtering.
//!
//! Every protected object carries one [`PolicyValue`] per [`Capability`] it
//! supports. A [`Viewer`] holds a capability when the policy admits its
//! access tier:
//!
//! | policy     | logged out          | user | admin | omnipotent |
//! |------------|---------------------|------|-------|------------|
//! | `public`   | if `allow_public`   | yes  | yes   | yes        |
//! | `users`    | no                  | yes  | yes   | yes        |
//! | `admin`    | no                  | no   | yes   | yes        |
//! | `no-one`   | no                  | no   | no    | yes        |
//! | unknown    | no                  | no   | no    | yes        |
//!
//! Missing policies fail closed. A [`Query`] applies the filter before
//! paging, so offsets and limits count visible objects only.
//!
//! # Example
//!
//! ```
//! use policy::{PolicyConfig, PolicyValue, ProtectedObject, Query, Viewer};
//!
//! let candidates = vec![
//!     ProtectedObject::viewable("roadmap", PolicyValue::NoOne),
//!     ProtectedObject::viewable("standup", PolicyValue::User),
//!     ProtectedObject::viewable("launch", PolicyValue::Public),
//! ];
//!
//! let visible = Query::new(Viewer::public())
//!     .with_config(PolicyConfig::new(true))
//!     .with_candidates(candidates)
//!     .execute();
//!
//! assert_eq!(visible.len(), 1);
//! assert_eq!(*visible[0].payload(), "launch");
//! ```

mod capability;
mod error;
mod filter;
mod policy;
mod query;
mod viewer;

pub use capability::{Capability, PolicyMap, Protected, ProtectedObject};
pub use error::{Error, Result};
pub use filter::{Decision, PolicyFilter, Rejection, can_view, check};
pub use policy::{PolicyConfig, PolicyValue};
pub use query::Query;
pub use viewer::{UserId, Viewer};
