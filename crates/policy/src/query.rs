//! Policy-aware paging over an ordered candidate sequence.
//!
//! Candidates are filtered first and paged second: objects the viewer cannot
//! see never count towards the offset or the limit.

use crate::{
    Capability, Decision, Error, PolicyConfig, PolicyFilter, Protected, Result, Viewer,
};

/// A single-use query for one viewer.
#[derive(Debug, Clone)]
pub struct Query<O> {
    candidates: Vec<O>,
    viewer: Viewer,
    config: PolicyConfig,
    required: Vec<Capability>,
    limit: usize,
    offset: usize,
}

impl<O: Protected> Query<O> {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            candidates: Vec::new(),
            viewer,
            config: PolicyConfig::default(),
            required: vec![Capability::View],
            limit: 0,
            offset: 0,
        }
    }

    /// Set the ordered candidates, as supplied by the storage layer.
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = O>) -> Self {
        self.candidates = candidates.into_iter().collect();
        self
    }

    pub fn with_config(mut self, config: PolicyConfig) -> Self {
        self.config = config;
        self
    }

    /// Maximum number of results; `0` means no limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Number of visible results to skip.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Replace the set of required capabilities. An empty set denies every
    /// ordinary viewer.
    pub fn require_capabilities(
        mut self,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        self.required = capabilities.into_iter().collect();
        self
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Run the query, returning at most `limit` visible objects after
    /// skipping `offset` visible ones.
    pub fn execute(self) -> Vec<O> {
        let Query {
            candidates,
            viewer,
            config,
            required,
            limit,
            offset,
        } = self;

        let filter = PolicyFilter::new(&viewer, config).require_capabilities(required);
        let scanned = candidates.len();
        let mut skipped = 0;
        let mut filtered = 0;
        let mut results = Vec::new();

        for candidate in candidates {
            if let Decision::Deny(rejection) = filter.check(&candidate) {
                tracing::debug!(viewer = %viewer, %rejection, "filtered object");
                filtered += 1;
                continue;
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }
            results.push(candidate);
            if limit != 0 && results.len() >= limit {
                break;
            }
        }

        tracing::debug!(
            viewer = %viewer,
            scanned,
            filtered,
            skipped,
            returned = results.len(),
            "query executed"
        );
        results
    }

    /// Return the first visible object.
    ///
    /// Fails with [`Error::Denied`] when candidates exist but none of them is
    /// visible; an empty candidate set is `Ok(None)`. The offset is honored,
    /// the limit is not.
    pub fn execute_one(self) -> Result<Option<O>> {
        let Query {
            candidates,
            viewer,
            config,
            required,
            offset,
            ..
        } = self;

        let filter = PolicyFilter::new(&viewer, config).require_capabilities(required);
        let mut skipped = 0;
        let mut first_rejection = None;

        for candidate in candidates {
            match filter.check(&candidate) {
                Decision::Allow if skipped < offset => skipped += 1,
                Decision::Allow => return Ok(Some(candidate)),
                Decision::Deny(rejection) => {
                    first_rejection.get_or_insert(rejection);
                }
            }
        }

        match first_rejection {
            Some(rejection) => {
                tracing::info!(viewer = %viewer, %rejection, "object not visible");
                Err(Error::Denied(rejection))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PolicyValue, ProtectedObject};

    fn objects(policies: &[&str]) -> Vec<ProtectedObject<usize>> {
        policies
            .iter()
            .enumerate()
            .map(|(i, p)| ProtectedObject::viewable(i, *p))
            .collect()
    }

    fn ids(results: Vec<ProtectedObject<usize>>) -> Vec<usize> {
        results.into_iter().map(ProtectedObject::into_payload).collect()
    }

    #[test]
    fn test_offset_counts_visible_objects_only() {
        let candidates = objects(&["users", "no-one", "users", "no-one", "users"]);
        let results = Query::new(Viewer::user("u"))
            .with_candidates(candidates)
            .with_offset(1)
            .execute();
        assert_eq!(ids(results), vec![2, 4]);
    }

    #[test]
    fn test_limit_stops_scan() {
        let candidates = objects(&["users", "users", "users"]);
        let results = Query::new(Viewer::user("u"))
            .with_candidates(candidates)
            .with_limit(2)
            .execute();
        assert_eq!(ids(results), vec![0, 1]);
    }

    #[test]
    fn test_empty_candidates() {
        let query: Query<ProtectedObject<usize>> = Query::new(Viewer::admin("a"));
        assert!(query.clone().execute().is_empty());
        assert!(query.execute_one().unwrap().is_none());
    }

    #[test]
    fn test_execute_one_skips_invisible() {
        let candidates = objects(&["no-one", "admin", "users"]);
        let found = Query::new(Viewer::user("u"))
            .with_candidates(candidates)
            .execute_one()
            .unwrap();
        assert_eq!(found.map(ProtectedObject::into_payload), Some(2));
    }

    #[test]
    fn test_execute_one_reports_first_rejection() {
        let candidates = objects(&["admin", "no-one"]);
        let err = Query::new(Viewer::user("u"))
            .with_candidates(candidates)
            .execute_one()
            .unwrap_err();
        let Error::Denied(rejection) = err else {
            panic!("expected denial");
        };
        assert_eq!(rejection.policy, Some(PolicyValue::Admin));
    }

    #[test]
    fn test_execute_one_honors_offset() {
        let candidates = objects(&["users", "users"]);
        let found = Query::new(Viewer::user("u"))
            .with_candidates(candidates)
            .with_offset(1)
            .execute_one()
            .unwrap();
        assert_eq!(found.map(ProtectedObject::into_payload), Some(1));
    }

    #[test]
    fn test_empty_requirement_returns_nothing() {
        let results = Query::new(Viewer::public())
            .with_candidates(objects(&["no-one", "public"]))
            .with_config(PolicyConfig::new(true))
            .require_capabilities([])
            .execute();
        assert!(results.is_empty());
    }

    #[test]
    fn test_required_capabilities_replace_view() {
        let candidates = vec![ProtectedObject::new(
            0usize,
            crate::PolicyMap::new().with(Capability::Edit, PolicyValue::User),
        )];
        let results = Query::new(Viewer::user("u"))
            .with_candidates(candidates)
            .require_capabilities([Capability::Edit])
            .execute();
        assert_eq!(ids(results), vec![0]);
    }
}
