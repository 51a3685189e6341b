//! Visibility filter: decides whether a viewer holds a set of capabilities.

use crate::{Capability, PolicyConfig, PolicyValue, Protected, Viewer};
use std::fmt;

/// Why an object was filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The first capability the viewer was refused.
    pub capability: Capability,
    /// The policy guarding that capability, if the object defines one.
    pub policy: Option<PolicyValue>,
    pub reason: String,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} this object: {}", self.capability, self.reason)
    }
}

/// Result of a capability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Rejection),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Check that `viewer` holds every capability in `required` on `object`.
///
/// Stops at the first capability that is refused.
pub fn check<O>(
    viewer: &Viewer,
    object: &O,
    required: &[Capability],
    config: &PolicyConfig,
) -> Decision
where
    O: Protected + ?Sized,
{
    if viewer.is_omnipotent() {
        return Decision::Allow;
    }

    // An empty requirement set grants nothing.
    if required.is_empty() {
        return Decision::Deny(Rejection {
            capability: Capability::View,
            policy: None,
            reason: "no capability was requested".to_string(),
        });
    }

    for &capability in required {
        if let Err(reason) = check_capability(viewer, object, capability, config) {
            return Decision::Deny(Rejection {
                capability,
                policy: object.policy(capability).cloned(),
                reason,
            });
        }
    }

    Decision::Allow
}

/// Boolean form of [`check`].
pub fn can_view<O>(
    viewer: &Viewer,
    object: &O,
    required: &[Capability],
    config: &PolicyConfig,
) -> bool
where
    O: Protected + ?Sized,
{
    check(viewer, object, required, config).is_allowed()
}

fn check_capability<O>(
    viewer: &Viewer,
    object: &O,
    capability: Capability,
    config: &PolicyConfig,
) -> Result<(), String>
where
    O: Protected + ?Sized,
{
    let Some(policy) = object.policy(capability) else {
        return Err(format!("object has no policy for the '{capability}' capability"));
    };

    if object.has_automatic_capability(capability, viewer) {
        return Ok(());
    }

    match policy {
        PolicyValue::Public if config.allow_public => Ok(()),
        PolicyValue::Public | PolicyValue::User => {
            if viewer.is_logged_in() {
                Ok(())
            } else {
                Err("you must log in to do this".to_string())
            }
        }
        PolicyValue::Admin => {
            if viewer.is_admin() {
                Ok(())
            } else {
                Err("only administrators can do this".to_string())
            }
        }
        PolicyValue::NoOne => Err("no one can do this".to_string()),
        PolicyValue::Unrecognized(raw) => Err(format!(
            "object has an unknown or invalid policy setting (\"{raw}\")"
        )),
    }
}

/// Filters objects down to those a viewer holds all required capabilities on.
///
/// Requires only [`Capability::View`] unless told otherwise.
#[derive(Debug, Clone)]
pub struct PolicyFilter<'a> {
    viewer: &'a Viewer,
    config: PolicyConfig,
    required: Vec<Capability>,
}

impl<'a> PolicyFilter<'a> {
    pub fn new(viewer: &'a Viewer, config: PolicyConfig) -> Self {
        Self {
            viewer,
            config,
            required: vec![Capability::View],
        }
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

    pub fn required(&self) -> &[Capability] {
        &self.required
    }

    pub fn check<O: Protected + ?Sized>(&self, object: &O) -> Decision {
        check(self.viewer, object, &self.required, &self.config)
    }

    /// Keep only permitted objects, in their original order.
    pub fn apply<O, I>(&self, objects: I) -> Vec<O>
    where
        O: Protected,
        I: IntoIterator<Item = O>,
    {
        objects
            .into_iter()
            .filter(|object| match self.check(object) {
                Decision::Allow => true,
                Decision::Deny(rejection) => {
                    tracing::debug!(viewer = %self.viewer, %rejection, "filtered object");
                    false
                }
            })
            .collect()
    }
}
