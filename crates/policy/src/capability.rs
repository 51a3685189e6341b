use crate::{Error, PolicyValue, Result, Viewer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Actions a viewer may attempt on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    View,
    Edit,
    Join,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::View, Capability::Edit, Capability::Join];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::View => "view",
            Capability::Edit => "edit",
            Capability::Join => "join",
        }
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::Invalid(format!("unknown capability '{s}'")))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-key mapping from capability to policy.
///
/// Capability names are validated when the map is built; policy values are
/// not, since unknown policies must still be stored and fail closed on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, PolicyValue>",
    into = "BTreeMap<String, PolicyValue>"
)]
pub struct PolicyMap(BTreeMap<Capability, PolicyValue>);

impl PolicyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from loosely-typed `(capability, policy)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<PolicyValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::new();
        for (capability, policy) in pairs {
            map.insert(capability.as_ref().parse()?, policy.into());
        }
        Ok(map)
    }

    pub fn with(mut self, capability: Capability, policy: impl Into<PolicyValue>) -> Self {
        self.insert(capability, policy.into());
        self
    }

    /// Set the policy for a capability, returning the previous one.
    pub fn insert(&mut self, capability: Capability, policy: PolicyValue) -> Option<PolicyValue> {
        self.0.insert(capability, policy)
    }

    pub fn get(&self, capability: Capability) -> Option<&PolicyValue> {
        self.0.get(&capability)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, &PolicyValue)> {
        self.0.iter().map(|(c, p)| (*c, p))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<String, PolicyValue>> for PolicyMap {
    type Error = Error;

    fn try_from(raw: BTreeMap<String, PolicyValue>) -> Result<Self> {
        Self::from_pairs(raw)
    }
}

impl From<PolicyMap> for BTreeMap<String, PolicyValue> {
    fn from(map: PolicyMap) -> Self {
        map.0
            .into_iter()
            .map(|(c, p)| (c.as_str().to_string(), p))
            .collect()
    }
}

/// An object that carries capability policies.
pub trait Protected {
    fn policies(&self) -> &PolicyMap;

    fn policy(&self, capability: Capability) -> Option<&PolicyValue> {
        self.policies().get(capability)
    }

    /// Grants that hold regardless of policy, e.g. for an object's owner.
    fn has_automatic_capability(&self, _capability: Capability, _viewer: &Viewer) -> bool {
        false
    }
}

impl<T: Protected + ?Sized> Protected for &T {
    fn policies(&self) -> &PolicyMap {
        (**self).policies()
    }

    fn has_automatic_capability(&self, capability: Capability, viewer: &Viewer) -> bool {
        (**self).has_automatic_capability(capability, viewer)
    }
}

/// A payload paired with the policies that guard it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedObject<T> {
    payload: T,
    policies: PolicyMap,
}

impl<T> ProtectedObject<T> {
    pub fn new(payload: T, policies: PolicyMap) -> Self {
        Self { payload, policies }
    }

    /// An object guarded only by a `view` policy.
    pub fn viewable(payload: T, policy: impl Into<PolicyValue>) -> Self {
        Self::new(payload, PolicyMap::new().with(Capability::View, policy))
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T> Protected for ProtectedObject<T> {
    fn policies(&self) -> &PolicyMap {
        &self.policies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_names() {
        for capability in Capability::ALL {
            assert_eq!(capability.as_str().parse::<Capability>().unwrap(), capability);
        }
        assert!(matches!("delete".parse::<Capability>(), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_from_pairs_validates_capabilities() {
        let map = PolicyMap::from_pairs([("view", "users"), ("edit", "admin")]).unwrap();
        assert_eq!(map.get(Capability::View), Some(&PolicyValue::User));
        assert_eq!(map.get(Capability::Edit), Some(&PolicyValue::Admin));
        assert_eq!(map.get(Capability::Join), None);

        let err = PolicyMap::from_pairs([("view", "users"), ("fly", "users")]).unwrap_err();
        assert!(err.to_string().contains("fly"));
    }

    #[test]
    fn test_from_pairs_keeps_unknown_policies() {
        let map = PolicyMap::from_pairs([("view", "the duck goes quack")]).unwrap();
        assert!(!map.get(Capability::View).unwrap().is_recognized());
    }

    #[test]
    fn test_serde_as_string_map() {
        let map = PolicyMap::new()
            .with(Capability::View, PolicyValue::Public)
            .with(Capability::Edit, PolicyValue::NoOne);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"edit":"no-one","view":"public"}"#);

        let back: PolicyMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);

        assert!(serde_json::from_str::<PolicyMap>(r#"{"teleport":"users"}"#).is_err());
    }

    #[test]
    fn test_reference_forwards_policies() {
        let object = ProtectedObject::viewable("doc", PolicyValue::Admin);
        let borrowed = &object;
        assert_eq!(borrowed.policy(Capability::View), Some(&PolicyValue::Admin));
        assert!(!borrowed.has_automatic_capability(Capability::View, &Viewer::admin("a")));
    }
}
