//! Resources, actions and permissions.

use crate::error::RbacError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// CRUD action on a resource.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn parse(name: &str) -> Result<Action, RbacError> {
        Action::from_str(name.trim()).map_err(|_| RbacError::UnknownAction(name.to_string()))
    }
}

/// A protected area of the application.
///
/// Resources are open-ended names rather than a closed enum, so new protected
/// areas need no change to the evaluator. The well-known ones are constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Cow<'static, str>);

impl Resource {
    pub const COMICS: Resource = Resource(Cow::Borrowed("comics"));
    pub const USERS: Resource = Resource(Cow::Borrowed("users"));
    pub const SETTINGS: Resource = Resource(Cow::Borrowed("settings"));
    pub const IMPORT: Resource = Resource(Cow::Borrowed("import"));
    pub const EXPORT: Resource = Resource(Cow::Borrowed("export"));
    pub const REPORTS: Resource = Resource(Cow::Borrowed("reports"));
    /// Shopify store connections.
    pub const SHOPIFY: Resource = Resource(Cow::Borrowed("shopify"));
    /// Product publishing jobs.
    pub const PUBLISH_JOBS: Resource = Resource(Cow::Borrowed("publish_jobs"));

    /// Every resource the default matrix knows about.
    pub const KNOWN: [Resource; 8] = [
        Self::COMICS,
        Self::USERS,
        Self::SETTINGS,
        Self::IMPORT,
        Self::EXPORT,
        Self::REPORTS,
        Self::SHOPIFY,
        Self::PUBLISH_JOBS,
    ];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Parse an untrusted resource name: non-empty, lowercase ASCII letters,
    /// digits and underscores.
    pub fn parse(name: &str) -> Result<Resource, RbacError> {
        let valid = !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if !valid {
            return Err(RbacError::InvalidResource(name.to_string()));
        }
        Ok(Self::known()
            .find(|known| known.as_str() == name)
            .unwrap_or_else(|| Resource::new(name.to_string())))
    }

    pub fn known() -> impl Iterator<Item = Resource> {
        Self::KNOWN.into_iter()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(self)
    }

    /// Actions this resource accepts. Reports can be read and generated but
    /// not edited or deleted; everything else takes all four.
    pub fn supported_actions(&self) -> &'static [Action] {
        if *self == Self::REPORTS {
            &[Action::Create, Action::Read]
        } else {
            &Action::ALL
        }
    }

    pub fn supports(&self, action: Action) -> bool {
        self.supported_actions().contains(&action)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Resource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A `(resource, action)` pair. Displays as `resource.action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    /// Fails if the resource is known and does not accept the action.
    pub fn ensure_supported(&self) -> Result<(), RbacError> {
        if self.resource.is_known() && !self.resource.supports(self.action) {
            return Err(RbacError::UnsupportedAction {
                resource: self.resource.to_string(),
                action: self.action.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.action)
    }
}

impl FromStr for Permission {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action) = s
            .rsplit_once('.')
            .ok_or_else(|| RbacError::InvalidPermission(s.to_string()))?;
        Ok(Permission::new(Resource::parse(resource)?, Action::parse(action)?))
    }
}
