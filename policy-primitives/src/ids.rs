//! Identifier types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Correlation identifier for a single deploy call.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployId(Uuid);

impl DeployId {
    /// Generates a random deploy identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

}

impl Default for DeployId {
    fn default() -> Self {
        Self::random()
    }
}

impl Display for DeployId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for DeployId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s).map_err(Error::from)?;
        Ok(Self::from_uuid(uuid))
    }
}

/// Store-assigned resource name of a policy.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyArn(String);

impl PolicyArn {
    /// Wraps a store-assigned resource name.
    #[must_use]
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    /// Returns the resource name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PolicyArn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version identifier assigned by the store in creation order.
///
/// Ordering is numeric, so `v10` sorts after `v9`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct VersionId(u32);

impl VersionId {
    /// Creates a version identifier from its number.
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the numeric part of the identifier.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.0
    }

    /// Returns the identifier that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for VersionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for VersionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidVersionId { id: s.to_owned() };
        let digits = s.strip_prefix('v').unwrap_or(s);
        if !digits.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid());
        }
        digits.parse::<u32>().map(Self).map_err(|_| invalid())
    }
}

impl From<VersionId> for String {
    fn from(value: VersionId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for VersionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_deploy_id() {
        let id = DeployId::random();
        let parsed = id.to_string().parse::<DeployId>().expect("parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn version_ids_parse_with_or_without_prefix() {
        assert_eq!("v3".parse::<VersionId>().unwrap(), VersionId::new(3));
        assert_eq!("12".parse::<VersionId>().unwrap(), VersionId::new(12));
        assert!("vx".parse::<VersionId>().is_err());
        assert!("".parse::<VersionId>().is_err());
    }

    #[test]
    fn version_ids_reject_signs_and_padding() {
        assert!("v+3".parse::<VersionId>().is_err());
        assert!("+3".parse::<VersionId>().is_err());
        assert!("v-1".parse::<VersionId>().is_err());
        assert!("v 3".parse::<VersionId>().is_err());
        assert!("v".parse::<VersionId>().is_err());
    }

    #[test]
    fn version_ids_order_numerically() {
        let nine: VersionId = "v9".parse().unwrap();
        let ten: VersionId = "v10".parse().unwrap();
        assert!(nine < ten);
        assert_eq!(nine.next(), ten);
        assert_eq!(ten.to_string(), "v10");
    }

    #[test]
    fn version_id_serializes_as_string() {
        let json = serde_json::to_string(&VersionId::new(4)).unwrap();
        assert_eq!(json, "\"v4\"");
        let back: VersionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.number(), 4);
    }
}
