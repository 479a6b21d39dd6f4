//! Policy documents as desired by the caller and as rendered by the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Path prefix used when the caller does not supply one.
pub const DEFAULT_PATH_PREFIX: &str = "/";

const MAX_NAME_LEN: usize = 128;
const MAX_PATH_LEN: usize = 512;

/// Desired access-control document together with the identity it deploys to.
///
/// The document is immutable once constructed; `name` and `path_prefix`
/// together identify the target policy in the store.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PolicyDocument {
    name: String,
    path_prefix: String,
    body: Value,
}

impl PolicyDocument {
    /// Creates a document deployed under the default `/` path prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPolicyName`] when the name is empty, too long, or
    /// contains unsupported characters, and [`Error::InvalidDocument`] when the
    /// body is not a JSON object.
    pub fn new(name: impl Into<String>, body: Value) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        if !body.is_object() {
            return Err(Error::InvalidDocument {
                reason: "policy body must be a JSON object".into(),
            });
        }

        Ok(Self {
            name,
            path_prefix: DEFAULT_PATH_PREFIX.to_owned(),
            body,
        })
    }

    /// Parses the body from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocument`] when the text is not JSON, plus any
    /// error from [`PolicyDocument::new`].
    pub fn from_json_str(name: impl Into<String>, body: &str) -> Result<Self> {
        let body = serde_json::from_str(body)?;
        Self::new(name, body)
    }

    /// Places the document under the given path prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPathPrefix`] when the prefix does not start and
    /// end with `/` or is too long.
    pub fn with_path_prefix(mut self, path_prefix: impl Into<String>) -> Result<Self> {
        let path_prefix = path_prefix.into();
        validate_path_prefix(&path_prefix)?;
        self.path_prefix = path_prefix;
        Ok(self)
    }

    /// Returns the policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path prefix.
    #[must_use]
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Returns the structured body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Serialises the body as compact JSON for publication.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.body.to_string()
    }

    /// Returns `true` when the stored rendering carries the same document.
    ///
    /// Comparison is structural: key order and insignificant whitespace are
    /// ignored, and a stored body that cannot be normalised never matches.
    #[must_use]
    pub fn matches(&self, stored: &RawDocument) -> bool {
        stored.normalize().is_ok_and(|value| value == self.body)
    }
}

/// Document text exactly as the store returned it.
///
/// Stores may hand documents back URL-escaped; [`RawDocument::normalize`]
/// undoes that before parsing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(String);

impl RawDocument {
    /// Wraps store-provided document text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the text as provided by the store.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the text, percent-decoding it first when it is not plain JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocument`] when neither the raw nor the
    /// decoded text is valid JSON, and [`Error::InvalidDocument`] when the
    /// escaping itself is broken.
    pub fn normalize(&self) -> Result<Value> {
        if let Ok(value) = serde_json::from_str(&self.0) {
            return Ok(value);
        }

        let decoded = urlencoding::decode(&self.0).map_err(|err| Error::InvalidDocument {
            reason: format!("stored document is not valid escaped text: {err}"),
        })?;
        Ok(serde_json::from_str(&decoded)?)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(Error::InvalidPolicyName {
            name: name.to_owned(),
            reason: reason.to_owned(),
        })
    };

    if name.is_empty() {
        return reject("name cannot be empty");
    }
    if name.len() > MAX_NAME_LEN {
        return reject("name is longer than 128 characters");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "+=,.@_-".contains(c))
    {
        return reject("name may only contain alphanumerics and `+=,.@_-`");
    }
    Ok(())
}

fn validate_path_prefix(path: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(Error::InvalidPathPrefix {
            path: path.to_owned(),
            reason: reason.to_owned(),
        })
    };

    if !path.starts_with('/') || !path.ends_with('/') {
        return reject("path prefix must start and end with `/`");
    }
    if path.len() > MAX_PATH_LEN {
        return reject("path prefix is longer than 512 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_only() -> Value {
        json!({
            "Version": "2012-10-17",
            "Statement": [{"Effect": "Allow", "Action": ["s3:GetObject"], "Resource": "*"}]
        })
    }

    #[test]
    fn defaults_to_root_path_prefix() {
        let doc = PolicyDocument::new("read-only", read_only()).unwrap();
        assert_eq!(doc.name(), "read-only");
        assert_eq!(doc.path_prefix(), DEFAULT_PATH_PREFIX);
    }

    #[test]
    fn rejects_invalid_names_and_bodies() {
        assert!(matches!(
            PolicyDocument::new("", read_only()),
            Err(Error::InvalidPolicyName { .. })
        ));
        assert!(matches!(
            PolicyDocument::new("has space", read_only()),
            Err(Error::InvalidPolicyName { .. })
        ));
        assert!(matches!(
            PolicyDocument::new("x".repeat(129), read_only()),
            Err(Error::InvalidPolicyName { .. })
        ));
        assert!(matches!(
            PolicyDocument::new("ok", json!(["not", "an", "object"])),
            Err(Error::InvalidDocument { .. })
        ));
        assert!(matches!(
            PolicyDocument::from_json_str("ok", "{not json"),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn path_prefix_must_be_slash_delimited() {
        let doc = PolicyDocument::new("read-only", read_only()).unwrap();
        assert!(doc.clone().with_path_prefix("/service/").is_ok());
        assert!(matches!(
            doc.clone().with_path_prefix("service/"),
            Err(Error::InvalidPathPrefix { .. })
        ));
        assert!(matches!(
            doc.with_path_prefix("/service"),
            Err(Error::InvalidPathPrefix { .. })
        ));
    }

    #[test]
    fn matches_escaped_store_rendering() {
        let doc = PolicyDocument::new("read-only", read_only()).unwrap();
        let escaped = urlencoding::encode(&doc.to_json_string()).into_owned();
        assert!(doc.matches(&RawDocument::new(escaped)));
    }

    #[test]
    fn matching_ignores_key_order_and_whitespace() {
        let doc = PolicyDocument::new("read-only", read_only()).unwrap();
        let reordered = r#"{
            "Statement" : [ { "Resource": "*", "Action": [ "s3:GetObject" ], "Effect": "Allow" } ],
            "Version" : "2012-10-17"
        }"#;
        assert!(doc.matches(&RawDocument::new(reordered)));
    }

    #[test]
    fn differing_or_garbled_documents_do_not_match() {
        let doc = PolicyDocument::new("read-only", read_only()).unwrap();
        let changed = json!({"Version": "2012-10-17", "Statement": []}).to_string();
        assert!(!doc.matches(&RawDocument::new(changed)));
        assert!(!doc.matches(&RawDocument::new("%7B%22broken")));
    }
}
