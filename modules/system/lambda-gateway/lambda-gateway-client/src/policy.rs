use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::envelope::encode_json;
use crate::request::CallerHeaders;

/// Header carrying the caller's account id.
pub const ACCOUNT_HEADER: &str = "LifeOmic-Account";
/// Header carrying the caller's user id.
pub const USER_HEADER: &str = "LifeOmic-User";
/// Content type header, always `application/json`.
pub const CONTENT_TYPE_HEADER: &str = "content-type";
/// Header carrying the JSON-serialized [`AccessPolicy`].
pub const POLICY_HEADER: &str = "LifeOmic-Policy";

const FIXED_HEADERS: [&str; 4] = [
    ACCOUNT_HEADER,
    USER_HEADER,
    CONTENT_TYPE_HEADER,
    POLICY_HEADER,
];

/// Flat header map sent inside the invocation envelope.
///
/// Ordered so the serialized envelope is deterministic.
pub type EnvelopeHeaders = BTreeMap<String, String>;

/// Named boolean authorization rules forwarded to the backend function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub rules: BTreeMap<String, bool>,
}

impl AccessPolicy {
    #[must_use]
    pub fn new(rules: BTreeMap<String, bool>) -> Self {
        Self { rules }
    }

    /// Add or replace a rule.
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>, allowed: bool) -> Self {
        self.rules.insert(name.into(), allowed);
        self
    }

    /// JSON form placed in the policy header, `{"rules":{...}}`.
    ///
    /// An empty rule set still yields valid JSON (`{"rules":{}}`).
    #[must_use]
    pub fn to_header_value(&self) -> String {
        encode_json("access policy", self)
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for AccessPolicy {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Identity and policy stamped onto every outgoing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    account: String,
    user: String,
    policy: AccessPolicy,
}

impl Principal {
    #[must_use]
    pub fn new(account: impl Into<String>, user: impl Into<String>, policy: AccessPolicy) -> Self {
        Self {
            account: account.into(),
            user: user.into(),
            policy,
        }
    }

    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// The four fixed headers. Rebuilt on every call, never cached.
    #[must_use]
    pub fn auth_headers(&self) -> EnvelopeHeaders {
        let mut headers = EnvelopeHeaders::new();
        headers.insert(ACCOUNT_HEADER.to_owned(), self.account.clone());
        headers.insert(USER_HEADER.to_owned(), self.user.clone());
        headers.insert(
            CONTENT_TYPE_HEADER.to_owned(),
            "application/json".to_owned(),
        );
        headers.insert(POLICY_HEADER.to_owned(), self.policy.to_header_value());
        headers
    }
}

/// Whether `name` is one of the four fixed headers, ignoring ASCII case.
#[must_use]
pub fn is_fixed_header(name: &str) -> bool {
    FIXED_HEADERS.iter().any(|fixed| fixed.eq_ignore_ascii_case(name))
}

/// Add caller headers that do not collide with a fixed header.
///
/// Names keep the caller's spelling. Multi-valued headers collapse to their
/// first value under the first spelling seen. Backends read the flat
/// `{name: value}` form, so the remaining values are dropped.
pub fn merge_caller_headers(headers: &mut EnvelopeHeaders, caller: &CallerHeaders) {
    for (name, value) in caller.entries() {
        if is_fixed_header(name) || headers.keys().any(|key| key.eq_ignore_ascii_case(name)) {
            continue;
        }
        headers.insert(
            name.to_owned(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
}
