//! Validated identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Identity of a team member. Always a well-formed UUID string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

/// Identity of a pull request. Always a well-formed UUID string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PullRequestId(String);

macro_rules! uuid_id {
    ($name:ident, $what:literal) => {
        impl $name {
            /// Parse and validate an identifier, normalising it to the
            /// lowercase hyphenated form.
            pub fn parse(raw: &str) -> Result<Self, AppError> {
                Uuid::parse_str(raw.trim())
                    .map(|id| Self(id.hyphenated().to_string()))
                    .map_err(|_| AppError::Validation(format!("{} must be a UUID: {:?}", $what, raw)))
            }

            /// Wrap a value that was already validated when it was stored.
            pub(crate) fn from_stored(raw: String) -> Self {
                Self(raw)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = AppError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::parse(&raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

uuid_id!(MemberId, "member id");
uuid_id!(PullRequestId, "pull request id");
