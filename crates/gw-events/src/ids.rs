//! Prefixed ULID identifiers. Every id is `<prefix><26-char ULID>` and is
//! checked when parsed or deserialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;
use utoipa::ToSchema;

const ULID_LEN: usize = 26;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("invalid prefix: expected {expected}, got {got}")]
    InvalidPrefix { expected: &'static str, got: String },
    #[error("invalid ulid: {value}")]
    InvalidUlid { value: String },
    #[error("invalid id format: {value}")]
    InvalidFormat { value: String },
}

fn check(value: &str, prefix: &'static str) -> Result<(), IdError> {
    let rest = value.strip_prefix(prefix).ok_or_else(|| IdError::InvalidPrefix {
        expected: prefix,
        got: value.split('_').next().unwrap_or_default().to_string(),
    })?;
    if rest.len() != ULID_LEN {
        return Err(IdError::InvalidFormat {
            value: value.to_string(),
        });
    }
    match Ulid::from_string(rest) {
        Ok(_) => Ok(()),
        Err(_) => Err(IdError::InvalidUlid {
            value: value.to_string(),
        }),
    }
}

macro_rules! prefixed_id {
    ($(#[$doc:meta])* $name:ident => $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(into = "String", try_from = "String")]
        #[schema(as = String)]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new(value: String) -> Result<Self, IdError> {
                check(&value, Self::PREFIX)?;
                Ok(Self(value))
            }

            pub fn generate() -> Self {
                Self(format!("{}{}", Self::PREFIX, Ulid::new()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, IdError> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, IdError> {
                Self::new(s.to_owned())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

prefixed_id!(
    /// Tenant.
    TeamId => "team_"
);
prefixed_id!(
    /// Backend server registered by a team.
    ServerId => "srv_"
);
prefixed_id!(ActivityId => "act_");
prefixed_id!(
    /// Row id of a request trace. Unrelated to the advisory `trace_id` tag.
    TraceRecordId => "trc_"
);
prefixed_id!(ApiKeyId => "key_");
