//! Short random identifiers for rooms, devices, routines, alerts, and users.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of base-36 characters in a generated identifier.
const ID_LEN: usize = 7;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a random lowercase base-36 identifier.
pub fn generate() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Creates a fresh random identifier.
            pub fn generate() -> Self {
                Self(generate())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a [`crate::sim::types::Room`].
    RoomId
);
string_id!(
    /// Identifier of a [`crate::devices::Device`].
    DeviceId
);
string_id!(
    /// Identifier of a [`crate::sim::types::Routine`].
    RoutineId
);
string_id!(
    /// Identifier of a [`crate::sim::event::Alert`].
    AlertId
);
string_id!(
    /// Identifier of a [`crate::accounts::User`].
    UserId
);
