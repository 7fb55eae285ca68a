// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID newtypes for entity keys.
//!
//! Jobs and requests are identified by stable external keys supplied by the
//! submitting agent; clipboard items get a store-assigned random ID.

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// Define a newtype ID wrapper around `SmolStr`.
///
/// Generates `new()` for wrapping an external key, `as_str()`, `short()`,
/// `Display`, `From<String>`, `From<&str>`, `PartialEq<str>`, and
/// `PartialEq<&str>` implementations.
///
/// The prefixed form additionally generates `generate()`, producing a random
/// store-assigned ID `{prefix}{nanoid}` (19-character nanoid suffix).
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct JobKey;
/// }
/// define_id! {
///     pub struct ClipboardItemId("ops-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $crate::define_id! {
            $(#[$meta])*
            pub struct $name;
        }

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random ID with the type prefix.
            pub fn generate() -> Self {
                Self(smol_str::SmolStr::new(&format!(
                    "{}{}",
                    Self::PREFIX,
                    nanoid::nanoid!(19)
                )))
            }
        }
    };
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub smol_str::SmolStr);

        impl $name {
            /// Wrap an existing external key.
            pub fn new(id: impl Into<smol_str::SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns a string slice truncated to at most `n` characters.
            pub fn short(&self, n: usize) -> &str {
                $crate::id::short(&self.0, n)
            }

            /// Returns true if the ID is an empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Stable external key of a tracked entity (job ID, workflow name,
    /// or store document ID).
    pub struct EntityId;
}

define_id! {
    /// Store-assigned ID for an operations-clipboard item.
    pub struct ClipboardItemId("ops-");
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
