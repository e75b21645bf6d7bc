//! Service lifetime definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Service lifetimes recorded on every binding.
///
/// The registrar never caches instances itself; the lifetime is data the
/// host container acts on and the validator reasons about.
///
/// # Captivity
///
/// A longer-lived component that holds a shorter-lived one keeps it alive
/// past its intended lifetime:
///
/// - **Singleton → Scoped**: error
/// - **Singleton → Transient**: warning
/// - **Scoped → Transient**: fine
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::Lifetime;
///
/// assert_eq!("scoped".parse::<Lifetime>().unwrap(), Lifetime::Scoped);
/// assert_eq!(Lifetime::Singleton.to_string(), "Singleton");
/// assert!(Lifetime::Singleton.outlives(Lifetime::Transient));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lifetime {
    /// One instance for the whole application
    Singleton,
    /// One instance per scope, typically a request
    Scoped,
    /// A new instance for every resolution
    Transient,
}

impl Lifetime {
    /// All lifetimes, longest first.
    pub const ALL: [Lifetime; 3] = [Lifetime::Singleton, Lifetime::Scoped, Lifetime::Transient];

    pub fn as_str(self) -> &'static str {
        match self {
            Lifetime::Singleton => "Singleton",
            Lifetime::Scoped => "Scoped",
            Lifetime::Transient => "Transient",
        }
    }

    /// True when instances of `self` live strictly longer than `other`.
    pub fn outlives(self, other: Lifetime) -> bool {
        self < other
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" => Ok(Lifetime::Scoped),
            "transient" => Ok(Lifetime::Transient),
            other => Err(format!("unknown lifetime '{}'", other)),
        }
    }
}
