use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The two independent account namespaces.
///
/// A username registered as a provider may also be registered as a
/// recipient; the tables never share rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Offers appointment slots and administers dose inventory.
    Provider,
    /// Books appointments against provider slots.
    Recipient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Recipient => "recipient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive account name.
///
/// Usernames are compared byte-for-byte: `Alice` and `alice` are two
/// different accounts.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and wrap a username.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidUsername(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl FromStr for Username {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username({})", self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        let u = Username::new("p1").unwrap();
        assert_eq!(u.as_str(), "p1");
        assert_eq!(u.to_string(), "p1");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(matches!(Username::new(""), Err(TypeError::InvalidUsername(_))));
        assert!(Username::new("a b").is_err());
        assert!(Username::new("tab\there").is_err());
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let upper = Username::new("Alice").unwrap();
        let lower = Username::new("alice").unwrap();
        assert_ne!(upper, lower);
        assert!(upper < lower);
    }

    #[test]
    fn serde_validates_on_decode() {
        let u: Username = serde_json::from_str("\"r1\"").unwrap();
        assert_eq!(u.as_str(), "r1");
        assert!(serde_json::from_str::<Username>("\"has space\"").is_err());
    }

    #[test]
    fn role_display() {
        assert_eq!(Role::Provider.to_string(), "provider");
        assert_eq!(Role::Recipient.to_string(), "recipient");
    }
}
