use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of account roles. Stored as its string form in the
/// `users.role` column and in token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::User => "User",
        }
    }

    /// Case-insensitive parse, used for bulk-import rows.
    #[must_use]
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Self::Admin),
            "User" => Ok(Self::User),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_parse_is_case_insensitive() {
        assert_eq!(Role::parse_loose("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse_loose(" user "), Some(Role::User));
        assert_eq!(Role::parse_loose("root"), None);
    }

    #[test]
    fn test_strict_parse_round_trip() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(Role::User.as_str().parse::<Role>(), Ok(Role::User));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
    }
}
