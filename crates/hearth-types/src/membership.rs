//! Membership states a user can hold in a room.

use serde::{Deserialize, Serialize};

/// A user's relationship to a room at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    /// The user has been invited but has not acted on it.
    Invite,
    /// The user is in the room.
    Join,
    /// The user left, was kicked, or rejected an invite.
    Leave,
    /// The user is banned.
    Ban,
    /// The user asked to be let in.
    Knock,
}

impl Membership {
    /// Every membership state, in declaration order.
    pub const ALL: [Membership; 5] = [
        Self::Invite,
        Self::Join,
        Self::Leave,
        Self::Ban,
        Self::Knock,
    ];

    /// Returns the canonical string label, as stored and sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invite => "invite",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Ban => "ban",
            Self::Knock => "knock",
        }
    }
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Membership {
    type Err = ParseMembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invite" => Ok(Self::Invite),
            "join" => Ok(Self::Join),
            "leave" => Ok(Self::Leave),
            "ban" => Ok(Self::Ban),
            "knock" => Ok(Self::Knock),
            _ => Err(ParseMembershipError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown membership string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMembershipError(pub String);

impl std::fmt::Display for ParseMembershipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown membership state: {}", self.0)
    }
}

impl std::error::Error for ParseMembershipError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back() {
        for membership in Membership::ALL {
            let parsed: Membership = membership.as_str().parse().unwrap();
            assert_eq!(parsed, membership);
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "joined".parse::<Membership>().unwrap_err();
        assert_eq!(err.to_string(), "unknown membership state: joined");
    }

    #[test]
    fn serde_uses_lowercase_labels() {
        let json = serde_json::to_string(&Membership::Ban).unwrap();
        assert_eq!(json, "\"ban\"");
        let back: Membership = serde_json::from_str("\"knock\"").unwrap();
        assert_eq!(back, Membership::Knock);
    }
}
