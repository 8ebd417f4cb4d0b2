//! Server capabilities and response status.

/// Completion status of a tagged or status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Greeting of a pre-authenticated connection.
    PreAuth,
    /// Server is closing the connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// Server capability relevant to this client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051), which implies ESEARCH and MOVE.
    Imap4Rev2,
    /// ESEARCH extension (RFC 4731): `SEARCH RETURN (...)`.
    Esearch,
    /// MOVE extension (RFC 6851)
    Move,
    /// UIDPLUS extension (RFC 4315)
    UidPlus,
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// Anything else.
    Unknown(String),
}

impl Capability {
    /// Parses a capability atom.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "ESEARCH" => Self::Esearch,
            "MOVE" => Self::Move,
            "UIDPLUS" => Self::UidPlus,
            "LITERAL+" => Self::LiteralPlus,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ => upper.strip_prefix("AUTH=").map_or_else(
                || Self::Unknown(s.to_string()),
                |_| Self::Auth(s[5..].to_string()),
            ),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => f.write_str("IMAP4rev1"),
            Self::Imap4Rev2 => f.write_str("IMAP4rev2"),
            Self::Esearch => f.write_str("ESEARCH"),
            Self::Move => f.write_str("MOVE"),
            Self::UidPlus => f.write_str("UIDPLUS"),
            Self::LiteralPlus => f.write_str("LITERAL+"),
            Self::StartTls => f.write_str("STARTTLS"),
            Self::LoginDisabled => f.write_str("LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Unknown(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_capabilities() {
        assert_eq!(Capability::parse("IMAP4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("imap4rev2"), Capability::Imap4Rev2);
        assert_eq!(Capability::parse("ESEARCH"), Capability::Esearch);
        assert_eq!(Capability::parse("move"), Capability::Move);
    }

    #[test]
    fn parse_auth_keeps_mechanism_case() {
        assert_eq!(
            Capability::parse("AUTH=PLAIN"),
            Capability::Auth("PLAIN".to_string())
        );
        assert_eq!(Capability::Auth("XOAUTH2".into()).to_string(), "AUTH=XOAUTH2");
    }

    #[test]
    fn unknown_round_trips() {
        let cap = Capability::parse("X-GM-EXT-1");
        assert_eq!(cap, Capability::Unknown("X-GM-EXT-1".to_string()));
        assert_eq!(cap.to_string(), "X-GM-EXT-1");
    }

    #[test]
    fn status_ok() {
        assert!(Status::Ok.is_ok());
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
    }
}
