//! The identifier token exchanged with the client.
//!
//! Format: `<id>||<expires>||<exp_variant>` with unix-second timestamps.
//! Resolution is forgiving — anything that does not parse cleanly is treated
//! as absent and the caller mints a fresh session instead.

use crate::handler::sanitize_key;

/// Separator between the token crumbs.
const SEPARATOR: &str = "||";

/// Longest identifier accepted from the wire.  Generated IDs are 32 chars;
/// anything much longer is garbage or abuse.
const MAX_ID_LEN: usize = 64;

/// Parsed identifier token: session ID plus the two expiry timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub id: String,
    pub expires: i64,
    pub exp_variant: i64,
}

impl SessionToken {
    /// Parse an inbound token.  Returns `None` on the wrong crumb count,
    /// non-numeric timestamps, or an empty/oversized identifier — the caller
    /// falls back to minting a new session.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut crumbs = raw.split(SEPARATOR);
        let id = crumbs.next()?;
        let expires = crumbs.next()?.parse::<i64>().ok()?;
        let exp_variant = crumbs.next()?.parse::<i64>().ok()?;
        if crumbs.next().is_some() {
            return None;
        }

        let id = sanitize_key(id);
        if id.is_empty() || id.len() > MAX_ID_LEN {
            return None;
        }

        Some(Self {
            id,
            expires,
            exp_variant,
        })
    }

    /// Render the outbound token.
    pub fn render(&self) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.id, self.expires, self.exp_variant
        )
    }
}

/// Mint a fresh session identifier: 32 hex chars from a v4 UUID, already
/// within the sanitized charset.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let token = SessionToken {
            id: "deadbeefdeadbeefdeadbeefdeadbeef".into(),
            expires: 1_700_001_800,
            exp_variant: 1_700_001_440,
        };
        assert_eq!(SessionToken::parse(&token.render()), Some(token));
    }

    #[test]
    fn rejects_wrong_crumb_count() {
        assert_eq!(SessionToken::parse("abc||123"), None);
        assert_eq!(SessionToken::parse("abc||1||2||3"), None);
        assert_eq!(SessionToken::parse(""), None);
    }

    #[test]
    fn rejects_non_numeric_timestamps() {
        assert_eq!(SessionToken::parse("abc||soon||later"), None);
    }

    #[test]
    fn sanitizes_identifier_crumb() {
        let token = SessionToken::parse("abc!! def||100||50").unwrap();
        assert_eq!(token.id, "abcdef");
    }

    #[test]
    fn rejects_id_that_sanitizes_to_nothing() {
        assert_eq!(SessionToken::parse("!!!||100||50"), None);
    }

    #[test]
    fn generated_ids_are_unique_and_fixed_length() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
