//! The per-request session facade.
//!
//! One `Session` per inbound identifier: it resolves or mints the session ID,
//! tracks the expiry pair, and orchestrates reads and writes of the JSON data
//! bag against the handler chain.  Constructed explicitly and threaded
//! through call sites — there is no process-global session.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use stratum_domain::config::SessionConfig;
use stratum_domain::{Result, TraceEvent};

use crate::chain::HandlerChain;
use crate::token::{generate_id, SessionToken};

pub struct Session {
    chain: Arc<HandlerChain>,
    session_id: String,
    expires: i64,
    exp_variant: i64,
    lifetime_secs: u64,
    variant_secs: u64,
    container: Map<String, Value>,
    dirty: bool,
}

impl Session {
    /// Resolve a session from an inbound identifier token, or mint a new one
    /// when the token is absent or unparsable.  Populates the data bag from
    /// the chain; a chain miss yields an empty bag, so a fresh anonymous
    /// session and an expired one are indistinguishable here.
    pub fn open(token: Option<&str>, chain: Arc<HandlerChain>, config: &SessionConfig) -> Self {
        let now = Utc::now().timestamp();
        let mut session = match token.and_then(SessionToken::parse) {
            Some(parsed) => {
                let mut session = Self {
                    chain,
                    session_id: parsed.id,
                    expires: parsed.expires,
                    exp_variant: parsed.exp_variant,
                    lifetime_secs: config.lifetime_secs,
                    variant_secs: config.variant_secs,
                    container: Map::new(),
                    dirty: false,
                };
                // Past the variant threshold: refresh both timestamps now so
                // the next write persists the new expiry.  Within the window
                // the stored metadata is left untouched.
                if now > session.exp_variant {
                    session.set_expiration();
                }
                TraceEvent::SessionResolved {
                    session_id: session.session_id.clone(),
                    is_new: false,
                }
                .emit();
                session
            }
            None => {
                let mut session = Self {
                    chain,
                    session_id: generate_id(),
                    expires: 0,
                    exp_variant: 0,
                    lifetime_secs: config.lifetime_secs,
                    variant_secs: config.variant_secs,
                    container: Map::new(),
                    dirty: false,
                };
                session.set_expiration();
                TraceEvent::SessionResolved {
                    session_id: session.session_id.clone(),
                    is_new: true,
                }
                .emit();
                session
            }
        };

        session.read_data();
        session
    }

    fn set_expiration(&mut self) {
        let now = Utc::now().timestamp();
        self.expires = now + self.lifetime_secs as i64;
        self.exp_variant = now + self.variant_secs as i64;
    }

    // ── Identity & timestamps ───────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.session_id
    }

    pub fn expires(&self) -> i64 {
        self.expires
    }

    pub fn exp_variant(&self) -> i64 {
        self.exp_variant
    }

    /// Render the outbound identifier token for this session.
    pub fn token(&self) -> String {
        SessionToken {
            id: self.session_id.clone(),
            expires: self.expires,
            exp_variant: self.exp_variant,
        }
        .render()
    }

    /// Mint a new session ID.  Optionally deletes the old record from every
    /// tier first.  Deletion and the caller re-issuing the token are two
    /// separate steps — nothing makes them atomic.
    pub fn regenerate_id(&mut self, delete_old: bool) -> Result<()> {
        let old_id = std::mem::replace(&mut self.session_id, generate_id());
        if delete_old {
            self.chain.delete(&old_id)?;
        }
        self.set_expiration();
        self.dirty = true;

        TraceEvent::SessionRegenerated {
            old_session_id: old_id,
            new_session_id: self.session_id.clone(),
            deleted_old: delete_old,
        }
        .emit();
        Ok(())
    }

    // ── Data bag access ─────────────────────────────────────────────

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.container.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.container.insert(key.to_owned(), value.into());
        self.dirty = true;
    }

    pub fn unset(&mut self, key: &str) -> Option<Value> {
        let removed = self.container.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.container.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the bag in memory.  Storage is untouched until the next
    /// `write_data`.
    pub fn reset(&mut self) {
        self.container.clear();
        self.dirty = true;
    }

    /// The bag as a JSON string.
    pub fn json_out(&self) -> String {
        Value::Object(self.container.clone()).to_string()
    }

    /// Replace the bag with the contents of a JSON object string.  Anything
    /// that is not a JSON object is rejected without side effects.
    pub fn json_in(&mut self, data: &str) -> bool {
        match serde_json::from_str::<Value>(data) {
            Ok(Value::Object(map)) => {
                self.container = map;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    // ── Storage orchestration ───────────────────────────────────────

    /// Populate the bag from the chain.  A miss — no tier has a valid
    /// record, or the stored payload is not a JSON object — leaves the bag
    /// empty.
    pub fn read_data(&mut self) {
        self.container = self
            .chain
            .read(&self.session_id)
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();
        self.dirty = false;
    }

    /// Persist the bag through every tier.  An empty bag deletes the record
    /// instead — no tier retains empty state.  When the variant threshold
    /// has passed, the expiry pair is refreshed first; within the window the
    /// stored expiry metadata is not rewritten.
    pub fn write_data(&mut self) -> Result<()> {
        if Utc::now().timestamp() >= self.exp_variant {
            self.set_expiration();
        }

        if self.container.is_empty() {
            self.chain.delete(&self.session_id)?;
        } else {
            let raw = self.json_out();
            self.chain.write(&self.session_id, &raw)?;
            TraceEvent::SessionWritten {
                session_id: self.session_id.clone(),
                bytes: raw.len(),
            }
            .emit();
        }

        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainBuilder;
    use crate::handlers::memory::MemoryHandler;
    use serde_json::json;
    use stratum_domain::config::SessionConfig;

    fn memory_chain() -> Arc<HandlerChain> {
        Arc::new(
            ChainBuilder::new()
                .add_handler(Box::new(MemoryHandler::new()))
                .build(),
        )
    }

    fn config() -> SessionConfig {
        SessionConfig::default()
    }

    #[test]
    fn fresh_session_gets_generated_id_and_empty_bag() {
        let session = Session::open(None, memory_chain(), &config());
        assert_eq!(session.id().len(), 32);
        assert!(session.is_empty());
        assert!(session.expires() > session.exp_variant());
    }

    #[test]
    fn unparsable_token_falls_back_to_fresh_session() {
        let session = Session::open(Some("garbage token"), memory_chain(), &config());
        assert_eq!(session.id().len(), 32);
        assert!(session.is_empty());
    }

    #[test]
    fn bag_round_trips_through_the_chain() {
        let chain = memory_chain();

        let mut session = Session::open(None, chain.clone(), &config());
        session.set("user_id", 42);
        session.set("cart", json!({"items": [1, 2], "coupon": {"code": "X"}}));
        let token = session.token();
        session.write_data().unwrap();

        let restored = Session::open(Some(&token), chain, &config());
        assert_eq!(restored.id(), session.id());
        assert_eq!(restored.get("user_id"), Some(&json!(42)));
        assert_eq!(
            restored.get("cart").and_then(|c| c.pointer("/coupon/code")),
            Some(&json!("X"))
        );
    }

    #[test]
    fn empty_bag_write_deletes_the_record() {
        let chain = memory_chain();

        let mut session = Session::open(None, chain.clone(), &config());
        session.set("k", "v");
        session.write_data().unwrap();
        assert!(chain.read(session.id()).is_some());

        session.reset();
        session.write_data().unwrap();
        assert_eq!(chain.read(session.id()), None);
    }

    #[test]
    fn unset_and_contains() {
        let mut session = Session::open(None, memory_chain(), &config());
        session.set("k", "v");
        assert!(session.contains("k"));
        assert_eq!(session.unset("k"), Some(json!("v")));
        assert!(!session.contains("k"));
        assert_eq!(session.unset("k"), None);
    }

    #[test]
    fn json_in_rejects_non_objects() {
        let mut session = Session::open(None, memory_chain(), &config());
        session.set("keep", true);
        assert!(!session.json_in("[1,2,3]"));
        assert!(!session.json_in("not json"));
        assert!(session.contains("keep"));

        assert!(session.json_in("{\"a\":1}"));
        assert!(!session.contains("keep"));
        assert_eq!(session.get("a"), Some(&json!(1)));
    }

    #[test]
    fn regenerate_id_with_delete_removes_old_record() {
        let chain = memory_chain();

        let mut session = Session::open(None, chain.clone(), &config());
        session.set("k", "v");
        session.write_data().unwrap();
        let old_id = session.id().to_owned();

        session.regenerate_id(true).unwrap();
        assert_ne!(session.id(), old_id);
        assert_eq!(chain.read(&old_id), None);
        // The bag travels with the facade, not the old record.
        assert!(session.contains("k"));
    }

    #[test]
    fn token_within_variant_window_keeps_timestamps() {
        let now = Utc::now().timestamp();
        let token = SessionToken {
            id: "a".repeat(32),
            expires: now + 1000,
            exp_variant: now + 700,
        };
        let session = Session::open(Some(&token.render()), memory_chain(), &config());
        assert_eq!(session.expires(), now + 1000);
        assert_eq!(session.exp_variant(), now + 700);
    }

    #[test]
    fn token_past_variant_window_refreshes_timestamps() {
        let now = Utc::now().timestamp();
        let token = SessionToken {
            id: "a".repeat(32),
            expires: now + 300,
            exp_variant: now - 10,
        };
        let session = Session::open(Some(&token.render()), memory_chain(), &config());
        assert!(session.exp_variant() > now);
        assert!(session.expires() >= now + 1800 - 1);
    }
}
