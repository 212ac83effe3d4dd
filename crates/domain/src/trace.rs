use serde::Serialize;

/// Structured trace events emitted across all Stratum crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ChainBuilt {
        tiers: Vec<String>,
    },
    SessionResolved {
        session_id: String,
        is_new: bool,
    },
    SessionWritten {
        session_id: String,
        bytes: usize,
    },
    SessionRegenerated {
        old_session_id: String,
        new_session_id: String,
        deleted_old: bool,
    },
    CleanupPass {
        removed: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "stratum_event");
    }
}
