use log::Level;
use serde_json::{json, Value};

use crate::constants::SUBSYSTEM;

/// Receives one structured fact per lifecycle stage (`config.open`, `config.save`, ...).
pub trait FactsEmitter: Send + Sync {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value);
}

/// Receives human-readable diagnostics, including defects such as handles left open.
pub trait AuditSink: Send + Sync {
    fn log(&self, level: Level, msg: &str);
}

/// Default sink: forwards facts and audit lines to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FactsEmitter for LogSink {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        if !log::log_enabled!(target: "cfgkeeper::facts", Level::Debug) {
            return;
        }
        let line = json!({
            "subsystem": subsystem,
            "event": event,
            "decision": decision,
            "fields": fields,
        });
        log::debug!(target: "cfgkeeper::facts", "{line}");
    }
}

impl AuditSink for LogSink {
    fn log(&self, level: Level, msg: &str) {
        log::log!(target: SUBSYSTEM, level, "{msg}");
    }
}
