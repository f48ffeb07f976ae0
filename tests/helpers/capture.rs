// tests/helpers/capture.rs
// Facts emitter + audit sink that record everything for assertions.

use std::sync::{Arc, Mutex};

use cfgkeeper::logging::{redact_event, AuditSink, FactsEmitter};
use log::Level;
use serde_json::Value;

#[derive(Default, Clone)]
pub struct Capture {
    facts: Arc<Mutex<Vec<(String, String, Value)>>>,
    audit: Arc<Mutex<Vec<(Level, String)>>>,
}

impl FactsEmitter for Capture {
    fn emit(&self, _subsystem: &str, event: &str, decision: &str, fields: Value) {
        self.facts
            .lock()
            .unwrap()
            .push((event.to_string(), decision.to_string(), fields));
    }
}

impl AuditSink for Capture {
    fn log(&self, level: Level, msg: &str) {
        self.audit.lock().unwrap().push((level, msg.to_string()));
    }
}

impl Capture {
    pub fn facts_box(&self) -> Box<dyn FactsEmitter> { Box::new(self.clone()) }
    pub fn audit_box(&self) -> Box<dyn AuditSink> { Box::new(self.clone()) }

    /// Redacted fields of every fact for `event`, with their decisions.
    pub fn events(&self, event: &str) -> Vec<(String, Value)> {
        self.facts
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _, _)| e == event)
            .map(|(_, d, f)| (d.clone(), redact_event(f.clone())))
            .collect()
    }

    /// Unredacted fields of every fact for `event`.
    pub fn raw_events(&self, event: &str) -> Vec<Value> {
        self.facts
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _, _)| e == event)
            .map(|(_, _, f)| f.clone())
            .collect()
    }

    /// Audit lines at `level`.
    pub fn lines_at(&self, level: Level) -> Vec<String> {
        self.audit
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn defects(&self) -> Vec<String> {
        self.audit
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, m)| *l == Level::Error && m.contains("defect"))
            .map(|(_, m)| m.clone())
            .collect()
    }
}
