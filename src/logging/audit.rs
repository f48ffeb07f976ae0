// Audit helpers that emit one fact per ConfigFile lifecycle stage.
//
// Every fact carries a minimal envelope: `schema_version`, `ts`, `path`, `stage`, `decision`.
use serde_json::{json, Value};

use crate::constants::SUBSYSTEM;
use crate::logging::FactsEmitter;

pub(crate) const SCHEMA_VERSION: i64 = 1;

pub(crate) struct AuditCtx<'a> {
    pub facts: &'a dyn FactsEmitter,
    pub path: String,
    pub ts: String,
}

impl<'a> AuditCtx<'a> {
    pub(crate) fn new(facts: &'a dyn FactsEmitter, path: String, ts: String) -> Self {
        Self { facts, path, ts }
    }
}

/// Stage for typed audit emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Open,
    Create,
    SetVersion,
    Release,
    Save,
    Remove,
    Drop,
}

impl Stage {
    #[must_use]
    pub const fn as_event(&self) -> &'static str {
        match self {
            Stage::Open => "config.open",
            Stage::Create => "config.create",
            Stage::SetVersion => "config.set_version",
            Stage::Release => "config.release",
            Stage::Save => "config.save",
            Stage::Remove => "config.remove",
            Stage::Drop => "config.drop",
        }
    }
}

/// Decision severity for audit events.
#[derive(Clone, Copy, Debug)]
pub enum Decision {
    Success,
    Failure,
    Warn,
}

impl Decision {
    const fn as_str(&self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::Failure => "failure",
            Decision::Warn => "warn",
        }
    }
}

/// Builder facade over audit emission with a centralized envelope.
pub struct StageLogger<'a> {
    ctx: &'a AuditCtx<'a>,
}

impl<'a> StageLogger<'a> {
    pub(crate) fn new(ctx: &'a AuditCtx<'a>) -> Self { Self { ctx } }

    pub fn stage(&self, stage: Stage) -> EventBuilder<'a> { EventBuilder::new(self.ctx, stage) }
    pub fn open(&self) -> EventBuilder<'a> { self.stage(Stage::Open) }
    pub fn create(&self) -> EventBuilder<'a> { self.stage(Stage::Create) }
    pub fn save(&self) -> EventBuilder<'a> { self.stage(Stage::Save) }
    pub fn remove(&self) -> EventBuilder<'a> { self.stage(Stage::Remove) }
}

pub struct EventBuilder<'a> {
    ctx: &'a AuditCtx<'a>,
    stage: Stage,
    fields: serde_json::Map<String, Value>,
}

impl<'a> EventBuilder<'a> {
    fn new(ctx: &'a AuditCtx<'a>, stage: Stage) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("stage".to_string(), json!(stage.as_event()));
        Self { ctx, stage, fields }
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Attach `error` and its stable id when `err` is present.
    pub fn error(self, err: &crate::types::Error) -> Self {
        let id = crate::api::errors::id_for(err.kind);
        self.field("error", json!(err.msg))
            .field("error_id", json!(crate::api::errors::id_str(id)))
    }

    pub fn emit(self, decision: Decision) {
        let mut fields = self.fields;
        fields.entry("decision").or_insert(json!(decision.as_str()));
        fields.entry("schema_version").or_insert(json!(SCHEMA_VERSION));
        fields.entry("ts").or_insert(json!(self.ctx.ts));
        fields.entry("path").or_insert(json!(self.ctx.path));
        self.ctx.facts.emit(
            SUBSYSTEM,
            self.stage.as_event(),
            decision.as_str(),
            Value::Object(fields),
        );
    }

    pub fn emit_success(self) { self.emit(Decision::Success) }
    pub fn emit_failure(self) { self.emit(Decision::Failure) }
    pub fn emit_warn(self) { self.emit(Decision::Warn) }
}
