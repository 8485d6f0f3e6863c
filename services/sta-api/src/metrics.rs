//! Request and entity-write counters.

use metrics::counter;
use sta_model::EntityKind;

/// Entity write operations counted per entity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

impl WriteOp {
    pub fn label(&self) -> &'static str {
        match self {
            WriteOp::Create => "create",
            WriteOp::Update => "update",
            WriteOp::Delete => "delete",
        }
    }
}

/// Count a committed write.
pub fn record_write(kind: EntityKind, op: WriteOp) {
    counter!(
        "sta_entity_writes_total",
        "entity" => kind.name(),
        "operation" => op.label()
    )
    .increment(1);
}

/// Count a collection or entity read.
pub fn record_read(kind: EntityKind) {
    counter!("sta_entity_reads_total", "entity" => kind.name()).increment(1);
}

/// Count a request that ended in an error response.
pub fn record_error(status: u16) {
    counter!("sta_request_errors_total", "status" => status.to_string()).increment(1);
}
