mod channel;
mod memory;
mod tracing_sink;

pub use channel::ChannelAuditSink;
pub use memory::InMemoryAuditSink;
pub use tracing_sink::TracingAuditSink;
