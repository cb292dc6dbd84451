//! 服务模块

pub mod ingest;
pub mod pipeline;
pub mod resolver;

pub use ingest::{DocumentIngestor, IngestOutcome};
pub use pipeline::{PipelineController, PipelineState, PipelineStep, RunReport};
pub use resolver::{EntityResolver, EntityResolverImpl, create_entity_resolver};
