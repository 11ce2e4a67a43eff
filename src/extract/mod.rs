//! Template-driven extraction of infrastructure records from config documents.
//!
//! An [`Engine`] compiles a template once and can then be replayed against any
//! number of documents, concurrently if needed. Every call to
//! [`Engine::extract`] works on its own fresh [`Record`].

pub mod document;
pub mod dsl;
pub mod error;
pub mod path;
pub mod record;
pub mod template;
pub mod walker;

use tracing::debug;

pub use document::{Document, Scalar};
pub use dsl::Setter;
pub use error::{ExtractError, Result};
pub use record::{
    Collection, Kafka, KafkaQueue, OtherService, Port, Postgresql, PostgresqlDatabase,
    PostgresqlScheme, RabbitMq, RabbitQueue, Record, Redis, RedisDatabase, RedisNamespace,
    Sentinel, Service,
};
pub use template::{SetterNode, SetterTree};

#[derive(Debug)]
pub struct Engine {
    tree: SetterTree,
}

impl Engine {
    /// Compiles a template document. Any bad leaf fails the whole template.
    pub fn new(template: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(template)
            .map_err(|e| ExtractError::Template(format!("template is not UTF-8: {}", e)))?;
        let tree = SetterTree::build(text)?;

        debug!(leaves = tree.leaf_count(), "compiled extraction template");
        Ok(Self { tree })
    }

    pub fn tree(&self) -> &SetterTree {
        &self.tree
    }

    /// Extracts one document into a new record.
    pub fn extract(&self, document: &[u8]) -> Result<Record> {
        let document = Document::parse(document)?;
        let mut record = Record::new();
        self.extract_into(&document, &mut record)?;
        record.release_cursors();
        Ok(record)
    }

    /// Walks an already decoded document into `record`.
    ///
    /// On error `record` keeps whatever was written before the failure.
    pub fn extract_into(&self, document: &Document, record: &mut Record) -> Result<()> {
        match document {
            Document::Map(entries) => walker::walk(self.tree.root(), entries, record),
            other => Err(ExtractError::InvalidDocument(format!(
                "root is {}",
                other.kind()
            ))),
        }
    }
}
