//! Extraction result record
//!
//! A [`Record`] holds one [`Collection`] per resource kind. Each collection is
//! an ordered list of instances plus a cursor: the index of the instance
//! currently being filled. Writing a field that is already set on the current
//! instance opens a new instance instead of overwriting, which is how repeated
//! blocks in a document turn into separate instances without array indices.

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Accessor for one optional field of an instance type.
pub type Slot<T, V> = fn(&mut T) -> &mut Option<V>;

/// Typed field descriptor looked up by name when an object path is resolved.
pub enum FieldSpec<T> {
    Text(Slot<T, String>),
    Integer(Slot<T, i64>),
    Boolean(Slot<T, bool>),
}

/// An element of a [`Collection`] whose scalar fields are addressable by name.
pub trait Instance: Default + Send + 'static {
    fn field(name: &str) -> Option<FieldSpec<Self>>;
}

/// Ordered instance list with a cursor pointing at the last appended element.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    instances: Vec<T>,
    cursor: Option<usize>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            instances: Vec::new(),
            cursor: None,
        }
    }
}

impl<T> Collection<T> {
    pub fn instances(&self) -> &[T] {
        &self.instances
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }
}

impl<T: Instance> Collection<T> {
    /// Returns the instance under the cursor, creating an empty one if the
    /// list has none yet.
    pub fn current_mut(&mut self) -> &mut T {
        let index = match self.cursor {
            Some(index) => index,
            None => {
                if self.instances.is_empty() {
                    self.instances.push(T::default());
                }
                let index = self.instances.len() - 1;
                self.cursor = Some(index);
                index
            }
        };
        &mut self.instances[index]
    }

    /// Writes `value` into the current instance, or into a fresh instance if
    /// the field is already set there.
    pub fn assign<V>(&mut self, slot: Slot<T, V>, value: V) {
        let field = slot(self.current_mut());
        if field.is_none() {
            *field = Some(value);
            return;
        }

        let mut fresh = T::default();
        *slot(&mut fresh) = Some(value);
        self.instances.push(fresh);
        self.cursor = Some(self.instances.len() - 1);
    }

    fn release_cursor(&mut self) {
        self.cursor = None;
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}

impl<T: Serialize> Serialize for Collection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.instances.len()))?;
        for instance in &self.instances {
            seq.serialize_element(instance)?;
        }
        seq.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Port {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
}

impl Instance for Port {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "number" => Some(FieldSpec::Integer(|p| &mut p.number)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Service {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub ports: Collection<Port>,
}

impl Instance for Service {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "name" => Some(FieldSpec::Text(|s| &mut s.name)),
            "full_name" => Some(FieldSpec::Text(|s| &mut s.full_name)),
            "project_id" => Some(FieldSpec::Integer(|s| &mut s.project_id)),
            "tag" => Some(FieldSpec::Text(|s| &mut s.tag)),
            _ => None,
        }
    }
}

/// A service the described one talks to. Only its name and ports are known.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct OtherService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub ports: Collection<Port>,
}

impl Instance for OtherService {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "name" => Some(FieldSpec::Text(|s| &mut s.name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct KafkaQueue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl Instance for KafkaQueue {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "name" => Some(FieldSpec::Text(|q| &mut q.name)),
            "type" => Some(FieldSpec::Text(|q| &mut q.queue_type)),
            "topic" => Some(FieldSpec::Text(|q| &mut q.topic)),
            "type_name" => Some(FieldSpec::Text(|q| &mut q.type_name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Kafka {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub queues: Collection<KafkaQueue>,
}

impl Instance for Kafka {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "name" => Some(FieldSpec::Text(|k| &mut k.name)),
            "host" => Some(FieldSpec::Text(|k| &mut k.host)),
            "port" => Some(FieldSpec::Integer(|k| &mut k.port)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RedisNamespace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Instance for RedisNamespace {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "name" => Some(FieldSpec::Text(|n| &mut n.name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RedisDatabase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub namespaces: Collection<RedisNamespace>,
}

impl Instance for RedisDatabase {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "name" => Some(FieldSpec::Text(|d| &mut d.name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Sentinel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
}

impl Instance for Sentinel {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "host" => Some(FieldSpec::Text(|s| &mut s.host)),
            "port" => Some(FieldSpec::Integer(|s| &mut s.port)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Redis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<String>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub databases: Collection<RedisDatabase>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub sentinels: Collection<Sentinel>,
}

impl Instance for Redis {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "host" => Some(FieldSpec::Text(|r| &mut r.host)),
            "port" => Some(FieldSpec::Integer(|r| &mut r.port)),
            "master" => Some(FieldSpec::Text(|r| &mut r.master)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct PostgresqlScheme {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Instance for PostgresqlScheme {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "name" => Some(FieldSpec::Text(|s| &mut s.name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct PostgresqlDatabase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_migrations: Option<bool>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub schemes: Collection<PostgresqlScheme>,
}

impl Instance for PostgresqlDatabase {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "name" => Some(FieldSpec::Text(|d| &mut d.name)),
            "for_migrations" => Some(FieldSpec::Boolean(|d| &mut d.for_migrations)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Postgresql {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub databases: Collection<PostgresqlDatabase>,
}

impl Instance for Postgresql {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "host" => Some(FieldSpec::Text(|p| &mut p.host)),
            "port" => Some(FieldSpec::Integer(|p| &mut p.port)),
            "user" => Some(FieldSpec::Text(|p| &mut p.user)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RabbitQueue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Instance for RabbitQueue {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "name" => Some(FieldSpec::Text(|q| &mut q.name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RabbitMq {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub queues: Collection<RabbitQueue>,
}

impl Instance for RabbitMq {
    fn field(name: &str) -> Option<FieldSpec<Self>> {
        match name {
            "host" => Some(FieldSpec::Text(|r| &mut r.host)),
            "port" => Some(FieldSpec::Integer(|r| &mut r.port)),
            "user" => Some(FieldSpec::Text(|r| &mut r.user)),
            _ => None,
        }
    }
}

/// Per-document extraction output.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Record {
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub(crate) service: Collection<Service>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub(crate) other_service: Collection<OtherService>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub(crate) kafka: Collection<Kafka>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub(crate) redis: Collection<Redis>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub(crate) postgresql: Collection<Postgresql>,
    #[serde(skip_serializing_if = "Collection::is_empty")]
    pub(crate) rabbitmq: Collection<RabbitMq>,
    #[serde(skip)]
    pub(crate) warnings: Vec<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&self) -> &Collection<Service> {
        &self.service
    }

    pub fn other_services(&self) -> &Collection<OtherService> {
        &self.other_service
    }

    pub fn kafka(&self) -> &Collection<Kafka> {
        &self.kafka
    }

    pub fn redis(&self) -> &Collection<Redis> {
        &self.redis
    }

    pub fn postgresql(&self) -> &Collection<Postgresql> {
        &self.postgresql
    }

    pub fn rabbitmq(&self) -> &Collection<RabbitMq> {
        &self.rabbitmq
    }

    /// Soft conditions noticed during the walk, such as a missing separator.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(crate) fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// True when no resource kind holds an instance.
    pub fn is_empty(&self) -> bool {
        self.service.is_empty()
            && self.other_service.is_empty()
            && self.kafka.is_empty()
            && self.redis.is_empty()
            && self.postgresql.is_empty()
            && self.rabbitmq.is_empty()
    }

    /// Drops every cursor so only the instance lists remain meaningful.
    pub fn release_cursors(&mut self) {
        self.service.release_cursor();
        for service in &mut self.service.instances {
            service.ports.release_cursor();
        }

        self.other_service.release_cursor();
        for service in &mut self.other_service.instances {
            service.ports.release_cursor();
        }

        self.kafka.release_cursor();
        for kafka in &mut self.kafka.instances {
            kafka.queues.release_cursor();
        }

        self.redis.release_cursor();
        for redis in &mut self.redis.instances {
            redis.sentinels.release_cursor();
            redis.databases.release_cursor();
            for database in &mut redis.databases.instances {
                database.namespaces.release_cursor();
            }
        }

        self.postgresql.release_cursor();
        for postgresql in &mut self.postgresql.instances {
            postgresql.databases.release_cursor();
            for database in &mut postgresql.databases.instances {
                database.schemes.release_cursor();
            }
        }

        self.rabbitmq.release_cursor();
        for rabbitmq in &mut self.rabbitmq.instances {
            rabbitmq.queues.release_cursor();
        }
    }
}
