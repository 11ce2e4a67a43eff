//! Object-path resolution
//!
//! An object path such as `all.postgresql.database.scheme.name` names one field
//! of the [`Record`] schema. The first segment is a free-form root, the second
//! selects the resource kind and the rest walk through nested kinds down to a
//! field. Resolution happens once per template leaf and yields an [`Apply`]
//! closure that performs the write, including instance splitting.

use std::sync::Arc;

use super::error::{ExtractError, Result};
use super::record::{
    Collection, FieldSpec, Instance, Kafka, KafkaQueue, OtherService, Port, Postgresql,
    PostgresqlDatabase, PostgresqlScheme, RabbitMq, RabbitQueue, Record, Redis, RedisDatabase,
    RedisNamespace, Sentinel, Service,
};

/// A compiled write of one string value into a record.
pub type Apply = Arc<dyn Fn(&str, &mut Record) -> Result<()> + Send + Sync>;

/// Resolves `path` into a write closure.
pub fn resolve(path: &str) -> Result<Apply> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() < 3 {
        return Err(ExtractError::invalid_path(path));
    }

    let fields = &parts[2..];
    match parts[1] {
        "service" => resolve_service(path, fields),
        "other_service" => resolve_other_service(path, fields),
        "kafka" => resolve_kafka(path, fields),
        "redis" => resolve_redis(path, fields),
        "postgresql" => resolve_postgresql(path, fields),
        "rabbitmq" => resolve_rabbitmq(path, fields),
        _ => Err(ExtractError::invalid_path(path)),
    }
}

fn resolve_service(path: &str, fields: &[&str]) -> Result<Apply> {
    match fields {
        [field] => bind::<Service, _>(path, field, |r| &mut r.service),
        ["port", field] => bind::<Port, _>(path, field, |r| {
            &mut r.service.current_mut().ports
        }),
        _ => Err(ExtractError::invalid_path(path)),
    }
}

fn resolve_other_service(path: &str, fields: &[&str]) -> Result<Apply> {
    match fields {
        [field] => bind::<OtherService, _>(path, field, |r| &mut r.other_service),
        ["port", field] => bind::<Port, _>(path, field, |r| {
            &mut r.other_service.current_mut().ports
        }),
        _ => Err(ExtractError::invalid_path(path)),
    }
}

fn resolve_kafka(path: &str, fields: &[&str]) -> Result<Apply> {
    match fields {
        [field] => bind::<Kafka, _>(path, field, |r| &mut r.kafka),
        ["queue", field] => bind::<KafkaQueue, _>(path, field, |r| {
            &mut r.kafka.current_mut().queues
        }),
        _ => Err(ExtractError::invalid_path(path)),
    }
}

fn resolve_redis(path: &str, fields: &[&str]) -> Result<Apply> {
    match fields {
        [field] => bind::<Redis, _>(path, field, |r| &mut r.redis),
        ["sentinel", field] => bind::<Sentinel, _>(path, field, |r| {
            &mut r.redis.current_mut().sentinels
        }),
        ["database", field] => bind::<RedisDatabase, _>(path, field, |r| {
            &mut r.redis.current_mut().databases
        }),
        ["database", "namespace", field] => bind::<RedisNamespace, _>(path, field, |r| {
            &mut r.redis.current_mut().databases.current_mut().namespaces
        }),
        _ => Err(ExtractError::invalid_path(path)),
    }
}

fn resolve_postgresql(path: &str, fields: &[&str]) -> Result<Apply> {
    match fields {
        [field] => bind::<Postgresql, _>(path, field, |r| &mut r.postgresql),
        ["database", field] => bind::<PostgresqlDatabase, _>(path, field, |r| {
            &mut r.postgresql.current_mut().databases
        }),
        ["database", "scheme", field] => bind::<PostgresqlScheme, _>(path, field, |r| {
            &mut r.postgresql.current_mut().databases.current_mut().schemes
        }),
        _ => Err(ExtractError::invalid_path(path)),
    }
}

fn resolve_rabbitmq(path: &str, fields: &[&str]) -> Result<Apply> {
    match fields {
        [field] => bind::<RabbitMq, _>(path, field, |r| &mut r.rabbitmq),
        ["queue", field] => bind::<RabbitQueue, _>(path, field, |r| {
            &mut r.rabbitmq.current_mut().queues
        }),
        _ => Err(ExtractError::invalid_path(path)),
    }
}

/// Builds the write closure for `field` of the collection reached by `access`.
///
/// The raw value is converted before `access` runs, so a failed conversion
/// leaves every collection and cursor untouched.
fn bind<T, A>(path: &str, field: &str, access: A) -> Result<Apply>
where
    T: Instance,
    A: Fn(&mut Record) -> &mut Collection<T> + Send + Sync + 'static,
{
    let spec = T::field(field).ok_or_else(|| ExtractError::invalid_path(path))?;
    let path = path.to_string();

    let apply: Apply = match spec {
        FieldSpec::Text(slot) => Arc::new(move |raw: &str, record: &mut Record| -> Result<()> {
            access(record).assign(slot, raw.to_string());
            Ok(())
        }),
        FieldSpec::Integer(slot) => Arc::new(move |raw: &str, record: &mut Record| -> Result<()> {
            let value = parse_integer(&path, raw)?;
            access(record).assign(slot, value);
            Ok(())
        }),
        FieldSpec::Boolean(slot) => Arc::new(move |raw: &str, record: &mut Record| -> Result<()> {
            let value = parse_boolean(&path, raw)?;
            access(record).assign(slot, value);
            Ok(())
        }),
    };

    Ok(apply)
}

fn parse_integer(path: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| ExtractError::ValueConversion {
            path: path.to_string(),
            value: raw.to_string(),
            expected: "integer",
        })
}

fn parse_boolean(path: &str, raw: &str) -> Result<bool> {
    raw.parse::<bool>()
        .map_err(|_| ExtractError::ValueConversion {
            path: path.to_string(),
            value: raw.to_string(),
            expected: "boolean",
        })
}
