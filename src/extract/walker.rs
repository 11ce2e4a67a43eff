//! Lockstep walk of an input document against a setter tree.

use std::collections::BTreeMap;

use super::document::Document;
use super::error::{ExtractError, Result};
use super::record::Record;
use super::template::{SetterNode, ARRAY_SCHEMA, WILDCARD};

/// Walks the entries of an input map against a template map level.
///
/// Each key is matched exactly first, then against the wildcard. Keys that
/// match neither are skipped.
pub fn walk(
    schema: &BTreeMap<String, SetterNode>,
    entries: &[(String, Document)],
    record: &mut Record,
) -> Result<()> {
    for (key, value) in entries {
        let node = match schema.get(key).or_else(|| schema.get(WILDCARD)) {
            Some(node) => node,
            None => continue,
        };
        dispatch(key, node, value, record)?;
    }
    Ok(())
}

/// Applies one element schema to every item of an input array, in order.
pub fn walk_array(
    key: &str,
    schema: &SetterNode,
    items: &[Document],
    record: &mut Record,
) -> Result<()> {
    for (index, item) in items.iter().enumerate() {
        dispatch(&format!("{}[{}]", key, index), schema, item, record)?;
    }
    Ok(())
}

fn dispatch(key: &str, node: &SetterNode, value: &Document, record: &mut Record) -> Result<()> {
    match (value, node) {
        (Document::Map(entries), SetterNode::Map(children)) => walk(children, entries, record),
        (Document::Array(items), SetterNode::Array(element)) => match element {
            Some(schema) => walk_array(key, schema, items, record),
            None => Ok(()),
        },
        (Document::Array(items), SetterNode::Map(children)) if children.contains_key(ARRAY_SCHEMA) => {
            match children.get(ARRAY_SCHEMA) {
                Some(SetterNode::Array(Some(schema))) => walk_array(key, schema, items, record),
                Some(SetterNode::Array(None)) | None => Ok(()),
                Some(schema) => walk_array(key, schema, items, record),
            }
        }
        (Document::Scalar(scalar), SetterNode::Leaf(setter)) => {
            setter.apply(&scalar.to_text(), record)
        }
        _ => Err(ExtractError::UnsupportedShape {
            key: key.to_string(),
            found: value.kind(),
            expected: node.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::template::SetterTree;

    fn run(template: &str, document: &str) -> Result<Record> {
        let tree = SetterTree::build(template).unwrap();
        let Document::Map(entries) = Document::parse(document.as_bytes()).unwrap() else {
            panic!("document root is not a map");
        };
        let mut record = Record::new();
        walk(tree.root(), &entries, &mut record)?;
        Ok(record)
    }

    #[test]
    fn test_exact_key_beats_wildcard() {
        let record = run(
            "services:\n  billing: {{ all.service.full_name }}\n  *: {{ all.service.name }}\n",
            "services:\n  billing: b\n  ledger: l\n",
        )
        .unwrap();

        let services = record.services().instances();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].full_name.as_deref(), Some("b"));
        assert_eq!(services[0].name.as_deref(), Some("l"));
    }

    #[test]
    fn test_wildcard_follows_input_order() {
        let record = run(
            "topics:\n  *: {{ all.kafka.queue.name }}\n",
            "topics:\n  zeta: z\n  alpha: a\n  mid: m\n",
        )
        .unwrap();

        let names: Vec<_> = record.kafka().instances()[0]
            .queues
            .iter()
            .map(|q| q.name.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_unmapped_keys_are_ignored() {
        let record = run(
            "kafka:\n  host: {{ all.kafka.host }}\n",
            "unrelated:\n  deep: [1, 2, {x: y}]\nkafka:\n  other: 5\n",
        )
        .unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_array_template_applies_first_element_to_all_items() {
        let record = run(
            "databases:\n  - name: {{ all.postgresql.database.name }}\n",
            "databases:\n  - name: orders\n  - name: users\n",
        )
        .unwrap();

        let databases = &record.postgresql().instances()[0].databases;
        let names: Vec<_> = databases.iter().map(|d| d.name.as_deref()).collect();
        assert_eq!(names, vec![Some("orders"), Some("users")]);
    }

    #[test]
    fn test_array_schema_key() {
        let record = run(
            "hosts:\n  '[]': {{ all.redis.sentinel.host }}\n",
            "hosts: [s1, s2, s3]\n",
        )
        .unwrap();
        assert_eq!(record.redis().instances()[0].sentinels.len(), 3);
    }

    #[test]
    fn test_array_schema_key_holding_array() {
        let record = run(
            "queues:\n  '[]':\n    - {{ all.rabbitmq.queue.name }}\n",
            "queues: [a, b]\n",
        )
        .unwrap();
        assert_eq!(record.rabbitmq().instances()[0].queues.len(), 2);
    }

    #[test]
    fn test_empty_template_array_skips_input() {
        let record = run("queues: []\n", "queues: [a, b]\n").unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_scalar_kinds_are_stringified() {
        let record = run(
            "port: {{ all.kafka.port }}\nratio: {{ all.kafka.name }}\nmigrate: {{ all.postgresql.database.for_migrations }}\n",
            "port: 9092\nratio: 3.0\nmigrate: true\n",
        )
        .unwrap();

        let kafka = &record.kafka().instances()[0];
        assert_eq!(kafka.port, Some(9092));
        assert_eq!(kafka.name.as_deref(), Some("3"));
        let database = &record.postgresql().instances()[0].databases.instances()[0];
        assert_eq!(database.for_migrations, Some(true));
    }

    #[test]
    fn test_shape_mismatches_abort_the_walk() {
        let cases = [
            ("a: {{ all.kafka.host }}\n", "a:\n  b: c\n", "map", "setter"),
            ("a:\n  b: {{ all.kafka.host }}\n", "a: scalar\n", "scalar", "map"),
            ("a:\n  - {{ all.kafka.host }}\n", "a:\n  b: c\n", "map", "array"),
            ("a:\n  b: {{ all.kafka.host }}\n", "a: [x]\n", "array", "map"),
            ("a: {{ all.kafka.host }}\n", "a:\n", "null", "setter"),
        ];

        for (template, document, found_kind, expected_kind) in cases {
            match run(template, document) {
                Err(ExtractError::UnsupportedShape {
                    key,
                    found,
                    expected,
                }) => {
                    assert_eq!(key, "a");
                    assert_eq!(found, found_kind);
                    assert_eq!(expected, expected_kind);
                }
                other => panic!("expected shape error for {:?}, got {:?}", document, other),
            }
        }
    }

    #[test]
    fn test_array_element_mismatch_names_index() {
        let err = run(
            "items:\n  - {{ all.kafka.host }}\n",
            "items:\n  - ok\n  - nested: value\n",
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedShape { ref key, .. } if key == "items[1]"));
    }

    #[test]
    fn test_error_keeps_partial_progress() {
        let tree = SetterTree::build("a: {{ all.kafka.host }}\nb: {{ all.kafka.port }}\n").unwrap();
        let Document::Map(entries) =
            Document::parse(b"a: broker\nb: not-a-port\n").unwrap()
        else {
            panic!("document root is not a map");
        };

        let mut record = Record::new();
        let err = walk(tree.root(), &entries, &mut record).unwrap_err();
        assert!(matches!(err, ExtractError::ValueConversion { .. }));
        assert_eq!(record.kafka().instances()[0].host.as_deref(), Some("broker"));
    }
}
