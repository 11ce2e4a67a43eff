//! Template compilation into a reusable setter tree.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_yaml::Value;

use super::document::key_text;
use super::dsl::{self, Setter};
use super::error::{ExtractError, Result};

/// Key that matches any input key at its level.
pub const WILDCARD: &str = "*";
/// Key holding the element schema for arrays found at its level.
pub const ARRAY_SCHEMA: &str = "[]";

/// A node of the compiled template.
#[derive(Debug)]
pub enum SetterNode {
    Map(BTreeMap<String, SetterNode>),
    /// Element schema of an array. `None` for an empty template array.
    Array(Option<Box<SetterNode>>),
    Leaf(Setter),
}

impl SetterNode {
    pub fn kind(&self) -> &'static str {
        match self {
            SetterNode::Map(_) => "map",
            SetterNode::Array(_) => "array",
            SetterNode::Leaf(_) => "setter",
        }
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Setter>) {
        match self {
            SetterNode::Map(children) => {
                for child in children.values() {
                    child.collect_leaves(out);
                }
            }
            SetterNode::Array(Some(element)) => element.collect_leaves(out),
            SetterNode::Array(None) => {}
            SetterNode::Leaf(setter) => out.push(setter),
        }
    }
}

/// Compiled template. Immutable once built.
#[derive(Debug)]
pub struct SetterTree {
    root: BTreeMap<String, SetterNode>,
}

impl SetterTree {
    /// Parses and compiles template text, failing on the first bad leaf.
    pub fn build(template: &str) -> Result<Self> {
        let text = fix_up(template);
        let value: Value =
            serde_yaml::from_str(&text).map_err(|e| ExtractError::Template(e.to_string()))?;

        if value.is_null() {
            return Err(ExtractError::Template("template is empty".to_string()));
        }

        match compile_node(value)? {
            SetterNode::Map(root) => Ok(Self { root }),
            other => Err(ExtractError::Template(format!(
                "template root must be a map, found {}",
                other.kind()
            ))),
        }
    }

    pub fn root(&self) -> &BTreeMap<String, SetterNode> {
        &self.root
    }

    /// Every compiled setter, in key order.
    pub fn leaves(&self) -> Vec<&Setter> {
        let mut out = Vec::new();
        for node in self.root.values() {
            node.collect_leaves(&mut out);
        }
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }
}

fn compile_node(value: Value) -> Result<SetterNode> {
    match value {
        Value::Mapping(mapping) => {
            let mut children = BTreeMap::new();
            for (key, value) in mapping {
                let key = key_text(key).map_err(|e| ExtractError::Template(e.to_string()))?;
                children.insert(key, compile_node(value)?);
            }
            Ok(SetterNode::Map(children))
        }
        Value::Sequence(items) => match items.into_iter().next() {
            Some(first) => Ok(SetterNode::Array(Some(Box::new(compile_node(first)?)))),
            None => Ok(SetterNode::Array(None)),
        },
        Value::Tagged(tagged) => compile_node(tagged.value),
        Value::Null => Err(ExtractError::Template(
            "template leaf is empty".to_string(),
        )),
        Value::String(leaf) => compile_leaf(leaf),
        Value::Bool(b) => compile_leaf(b.to_string()),
        Value::Number(n) => compile_leaf(n.to_string()),
    }
}

fn compile_leaf(leaf: String) -> Result<SetterNode> {
    match dsl::compile(&leaf) {
        Ok(setter) => Ok(SetterNode::Leaf(setter)),
        Err(source) => Err(ExtractError::Compile {
            leaf,
            source: Box::new(source),
        }),
    }
}

/// Quotes `{{ ... }}` leaves and bare `*` keys so YAML reads them as strings.
///
/// Leaves that already sit inside quotes are left alone.
pub fn fix_up(template: &str) -> String {
    static LEAF: OnceLock<Regex> = OnceLock::new();
    static WILDCARD_KEY: OnceLock<Regex> = OnceLock::new();

    let leaf = LEAF.get_or_init(|| {
        Regex::new(r#"(?m)^(?P<prefix>[^\n{]*?)(?P<open>['"]?)(?P<leaf>\{\{.*\}\})(?P<trail>[ \t]*)$"#)
            .expect("valid regex")
    });
    let wildcard = WILDCARD_KEY.get_or_init(|| {
        Regex::new(r"(?m)^(?P<indent>[ \t]*(?:-[ \t]+)?)\*:")
            .expect("valid regex")
    });

    let quoted = leaf.replace_all(template, |caps: &Captures| {
        if !caps["open"].is_empty() {
            return caps[0].to_string();
        }
        format!(
            "{}'{}'{}",
            &caps["prefix"],
            caps["leaf"].replace('\'', "''"),
            &caps["trail"]
        )
    });

    wildcard.replace_all(&quoted, "${indent}\"*\":").into_owned()
}
