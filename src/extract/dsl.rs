//! Template leaf compiler
//!
//! A leaf looks like `{{ all.kafka.host | weight 2 }}`: a pipeline of segments
//! separated by ` | `. Each segment is one of
//!
//! - `weight N` : declares the setter weight
//! - `if <bool> <path> = <literal>` : writes the literal when the value matches
//! - `parse <pattern>` : splits the value positionally across several paths
//! - `<path> = <literal>` : writes the literal, ignoring the value
//! - `<path>` : writes the value as-is
//!
//! The first matching form wins, in that order. Every path is resolved while
//! compiling, so a leaf that compiles can only fail on bad runtime values.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::error::{ExtractError, Result};
use super::path::{self, Apply};
use super::record::Record;

const PATH_CHARS: &str = "abcdefghijklmnopqrstuvwxyz_.";
const PATH_START: char = '.';
const FORCED_END: char = '$';

/// A compiled template leaf.
pub struct Setter {
    weight: i64,
    actions: Vec<Apply>,
}

impl Setter {
    /// Declared weight. The engine itself never reads it.
    pub fn weight(&self) -> i64 {
        self.weight
    }

    /// Runs every pipeline segment against `value`, stopping at the first error.
    pub fn apply(&self, value: &str, record: &mut Record) -> Result<()> {
        for action in &self.actions {
            action(value, record)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("weight", &self.weight)
            .field("actions", &self.actions.len())
            .finish()
    }
}

/// A literal separator of a `parse` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separator {
    pub literal: String,
    /// Stop splitting after this separator and drop whatever follows it.
    pub forced_end: bool,
}

impl Separator {
    fn from_run(run: &str) -> Self {
        match run.strip_suffix(FORCED_END) {
            Some(literal) => Self {
                literal: literal.to_string(),
                forced_end: true,
            },
            None => Self {
                literal: run.to_string(),
                forced_end: false,
            },
        }
    }
}

/// Result of cutting a value at a sequence of separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub values: Vec<String>,
    /// Separator that could not be found, if splitting stopped early.
    pub missing: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Weight(i64),
    Conditional {
        expected: bool,
        path: &'a str,
        literal: &'a str,
    },
    Parse {
        paths: Vec<&'a str>,
        separators: Vec<Separator>,
    },
    Preset {
        path: &'a str,
        literal: &'a str,
    },
    Direct(&'a str),
}

/// Compiles a template leaf into a [`Setter`].
pub fn compile(leaf: &str) -> Result<Setter> {
    let mut setter = Setter {
        weight: 0,
        actions: Vec::new(),
    };

    for raw in pipeline(leaf) {
        match parse_segment(raw.trim())? {
            Segment::Weight(weight) => setter.weight = weight,
            Segment::Conditional {
                expected,
                path,
                literal,
            } => setter.actions.push(conditional(expected, path, literal)?),
            Segment::Parse { paths, separators } => {
                setter.actions.push(positional(&paths, separators)?)
            }
            Segment::Preset { path, literal } => setter.actions.push(preset(path, literal)?),
            Segment::Direct(path) => setter.actions.push(path::resolve(path)?),
        }
    }

    Ok(setter)
}

fn pipeline(leaf: &str) -> std::str::Split<'_, &'static str> {
    let inner = leaf.strip_prefix("{{ ").unwrap_or(leaf);
    let inner = inner.strip_suffix(" }}").unwrap_or(inner);
    inner.split(" | ")
}

fn parse_segment(segment: &str) -> Result<Segment<'_>> {
    if let Some(rest) = segment.strip_prefix("weight ") {
        let weight = rest.parse::<i64>().map_err(|e| {
            ExtractError::invalid_segment(segment, format!("could not parse weight: {}", e))
        })?;
        return Ok(Segment::Weight(weight));
    }

    if let Some(rest) = segment.strip_prefix("if ") {
        return parse_conditional(segment, rest);
    }

    if let Some(rest) = segment.strip_prefix("parse ") {
        let (paths, separators) = parse_pattern(rest);
        if paths.is_empty() {
            return Err(ExtractError::invalid_segment(
                segment,
                "parse pattern names no object path",
            ));
        }
        return Ok(Segment::Parse { paths, separators });
    }

    if let Some((path, literal)) = segment.split_once(" = ") {
        return Ok(Segment::Preset { path, literal });
    }

    Ok(Segment::Direct(segment))
}

fn parse_conditional<'a>(segment: &'a str, rest: &'a str) -> Result<Segment<'a>> {
    const SHAPE: &str = "should be 'if <true|false> <path> = <value>'";

    let (condition, assignment) = rest
        .split_once(' ')
        .ok_or_else(|| ExtractError::invalid_segment(segment, SHAPE))?;

    let expected = condition.parse::<bool>().map_err(|_| {
        ExtractError::invalid_segment(segment, format!("condition '{}' is not a boolean", condition))
    })?;

    let (path, literal) = assignment
        .split_once(" = ")
        .ok_or_else(|| ExtractError::invalid_segment(segment, SHAPE))?;

    Ok(Segment::Conditional {
        expected,
        path,
        literal,
    })
}

/// Splits a `parse` pattern into object-path tokens and separator runs.
///
/// A token opens at a `.` and runs through `[a-z_.]`. Everything else,
/// including letters outside a token, is separator text, so `redis://` or
/// `?sslmode=` stay literal.
pub fn parse_pattern(pattern: &str) -> (Vec<&str>, Vec<Separator>) {
    let mut paths = Vec::new();
    let mut separators = Vec::new();

    let mut separator_start = 0;
    let mut chars = pattern.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        if ch != PATH_START {
            continue;
        }
        if separator_start < start {
            separators.push(Separator::from_run(&pattern[separator_start..start]));
        }

        let mut end = pattern.len();
        while let Some(&(index, next)) = chars.peek() {
            if !PATH_CHARS.contains(next) {
                end = index;
                break;
            }
            chars.next();
        }
        paths.push(&pattern[start..end]);
        separator_start = end;
    }

    if separator_start < pattern.len() {
        separators.push(Separator::from_run(&pattern[separator_start..]));
    }

    (paths, separators)
}

/// Cuts `value` at each separator in order.
///
/// Empty pieces are dropped. When a separator is missing, splitting stops and
/// the unsplit remainder becomes the last value. A forced-end separator
/// discards everything after it, and a bare `$` takes the remainder whole.
pub fn split_positional(value: &str, separators: &[Separator]) -> Split {
    let mut values = Vec::new();
    let mut missing = None;
    let mut remaining = value;

    for separator in separators {
        if separator.literal.is_empty() {
            break;
        }

        let Some((before, after)) = remaining.split_once(separator.literal.as_str()) else {
            missing = Some(separator.literal.clone());
            break;
        };

        if !before.is_empty() {
            values.push(before.to_string());
        }
        remaining = after;

        if separator.forced_end {
            remaining = "";
            break;
        }
    }

    if !remaining.is_empty() {
        values.push(remaining.to_string());
    }

    Split { values, missing }
}

fn conditional(expected: bool, path: &str, literal: &str) -> Result<Apply> {
    let apply = path::resolve(path)?;
    let literal = literal.to_string();

    Ok(Arc::new(
        move |value: &str, record: &mut Record| -> Result<()> {
            let actual = value.parse::<bool>().map_err(|_| ExtractError::Condition {
                value: value.to_string(),
            })?;
            if actual == expected {
                apply(&literal, record)?;
            }
            Ok(())
        },
    ))
}

fn preset(path: &str, literal: &str) -> Result<Apply> {
    let apply = path::resolve(path)?;
    let literal = literal.to_string();

    Ok(Arc::new(
        move |_value: &str, record: &mut Record| -> Result<()> { apply(&literal, record) },
    ))
}

fn positional(paths: &[&str], separators: Vec<Separator>) -> Result<Apply> {
    let applies = paths
        .iter()
        .map(|path| path::resolve(path))
        .collect::<Result<Vec<_>>>()?;

    Ok(Arc::new(
        move |value: &str, record: &mut Record| -> Result<()> {
            let Split { values, missing } = split_positional(value, &separators);

            if let Some(separator) = &missing {
                warn!(value, separator = %separator, "separator not found, skipping");
                record.warn(format!(
                    "separator '{}' not found in '{}'",
                    separator, value
                ));
            }

            for (index, piece) in values.iter().enumerate() {
                match applies.get(index) {
                    Some(apply) => apply(piece, record)?,
                    None => {
                        return Err(ExtractError::TooManySegments {
                            values: values.clone(),
                        })
                    }
                }
            }
            Ok(())
        },
    ))
}
