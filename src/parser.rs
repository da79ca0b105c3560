//! Streaming JSON5 parsing of graph snapshots
//!
//! A snapshot is a stream of node records, one JSON5 object each:
//!
//! ```text
//! {"kind": "callback", "result": 1}
//! {"kind": "callback", "result": 2}
//! {"kind": "deterministic", "adjustments": [{"variable": 64}], "ranges": [{"low": 0, "high": 9, "target": 0}], "default": 1}
//! ```
//!
//! The n-th record (counting from zero) becomes `NodeId(n)`, and targets refer to
//! records by that number. Records may be single-line (JSONL) or span several lines,
//! and may use JSON5 comments, trailing commas and unquoted keys.

use std::io::Read;

use thiserror::Error;

use crate::arena::{ArenaError, DanglingLink, NodeArena, MAX_BLOCKS};
use crate::models::Node;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

/// A warning message from parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub message: String,
    pub line: usize,
}

/// Result of parsing a snapshot stream.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub nodes: Vec<Node>,
    pub warnings: Vec<Warning>,
}

/// Error building an arena from parsed nodes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// Targets referring to records that do not exist
    #[error("{} dangling reference(s)", .0.len())]
    DanglingLinks(Vec<DanglingLink>),
}

/// Parse a single JSON5 string into a node.
pub fn parse_line(line: &str, line_number: usize) -> Result<Node, ParseError> {
    json5::from_str(line).map_err(|e| ParseError { message: e.to_string(), line: line_number })
}

/// Parse a stream of JSON5 node records.
///
/// Collects a warning for a malformed record or an unreadable line and stops there,
/// since the start of the next record cannot be found reliably. Node numbering of
/// the records read so far is unaffected.
pub fn parse_stream<R: Read>(reader: R) -> ParseResult {
    use std::io::BufRead;

    let mut result = ParseResult::default();
    let buf_reader = std::io::BufReader::new(reader);
    let lines = buf_reader.lines();

    let mut accumulator = String::new();
    let mut start_line = 1;
    let mut current_line = 1;
    let mut brace_depth = 0;
    let mut bracket_depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                result.warnings.push(Warning {
                    message: format!("Failed to read line: {}", e),
                    line: current_line,
                });
                return result;
            }
        };
        let trimmed = line.trim();
        if accumulator.is_empty() && (trimmed.is_empty() || trimmed.starts_with("//")) {
            current_line += 1;
            start_line = current_line;
            continue;
        }

        if !accumulator.is_empty() {
            accumulator.push('\n');
        }
        accumulator.push_str(&line);

        for ch in line.chars() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                '{' if !in_string => brace_depth += 1,
                '}' if !in_string => brace_depth -= 1,
                '[' if !in_string => bracket_depth += 1,
                ']' if !in_string => bracket_depth -= 1,
                _ => {}
            }
        }

        if brace_depth == 0 && bracket_depth == 0 && !accumulator.trim().is_empty() {
            match parse_line(&accumulator, start_line) {
                Ok(node) => result.nodes.push(node),
                Err(e) => {
                    result.warnings.push(Warning { message: e.message, line: e.line });
                    return result;
                }
            }

            accumulator.clear();
            start_line = current_line + 1;
            in_string = false;
            escape_next = false;
        }

        current_line += 1;
    }

    if !accumulator.trim().is_empty() {
        match parse_line(&accumulator, start_line) {
            Ok(node) => result.nodes.push(node),
            Err(e) => result.warnings.push(Warning { message: e.message, line: e.line }),
        }
    }

    result
}

/// Store parsed nodes in a fresh arena, validating every node and link.
pub fn build_arena(nodes: Vec<Node>) -> Result<NodeArena, GraphError> {
    build_arena_with_limit(nodes, MAX_BLOCKS)
}

/// Like [`build_arena`], with an explicit block limit.
pub fn build_arena_with_limit(
    nodes: Vec<Node>,
    max_blocks: usize,
) -> Result<NodeArena, GraphError> {
    let mut arena = NodeArena::with_max_blocks(max_blocks);
    for node in nodes {
        arena.insert(node)?;
    }

    let dangling = arena.validate_links();
    if !dangling.is_empty() {
        return Err(GraphError::DanglingLinks(dangling));
    }

    Ok(arena)
}
