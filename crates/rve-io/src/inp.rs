//! CalculiX/Abaqus `.inp` keyword deck reader.
//!
//! Only the structure needed to recover the RVE mesh is interpreted:
//! cards, their parameters and data lines, `*INCLUDE` expansion, and the
//! node table of `*NODE` cards.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use rve_model::Node;

/// A parsed deck: the cards in file order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deck {
    pub cards: Vec<Card>,
}

/// One keyword card with its data lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Upper-cased keyword without the leading `*`
    pub keyword: String,
    pub parameters: Vec<Parameter>,
    pub data_lines: Vec<DataLine>,
    /// 1-based line of the keyword
    pub line_start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub key: String,
    pub value: Option<String>,
}

/// A data line and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLine {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

impl Card {
    /// Value of a parameter, matched case-insensitively
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key))
            .and_then(|p| p.value.as_deref())
    }

    pub fn is(&self, keyword: &str) -> bool {
        normalized_keyword(&self.keyword) == normalized_keyword(keyword)
    }
}

impl Deck {
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let mut active = HashSet::new();
        Self::parse_file_inner(path.as_ref(), &mut active)
    }

    pub fn parse_str(raw: &str) -> Result<Self, ParseError> {
        let mut cards: Vec<Card> = Vec::new();

        for (index, line) in raw.lines().enumerate() {
            let number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || is_comment(trimmed) {
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('*') {
                let (keyword, parameters) = parse_header(header, number)?;
                cards.push(Card {
                    keyword,
                    parameters,
                    data_lines: Vec::new(),
                    line_start: number,
                });
                continue;
            }

            let Some(card) = cards.last_mut() else {
                return Err(ParseError::new(number, "expected card starting with '*'"));
            };
            // A leading comma continues the header of a card without data yet.
            if trimmed.starts_with(',') && card.data_lines.is_empty() {
                let (_, more) = parse_header(&format!("{}{trimmed}", card.keyword), number)?;
                card.parameters.extend(more);
                continue;
            }
            card.data_lines.push(DataLine {
                line: number,
                text: trimmed.to_string(),
            });
        }

        Ok(Deck { cards })
    }

    fn parse_file_inner(path: &Path, active: &mut HashSet<PathBuf>) -> Result<Self, ParseError> {
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !active.insert(canonical.clone()) {
            return Err(ParseError::new(
                0,
                format!("include cycle detected at {}", path.display()),
            ));
        }

        let raw = fs::read_to_string(path)
            .map_err(|e| ParseError::new(0, format!("failed to read {}: {e}", path.display())))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut cards = Vec::new();
        for card in Self::parse_str(&raw)?.cards {
            if !card.is("INCLUDE") {
                cards.push(card);
                continue;
            }
            let target = card.parameter("INPUT").ok_or_else(|| {
                ParseError::new(card.line_start, "missing INPUT parameter in *INCLUDE card")
            })?;
            let target = base.join(target.trim_matches(|c| c == '"' || c == '\''));
            let included = Self::parse_file_inner(&target, active).map_err(|err| {
                ParseError::new(
                    err.line,
                    format!("{} (while expanding include {})", err.message, target.display()),
                )
            })?;
            cards.extend(included.cards);
        }

        active.remove(&canonical);
        Ok(Deck { cards })
    }

    /// Cards matching a keyword
    pub fn cards_named<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Card> + 'a {
        self.cards.iter().filter(move |card| card.is(keyword))
    }

    /// Every node row of every `*NODE` card.
    ///
    /// Malformed rows do not stop the scan; they are returned alongside the
    /// nodes that did parse.
    pub fn node_records(&self) -> (Vec<Node>, Vec<ParseError>) {
        let mut nodes = Vec::new();
        let mut errors = Vec::new();
        for card in self.cards_named("NODE") {
            for data in &card.data_lines {
                match parse_node_line(&data.text) {
                    Ok(node) => nodes.push(node),
                    Err(message) => errors.push(ParseError::new(data.line, message)),
                }
            }
        }
        (nodes, errors)
    }

    /// Number of element rows across `*ELEMENT` cards
    pub fn element_count(&self) -> usize {
        self.cards_named("ELEMENT").map(|card| card.data_lines.len()).sum()
    }
}

/// Parse `id, x, y[, z]`; a missing z defaults to zero
pub fn parse_node_line(text: &str) -> Result<Node, String> {
    let fields: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect();
    if fields.len() < 3 {
        return Err(format!("node row needs an id and at least two coordinates: {text:?}"));
    }
    let id = fields[0]
        .parse::<i32>()
        .map_err(|e| format!("invalid node id {:?}: {e}", fields[0]))?;
    let mut coords = [0.0; 3];
    for (slot, raw) in coords.iter_mut().zip(&fields[1..]) {
        *slot = raw
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate {raw:?} for node {id}: {e}"))?;
    }
    Ok(Node::new(id, coords[0], coords[1], coords[2]))
}

fn is_comment(line: &str) -> bool {
    line.starts_with("**")
}

fn parse_header(header: &str, line: usize) -> Result<(String, Vec<Parameter>), ParseError> {
    let mut parts = header.split(',');
    let keyword = parts.next().unwrap_or_default().trim().to_ascii_uppercase();
    if keyword.is_empty() {
        return Err(ParseError::new(line, "empty card keyword"));
    }

    let parameters = parts
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((k, v)) => Parameter {
                key: k.trim().to_ascii_uppercase(),
                value: Some(v.trim().to_string()),
            },
            None => Parameter {
                key: item.to_ascii_uppercase(),
                value: None,
            },
        })
        .collect();

    Ok((keyword, parameters))
}

fn normalized_keyword(keyword: &str) -> String {
    keyword
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect::<String>()
        .to_ascii_uppercase()
}
