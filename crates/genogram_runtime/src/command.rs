//! Parsing REPL input lines into commands.
//!
//! Input is whitespace-separated words; double quotes group words into one
//! argument. Entity ids are plain numbers, optionally written `#12`.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use genogram_foundation::{EntityId, EntityKind, EventKind, RelationshipKind, Value, ValueType};
use thiserror::Error;

/// Why an input line could not be parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A quoted argument was never closed.
    #[error("unterminated quote")]
    UnterminatedQuote,
    /// The first word is not a command.
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    /// A required argument is missing.
    #[error("{command}: missing {what}")]
    Missing {
        /// The command being parsed.
        command: &'static str,
        /// The missing argument.
        what: &'static str,
    },
    /// Extra arguments follow a complete command.
    #[error("{0}: unexpected argument '{1}'")]
    Unexpected(&'static str, String),
    /// An argument did not parse as an entity id.
    #[error("'{0}' is not an entity id")]
    BadId(String),
    /// An argument named an unknown kind of thing.
    #[error("unknown {what} '{word}'")]
    UnknownName {
        /// What was being named.
        what: &'static str,
        /// The word given.
        word: String,
    },
}

/// A parsed REPL command.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplCommand {
    /// `add person [name]`
    AddPerson(Option<String>),
    /// `add bond <a> <b>`
    AddPairBond(EntityId, EntityId),
    /// `add emotion <kind> <a> [b]`
    AddEmotion(RelationshipKind, EntityId, Option<EntityId>),
    /// `add event <kind> <owner>`
    AddEvent(EventKind, EntityId),
    /// `add layer <name>`
    AddLayer(String),
    /// `parents <person> <target|none>`
    SetParents(EntityId, Option<EntityId>),
    /// `remove <id>...`
    Remove(Vec<EntityId>),
    /// `set <id> <property> <value>`
    Set(EntityId, String, Value),
    /// `get <id> <property>`
    Get(EntityId, String),
    /// `reset <id> <property>`
    Reset(EntityId, String),
    /// `show <id>`
    Show(EntityId),
    /// `list [kind]`
    List(Option<EntityKind>),
    /// `layer on|off <id>`
    LayerActive(EntityId, bool),
    /// `layer rename <id> <name>`
    LayerRename(EntityId, String),
    /// `layer order <id>...`
    LayerOrder(Vec<EntityId>),
    /// `layer geometry <id> on|off`
    LayerGeometry(EntityId, bool),
    /// `layer clear <id>`
    LayerClear(EntityId),
    /// `tag new <name>`
    TagAdd(String),
    /// `tag delete <name>`
    TagRemove(String),
    /// `tag rename <old> <new>`
    TagRename(String, String),
    /// `tag <id> <name>`
    Tag(EntityId, String),
    /// `untag <id> <name>`
    Untag(EntityId, String),
    /// `ext add <name> <type>`
    ExtensionAdd(String, ValueType),
    /// `ext remove <attr>`
    ExtensionRemove(String),
    /// `ext rename <attr> <name>`
    ExtensionRename(String, String),
    /// `ext replace [<name> <type>]...`
    ExtensionReplace(Vec<(String, ValueType)>),
    /// `propose person`
    ProposePerson,
    /// `propose bond <a> <b>`
    ProposePairBond(EntityId, EntityId),
    /// `accept <id>`
    Accept(EntityId),
    /// `reject <id>`
    Reject(EntityId),
    /// `undo`
    Undo,
    /// `redo`
    Redo,
    /// `history`
    History,
    /// `validate`
    Validate,
    /// `save [path]`
    Save(Option<PathBuf>),
    /// `open <path>`
    Open(PathBuf),
    /// `help`
    Help,
    /// `quit`
    Quit,
}

/// Command words offered for completion.
pub const KEYWORDS: &[&str] = &[
    "add", "person", "bond", "emotion", "event", "layer", "parents", "remove", "set", "get",
    "reset", "show", "list", "on", "off", "rename", "order", "geometry", "clear", "tag", "untag",
    "new", "delete", "ext", "propose", "accept", "reject", "undo", "redo", "history", "validate",
    "save", "open", "help", "quit", "none",
];

/// Splits a line into words, honoring double quotes.
///
/// # Errors
///
/// Returns [`ParseError::UnterminatedQuote`] for an unclosed quote.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_word = false;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            '\\' if quoted => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quoted {
        return Err(ParseError::UnterminatedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Parses one input line. Blank lines and `;` comments yield `None`.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first problem found.
pub fn parse(line: &str) -> Result<Option<ReplCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') {
        return Ok(None);
    }
    let words = tokenize(line)?;
    let mut args = Args::new(&words);
    let Some(head) = args.next() else {
        return Ok(None);
    };
    let command = match head {
        "add" => parse_add(&mut args)?,
        "parents" => {
            let person = args.id("parents", "person")?;
            let target = match args.word("parents", "target")? {
                "none" => None,
                word => Some(parse_id(word)?),
            };
            ReplCommand::SetParents(person, target)
        }
        "remove" | "rm" => {
            let ids = args.rest_ids()?;
            if ids.is_empty() {
                return Err(missing("remove", "id"));
            }
            ReplCommand::Remove(ids)
        }
        "set" => {
            let id = args.id("set", "id")?;
            let name = args.word("set", "property")?.to_string();
            let value = parse_value(args.word("set", "value")?);
            ReplCommand::Set(id, name, value)
        }
        "get" => ReplCommand::Get(
            args.id("get", "id")?,
            args.word("get", "property")?.to_string(),
        ),
        "reset" => ReplCommand::Reset(
            args.id("reset", "id")?,
            args.word("reset", "property")?.to_string(),
        ),
        "show" => ReplCommand::Show(args.id("show", "id")?),
        "list" | "ls" => ReplCommand::List(match args.next() {
            Some(word) => Some(parse_kind(word)?),
            None => None,
        }),
        "layer" => parse_layer(&mut args)?,
        "tag" => parse_tag(&mut args)?,
        "untag" => ReplCommand::Untag(
            args.id("untag", "id")?,
            args.word("untag", "tag")?.to_string(),
        ),
        "ext" => parse_extension(&mut args)?,
        "propose" => match args.word("propose", "kind")? {
            "person" => ReplCommand::ProposePerson,
            "bond" => ReplCommand::ProposePairBond(
                args.id("propose", "person")?,
                args.id("propose", "person")?,
            ),
            other => {
                return Err(ParseError::UnknownName {
                    what: "proposal kind",
                    word: other.to_string(),
                });
            }
        },
        "accept" => ReplCommand::Accept(args.id("accept", "id")?),
        "reject" => ReplCommand::Reject(args.id("reject", "id")?),
        "undo" => ReplCommand::Undo,
        "redo" => ReplCommand::Redo,
        "history" => ReplCommand::History,
        "validate" => ReplCommand::Validate,
        "save" => ReplCommand::Save(args.next().map(PathBuf::from)),
        "open" => ReplCommand::Open(PathBuf::from(args.word("open", "path")?)),
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    args.finish(head_name(head))?;
    Ok(Some(command))
}

fn parse_add(args: &mut Args<'_>) -> Result<ReplCommand, ParseError> {
    Ok(match args.word("add", "kind")? {
        "person" => ReplCommand::AddPerson(args.next().map(str::to_string)),
        "bond" => ReplCommand::AddPairBond(args.id("add", "person")?, args.id("add", "person")?),
        "emotion" => {
            let word = args.word("add", "relationship")?;
            let kind = RelationshipKind::from_slug(word).ok_or_else(|| ParseError::UnknownName {
                what: "relationship",
                word: word.to_string(),
            })?;
            let a = args.id("add", "person")?;
            let b = match args.next() {
                Some(word) => Some(parse_id(word)?),
                None => None,
            };
            ReplCommand::AddEmotion(kind, a, b)
        }
        "event" => {
            let word = args.word("add", "event kind")?;
            let kind = EventKind::from_slug(word).ok_or_else(|| ParseError::UnknownName {
                what: "event kind",
                word: word.to_string(),
            })?;
            ReplCommand::AddEvent(kind, args.id("add", "owner")?)
        }
        "layer" => ReplCommand::AddLayer(args.word("add", "name")?.to_string()),
        other => {
            return Err(ParseError::UnknownName {
                what: "item kind",
                word: other.to_string(),
            });
        }
    })
}

fn parse_layer(args: &mut Args<'_>) -> Result<ReplCommand, ParseError> {
    Ok(match args.word("layer", "action")? {
        "on" => ReplCommand::LayerActive(args.id("layer", "id")?, true),
        "off" => ReplCommand::LayerActive(args.id("layer", "id")?, false),
        "rename" => ReplCommand::LayerRename(
            args.id("layer", "id")?,
            args.word("layer", "name")?.to_string(),
        ),
        "order" => ReplCommand::LayerOrder(args.rest_ids()?),
        "geometry" => {
            let id = args.id("layer", "id")?;
            let enabled = parse_switch(args.word("layer", "on|off")?)?;
            ReplCommand::LayerGeometry(id, enabled)
        }
        "clear" => ReplCommand::LayerClear(args.id("layer", "id")?),
        other => {
            return Err(ParseError::UnknownName {
                what: "layer action",
                word: other.to_string(),
            });
        }
    })
}

fn parse_tag(args: &mut Args<'_>) -> Result<ReplCommand, ParseError> {
    Ok(match args.word("tag", "action or id")? {
        "new" => ReplCommand::TagAdd(args.word("tag", "name")?.to_string()),
        "delete" => ReplCommand::TagRemove(args.word("tag", "name")?.to_string()),
        "rename" => ReplCommand::TagRename(
            args.word("tag", "old name")?.to_string(),
            args.word("tag", "new name")?.to_string(),
        ),
        word => ReplCommand::Tag(parse_id(word)?, args.word("tag", "name")?.to_string()),
    })
}

fn parse_extension(args: &mut Args<'_>) -> Result<ReplCommand, ParseError> {
    Ok(match args.word("ext", "action")? {
        "add" => {
            let name = args.word("ext", "name")?.to_string();
            ReplCommand::ExtensionAdd(name, parse_type(args.word("ext", "type")?)?)
        }
        "replace" => {
            let mut specs = Vec::new();
            while let Some(name) = args.next() {
                specs.push((name.to_string(), parse_type(args.word("ext", "type")?)?));
            }
            ReplCommand::ExtensionReplace(specs)
        }
        "remove" => ReplCommand::ExtensionRemove(args.word("ext", "attribute")?.to_string()),
        "rename" => ReplCommand::ExtensionRename(
            args.word("ext", "attribute")?.to_string(),
            args.word("ext", "name")?.to_string(),
        ),
        other => {
            return Err(ParseError::UnknownName {
                what: "extension action",
                word: other.to_string(),
            });
        }
    })
}

fn parse_type(word: &str) -> Result<ValueType, ParseError> {
    ValueType::from_name(word).ok_or_else(|| ParseError::UnknownName {
        what: "type",
        word: word.to_string(),
    })
}

/// Parses a value literal.
///
/// `nil`, `true`, `false`, integers, floats, `x,y` points, and dates
/// (`2001-02-03` or `2001-02-03T04:05:06`) are recognized; anything else is a
/// string.
#[must_use]
pub fn parse_value(word: &str) -> Value {
    match word {
        "nil" => return Value::Nil,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = word.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = word.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    if let Some((x, y)) = word.split_once(',') {
        if let (Ok(x), Ok(y)) = (x.trim().parse::<f64>(), y.trim().parse::<f64>()) {
            return Value::point(x, y);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(word, "%Y-%m-%dT%H:%M:%S") {
        return Value::DateTime(dt);
    }
    if let Some(dt) = NaiveDate::parse_from_str(word, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Value::DateTime(dt);
    }
    Value::String(word.to_string())
}

fn parse_id(word: &str) -> Result<EntityId, ParseError> {
    word.strip_prefix('#')
        .unwrap_or(word)
        .parse::<u64>()
        .map(EntityId::new)
        .map_err(|_| ParseError::BadId(word.to_string()))
}

fn parse_kind(word: &str) -> Result<EntityKind, ParseError> {
    let word = match word {
        "people" => "person",
        "bonds" | "bond" => "pair_bond",
        "emotions" => "emotion",
        "events" => "event",
        "layers" => "layer",
        other => other,
    };
    EntityKind::ALL
        .into_iter()
        .find(|kind| kind.name() == word)
        .ok_or_else(|| ParseError::UnknownName {
            what: "kind",
            word: word.to_string(),
        })
}

fn parse_switch(word: &str) -> Result<bool, ParseError> {
    match word {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(ParseError::UnknownName {
            what: "switch",
            word: other.to_string(),
        }),
    }
}

fn missing(command: &'static str, what: &'static str) -> ParseError {
    ParseError::Missing { command, what }
}

fn head_name(head: &str) -> &'static str {
    KEYWORDS
        .iter()
        .find(|kw| **kw == head)
        .copied()
        .unwrap_or("command")
}

/// Cursor over the words of a line.
struct Args<'a> {
    words: &'a [String],
    pos: usize,
}

impl<'a> Args<'a> {
    fn new(words: &'a [String]) -> Self {
        Self { words, pos: 0 }
    }

    fn next(&mut self) -> Option<&'a str> {
        let word = self.words.get(self.pos)?;
        self.pos += 1;
        Some(word.as_str())
    }

    fn word(&mut self, command: &'static str, what: &'static str) -> Result<&'a str, ParseError> {
        self.next().ok_or(ParseError::Missing { command, what })
    }

    fn id(&mut self, command: &'static str, what: &'static str) -> Result<EntityId, ParseError> {
        parse_id(self.word(command, what)?)
    }

    fn rest_ids(&mut self) -> Result<Vec<EntityId>, ParseError> {
        let mut ids = Vec::new();
        while let Some(word) = self.next() {
            ids.push(parse_id(word)?);
        }
        Ok(ids)
    }

    fn finish(&mut self, command: &'static str) -> Result<(), ParseError> {
        match self.next() {
            Some(extra) => Err(ParseError::Unexpected(command, extra.to_string())),
            None => Ok(()),
        }
    }
}
