//! The interactive REPL.

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use genogram_foundation::{EntityId, EntityKind, Error, Value};
use genogram_storage::schema;
use genogram_storage::{Entity, PairBond, Person, Relational};
use thiserror::Error;
use tracing::debug;

use crate::command::{self, KEYWORDS, ParseError, ReplCommand};
use crate::config::RuntimeConfig;
use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::Session;

/// Why a REPL line failed.
#[derive(Debug, Error)]
pub enum ReplError {
    /// The line did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The engine refused the command.
    #[error(transparent)]
    Engine(#[from] Error),
}

/// What evaluating a line produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Text to print.
    Output(String),
    /// Nothing to print.
    Silent,
    /// The user asked to leave.
    Quit,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self::Output(text.into())
    }
}

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    editor: E,
    session: Session,
    show_banner: bool,
    prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new(config: RuntimeConfig) -> Result<Self, Error> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor).with_session(Session::new(config)))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor.
    pub fn with_editor(mut editor: E) -> Self {
        editor.set_keywords(KEYWORDS.iter().map(|kw| (*kw).to_string()).collect());
        Self {
            editor,
            session: Session::default(),
            show_banner: true,
            prompt: "genogram> ".to_string(),
        }
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.show_banner = session.config().show_banner;
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the session for editing.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs the REPL loop until EOF or `quit`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<(), Error> {
        if self.show_banner {
            self.print_banner();
        }
        while self.read_eval_print()? {}
        if self.session.is_modified() {
            println!("Unsaved changes discarded.");
        }
        println!("Goodbye!");
        Ok(())
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool, Error> {
        let line = match self.editor.read_line(&self.prompt)? {
            ReadResult::Line(line) => line,
            ReadResult::Interrupted => {
                println!();
                return Ok(true);
            }
            ReadResult::Eof => return Ok(false),
        };
        if line.trim().is_empty() {
            return Ok(true);
        }
        self.editor.add_history(&line);

        match self.eval(&line) {
            Ok(Reply::Output(text)) => println!("{text}"),
            Ok(Reply::Silent) => {}
            Ok(Reply::Quit) => return Ok(false),
            Err(e) => print_error(&e),
        }
        Ok(true)
    }

    /// Runs every line of `input` without prompting.
    ///
    /// Stops at the first failing line and returns its 1-based number with
    /// the error.
    ///
    /// # Errors
    ///
    /// Returns `(line, error)` for the first failure.
    pub fn run_script<R: BufRead>(&mut self, input: R) -> Result<(), (usize, ReplError)> {
        for (index, line) in input.lines().enumerate() {
            let line = line.map_err(|e| {
                (
                    index + 1,
                    ReplError::Engine(Error::new(genogram_foundation::ErrorKind::Io(
                        e.to_string(),
                    ))),
                )
            })?;
            match self.eval(&line).map_err(|e| (index + 1, e))? {
                Reply::Output(text) => println!("{text}"),
                Reply::Silent => {}
                Reply::Quit => break,
            }
        }
        Ok(())
    }

    /// Evaluates one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not parse or the engine refuses it.
    pub fn eval(&mut self, line: &str) -> Result<Reply, ReplError> {
        let Some(command) = command::parse(line)? else {
            return Ok(Reply::Silent);
        };
        debug!(?command, "evaluating");
        Ok(self.execute(command)?)
    }

    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, command: ReplCommand) -> Result<Reply, Error> {
        let doc = self.session.document_mut();
        let reply = match command {
            ReplCommand::AddPerson(name) => added("person", doc.add_person(name.as_deref())?),
            ReplCommand::AddPairBond(a, b) => added("pair-bond", doc.add_pair_bond(a, b)?),
            ReplCommand::AddEmotion(kind, a, b) => added(kind.slug(), doc.add_emotion(kind, a, b)?),
            ReplCommand::AddEvent(kind, owner) => added(kind.slug(), doc.add_event(kind, owner)?),
            ReplCommand::AddLayer(name) => added("layer", doc.add_layer(&name)?),
            ReplCommand::SetParents(person, target) => {
                doc.set_parents(person, target)?;
                Reply::Silent
            }
            ReplCommand::Remove(ids) => {
                let removed = doc.remove(&ids)?;
                Reply::line(format!("Removed {}", id_list(&removed)))
            }
            ReplCommand::Set(id, name, value) => {
                doc.set_property(id, &name, value)?;
                Reply::Silent
            }
            ReplCommand::Get(id, name) => Reply::line(doc.property(id, &name)?.to_string()),
            ReplCommand::Reset(id, name) => {
                doc.reset_property(id, &name)?;
                Reply::Silent
            }
            ReplCommand::Show(id) => Reply::Output(self.describe(id)?),
            ReplCommand::List(kind) => Reply::Output(self.list(kind)),
            ReplCommand::LayerActive(layer, active) => {
                doc.set_layer_active(layer, active)?;
                Reply::Silent
            }
            ReplCommand::LayerRename(layer, name) => {
                doc.rename_layer(layer, &name)?;
                Reply::Silent
            }
            ReplCommand::LayerOrder(order) => {
                doc.reorder_layers(order)?;
                Reply::Silent
            }
            ReplCommand::LayerGeometry(layer, enabled) => {
                doc.set_layer_store_geometry(layer, enabled)?;
                Reply::Silent
            }
            ReplCommand::LayerClear(layer) => {
                doc.reset_layer_overrides(layer)?;
                Reply::Silent
            }
            ReplCommand::TagAdd(tag) => {
                if doc.add_tag(&tag)? {
                    Reply::Silent
                } else {
                    Reply::line(format!("Tag '{tag}' already exists"))
                }
            }
            ReplCommand::TagRemove(tag) => {
                doc.remove_tag(&tag)?;
                Reply::Silent
            }
            ReplCommand::TagRename(old, new) => {
                doc.rename_tag(&old, &new)?;
                Reply::Silent
            }
            ReplCommand::Tag(id, tag) => {
                doc.tag_entity(id, &tag)?;
                Reply::Silent
            }
            ReplCommand::Untag(id, tag) => {
                doc.untag_entity(id, &tag)?;
                Reply::Silent
            }
            ReplCommand::ExtensionAdd(name, ty) => {
                let attr = doc.add_extension(&name, ty)?;
                Reply::line(format!("Added event property '{attr}'"))
            }
            ReplCommand::ExtensionRemove(attr) => {
                doc.remove_extension(&attr)?;
                Reply::Silent
            }
            ReplCommand::ExtensionRename(attr, name) => {
                let attr = doc.rename_extension(&attr, &name)?;
                Reply::line(format!("Renamed to '{attr}'"))
            }
            ReplCommand::ExtensionReplace(specs) => {
                let count = specs.len();
                let specs = specs
                    .into_iter()
                    .map(|(name, ty)| schema::ExtensionSpec::new(name, ty))
                    .collect();
                doc.replace_extensions(specs)?;
                Reply::line(format!("Replaced event properties ({count})"))
            }
            ReplCommand::ProposePerson => {
                let id = doc.allocate_id();
                added("proposed person", doc.propose(Entity::Person(Person::new(id)))?)
            }
            ReplCommand::ProposePairBond(a, b) => {
                let id = doc.allocate_id();
                let bond = Entity::PairBond(PairBond::new(id, a, b));
                added("proposed pair-bond", doc.propose(bond)?)
            }
            ReplCommand::Accept(id) => {
                let committed: Vec<EntityId> = doc.accept_proposed(id)?.into_iter().collect();
                Reply::line(format!("Accepted {}", id_list(&committed)))
            }
            ReplCommand::Reject(id) => {
                let removed = doc.reject_proposed(id)?;
                Reply::line(format!("Rejected {}", id_list(&removed)))
            }
            ReplCommand::Undo => {
                let label = doc.stack().undo_label();
                if doc.undo()? {
                    Reply::line(format!("Undid: {}", label.unwrap_or_default()))
                } else {
                    Reply::line("Nothing to undo")
                }
            }
            ReplCommand::Redo => {
                let label = doc.stack().redo_label();
                if doc.redo()? {
                    Reply::line(format!("Redid: {}", label.unwrap_or_default()))
                } else {
                    Reply::line("Nothing to redo")
                }
            }
            ReplCommand::History => Reply::Output(self.history()),
            ReplCommand::Validate => {
                doc.validate()?;
                Reply::line("ok")
            }
            ReplCommand::Save(path) => {
                match path {
                    Some(path) => self.session.save_as(path)?,
                    None => self.session.save()?,
                }
                Reply::Silent
            }
            ReplCommand::Open(path) => {
                let session = Session::open(&path, self.session.config().clone())?;
                let report = session.report();
                let text = if report.is_clean() {
                    format!("Opened {}", path.display())
                } else {
                    format!(
                        "Opened {} (pruned {}, dissolved {})",
                        path.display(),
                        report.pruned_count(),
                        report.dissolved.len()
                    )
                };
                self.session = session;
                Reply::Output(text)
            }
            ReplCommand::Help => Reply::line(HELP.trim_end()),
            ReplCommand::Quit => Reply::Quit,
        };
        self.session.document_mut().drain_changes();
        Ok(reply)
    }

    fn describe(&self, id: EntityId) -> Result<String, Error> {
        let graph = self.session.document().graph();
        let entity = graph.get(id)?;
        let kind = entity.kind();
        let mut out = format!("#{} {kind}", id.raw());
        if graph.is_proposed(id) {
            out.push_str(" (proposed)");
        }
        for reference in entity.references() {
            let _ = write!(out, "\n  {} -> #{}", reference.field, reference.target.raw());
        }
        for spec in schema::properties(kind) {
            let value = graph.property(id, spec.name)?;
            if value != spec.default {
                let _ = write!(out, "\n  {} = {value}", spec.name);
            }
        }
        if kind == EntityKind::Event {
            for ext in graph.extensions().iter() {
                let value = graph.property(id, &ext.attr)?;
                if !value.is_nil() {
                    let _ = write!(out, "\n  {} = {value}", ext.attr);
                }
            }
        }
        Ok(out)
    }

    fn list(&self, kind: Option<EntityKind>) -> String {
        let graph = self.session.document().graph();
        let lines: Vec<String> = graph
            .iter()
            .filter(|entity| kind.is_none_or(|k| entity.kind() == k))
            .map(|entity| {
                let id = entity.id();
                match graph.property(id, "name") {
                    Ok(Value::String(name)) => format!("#{} {} {name}", id.raw(), entity.kind()),
                    _ => format!("#{} {}", id.raw(), entity.kind()),
                }
            })
            .collect();
        if lines.is_empty() {
            "(empty)".to_string()
        } else {
            lines.join("\n")
        }
    }

    fn history(&self) -> String {
        let stack = self.session.document().stack();
        let labels = stack.labels();
        if labels.is_empty() {
            return "(no history)".to_string();
        }
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let marker = if i + 1 == stack.cursor() { '>' } else { ' ' };
                format!("{marker} {}. {label}", i + 1)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn print_banner(&self) {
        println!("\x1b[1;36mgenogram\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
        match self.session.path() {
            Some(path) => println!("Editing {}", path.display()),
            None => println!("New diagram."),
        }
        println!("Type 'help' for commands. Use Ctrl+D to exit.\n");
        let _ = io::stdout().flush();
    }
}

fn added(what: &str, id: EntityId) -> Reply {
    Reply::line(format!("Added {what} #{}", id.raw()))
}

fn id_list(ids: &[EntityId]) -> String {
    ids.iter()
        .map(|id| format!("#{}", id.raw()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_error(error: &ReplError) {
    eprintln!("\x1b[31mError: {error}\x1b[0m");
}

const HELP: &str = "\
add person [name]              add bond <a> <b>
add emotion <kind> <a> [b]     add event <kind> <owner>
add layer <name>               parents <person> <target|none>
remove <id>...                 show <id>      list [kind]
set <id> <prop> <value>        get <id> <prop>      reset <id> <prop>
layer on|off <id>              layer rename <id> <name>
layer order <id>...            layer geometry <id> on|off
layer clear <id>
tag new|delete <name>          tag rename <old> <new>
tag <id> <name>                untag <id> <name>
ext add <name> <type>          ext remove <attr>    ext rename <attr> <name>
ext replace [<name> <type>]...
propose person                 propose bond <a> <b>
accept <id>                    reject <id>
undo   redo   history   validate
save [path]   open <path>   help   quit
";
