//! Line-oriented terminal front end over the list and form controllers.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::api::ContactApi;
use crate::api::models::{ContactId, Field};
use crate::ui::Route;
use crate::ui::confirm::Surface;
use crate::ui::contact_form::{ContactForm, Submission};
use crate::ui::contact_list::{ContactList, ListState, SortField};
use crate::ui::table;

const HELP: &str = "\
Commands:
  search <text>      filter by name or email
  clear              drop the search filter
  sort name|email    sort the list (again to reverse)
  add                create a contact
  edit <id>          edit a contact
  delete <id>        delete a contact
  refresh            reload the list
  help               show this text
  quit               leave";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Empty,
    Search(String),
    Clear,
    Sort(SortField),
    Refresh,
    Add,
    Edit(ContactId),
    Delete(ContactId),
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match (word, rest) {
            ("", _) => Ok(Command::Empty),
            ("search" | "s", "") => Err("usage: search <text>".into()),
            ("search" | "s", term) => Ok(Command::Search(term.to_string())),
            ("clear", _) => Ok(Command::Clear),
            ("sort", "" | "email") => Ok(Command::Sort(SortField::Email)),
            ("sort", "name") => Ok(Command::Sort(SortField::Name)),
            ("sort", _) => Err("usage: sort name|email".into()),
            ("refresh" | "r", _) => Ok(Command::Refresh),
            ("add" | "new", _) => Ok(Command::Add),
            ("edit" | "e", "") => Err("usage: edit <id>".into()),
            ("edit" | "e", id) => Ok(Command::Edit(ContactId::new(id))),
            ("delete" | "rm", "") => Err("usage: delete <id>".into()),
            ("delete" | "rm", id) => Ok(Command::Delete(ContactId::new(id))),
            ("help" | "?", _) => Ok(Command::Help),
            ("quit" | "q" | "exit", _) => Ok(Command::Quit),
            (other, _) => Err(format!("Unknown command {other:?}. Type 'help' for the list of commands.")),
        }
    }
}

fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "" | "n" | "no" => Some(false),
        _ => None,
    }
}

pub struct Shell<R, W> {
    api: Arc<dyn ContactApi>,
    debounce: Duration,
    surface: Surface,
    input: Lines<R>,
    out: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(api: Arc<dyn ContactApi>, debounce: Duration, input: R, out: W) -> Self {
        Self { api, debounce, surface: Surface::default(), input: input.lines(), out }
    }

    /// Run until `quit` or end of input.
    pub async fn run(&mut self) -> io::Result<()> {
        let list = ContactList::mount(Arc::clone(&self.api), self.debounce, self.surface.clone());
        let mut route = Route::List;
        loop {
            route = match route {
                Route::List => match self.list_view(&list).await? {
                    Some(next) => next,
                    None => return Ok(()),
                },
                Route::Add => self.form_view(None).await?,
                Route::Edit(id) => self.form_view(Some(id)).await?,
            };
            if route == Route::List {
                list.refresh();
            }
        }
    }

    async fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        self.input.next_line().await
    }

    /// Keep asking until the answer is yes or no. `None` at end of input.
    async fn ask_yes_no(&mut self, question: &str) -> io::Result<Option<bool>> {
        loop {
            let Some(answer) = self.prompt(&format!("{question} [y/N] ")).await? else {
                return Ok(None);
            };
            match parse_answer(&answer) {
                Some(yes) => return Ok(Some(yes)),
                None => writeln!(self.out, "Please answer y or n.")?,
            }
        }
    }

    fn render_list(&mut self, state: &ListState) -> io::Result<()> {
        writeln!(self.out)?;
        if !state.search_term.is_empty() {
            writeln!(self.out, "Search: {}", state.search_term)?;
        }
        if let Some(err) = &state.error {
            writeln!(self.out, "! {err}")?;
        }
        if state.contacts.is_empty() {
            if state.error.is_none() {
                writeln!(self.out, "No contacts found.")?;
            }
        } else {
            write!(self.out, "{}", table::render(&state.contacts, state.sort))?;
        }
        Ok(())
    }

    async fn list_view(&mut self, list: &ContactList) -> io::Result<Option<Route>> {
        let mut redraw = true;
        loop {
            if redraw {
                let state = list.settled().await;
                self.render_list(&state)?;
            }
            redraw = true;

            let Some(line) = self.prompt("contacts> ").await? else {
                return Ok(None);
            };
            match Command::parse(&line) {
                Ok(Command::Empty) => redraw = false,
                Ok(Command::Search(term)) => {
                    writeln!(self.out, "Searching for {term:?}…")?;
                    list.set_search_term(term);
                }
                Ok(Command::Clear) => {
                    list.set_search_term("");
                }
                Ok(Command::Sort(field)) => {
                    list.sort(field);
                }
                Ok(Command::Refresh) => {
                    list.refresh();
                }
                Ok(Command::Add) => return Ok(Some(Route::Add)),
                Ok(Command::Edit(id)) => return Ok(Some(Route::Edit(id))),
                Ok(Command::Delete(id)) => {
                    if !self.delete_from_list(list, &id).await? {
                        return Ok(None);
                    }
                }
                Ok(Command::Help) => {
                    writeln!(self.out, "{HELP}")?;
                    redraw = false;
                }
                Ok(Command::Quit) => return Ok(None),
                Err(msg) => {
                    writeln!(self.out, "{msg}")?;
                    redraw = false;
                }
            }
        }
    }

    /// Returns `false` if input ended while the question was open.
    async fn delete_from_list(&mut self, list: &ContactList, id: &ContactId) -> io::Result<bool> {
        if !list.request_delete(id) {
            writeln!(self.out, "No contact with id {id}.")?;
            return Ok(true);
        }
        let message = list.delete_prompt().map(|p| p.message).unwrap_or_default();
        match self.ask_yes_no(&message).await? {
            Some(true) => match list.confirm_delete().await {
                Ok(Some(deleted)) => writeln!(self.out, "Deleted contact {deleted}.")?,
                Ok(None) => {}
                // The list view shows the error.
                Err(_) => {}
            },
            Some(false) => list.cancel_delete(),
            None => {
                list.cancel_delete();
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn form_view(&mut self, id: Option<ContactId>) -> io::Result<Route> {
        let mut form = ContactForm::open(Arc::clone(&self.api), id, self.surface.clone()).await;
        if form.is_edit() {
            writeln!(self.out, "\nEdit Contact  (enter keeps a value, '-' clears it, ':cancel' leaves, ':delete' deletes)")?;
        } else {
            writeln!(self.out, "\nAdd Contact  (enter keeps a value, '-' clears it, ':cancel' leaves)")?;
        }
        if let Some(err) = &form.state().api_error {
            writeln!(self.out, "! {err}")?;
        }

        let mut fields = Field::ALL.to_vec();
        loop {
            let mut pending = fields.iter().copied().peekable();
            while let Some(&field) = pending.peek() {
                let current = form.state().draft.get(field).to_string();
                let marker = if field.is_required() { "*" } else { "" };
                let label = if current.is_empty() {
                    format!("{}{marker}: ", field.label())
                } else {
                    format!("{}{marker} [{current}]: ", field.label())
                };
                let Some(input) = self.prompt(&label).await? else {
                    return Ok(form.cancel());
                };
                match input.trim() {
                    "" => {}
                    ":cancel" => return Ok(form.cancel()),
                    ":delete" if form.is_edit() => {
                        if let Some(next) = self.delete_from_form(&mut form).await? {
                            return Ok(next);
                        }
                        // Still editing: ask for the same field again.
                        continue;
                    }
                    "-" => form.edit(field, ""),
                    _ => form.edit(field, input.as_str()),
                }
                pending.next();
            }

            match form.submit().await {
                Submission::Saved { contact, next } => {
                    writeln!(self.out, "Saved {} ({}).", contact.name, contact.id)?;
                    return Ok(next);
                }
                Submission::Rejected => {
                    for (field, err) in &form.state().errors {
                        writeln!(self.out, "! {field}: {}", err.message)?;
                    }
                    fields = form.state().errors.keys().copied().collect();
                }
                Submission::Failed => {
                    let message = form.state().api_error.clone().unwrap_or_default();
                    writeln!(self.out, "! {message}")?;
                    if self.ask_yes_no("Try again?").await? != Some(true) {
                        return Ok(form.cancel());
                    }
                    fields.clear();
                }
            }
        }
    }

    async fn delete_from_form(&mut self, form: &mut ContactForm) -> io::Result<Option<Route>> {
        if !form.request_delete() {
            return Ok(None);
        }
        let message = form.delete_prompt().map(|p| p.message.clone()).unwrap_or_default();
        match self.ask_yes_no(&message).await? {
            Some(true) => {
                let next = form.confirm_delete().await;
                if next.is_none()
                    && let Some(err) = &form.state().api_error
                {
                    writeln!(self.out, "! {err}")?;
                }
                Ok(next)
            }
            _ => {
                form.cancel_delete();
                Ok(None)
            }
        }
    }
}
