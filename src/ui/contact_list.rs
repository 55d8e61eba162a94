use log::{debug, warn};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::api::error::ApiError;
use crate::api::models::{Contact, ContactId};
use crate::api::{ContactApi, Outcome};
use crate::ui::confirm::{Choice, ConfirmDialog, Prompt, Surface};
use crate::utils::{Debouncer, Ticket, spawn_async};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Snapshot of the contact list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub contacts: Vec<Contact>,
    pub search_term: String,
    pub is_initial_loading: bool,
    pub is_search_loading: bool,
    /// A list request is waiting out the debounce window or is in flight.
    pub is_fetching: bool,
    pub error: Option<String>,
    /// Order applied locally since the last fetch, if any.
    pub sort: Option<SortOrder>,
    /// Contact awaiting delete confirmation.
    pub pending_delete: Option<ContactId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    Initial,
    Debounced,
    Immediate,
}

struct Inner {
    state: ListState,
    debouncer: Debouncer,
    dialog: ConfirmDialog,
}

struct Shared {
    api: Arc<dyn ContactApi>,
    surface: Surface,
    inner: Mutex<Inner>,
    updates: watch::Sender<ListState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// User intents are refused while a modal dialog owns the surface.
    fn accepts_input(&self) -> bool {
        let open = self.surface.is_interactive();
        if !open {
            debug!("ignoring list input while a dialog is open");
        }
        open
    }

    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.state.clone());
    }

    fn schedule(&self, inner: &mut Inner, fetch: Fetch) -> Ticket {
        let ticket = inner.debouncer.restart(fetch == Fetch::Debounced);
        let state = &mut inner.state;
        match fetch {
            Fetch::Initial => state.is_initial_loading = true,
            Fetch::Debounced => state.is_search_loading = true,
            Fetch::Immediate => state.is_search_loading = false,
        }
        state.is_fetching = true;
        self.publish(inner);
        ticket
    }

    async fn fetch(self: Arc<Self>, ticket: Ticket, term: String) {
        if !ticket.ready().await {
            debug!("search {term:?} superseded before it was sent");
            return;
        }
        let search = (!term.is_empty()).then_some(term.as_str());
        let result = self.api.list(search, ticket.token()).await;

        let mut inner = self.lock();
        // Only the latest ticket may touch the list.
        if ticket.is_cancelled() {
            debug!("dropping superseded results for {term:?}");
            return;
        }
        let state = &mut inner.state;
        match result {
            Ok(Outcome::Completed(contacts)) => {
                state.contacts = contacts;
                state.sort = None;
                state.error = None;
            }
            Ok(Outcome::Cancelled) => {}
            Err(err) => {
                warn!("listing contacts failed: {err}");
                state.contacts = Vec::new();
                state.sort = None;
                state.error = Some(err.to_string());
            }
        }
        state.is_initial_loading = false;
        state.is_search_loading = false;
        state.is_fetching = false;
        self.publish(&inner);
    }
}

/// Owns the contact list: loading, debounced search, local sort and
/// confirmed delete. Must be created inside a tokio runtime.
pub struct ContactList {
    shared: Arc<Shared>,
}

impl ContactList {
    /// Create the controller and start the initial, undebounced load.
    pub fn mount(api: Arc<dyn ContactApi>, debounce: Duration, surface: Surface) -> Self {
        let inner = Inner {
            state: ListState::default(),
            debouncer: Debouncer::new(debounce),
            dialog: ConfirmDialog::default(),
        };
        let (updates, _) = watch::channel(ListState::default());
        let list = Self { shared: Arc::new(Shared { api, surface, inner: Mutex::new(inner), updates }) };
        list.start(Fetch::Initial, String::new());
        list
    }

    fn start(&self, fetch: Fetch, term: String) {
        let ticket = {
            let mut inner = self.shared.lock();
            self.shared.schedule(&mut inner, fetch)
        };
        spawn_async(Arc::clone(&self.shared).fetch(ticket, term));
    }

    pub fn snapshot(&self) -> ListState {
        self.shared.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.shared.updates.subscribe()
    }

    /// Wait until no list request is pending and return the state at that point.
    pub async fn settled(&self) -> ListState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_fetching).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Supersede any pending search. A non-empty term is fetched after the
    /// debounce window; an empty one right away. Returns `false` while a
    /// dialog is open.
    pub fn set_search_term(&self, term: impl Into<String>) -> bool {
        if !self.shared.accepts_input() {
            return false;
        }
        let term = term.into();
        let fetch = if term.is_empty() { Fetch::Immediate } else { Fetch::Debounced };
        let ticket = {
            let mut inner = self.shared.lock();
            inner.state.search_term = term.clone();
            self.shared.schedule(&mut inner, fetch)
        };
        spawn_async(Arc::clone(&self.shared).fetch(ticket, term));
        true
    }

    /// Fetch the current search again without waiting.
    pub fn refresh(&self) -> bool {
        if !self.shared.accepts_input() {
            return false;
        }
        let term = self.shared.lock().state.search_term.clone();
        self.start(Fetch::Immediate, term);
        true
    }

    /// Replace the snapshot without fetching.
    pub fn set_contacts(&self, contacts: Vec<Contact>) {
        let mut inner = self.shared.lock();
        inner.state.contacts = contacts;
        inner.state.sort = None;
        self.shared.publish(&inner);
    }

    /// Order the snapshot by `field`. Sorting the same field again flips the direction.
    pub fn sort(&self, field: SortField) -> Option<SortOrder> {
        if !self.shared.accepts_input() {
            return None;
        }
        let mut inner = self.shared.lock();
        let direction = match inner.state.sort {
            Some(order) if order.field == field => order.direction.reversed(),
            _ => SortDirection::Ascending,
        };
        let mut contacts = inner.state.contacts.clone();
        contacts.sort_by(|a, b| {
            let ord = compare(field, a, b);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        let order = SortOrder { field, direction };
        inner.state.contacts = contacts;
        inner.state.sort = Some(order);
        self.shared.publish(&inner);
        Some(order)
    }

    /// Ask for confirmation before deleting `id`. Returns `false` if the
    /// contact is not in the list or a dialog is already open.
    pub fn request_delete(&self, id: &ContactId) -> bool {
        if !self.shared.accepts_input() {
            return false;
        }
        let mut inner = self.shared.lock();
        let Some(contact) = inner.state.contacts.iter().find(|c| &c.id == id) else {
            return false;
        };
        let prompt = Prompt {
            title: "Delete contact".into(),
            message: format!("Are you sure you want to delete {}?", contact.name),
        };
        inner.dialog.open(&self.shared.surface, prompt);
        inner.state.pending_delete = Some(id.clone());
        self.shared.publish(&inner);
        true
    }

    pub fn delete_prompt(&self) -> Option<Prompt> {
        self.shared.lock().dialog.prompt().cloned()
    }

    pub fn cancel_delete(&self) {
        let mut inner = self.shared.lock();
        inner.dialog.respond(Choice::Cancel, || (), || ());
        inner.state.pending_delete = None;
        self.shared.publish(&inner);
    }

    /// Delete the contact awaiting confirmation. `Ok(None)` if nothing was
    /// pending. On failure the list is left as it was. A list request still
    /// outstanding when the delete lands is replaced by a fresh one.
    pub async fn confirm_delete(&self) -> Result<Option<ContactId>, ApiError> {
        let id = {
            let mut inner = self.shared.lock();
            let pending = inner.state.pending_delete.take();
            let confirmed = inner.dialog.respond(Choice::Confirm, move || pending, || None).flatten();
            self.shared.publish(&inner);
            confirmed
        };
        let Some(id) = id else {
            return Ok(None);
        };

        let result = self.shared.api.delete(&id).await;
        let mut inner = self.shared.lock();
        match result {
            Ok(()) => {
                inner.state.contacts.retain(|c| c.id != id);
                // An older response may still carry the deleted contact.
                let refetch = if inner.state.is_fetching {
                    let term = inner.state.search_term.clone();
                    Some((self.shared.schedule(&mut inner, Fetch::Immediate), term))
                } else {
                    self.shared.publish(&inner);
                    None
                };
                drop(inner);
                if let Some((ticket, term)) = refetch {
                    debug!("re-issuing list for {term:?} after deleting {id}");
                    spawn_async(Arc::clone(&self.shared).fetch(ticket, term));
                }
                Ok(Some(id))
            }
            Err(err) => {
                warn!("deleting contact {id} failed: {err}");
                inner.state.error = Some(err.to_string());
                self.shared.publish(&inner);
                Err(err)
            }
        }
    }
}

impl Drop for ContactList {
    fn drop(&mut self) {
        self.shared.lock().debouncer.cancel();
    }
}

fn compare(field: SortField, a: &Contact, b: &Contact) -> Ordering {
    match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
    }
}
