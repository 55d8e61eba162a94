use log::warn;
use std::sync::Arc;
use tokio::sync::watch;

use crate::api::ContactApi;
use crate::api::models::{Contact, ContactDraft, ContactId, ContactPayload, Field};
use crate::ui::Route;
use crate::ui::confirm::{Choice, ConfirmDialog, Prompt, Surface};
use crate::validation::{FieldErrors, validate};

const FETCH_FAILED: &str = "Failed to fetch contact details";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub draft: ContactDraft,
    pub errors: FieldErrors,
    pub is_loading: bool,
    pub is_submitting: bool,
    pub api_error: Option<String>,
}

/// What happened to a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Validation failed; nothing was sent.
    Rejected,
    /// The server call failed; `api_error` holds the message.
    Failed,
    Saved { contact: Contact, next: Route },
}

/// Create/edit form for a single contact. With an id it edits that contact,
/// without one it creates a new contact.
pub struct ContactForm {
    api: Arc<dyn ContactApi>,
    id: Option<ContactId>,
    surface: Surface,
    dialog: ConfirmDialog,
    state: FormState,
    updates: watch::Sender<FormState>,
}

impl ContactForm {
    pub async fn open(api: Arc<dyn ContactApi>, id: Option<ContactId>, surface: Surface) -> Self {
        let (updates, _) = watch::channel(FormState::default());
        let mut form = Self {
            api,
            id,
            surface,
            dialog: ConfirmDialog::default(),
            state: FormState::default(),
            updates,
        };
        if form.id.is_some() {
            form.load().await;
        }
        form
    }

    async fn load(&mut self) {
        let Some(id) = self.id.clone() else {
            return;
        };
        self.state.is_loading = true;
        self.state.api_error = None;
        self.publish();

        match self.api.get(&id).await {
            Ok(contact) => self.state.draft = ContactDraft::from(&contact),
            Err(err) => {
                warn!("loading contact {id} failed: {err}");
                self.state.api_error = Some(FETCH_FAILED.to_string());
            }
        }
        self.state.is_loading = false;
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.state.clone());
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.updates.subscribe()
    }

    /// Change one field. Clears that field's error and any API error.
    pub fn edit(&mut self, field: Field, value: impl Into<String>) {
        self.state.draft.set(field, value.into());
        self.state.errors.remove(&field);
        self.state.api_error = None;
        self.publish();
    }

    pub async fn submit(&mut self) -> Submission {
        let validation = validate(&self.state.draft);
        if !validation.is_valid() {
            self.state.errors = validation.into_errors();
            self.publish();
            return Submission::Rejected;
        }

        let payload = ContactPayload::from(&self.state.draft);
        self.state.errors.clear();
        self.state.api_error = None;
        self.state.is_submitting = true;
        self.publish();

        let result = match &self.id {
            Some(id) => self.api.update(id, &payload).await,
            None => self.api.create(&payload).await,
        };

        self.state.is_submitting = false;
        let submission = match result {
            Ok(contact) => Submission::Saved { contact, next: Route::List },
            Err(err) => {
                warn!("saving contact failed: {err}");
                self.state.api_error = Some(err.to_string());
                Submission::Failed
            }
        };
        self.publish();
        submission
    }

    /// Open the delete confirmation. Only an existing contact can be deleted.
    pub fn request_delete(&mut self) -> bool {
        if self.id.is_none() {
            return false;
        }
        let name = self.state.draft.name.trim();
        let message = if name.is_empty() {
            "Are you sure you want to delete this contact?".to_string()
        } else {
            format!("Are you sure you want to delete {name}?")
        };
        self.dialog.open(&self.surface, Prompt { title: "Delete contact".into(), message });
        true
    }

    pub fn delete_prompt(&self) -> Option<&Prompt> {
        self.dialog.prompt()
    }

    pub fn cancel_delete(&mut self) {
        self.dialog.respond(Choice::Cancel, || (), || ());
    }

    /// Delete after confirmation. `Some(Route::List)` once the contact is gone.
    pub async fn confirm_delete(&mut self) -> Option<Route> {
        let confirmed = self.dialog.respond(Choice::Confirm, || true, || false).unwrap_or(false);
        let id = self.id.clone().filter(|_| confirmed)?;

        self.state.is_submitting = true;
        self.state.api_error = None;
        self.publish();
        let result = self.api.delete(&id).await;
        self.state.is_submitting = false;

        let next = match result {
            Ok(()) => Some(Route::List),
            Err(err) => {
                warn!("deleting contact {id} failed: {err}");
                self.state.api_error = Some(err.to_string());
                None
            }
        };
        self.publish();
        next
    }

    /// Leave the form, dropping the draft.
    pub fn cancel(self) -> Route {
        Route::List
    }
}
