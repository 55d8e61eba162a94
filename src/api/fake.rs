//! In-memory `ContactApi` for controller tests.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::api::error::{ApiError, Operation};
use crate::api::models::{Contact, ContactId, ContactPayload};
use crate::api::{ContactApi, Outcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List(Option<String>),
    Get(ContactId),
    Create(ContactPayload),
    Update(ContactId, ContactPayload),
    Delete(ContactId),
}

#[derive(Default)]
struct Store {
    contacts: Vec<Contact>,
    next_id: u64,
    latency: HashMap<String, Duration>,
    write_latency: Duration,
    failing: HashSet<Operation>,
    ignore_cancel: bool,
    calls: Vec<Call>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    store: Mutex<Store>,
}

pub(crate) fn contact(id: &str, name: &str, email: &str, phone: Option<&str>) -> Contact {
    Contact {
        id: ContactId::new(id),
        name: name.into(),
        email: email.into(),
        phone: phone.map(str::to_string),
        created_at: Some("2024-05-01T10:00:00Z".into()),
    }
}

impl FakeApi {
    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        let api = Self::default();
        {
            let mut store = api.store();
            store.next_id = 100;
            store.contacts = contacts;
        }
        api
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    /// Latency of `list` for a given term; the empty string covers unfiltered lists.
    pub fn set_latency(&self, term: &str, latency: Duration) {
        self.store().latency.insert(term.to_string(), latency);
    }

    pub fn set_write_latency(&self, latency: Duration) {
        self.store().write_latency = latency;
    }

    /// Keep answering `list` after the token fires, like a server that
    /// responds before the abort reaches it.
    pub fn ignore_cancellation(&self) {
        self.store().ignore_cancel = true;
    }

    pub fn fail(&self, op: Operation) {
        self.store().failing.insert(op);
    }

    pub fn recover(&self, op: Operation) {
        self.store().failing.remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.store().calls.clone()
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.store().contacts.clone()
    }

    fn check(store: &Store, op: Operation) -> Result<(), ApiError> {
        if store.failing.contains(&op) {
            return Err(ApiError::status(op, StatusCode::INTERNAL_SERVER_ERROR));
        }
        Ok(())
    }
}

#[async_trait]
impl ContactApi for FakeApi {
    async fn list(
        &self,
        search: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<Outcome<Vec<Contact>>, ApiError> {
        let (latency, ignore_cancel, result) = {
            let mut store = self.store();
            store.calls.push(Call::List(search.map(str::to_string)));
            let term = search.unwrap_or_default().to_lowercase();
            let latency = store.latency.get(&term).copied().unwrap_or_default();
            let result = Self::check(&store, Operation::List).map(|()| {
                store
                    .contacts
                    .iter()
                    .filter(|c| {
                        c.name.to_lowercase().contains(&term) || c.email.to_lowercase().contains(&term)
                    })
                    .cloned()
                    .collect::<Vec<_>>()
            });
            (latency, store.ignore_cancel, result)
        };

        if ignore_cancel {
            tokio::time::sleep(latency).await;
        } else {
            tokio::select! {
                () = cancel.cancelled() => return Ok(Outcome::Cancelled),
                () = tokio::time::sleep(latency) => {}
            }
        }
        result.map(Outcome::Completed)
    }

    async fn get(&self, id: &ContactId) -> Result<Contact, ApiError> {
        let mut store = self.store();
        store.calls.push(Call::Get(id.clone()));
        Self::check(&store, Operation::Get)?;
        store
            .contacts
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound { operation: Operation::Get, id: id.clone() })
    }

    async fn create(&self, payload: &ContactPayload) -> Result<Contact, ApiError> {
        let latency = {
            let mut store = self.store();
            store.calls.push(Call::Create(payload.clone()));
            store.write_latency
        };
        tokio::time::sleep(latency).await;

        let mut store = self.store();
        Self::check(&store, Operation::Create)?;
        store.next_id += 1;
        let created = Contact {
            id: ContactId::new(store.next_id.to_string()),
            name: payload.name.clone(),
            email: payload.email.clone(),
            phone: payload.phone.clone(),
            created_at: Some("2024-06-01T00:00:00Z".into()),
        };
        store.contacts.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &ContactId, payload: &ContactPayload) -> Result<Contact, ApiError> {
        let mut store = self.store();
        store.calls.push(Call::Update(id.clone(), payload.clone()));
        Self::check(&store, Operation::Update)?;
        let existing = store
            .contacts
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ApiError::NotFound { operation: Operation::Update, id: id.clone() })?;
        existing.name = payload.name.clone();
        existing.email = payload.email.clone();
        existing.phone = payload.phone.clone();
        Ok(existing.clone())
    }

    async fn delete(&self, id: &ContactId) -> Result<(), ApiError> {
        let mut store = self.store();
        store.calls.push(Call::Delete(id.clone()));
        Self::check(&store, Operation::Delete)?;
        store.contacts.retain(|c| &c.id != id);
        Ok(())
    }
}
