use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::api::error::{ApiError, Operation};
use crate::api::models::{Contact, ContactId, ContactPayload, DataEnvelope, MaybeEnveloped};
use crate::api::{ContactApi, Outcome};
use crate::app::ConfigError;

/// Where the contacts resource lives and how long a request may take.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Option<Duration>,
}

/// HTTP implementation of [`ContactApi`] rooted at a single resource URL,
/// e.g. `http://localhost:8080/contacts`.
#[derive(Debug, Clone)]
pub struct ContactClient {
    http: HttpClient,
    base: Url,
}

impl ContactClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiUrl {
                url: config.base_url.to_string(),
                reason: "URL cannot have path segments".into(),
            });
        }
        let mut builder = HttpClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { http: builder.build()?, base: config.base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn list_url(&self, search: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Some(term) = search.filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("search", term);
        }
        url
    }

    fn item_url(&self, id: &ContactId) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id.as_str());
        }
        url
    }

    async fn send(op: Operation, request: reqwest::RequestBuilder) -> Result<Response, ApiError> {
        let resp = request.send().await.map_err(|e| ApiError::transport(op, e))?;
        if !resp.status().is_success() {
            return Err(ApiError::status(op, resp.status()));
        }
        Ok(resp)
    }

    async fn read_json<T: DeserializeOwned>(op: Operation, resp: Response) -> Result<T, ApiError> {
        resp.json::<T>().await.map_err(|e| ApiError::transport(op, e))
    }

    async fn fetch_list(&self, url: Url) -> Result<Vec<Contact>, ApiError> {
        let resp = Self::send(Operation::List, self.http.get(url)).await?;
        let body: DataEnvelope<Vec<Contact>> = Self::read_json(Operation::List, resp).await?;
        Ok(body.data)
    }
}

#[async_trait]
impl ContactApi for ContactClient {
    async fn list(
        &self,
        search: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<Outcome<Vec<Contact>>, ApiError> {
        let url = self.list_url(search);
        debug!("GET {url}");
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("list request for {search:?} aborted");
                Ok(Outcome::Cancelled)
            }
            result = self.fetch_list(url) => result.map(Outcome::Completed),
        }
    }

    async fn get(&self, id: &ContactId) -> Result<Contact, ApiError> {
        let url = self.item_url(id);
        debug!("GET {url}");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::transport(Operation::Get, e))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound { operation: Operation::Get, id: id.clone() }),
            status if !status.is_success() => Err(ApiError::status(Operation::Get, status)),
            _ => {
                let body: DataEnvelope<Contact> = Self::read_json(Operation::Get, resp).await?;
                Ok(body.data)
            }
        }
    }

    async fn create(&self, payload: &ContactPayload) -> Result<Contact, ApiError> {
        debug!("POST {}", self.base);
        let resp = Self::send(Operation::Create, self.http.post(self.base.clone()).json(payload)).await?;
        let body: MaybeEnveloped<Contact> = Self::read_json(Operation::Create, resp).await?;
        Ok(body.into_inner())
    }

    async fn update(&self, id: &ContactId, payload: &ContactPayload) -> Result<Contact, ApiError> {
        let url = self.item_url(id);
        debug!("PUT {url}");
        let resp = Self::send(Operation::Update, self.http.put(url).json(payload)).await?;
        let body: MaybeEnveloped<Contact> = Self::read_json(Operation::Update, resp).await?;
        Ok(body.into_inner())
    }

    async fn delete(&self, id: &ContactId) -> Result<(), ApiError> {
        let url = self.item_url(id);
        debug!("DELETE {url}");
        Self::send(Operation::Delete, self.http.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> ContactClient {
        ContactClient::new(ClientConfig {
            base_url: Url::parse(&server.url("/contacts")).unwrap(),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap()
    }

    fn ann() -> serde_json::Value {
        json!({"id": "1", "name": "Ann Lee", "email": "ann@x.com", "phone": "123-456-7890", "createdAt": "2024-05-01T10:00:00Z"})
    }

    #[test]
    fn list_url_encodes_search_and_skips_empty_term() {
        let client = ContactClient::new(ClientConfig {
            base_url: Url::parse("http://localhost:8080/contacts").unwrap(),
            timeout: None,
        })
        .unwrap();
        assert_eq!(client.list_url(None).as_str(), "http://localhost:8080/contacts");
        assert_eq!(client.list_url(Some("")).as_str(), "http://localhost:8080/contacts");
        assert_eq!(
            client.list_url(Some("ann lee&co")).as_str(),
            "http://localhost:8080/contacts?search=ann+lee%26co"
        );
        assert_eq!(
            client.item_url(&ContactId::new("a/b")).as_str(),
            "http://localhost:8080/contacts/a%2Fb"
        );
    }

    #[test]
    fn item_url_handles_trailing_slash_in_base() {
        let client = ContactClient::new(ClientConfig {
            base_url: Url::parse("http://localhost:8080/contacts/").unwrap(),
            timeout: None,
        })
        .unwrap();
        assert_eq!(client.item_url(&ContactId::new("5")).as_str(), "http://localhost:8080/contacts/5");
    }

    #[test]
    fn rejects_base_url_without_path() {
        let result = ContactClient::new(ClientConfig {
            base_url: Url::parse("mailto:someone@example.com").unwrap(),
            timeout: None,
        });
        assert!(matches!(result, Err(ConfigError::InvalidApiUrl { .. })));
    }

    #[tokio::test]
    async fn list_reads_data_envelope() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/contacts");
            then.status(200).json_body(json!({"data": [ann()]}));
        });

        let outcome = client_for(&server).list(None, CancellationToken::new()).await.unwrap();

        mock.assert();
        let Outcome::Completed(contacts) = outcome else { panic!("list was not cancelled") };
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Ann Lee");
        assert_eq!(contacts[0].created_at, Some(json!("2024-05-01T10:00:00Z")));
    }

    #[tokio::test]
    async fn list_passes_search_term_as_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/contacts").query_param("search", "ann");
            then.status(200).json_body(json!({"data": [ann()]}));
        });

        let outcome = client_for(&server).list(Some("ann"), CancellationToken::new()).await.unwrap();

        mock.assert();
        assert!(matches!(outcome, Outcome::Completed(contacts) if contacts.len() == 1));
    }

    #[tokio::test]
    async fn list_failure_is_a_remote_error() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/contacts");
            then.status(500);
        });

        let err = client_for(&server).list(None, CancellationToken::new()).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch contacts");
        assert!(matches!(err, ApiError::Remote { status: Some(StatusCode::INTERNAL_SERVER_ERROR), .. }));
    }

    #[tokio::test]
    async fn list_with_malformed_body_is_a_remote_error() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/contacts");
            then.status(200).json_body(json!([ann()]));
        });

        let err = client_for(&server).list(None, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.operation(), Operation::List);
    }

    #[tokio::test]
    async fn cancelled_list_is_not_an_error() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/contacts");
            then.status(200).delay(Duration::from_secs(3)).json_body(json!({"data": []}));
        });
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let outcome = client_for(&server).list(None, cancel).await.unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn timeout_is_a_remote_error_not_a_cancellation() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/contacts");
            then.status(200).delay(Duration::from_secs(3)).json_body(json!({"data": []}));
        });
        let client = ContactClient::new(ClientConfig {
            base_url: Url::parse(&server.url("/contacts")).unwrap(),
            timeout: Some(Duration::from_millis(100)),
        })
        .unwrap();

        let err = client.list(None, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Remote { source: Some(_), .. }));
    }

    #[tokio::test]
    async fn get_reads_data_envelope() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/contacts/1");
            then.status(200).json_body(json!({"data": ann()}));
        });

        let contact = client_for(&server).get(&ContactId::new("1")).await.unwrap();

        mock.assert();
        assert_eq!(contact.email, "ann@x.com");
        assert_eq!(contact.phone.as_deref(), Some("123-456-7890"));
    }

    #[tokio::test]
    async fn get_missing_contact_is_not_found() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/contacts/404");
            then.status(404);
        });

        let err = client_for(&server).get(&ContactId::new("404")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { ref id, .. } if id.as_str() == "404"));
    }

    #[tokio::test]
    async fn create_posts_payload_without_blank_phone() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/contacts")
                .json_body(json!({"name": "John Doe", "email": "j@x.com"}));
            then.status(201)
                .json_body(json!({"id": 17, "name": "John Doe", "email": "j@x.com", "createdAt": "2024-05-01"}));
        });
        let payload = ContactPayload { name: "John Doe".into(), email: "j@x.com".into(), phone: None };

        let created = client_for(&server).create(&payload).await.unwrap();

        mock.assert();
        assert_eq!(created.id, ContactId::new("17"));
    }

    #[tokio::test]
    async fn create_accepts_wrapped_response() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST).path("/contacts");
            then.status(201).json_body(json!({"data": ann()}));
        });
        let payload = ContactPayload { name: "Ann Lee".into(), email: "ann@x.com".into(), phone: None };

        let created = client_for(&server).create(&payload).await.unwrap();
        assert_eq!(created.id, ContactId::new("1"));
    }

    #[tokio::test]
    async fn update_puts_to_item_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT).path("/contacts/1").json_body(
                json!({"name": "Ann Lee", "email": "ann@x.com", "phone": "123-456-7890"}),
            );
            then.status(200).json_body(ann());
        });
        let payload = ContactPayload {
            name: "Ann Lee".into(),
            email: "ann@x.com".into(),
            phone: Some("123-456-7890".into()),
        };

        let updated = client_for(&server).update(&ContactId::new("1"), &payload).await.unwrap();

        mock.assert();
        assert_eq!(updated.name, "Ann Lee");
    }

    #[tokio::test]
    async fn update_failure_carries_operation_message() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(PUT).path("/contacts/1");
            then.status(422);
        });
        let payload = ContactPayload { name: "Ann Lee".into(), email: "ann@x.com".into(), phone: None };

        let err = client_for(&server).update(&ContactId::new("1"), &payload).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to update contact");
    }

    #[tokio::test]
    async fn delete_ignores_response_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/contacts/1");
            then.status(200).body("deleted");
        });

        client_for(&server).delete(&ContactId::new("1")).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn delete_failure_is_a_remote_error() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(DELETE).path("/contacts/1");
            then.status(503);
        });

        let err = client_for(&server).delete(&ContactId::new("1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to delete contact");
    }
}
