//! HTTP client for the Tapestry content API
//!
//! Thin request construction over the remote contract: one inspection call
//! and four schema mutations. The client carries no retry or timeout policy
//! of its own; each call is a single attempt and the sync engine treats any
//! failure as one recoverable unit of work.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::Environment;
use crate::sync::{
    FieldChanges, RemoteContentType, RemoteField, ResolvedContentType, ResolvedField, SchemaRemote,
};

use super::models::{ContentTypePayload, FieldPayload, InspectResponse};

/// Client for one Tapestry environment
pub struct TapestryClient {
    http: reqwest::Client,
    environment: Environment,
}

impl TapestryClient {
    pub fn new(environment: Environment) -> Self {
        Self {
            http: reqwest::Client::new(),
            environment,
        }
    }

    /// The environment this client talks to
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.environment.base_url.trim_end_matches('/'), path)
    }
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("{what} failed with {status}: {body}");
    }
    response
        .json::<T>()
        .await
        .with_context(|| format!("{what} returned an unreadable body"))
}

async fn check_response(response: reqwest::Response, what: &str) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("{what} failed with {status}: {body}");
    }
    Ok(())
}

fn field_body(field: &ResolvedField) -> serde_json::Value {
    let mut body = json!({
        "slug": field.name,
        "type": field.field_type,
        "required": field.required,
        "is_label": field.is_label,
    });
    if let Some(options) = &field.options {
        body["options"] = json!(options);
    }
    if !field.reference_ids.is_empty() {
        body["meta"] = json!({ "reference_types": field.reference_ids });
    }
    if let Some(description) = &field.description {
        body["description"] = json!(description);
    }
    body
}

#[async_trait]
impl SchemaRemote for TapestryClient {
    async fn inspect(&self) -> Result<Vec<RemoteContentType>> {
        debug!("inspecting remote schema on '{}'", self.environment.name);
        let response = self
            .http
            .get(self.url("/content-types"))
            .query(&[("include", "fields")])
            .bearer_auth(&self.environment.api_key)
            .send()
            .await
            .context("inspection request failed")?;
        let parsed: InspectResponse = parse_response(response, "inspection").await?;
        Ok(parsed.into_observed())
    }

    async fn create_content_type(
        &self,
        content_type: &ResolvedContentType,
    ) -> Result<RemoteContentType> {
        debug!("creating content type '{}'", content_type.name);
        let mut body = json!({
            "name": content_type.display_name,
            "slug": content_type.name,
            "fields": content_type.fields.iter().map(field_body).collect::<Vec<_>>(),
        });
        if let Some(description) = &content_type.description {
            body["description"] = json!(description);
        }

        let response = self
            .http
            .post(self.url("/content-types"))
            .bearer_auth(&self.environment.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("create content type '{}' request failed", content_type.name))?;
        let created: ContentTypePayload =
            parse_response(response, "create content type").await?;
        Ok(created.into())
    }

    async fn create_field(
        &self,
        content_type_id: &str,
        field: &ResolvedField,
    ) -> Result<RemoteField> {
        debug!("creating field '{}' on content type {}", field.name, content_type_id);
        let path = format!("/content-types/{}/fields", urlencoding::encode(content_type_id));
        let response = self
            .http
            .post(self.url(&path))
            .bearer_auth(&self.environment.api_key)
            .json(&field_body(field))
            .send()
            .await
            .with_context(|| format!("create field '{}' request failed", field.name))?;
        let created: FieldPayload = parse_response(response, "create field").await?;
        Ok(created.into())
    }

    async fn update_field(&self, field_id: &str, changes: &FieldChanges) -> Result<RemoteField> {
        debug!("updating field {}", field_id);
        let path = format!("/fields/{}", urlencoding::encode(field_id));
        let response = self
            .http
            .patch(self.url(&path))
            .bearer_auth(&self.environment.api_key)
            .json(changes)
            .send()
            .await
            .with_context(|| format!("update field '{}' request failed", field_id))?;
        let updated: FieldPayload = parse_response(response, "update field").await?;
        Ok(updated.into())
    }

    async fn delete_field(&self, field_id: &str) -> Result<()> {
        debug!("deleting field {}", field_id);
        let path = format!("/fields/{}", urlencoding::encode(field_id));
        let response = self
            .http
            .delete(self.url(&path))
            .bearer_auth(&self.environment.api_key)
            .send()
            .await
            .with_context(|| format!("delete field '{}' request failed", field_id))?;
        check_response(response, "delete field").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TapestryClient {
        TapestryClient::new(Environment {
            name: "test".to_string(),
            base_url: server.uri(),
            api_key: "tap_test".to_string(),
        })
    }

    #[tokio::test]
    async fn test_inspect_parses_content_types() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/content-types"))
            .and(query_param("include", "fields"))
            .and(header("authorization", "Bearer tap_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content_types": [{
                    "id": "ct_1",
                    "slug": "post",
                    "fields": [
                        { "id": "fld_1", "slug": "title", "type": "text", "required": true }
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let observed = client_for(&server).inspect().await.unwrap();

        assert_eq!(observed.len(), 1);
        assert_eq!(observed[0].name, "post");
        assert_eq!(observed[0].fields["title"].field_type, FieldType::Text);
    }

    #[tokio::test]
    async fn test_inspect_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/content-types"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).inspect().await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("boom"));
    }

    #[tokio::test]
    async fn test_create_field_posts_to_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/content-types/ct_1/fields"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "fld_9",
                "slug": "summary",
                "type": "text"
            })))
            .mount(&server)
            .await;

        let field = ResolvedField {
            name: "summary".to_string(),
            field_type: FieldType::Text,
            required: false,
            is_label: false,
            options: None,
            reference_ids: Vec::new(),
            description: None,
        };
        let created = client_for(&server).create_field("ct_1", &field).await.unwrap();

        assert_eq!(created.id, "fld_9");
        assert_eq!(created.name, "summary");
    }

    #[tokio::test]
    async fn test_delete_field_hits_field_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/fields/fld_9"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server).delete_field("fld_9").await.unwrap();
    }
}
