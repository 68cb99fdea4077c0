//! REST client for the custom field and custom field set endpoints

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::reorder::PositionSetter;
use crate::types::{ApiError, CustomField, CustomFieldSet, FieldId, FieldSetId, ParentType};

const FIELD_ATTRIBUTES: &str =
    "id,name,parent_type,field_type,displayed,deleted,required,display_order";
const FIELD_SET_ATTRIBUTES: &str = "id,name,parent_type,displayed,custom_fields{id}";
const MAX_PAGES: usize = 100;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub access_token: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct NewField {
    pub name: String,
    pub parent_type: ParentType,
    pub field_type: String,
    pub displayed: bool,
    pub required: bool,
    pub display_order: Option<i64>,
}

/// Partial edit of a field. `None` leaves the attribute as it is upstream.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FieldUpdate {
    pub name: Option<String>,
    pub displayed: Option<bool>,
    pub required: Option<bool>,
}

impl FieldUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.displayed.is_none() && self.required.is_none()
    }

    fn payload(&self) -> Value {
        let mut data = Map::new();
        if let Some(name) = &self.name {
            data.insert("name".to_string(), json!(name));
        }
        if let Some(displayed) = self.displayed {
            data.insert("displayed".to_string(), json!(displayed));
        }
        if let Some(required) = self.required {
            data.insert("required".to_string(), json!(required));
        }
        json!({ "data": data })
    }
}

#[derive(Debug, Clone)]
pub struct NewFieldSet {
    pub name: String,
    pub parent_type: ParentType,
    pub displayed: bool,
    pub field_ids: Vec<FieldId>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    meta: Option<ListMeta>,
}

#[derive(Debug, Deserialize)]
struct ListMeta {
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::new("CLIENT_INIT_FAILED", err.to_string()))?;
        Ok(Self { http, config })
    }

    /// All fields of one scope in ascending display order, deleted ones included.
    pub async fn list_fields(&self, parent_type: ParentType) -> Result<Vec<CustomField>, ApiError> {
        let url = self.list_url(
            "/custom_fields.json",
            &[
                ("fields", FIELD_ATTRIBUTES),
                ("order", "display_order(asc)"),
                ("parent_type", parent_type.api_name()),
            ],
        )?;
        self.fetch_all(url, parent_type).await
    }

    pub async fn list_field_sets(
        &self,
        parent_type: ParentType,
    ) -> Result<Vec<CustomFieldSet>, ApiError> {
        let url = self.list_url(
            "/custom_field_sets.json",
            &[
                ("fields", FIELD_SET_ATTRIBUTES),
                ("parent_type", parent_type.api_name()),
            ],
        )?;
        self.fetch_all(url, parent_type).await
    }

    /// Creates a field. Without an explicit order the field goes last in its scope.
    pub async fn create_field(
        &self,
        field: &NewField,
        next_display_order: i64,
    ) -> Result<CustomField, ApiError> {
        let display_order = field.display_order.unwrap_or(next_display_order);
        let url = self.parse_url("/custom_fields.json", FIELD_ATTRIBUTES)?;
        let payload = json!({
            "data": {
                "name": field.name,
                "parent_type": field.parent_type.api_name(),
                "field_type": field.field_type,
                "displayed": field.displayed,
                "required": field.required,
                "display_order": display_order,
            }
        });

        let body = self.send(Method::POST, url, Some(payload)).await?;
        decode_data(body)
    }

    pub async fn update_field(
        &self,
        id: FieldId,
        update: &FieldUpdate,
    ) -> Result<CustomField, ApiError> {
        if update.is_empty() {
            return Err(ApiError::new("EMPTY_UPDATE", "nothing to update"));
        }
        let url = self.parse_url(&format!("/custom_fields/{id}.json"), FIELD_ATTRIBUTES)?;
        let body = self.send(Method::PATCH, url, Some(update.payload())).await?;
        decode_data(body)
    }

    pub async fn delete_field(&self, id: FieldId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/custom_fields/{id}.json"))?;
        self.send(Method::DELETE, url, None).await?;
        info!(field_id = %id, "custom field deleted");
        Ok(())
    }

    pub async fn create_field_set(&self, set: &NewFieldSet) -> Result<CustomFieldSet, ApiError> {
        let url = self.parse_url("/custom_field_sets.json", FIELD_SET_ATTRIBUTES)?;
        let members: Vec<Value> = set.field_ids.iter().map(|id| json!({ "id": id })).collect();
        let payload = json!({
            "data": {
                "name": set.name,
                "parent_type": set.parent_type.api_name(),
                "displayed": set.displayed,
                "custom_fields": members,
            }
        });

        let body = self.send(Method::POST, url, Some(payload)).await?;
        decode_data(body)
    }

    pub async fn rename_field_set(
        &self,
        id: FieldSetId,
        name: &str,
    ) -> Result<CustomFieldSet, ApiError> {
        let url = self.parse_url(&format!("/custom_field_sets/{id}.json"), FIELD_SET_ATTRIBUTES)?;
        let payload = json!({ "data": { "name": name } });
        let body = self.send(Method::PATCH, url, Some(payload)).await?;
        decode_data(body)
    }

    async fn fetch_all<T: DeserializeOwned>(
        &self,
        first: Url,
        parent_type: ParentType,
    ) -> Result<Vec<T>, ApiError> {
        let mut next = Some(first);
        let mut items = Vec::new();
        let mut pages = 0;
        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(ApiError::new(
                    "PAGING_LIMIT",
                    format!("{} listing exceeded {MAX_PAGES} pages", url.path()),
                ));
            }

            let body = self.send(Method::GET, url.clone(), None).await?;
            let page: ListResponse<T> = serde_json::from_value(body)
                .map_err(|err| ApiError::new("PROTOCOL_ERROR", err.to_string()))?;
            debug!(
                path = url.path(),
                parent_type = %parent_type,
                page = pages,
                count = page.data.len(),
                "fetched page"
            );
            items.extend(page.data);

            next = page
                .meta
                .and_then(|meta| meta.paging)
                .and_then(|paging| paging.next)
                .filter(|link| !link.trim().is_empty())
                .map(|link| {
                    Url::parse(&link).map_err(|err| ApiError::new("PROTOCOL_ERROR", err.to_string()))
                })
                .transpose()?;
        }

        Ok(items)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|err| ApiError::new("INVALID_URL", err.to_string()))
    }

    fn list_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    fn parse_url(&self, path: &str, fields: &str) -> Result<Url, ApiError> {
        self.list_url(path, &[("fields", fields)])
    }

    /// Sends one request. A successful response with an empty body yields `Value::Null`.
    async fn send(&self, method: Method, url: Url, payload: Option<Value>) -> Result<Value, ApiError> {
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(&self.config.access_token);
        if let Some(payload) = payload {
            request = request.json(&payload);
        }

        let response = request.send().await.map_err(|err| {
            let code = if err.is_timeout() {
                "REQUEST_TIMEOUT"
            } else {
                "REQUEST_FAILED"
            };
            ApiError::new(code, format!("{method} {} failed: {err}", url.path()))
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(status, &method, url.path(), detail.trim()));
        }

        let bytes = response.bytes().await.map_err(|err| {
            ApiError::new("REQUEST_FAILED", format!("{method} {} body: {err}", url.path()))
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new("PROTOCOL_ERROR", format!("invalid JSON body: {err}")))
    }
}

impl PositionSetter for ApiClient {
    async fn set_position(&self, id: FieldId, display_order: i64) -> Result<(), ApiError> {
        let url = self.parse_url(&format!("/custom_fields/{id}.json"), FIELD_ATTRIBUTES)?;
        let payload = json!({ "data": { "display_order": display_order } });

        let body = self.send(Method::PATCH, url, Some(payload)).await?;
        let updated: CustomField = decode_data(body)?;
        if updated.display_order != display_order {
            warn!(
                field_id = %id,
                requested = display_order,
                reported = updated.display_order,
                "server reported a different display order"
            );
        }
        Ok(())
    }
}

fn decode_data<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    let data = body
        .get("data")
        .filter(|data| data.is_object())
        .cloned()
        .ok_or_else(|| ApiError::new("PROTOCOL_ERROR", "response is missing a data object"))?;
    serde_json::from_value(data).map_err(|err| ApiError::new("PROTOCOL_ERROR", err.to_string()))
}

fn status_error(status: StatusCode, method: &Method, path: &str, detail: &str) -> ApiError {
    let code = match status {
        StatusCode::UNAUTHORIZED => "AUTH_ERROR",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::UNPROCESSABLE_ENTITY => "VALIDATION_ERROR",
        _ => "HTTP_ERROR",
    };
    let mut message = format!("{method} {path} returned HTTP {}", status.as_u16());
    if !detail.is_empty() {
        message.push_str(": ");
        message.push_str(detail);
    }
    ApiError::new(code, message)
}
