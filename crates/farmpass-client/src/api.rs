//! Backend REST boundary.
//!
//! [`Backend`] is the port every portal is driven through; [`HttpBackend`]
//! is the reqwest adapter. Transport failures and HTTP status codes are
//! turned into [`ApiError`] here, and bodies are handed to the normalizing
//! adapters in `farmpass_shared::models`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use farmpass_shared::models::{
    Batch, BatchCreated, ClaimGrant, CreatedReceipt, FarmRegistration, FarmerDashboard,
    NearbyRestaurant, Receipt,
};
use farmpass_shared::normalize::{unwrap_list, Fields};
use farmpass_shared::{DecodeError, Session, SessionDomain};

use crate::error::ApiError;
use crate::wallet::FarmerCredential;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct CustomerSignup {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl std::fmt::Debug for CustomerSignup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerSignup")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSignup {
    pub email: String,
    pub password: String,
    pub restaurant_name: String,
    pub postcode: String,
}

impl std::fmt::Debug for RestaurantSignup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestaurantSignup")
            .field("email", &self.email)
            .field("restaurant_name", &self.restaurant_name)
            .field("postcode", &self.postcode)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub batch_id: String,
    pub restaurant_name: String,
    pub amount_paid: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmSignup {
    /// Only the derived address is sent; the key never leaves the process.
    pub farmer_address: String,
    pub farm_name: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub farmer_address: String,
    pub batch_id: String,
    pub product_type: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit: String,
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, domain: SessionDomain, credentials: &Credentials) -> Result<Session, ApiError>;

    async fn register_customer(&self, signup: &CustomerSignup) -> Result<Session, ApiError>;

    async fn register_restaurant(&self, signup: &RestaurantSignup) -> Result<Session, ApiError>;

    /// `GET /batch/{id}`, no auth.
    async fn batch(&self, batch_id: &str) -> Result<Batch, ApiError>;

    /// `GET /receipt/{id}`, no auth.
    async fn receipt(&self, receipt_id: &str) -> Result<Receipt, ApiError>;

    /// `POST /receipt/{id}/claim-badge`, bearer.
    async fn claim_badge(&self, receipt_id: &str, token: &str) -> Result<ClaimGrant, ApiError>;

    /// `GET /user/badges`, bearer. Raw entries; see [`crate::badges`].
    async fn user_badges(&self, token: &str) -> Result<Vec<Value>, ApiError>;

    /// `POST /unlock-badge`, bearer.
    async fn unlock_badge(&self, batch_id: &str, token: &str) -> Result<(), ApiError>;

    async fn same_farm_restaurants(
        &self,
        batch_id: &str,
        exclude: Option<&str>,
    ) -> Result<Vec<NearbyRestaurant>, ApiError>;

    async fn restaurant_batches(&self, token: &str) -> Result<Vec<Batch>, ApiError>;

    async fn create_receipt(&self, request: &ReceiptRequest, token: &str) -> Result<CreatedReceipt, ApiError>;

    async fn register_farm(&self, signup: &FarmSignup) -> Result<FarmRegistration, ApiError>;

    async fn create_batch(&self, request: &BatchRequest) -> Result<BatchCreated, ApiError>;

    /// The dashboard endpoint identifies the farmer by private key.
    async fn farmer_dashboard(&self, credential: &FarmerCredential) -> Result<FarmerDashboard, ApiError>;
}

// ---------------------------------------------------------------------------
// HTTP adapter
// ---------------------------------------------------------------------------

pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(api_base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(api_base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(api_base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let url = response.url().path().to_string();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(v) => v,
                Err(e) if status.is_success() => return Err(DecodeError::from(e).into()),
                Err(_) => Value::Null,
            }
        };

        if status.is_success() {
            debug!(%url, status = status.as_u16(), "backend call ok");
            return Ok(body);
        }

        let err = classify_status(status.as_u16(), &body);
        warn!(%url, status = status.as_u16(), error = %err, "backend call failed");
        Err(err)
    }

    async fn session(&self, domain: SessionDomain, request: RequestBuilder) -> Result<Session, ApiError> {
        let body = self.send(request).await?;
        Session::from_value(domain, body).ok_or(ApiError::Decode(DecodeError::MissingField("user/token")))
    }
}

/// Map a non-2xx status and its `{ "error": "..." }` body to an [`ApiError`].
pub(crate) fn classify_status(status: u16, body: &Value) -> ApiError {
    let message = ["error", "message"]
        .iter()
        .filter_map(|k| body.get(*k).and_then(Value::as_str))
        .find(|m| !m.is_empty())
        .map(str::to_string);

    match status {
        401 | 403 => ApiError::Unauthenticated { status, message },
        404 => ApiError::NotFound(message.unwrap_or_else(|| "Not found".to_string())),
        _ => ApiError::Rejected {
            status,
            message: message.unwrap_or_else(|| format!("Server responded with HTTP {status}")),
        },
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, domain: SessionDomain, credentials: &Credentials) -> Result<Session, ApiError> {
        let url = match domain {
            SessionDomain::Customer => self.endpoint(&["auth", "login"]),
            SessionDomain::Restaurant => self.endpoint(&["restaurant", "auth", "login"]),
        };
        self.session(domain, self.client.post(url).json(credentials)).await
    }

    async fn register_customer(&self, signup: &CustomerSignup) -> Result<Session, ApiError> {
        let url = self.endpoint(&["auth", "register"]);
        self.session(SessionDomain::Customer, self.client.post(url).json(signup))
            .await
    }

    async fn register_restaurant(&self, signup: &RestaurantSignup) -> Result<Session, ApiError> {
        let url = self.endpoint(&["restaurant", "auth", "register"]);
        self.session(SessionDomain::Restaurant, self.client.post(url).json(signup))
            .await
    }

    async fn batch(&self, batch_id: &str) -> Result<Batch, ApiError> {
        let body = self
            .send(self.client.get(self.endpoint(&["batch", batch_id])))
            .await?;
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(ApiError::NotFound(format!("Batch {batch_id}")));
        }
        Ok(Batch::from_backend(&body)?)
    }

    async fn receipt(&self, receipt_id: &str) -> Result<Receipt, ApiError> {
        let body = self
            .send(self.client.get(self.endpoint(&["receipt", receipt_id])))
            .await?;
        Ok(Receipt::from_backend(&body, receipt_id)?)
    }

    async fn claim_badge(&self, receipt_id: &str, token: &str) -> Result<ClaimGrant, ApiError> {
        let url = self.endpoint(&["receipt", receipt_id, "claim-badge"]);
        let body = self
            .send(self.client.post(url).bearer_auth(token).json(&json!({})))
            .await?;
        // A 2xx means the badge was issued; a body without details still counts.
        Ok(ClaimGrant::from_backend(&body).unwrap_or_default())
    }

    async fn user_badges(&self, token: &str) -> Result<Vec<Value>, ApiError> {
        let url = self.endpoint(&["user", "badges"]);
        let body = self.send(self.client.get(url).bearer_auth(token)).await?;
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return Ok(Vec::new());
        }
        Ok(unwrap_list(&body, &["badges", "data"]).to_vec())
    }

    async fn unlock_badge(&self, batch_id: &str, token: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["unlock-badge"]);
        self.send(
            self.client
                .post(url)
                .bearer_auth(token)
                .json(&json!({ "batchId": batch_id })),
        )
        .await?;
        Ok(())
    }

    async fn same_farm_restaurants(
        &self,
        batch_id: &str,
        exclude: Option<&str>,
    ) -> Result<Vec<NearbyRestaurant>, ApiError> {
        let mut request = self
            .client
            .get(self.endpoint(&["restaurants", "same-farm", batch_id]));
        if let Some(name) = exclude {
            request = request.query(&[("exclude", name)]);
        }
        let body = self.send(request).await?;
        Ok(unwrap_list(&body, &["restaurants"])
            .iter()
            .filter_map(|item| NearbyRestaurant::from_backend(item).ok())
            .collect())
    }

    async fn restaurant_batches(&self, token: &str) -> Result<Vec<Batch>, ApiError> {
        let url = self.endpoint(&["restaurant", "batches"]);
        let body = self.send(self.client.get(url).bearer_auth(token)).await?;
        Ok(unwrap_list(&body, &["batches", "data"])
            .iter()
            .filter_map(|item| match Batch::from_backend(item) {
                Ok(batch) => Some(batch),
                Err(e) => {
                    warn!(error = %e, "skipping malformed batch entry");
                    None
                }
            })
            .collect())
    }

    async fn create_receipt(&self, request: &ReceiptRequest, token: &str) -> Result<CreatedReceipt, ApiError> {
        let url = self.endpoint(&["restaurant", "create-receipt"]);
        let body = self
            .send(self.client.post(url).bearer_auth(token).json(request))
            .await?;
        Ok(CreatedReceipt::from_backend(
            &body,
            &request.batch_id,
            request.amount_paid,
        )?)
    }

    async fn register_farm(&self, signup: &FarmSignup) -> Result<FarmRegistration, ApiError> {
        let url = self.endpoint(&["farmer", "register"]);
        let body = self.send(self.client.post(url).json(signup)).await?;
        Ok(FarmRegistration::from_backend(
            &body,
            &signup.farm_name,
            &signup.farmer_address,
        )?)
    }

    async fn create_batch(&self, request: &BatchRequest) -> Result<BatchCreated, ApiError> {
        let url = self.endpoint(&["farmer", "create-batch"]);
        let body = self.send(self.client.post(url).json(request)).await?;
        let transaction_hash = Fields::new(&body)
            .ok()
            .and_then(|f| f.text(&["transactionHash", "transaction_hash"]));
        Ok(BatchCreated {
            batch_id: request.batch_id.clone(),
            product_name: request.product_name.clone(),
            transaction_hash,
        })
    }

    async fn farmer_dashboard(&self, credential: &FarmerCredential) -> Result<FarmerDashboard, ApiError> {
        let url = self.endpoint(&["farmer", "dashboard"]);
        let body = self
            .send(
                self.client
                    .post(url)
                    .json(&json!({ "privateKey": credential.private_key_hex() })),
            )
            .await?;
        Ok(FarmerDashboard::from_backend(&body)?)
    }
}
