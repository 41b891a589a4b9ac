//! Scripted in-process backend shared by the client tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::Notify;

use farmpass_shared::models::{
    Batch, BatchCreated, ClaimGrant, CreatedReceipt, FarmRegistration, Farmer, FarmerDashboard,
    NearbyRestaurant, Receipt,
};
use farmpass_shared::{Session, SessionDomain};

use crate::api::{
    Backend, BatchRequest, Credentials, CustomerSignup, FarmSignup, ReceiptRequest, RestaurantSignup,
};
use crate::error::ApiError;
use crate::wallet::FarmerCredential;

pub(crate) const PASSWORD: &str = "secret";

pub(crate) fn receipt(id: &str, farm: &str) -> Receipt {
    Receipt {
        receipt_id: id.to_string(),
        restaurant_name: "The Green Table".to_string(),
        batch_id: "VEG-001".to_string(),
        farm_name: farm.to_string(),
        product_name: Some("Carrots".to_string()),
        amount_paid: Some(12.5),
        created_at: Some(Utc::now()),
        expires_at: Some(Utc::now() + Duration::days(7)),
        claimed: false,
    }
}

pub(crate) fn expired_receipt(id: &str) -> Receipt {
    Receipt {
        expires_at: Some(Utc::now() - Duration::days(1)),
        ..receipt(id, "Oak Hill")
    }
}

pub(crate) fn batch(id: &str, farm: &str) -> Batch {
    Batch {
        batch_id: id.to_string(),
        farmer: Farmer {
            name: farm.to_string(),
            location: "Cornwall".to_string(),
            description: Some("Family farm since 1952".to_string()),
            certifications: vec!["Organic".to_string()],
        },
        crop_type: Some("Vegetable".to_string()),
        product_name: Some("Mixed vegetables".to_string()),
        harvest_date: None,
        quantity: Some("50".to_string()),
    }
}

fn session(domain: SessionDomain, email: &str, extra: Value) -> Session {
    let mut user = json!({ "email": email });
    if let (Some(user), Some(extra)) = (user.as_object_mut(), extra.as_object()) {
        user.extend(extra.clone());
    }
    Session::from_value(domain, json!({ "user": user, "token": format!("tok-{email}") }))
        .expect("mock session")
}

pub(crate) fn customer_session(email: &str) -> Session {
    session(SessionDomain::Customer, email, json!({}))
}

pub(crate) fn restaurant_session(email: &str, restaurant: &str) -> Session {
    session(
        SessionDomain::Restaurant,
        email,
        json!({ "restaurantName": restaurant }),
    )
}

#[derive(Default)]
pub(crate) struct MockBackend {
    pub receipts: Mutex<HashMap<String, Receipt>>,
    pub batches: Mutex<HashMap<String, Batch>>,
    /// Popped per claim call; an empty queue grants the badge.
    pub claim_script: Mutex<VecDeque<Result<ClaimGrant, ApiError>>>,
    pub badges: Mutex<Vec<Value>>,
    pub nearby: Mutex<Vec<NearbyRestaurant>>,
    pub nearby_fails: AtomicBool,
    pub restaurant_batches: Mutex<Vec<Batch>>,
    pub dashboards: Mutex<HashMap<String, FarmerDashboard>>,
    /// Tokens answered with 401.
    pub revoked: Mutex<HashSet<String>>,
    pub claim_gate: Mutex<Option<Arc<Notify>>>,

    pub claim_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    pub badge_calls: AtomicUsize,
    pub nearby_calls: AtomicUsize,
    pub dashboard_calls: AtomicUsize,

    pub last_exclude: Mutex<Option<String>>,
    pub last_receipt_request: Mutex<Option<ReceiptRequest>>,
    pub last_farm_signup: Mutex<Option<FarmSignup>>,
    pub last_batch_request: Mutex<Option<BatchRequest>>,
    pub last_dashboard_key: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_receipt(self, receipt: Receipt) -> Self {
        self.receipts
            .lock()
            .unwrap()
            .insert(receipt.receipt_id.clone(), receipt);
        self
    }

    pub fn with_batch(self, batch: Batch) -> Self {
        self.batches
            .lock()
            .unwrap()
            .insert(batch.batch_id.clone(), batch);
        self
    }

    pub fn with_restaurant_batches(self, batches: Vec<Batch>) -> Self {
        *self.restaurant_batches.lock().unwrap() = batches;
        self
    }

    pub fn with_nearby(self, names: &[&str]) -> Self {
        *self.nearby.lock().unwrap() = names
            .iter()
            .map(|n| NearbyRestaurant {
                name: n.to_string(),
                postcode: None,
            })
            .collect();
        self
    }

    pub fn with_dashboard(self, address: &str, dashboard: FarmerDashboard) -> Self {
        self.dashboards
            .lock()
            .unwrap()
            .insert(address.to_string(), dashboard);
        self
    }

    pub fn script_claim(&self, result: Result<ClaimGrant, ApiError>) {
        self.claim_script.lock().unwrap().push_back(result);
    }

    pub fn revoke(&self, token: &str) {
        self.revoked.lock().unwrap().insert(token.to_string());
    }

    /// Hold every claim call until the returned handle is notified.
    pub fn gate_claims(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.claim_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check_token(&self, token: &str) -> Result<(), ApiError> {
        if self.revoked.lock().unwrap().contains(token) {
            return Err(ApiError::Unauthenticated {
                status: 401,
                message: Some("Invalid token".to_string()),
            });
        }
        Ok(())
    }

    fn check_password(password: &str) -> Result<(), ApiError> {
        if password != PASSWORD {
            return Err(ApiError::Unauthenticated {
                status: 401,
                message: Some("Invalid credentials".to_string()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn login(&self, domain: SessionDomain, credentials: &Credentials) -> Result<Session, ApiError> {
        Self::check_password(&credentials.password)?;
        Ok(match domain {
            SessionDomain::Customer => customer_session(&credentials.email),
            SessionDomain::Restaurant => restaurant_session(&credentials.email, "The Green Table"),
        })
    }

    async fn register_customer(&self, signup: &CustomerSignup) -> Result<Session, ApiError> {
        Ok(session(
            SessionDomain::Customer,
            &signup.email,
            json!({ "name": signup.name }),
        ))
    }

    async fn register_restaurant(&self, signup: &RestaurantSignup) -> Result<Session, ApiError> {
        Ok(restaurant_session(&signup.email, &signup.restaurant_name))
    }

    async fn batch(&self, batch_id: &str) -> Result<Batch, ApiError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.batches
            .lock()
            .unwrap()
            .get(batch_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))
    }

    async fn receipt(&self, receipt_id: &str) -> Result<Receipt, ApiError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        self.receipts
            .lock()
            .unwrap()
            .get(receipt_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Receipt not found".to_string()))
    }

    async fn claim_badge(&self, receipt_id: &str, token: &str) -> Result<ClaimGrant, ApiError> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.claim_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_token(token)?;

        let scripted = self.claim_script.lock().unwrap().pop_front();
        let result = match scripted {
            Some(result) => result,
            None => {
                let receipts = self.receipts.lock().unwrap();
                let r = receipts
                    .get(receipt_id)
                    .ok_or_else(|| ApiError::NotFound("Receipt not found".to_string()))?;
                if r.claimed {
                    return Err(ApiError::Rejected {
                        status: 400,
                        message: "Badge has already been claimed".to_string(),
                    });
                }
                Ok(ClaimGrant {
                    farm_name: Some(r.farm_name.clone()),
                    batch_id: Some(r.batch_id.clone()),
                    transaction_hash: Some("0xfeed".to_string()),
                })
            }
        };

        if let Ok(grant) = &result {
            if let Some(r) = self.receipts.lock().unwrap().get_mut(receipt_id) {
                r.claimed = true;
            }
            self.badges.lock().unwrap().push(json!({
                "farmName": grant.farm_name,
                "batchId": grant.batch_id,
                "unlockDate": Utc::now().to_rfc3339(),
            }));
        }
        result
    }

    async fn user_badges(&self, token: &str) -> Result<Vec<Value>, ApiError> {
        self.badge_calls.fetch_add(1, Ordering::SeqCst);
        self.check_token(token)?;
        Ok(self.badges.lock().unwrap().clone())
    }

    async fn unlock_badge(&self, _batch_id: &str, token: &str) -> Result<(), ApiError> {
        self.check_token(token)
    }

    async fn same_farm_restaurants(
        &self,
        _batch_id: &str,
        exclude: Option<&str>,
    ) -> Result<Vec<NearbyRestaurant>, ApiError> {
        self.nearby_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_exclude.lock().unwrap() = exclude.map(str::to_string);
        if self.nearby_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Network("connection reset".to_string()));
        }
        Ok(self
            .nearby
            .lock()
            .unwrap()
            .iter()
            .filter(|r| Some(r.name.as_str()) != exclude)
            .cloned()
            .collect())
    }

    async fn restaurant_batches(&self, token: &str) -> Result<Vec<Batch>, ApiError> {
        self.check_token(token)?;
        Ok(self.restaurant_batches.lock().unwrap().clone())
    }

    async fn create_receipt(&self, request: &ReceiptRequest, token: &str) -> Result<CreatedReceipt, ApiError> {
        self.check_token(token)?;
        *self.last_receipt_request.lock().unwrap() = Some(request.clone());
        Ok(CreatedReceipt {
            receipt_id: "RECEIPT-20260201-ABC123".to_string(),
            batch_id: request.batch_id.clone(),
            amount_paid: request.amount_paid,
            expires_at: Some(Utc::now() + Duration::days(7)),
        })
    }

    async fn register_farm(&self, signup: &FarmSignup) -> Result<FarmRegistration, ApiError> {
        *self.last_farm_signup.lock().unwrap() = Some(signup.clone());
        Ok(FarmRegistration {
            farm_name: signup.farm_name.clone(),
            farmer_address: signup.farmer_address.clone(),
            transaction_hash: Some("0xfa7".to_string()),
        })
    }

    async fn create_batch(&self, request: &BatchRequest) -> Result<BatchCreated, ApiError> {
        *self.last_batch_request.lock().unwrap() = Some(request.clone());
        Ok(BatchCreated {
            batch_id: request.batch_id.clone(),
            product_name: request.product_name.clone(),
            transaction_hash: Some("0xb47c".to_string()),
        })
    }

    async fn farmer_dashboard(&self, credential: &FarmerCredential) -> Result<FarmerDashboard, ApiError> {
        self.dashboard_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_dashboard_key.lock().unwrap() = Some(credential.private_key_hex());
        self.dashboards
            .lock()
            .unwrap()
            .get(&credential.address())
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Farmer not registered".to_string()))
    }
}
