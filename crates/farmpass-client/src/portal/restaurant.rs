use std::sync::Arc;

use tracing::warn;

use farmpass_shared::constants::FALLBACK_RESTAURANT_NAME;
use farmpass_shared::models::Batch;
use farmpass_shared::{SessionDomain, ValidationError};
use farmpass_store::SessionStore;

use super::{auth_notice, check_password, required};
use crate::api::{Backend, Credentials, ReceiptRequest, RestaurantSignup};
use crate::error::Notice;
use crate::router::restaurant::{RestaurantEvent, RestaurantRouter, RestaurantView};
use crate::router::{noticed, Load, Transition};

#[derive(Debug, Clone, Default)]
pub struct RestaurantRegistration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub restaurant_name: String,
    pub postcode: String,
}

pub fn validate_registration(form: &RestaurantRegistration) -> Result<RestaurantSignup, ValidationError> {
    let email = required("Email", &form.email)?;
    check_password(&form.password, &form.confirm_password)?;
    Ok(RestaurantSignup {
        email,
        password: form.password.clone(),
        restaurant_name: required("Restaurant name", &form.restaurant_name)?,
        postcode: required("Postcode", &form.postcode)?,
    })
}

/// `restaurant_name` comes from the signed-in account, never from the form.
pub fn validate_receipt(
    batch_id: &str,
    amount: &str,
    available: &[Batch],
    restaurant_name: &str,
) -> Result<ReceiptRequest, ValidationError> {
    let batch_id = required("Batch", batch_id)?;
    if !available.iter().any(|b| b.batch_id == batch_id) {
        return Err(ValidationError::UnknownBatch);
    }
    let raw_amount = amount.trim();
    let amount_paid = match raw_amount.parse::<f64>() {
        Ok(a) if a.is_finite() && a > 0.0 => a,
        _ => return Err(ValidationError::InvalidAmount(raw_amount.to_string())),
    };
    Ok(ReceiptRequest {
        batch_id,
        restaurant_name: restaurant_name.to_string(),
        amount_paid,
    })
}

pub struct RestaurantPortal<B: Backend, S: SessionStore> {
    backend: Arc<B>,
    store: S,
    router: RestaurantRouter,
}

impl<B: Backend, S: SessionStore> RestaurantPortal<B, S> {
    /// Restores any stored restaurant session. Call [`Self::load_batches`]
    /// afterwards when it opened the receipt form.
    pub fn new(backend: Arc<B>, store: S) -> Self {
        let session = store.load(SessionDomain::Restaurant);
        tracing::info!(restored = session.is_some(), "restaurant portal ready");
        Self {
            backend,
            store,
            router: RestaurantRouter::new(session),
        }
    }

    pub fn router(&self) -> &RestaurantRouter {
        &self.router
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn switch_auth_form(&mut self) -> Transition {
        self.apply(RestaurantEvent::SwitchAuthForm)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Transition {
        if self.router.session().is_some() {
            return Transition::Ignored;
        }
        let credentials = match required("Email", email).and_then(|email| {
            required("Password", password).map(|_| Credentials {
                email,
                password: password.to_string(),
            })
        }) {
            Ok(c) => c,
            Err(e) => return self.apply(RestaurantEvent::AuthFailed(Notice::from(&e))),
        };

        let event = match self.backend.login(SessionDomain::Restaurant, &credentials).await {
            Ok(session) => RestaurantEvent::Authenticated(session),
            Err(e) => RestaurantEvent::AuthFailed(auth_notice(&e)),
        };
        let transition = self.apply(event);
        self.load_batches().await;
        transition
    }

    pub async fn register(&mut self, form: &RestaurantRegistration) -> Transition {
        if self.router.session().is_some() {
            return Transition::Ignored;
        }
        let signup = match validate_registration(form) {
            Ok(s) => s,
            Err(e) => return self.apply(RestaurantEvent::AuthFailed(Notice::from(&e))),
        };
        let event = match self.backend.register_restaurant(&signup).await {
            Ok(session) => RestaurantEvent::Authenticated(session),
            Err(e) => RestaurantEvent::AuthFailed(auth_notice(&e)),
        };
        let transition = self.apply(event);
        self.load_batches().await;
        transition
    }

    /// Fetch the batch list if the form is waiting for it.
    pub async fn load_batches(&mut self) -> Transition {
        let waiting = matches!(
            self.router.view(),
            RestaurantView::ReceiptForm {
                batches: Load::Loading,
                ..
            }
        );
        let Some(token) = self.router.token().filter(|_| waiting).map(str::to_string) else {
            return Transition::Ignored;
        };
        let seq = self.router.batches_seq();
        let result = noticed(self.backend.restaurant_batches(&token).await);
        self.apply(RestaurantEvent::BatchesLoaded { seq, result })
    }

    pub async fn create_receipt(&mut self, batch_id: &str, amount: &str) -> Transition {
        let (Some(token), Some(available)) = (
            self.router.token().map(str::to_string),
            self.router.available_batches(),
        ) else {
            return Transition::Ignored;
        };
        let restaurant_name = self
            .router
            .restaurant_name()
            .unwrap_or(FALLBACK_RESTAURANT_NAME);

        let request = match validate_receipt(batch_id, amount, available, restaurant_name) {
            Ok(r) => r,
            Err(e) => return self.apply(RestaurantEvent::SubmitFailed(Notice::from(&e))),
        };
        if self.apply(RestaurantEvent::Submitting) != Transition::Applied {
            return Transition::Ignored;
        }

        let event = match self.backend.create_receipt(&request, &token).await {
            Ok(receipt) => RestaurantEvent::ReceiptCreated(receipt),
            Err(e) => {
                warn!(batch_id = %request.batch_id, error = %e, "receipt creation failed");
                RestaurantEvent::SubmitFailed(Notice::from(&e))
            }
        };
        self.apply(event)
    }

    pub async fn create_another(&mut self) -> Transition {
        let transition = self.apply(RestaurantEvent::CreateAnother);
        self.load_batches().await;
        transition
    }

    pub fn logout(&mut self) -> Transition {
        self.apply(RestaurantEvent::Logout)
    }

    fn apply(&mut self, event: RestaurantEvent) -> Transition {
        let signed_in = match &event {
            RestaurantEvent::Authenticated(session) => Some(session.clone()),
            _ => None,
        };
        let had_session = self.router.session().is_some();

        let transition = self.router.apply(event);

        if transition == Transition::Applied {
            if let Some(session) = signed_in {
                if let Err(e) = self.store.save(&session) {
                    warn!(error = %e, "failed to persist restaurant session");
                }
            } else if had_session && self.router.session().is_none() {
                if let Err(e) = self.store.clear(SessionDomain::Restaurant) {
                    warn!(error = %e, "failed to clear restaurant session");
                }
            }
        }
        transition
    }
}
