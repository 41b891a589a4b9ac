use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::Rng;
use tracing::warn;

use farmpass_shared::constants::{BATCH_UNITS, PRODUCT_TYPES};
use farmpass_shared::ValidationError;

use super::required;
use crate::api::{Backend, BatchRequest, FarmSignup};
use crate::error::{CredentialError, Notice};
use crate::router::farmer::{FarmerEvent, FarmerRouter, FarmerView};
use crate::router::{noticed, Load, Transition};
use crate::wallet::FarmerCredential;

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    /// Typed-in key; empty means use the wallet generated in the form.
    pub private_key: String,
    pub farm_name: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchForm {
    pub batch_id: String,
    pub product_type: String,
    pub product_name: String,
    pub quantity: String,
    pub unit: String,
}

pub fn validate_registration(form: &RegistrationForm, farmer_address: &str) -> Result<FarmSignup, ValidationError> {
    Ok(FarmSignup {
        farmer_address: farmer_address.to_string(),
        farm_name: required("Farm name", &form.farm_name)?,
        location: required("Location", &form.location)?,
        description: form.description.trim().to_string(),
    })
}

pub fn validate_batch(form: &BatchForm, farmer_address: &str) -> Result<BatchRequest, ValidationError> {
    let batch_id = required("Batch ID", &form.batch_id)?;
    let product_type = required("Product type", &form.product_type)?;
    if !PRODUCT_TYPES.contains(&product_type.as_str()) {
        return Err(ValidationError::NotAllowed {
            field: "product type",
            value: product_type,
        });
    }
    let product_name = required("Product name", &form.product_name)?;

    let raw_quantity = form.quantity.trim();
    let quantity = match raw_quantity.parse::<u32>() {
        Ok(q) if q >= 1 => q,
        _ => return Err(ValidationError::InvalidQuantity(raw_quantity.to_string())),
    };

    let unit = required("Unit", &form.unit)?;
    if !BATCH_UNITS.contains(&unit.as_str()) {
        return Err(ValidationError::NotAllowed {
            field: "unit",
            value: unit,
        });
    }

    Ok(BatchRequest {
        farmer_address: farmer_address.to_string(),
        batch_id,
        product_type,
        product_name,
        quantity,
        unit,
    })
}

/// `{TYP}-{YYYYMMDD}-{XXXX}`: product-type prefix, date and four random
/// base-36 characters.
pub fn suggest_batch_id(product_type: &str, date: NaiveDate, rng: &mut impl Rng) -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let prefix: String = product_type.chars().take(3).collect::<String>().to_uppercase();
    let suffix: String = (0..4)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{}-{suffix}", date.format("%Y%m%d"))
}

pub struct FarmerPortal<B: Backend> {
    backend: Arc<B>,
    router: FarmerRouter,
}

impl<B: Backend> FarmerPortal<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            router: FarmerRouter::new(),
        }
    }

    pub fn router(&self) -> &FarmerRouter {
        &self.router
    }

    pub async fn sign_in(&mut self, private_key: &str) -> Transition {
        match FarmerCredential::from_hex(private_key) {
            Ok(credential) => {
                let transition = self.router.apply(FarmerEvent::SignedIn(credential));
                self.load_dashboard().await;
                transition
            }
            Err(e) => self.router.apply(FarmerEvent::SignInRejected(Notice::from(&e))),
        }
    }

    pub fn show_register(&mut self) -> Transition {
        self.router.apply(FarmerEvent::ShowRegister)
    }

    pub fn show_login(&mut self) -> Transition {
        self.router.apply(FarmerEvent::ShowLogin)
    }

    /// New wallet for the register form. Its key is available from
    /// `router().draft()` for the farmer to store once.
    pub fn generate_wallet(&mut self) -> Transition {
        self.router
            .apply(FarmerEvent::WalletGenerated(FarmerCredential::generate()))
    }

    pub async fn register(&mut self, form: &RegistrationForm) -> Transition {
        if !matches!(self.router.view(), FarmerView::Register { .. }) {
            return Transition::Ignored;
        }

        let credential = if form.private_key.trim().is_empty() {
            self.router
                .draft()
                .cloned()
                .ok_or(CredentialError::Missing)
        } else {
            FarmerCredential::from_hex(&form.private_key)
        };
        let credential = match credential {
            Ok(c) => c,
            Err(e) => return self.router.apply(FarmerEvent::RegisterRejected(Notice::from(&e))),
        };
        let signup = match validate_registration(form, &credential.address()) {
            Ok(s) => s,
            Err(e) => return self.router.apply(FarmerEvent::RegisterRejected(Notice::from(&e))),
        };

        match self.backend.register_farm(&signup).await {
            Ok(registration) => self.router.apply(FarmerEvent::Registered {
                credential,
                registration,
            }),
            Err(e) => {
                warn!(error = %e, "farm registration failed");
                self.router.apply(FarmerEvent::RegisterRejected(Notice::from(&e)))
            }
        }
    }

    pub async fn continue_to_dashboard(&mut self) -> Transition {
        let transition = self.router.apply(FarmerEvent::ContinueToDashboard);
        self.load_dashboard().await;
        transition
    }

    pub async fn refresh(&mut self) -> Transition {
        let transition = self.router.apply(FarmerEvent::Refresh);
        self.load_dashboard().await;
        transition
    }

    pub async fn create_batch(&mut self, form: &BatchForm) -> Transition {
        if !matches!(self.router.view(), FarmerView::Dashboard { .. }) {
            return Transition::Ignored;
        }
        let Some(address) = self.router.credential().map(FarmerCredential::address) else {
            return Transition::Ignored;
        };
        let request = match validate_batch(form, &address) {
            Ok(r) => r,
            Err(e) => return self.router.apply(FarmerEvent::BatchRejected(Notice::from(&e))),
        };

        match self.backend.create_batch(&request).await {
            Ok(created) => {
                let transition = self.router.apply(FarmerEvent::BatchCreated(created));
                self.load_dashboard().await;
                transition
            }
            Err(e) => {
                warn!(batch_id = %request.batch_id, error = %e, "batch creation failed");
                self.router.apply(FarmerEvent::BatchRejected(Notice::from(&e)))
            }
        }
    }

    /// Batch id suggestion for today.
    pub fn suggest_batch_id(&self, product_type: &str) -> String {
        suggest_batch_id(product_type, Utc::now().date_naive(), &mut rand::thread_rng())
    }

    pub fn dismiss_created(&mut self) -> Transition {
        self.router.apply(FarmerEvent::DismissCreated)
    }

    pub fn logout(&mut self) -> Transition {
        self.router.apply(FarmerEvent::Logout)
    }

    /// Fetch the dashboard if the view is waiting for one.
    async fn load_dashboard(&mut self) -> Transition {
        if !matches!(
            self.router.view(),
            FarmerView::Dashboard {
                dashboard: Load::Loading,
                ..
            }
        ) {
            return Transition::Ignored;
        }
        let Some(credential) = self.router.credential().cloned() else {
            return Transition::Ignored;
        };
        let seq = self.router.dashboard_seq();
        let result = noticed(self.backend.farmer_dashboard(&credential).await);
        self.router.apply(FarmerEvent::DashboardLoaded { seq, result })
    }
}
