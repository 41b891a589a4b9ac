//! Customer portal driver.
//!
//! One user action is handled in three steps. [`CustomerPortal::dispatch`]
//! updates the router synchronously and says which backend call the new
//! state needs. [`CustomerPortal::perform`] makes that call and turns the
//! outcome into an event tagged with the id it was for.
//! [`CustomerPortal::deliver`] applies the event, dropping stale ones, and
//! keeps the persisted session in step with the router.
//!
//! An attached camera runs only while the view is scanning; any transition
//! out of it releases the camera.

use std::sync::Arc;

use tracing::{debug, info, warn};

use farmpass_shared::{Session, SessionDomain, ValidationError};
use farmpass_store::SessionStore;

use super::{auth_notice, required, same_farm};
use crate::api::{Backend, Credentials, CustomerSignup};
use crate::badges::aggregate;
use crate::claim::{ClaimCoordinator, ClaimResult};
use crate::error::{CameraError, Notice};
use crate::router::customer::{CustomerEvent, CustomerRouter, CustomerView};
use crate::router::{noticed, Transition};
use crate::scanner::{manual_entry, Camera, Scanner};

#[derive(Debug, Clone)]
pub enum CustomerAction {
    Login { email: String, password: String },
    Register { email: String, password: String, name: String },
    SwitchAuthForm,
    /// A decoded or typed code.
    Scan(String),
    Claim,
    ShowBadges,
    LeaveBadges,
    ScanAnother,
    DismissOverlay,
    Logout,
}

#[derive(Debug, Clone)]
pub enum CustomerRequest {
    Login(Credentials),
    Register(CustomerSignup),
    Batch { batch_id: String },
    Receipt { receipt_id: String },
    Claim { receipt_id: String, token: String },
    Badges { seq: u64, token: String },
}

pub struct CustomerPortal<B: Backend, S: SessionStore> {
    backend: Arc<B>,
    store: S,
    claims: ClaimCoordinator<B>,
    router: CustomerRouter,
    scanner: Option<Scanner<Box<dyn Camera>>>,
}

impl<B: Backend, S: SessionStore> CustomerPortal<B, S> {
    pub fn new(backend: Arc<B>, store: S) -> Self {
        let session = store.load(SessionDomain::Customer);
        info!(restored = session.is_some(), "customer portal ready");
        Self {
            claims: ClaimCoordinator::new(backend.clone()),
            router: CustomerRouter::new(session),
            scanner: None,
            backend,
            store,
        }
    }

    /// Replaces any attached camera, releasing its session.
    pub fn attach_camera(&mut self, camera: Box<dyn Camera>) {
        self.scanner = Some(Scanner::new(camera));
    }

    pub fn camera_active(&self) -> bool {
        self.scanner.as_ref().is_some_and(Scanner::is_active)
    }

    /// No-op without a camera or outside the scanning view.
    pub fn start_camera(&mut self) -> Result<(), CameraError> {
        if !matches!(self.router.view(), CustomerView::Scanning { .. }) {
            return Ok(());
        }
        match &mut self.scanner {
            Some(scanner) => scanner.start(),
            None => Ok(()),
        }
    }

    /// A frame from the camera decoded to `text`.
    pub fn on_decoded(&mut self, text: &str) -> Result<Option<CustomerRequest>, ValidationError> {
        let Some(payload) = self.scanner.as_mut().and_then(|s| s.on_decoded(text)) else {
            return Ok(None);
        };
        self.dispatch(CustomerAction::Scan(payload.id().to_string()))
    }

    pub fn router(&self) -> &CustomerRouter {
        &self.router
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn claims(&self) -> &ClaimCoordinator<B> {
        &self.claims
    }

    pub fn dispatch(&mut self, action: CustomerAction) -> Result<Option<CustomerRequest>, ValidationError> {
        let unauthenticated = matches!(self.router.view(), CustomerView::Unauthenticated { .. });

        let request = match action {
            CustomerAction::Login { email, password } => {
                if !unauthenticated {
                    return Ok(None);
                }
                let credentials = self.validated(|| {
                    Ok(Credentials {
                        email: required("Email", &email)?,
                        password: required("Password", &password).map(|_| password.clone())?,
                    })
                })?;
                Some(CustomerRequest::Login(credentials))
            }
            CustomerAction::Register { email, password, name } => {
                if !unauthenticated {
                    return Ok(None);
                }
                let signup = self.validated(|| {
                    Ok(CustomerSignup {
                        email: required("Email", &email)?,
                        password: required("Password", &password).map(|_| password.clone())?,
                        name: required("Name", &name)?,
                    })
                })?;
                Some(CustomerRequest::Register(signup))
            }
            CustomerAction::Scan(raw) => {
                if !matches!(self.router.view(), CustomerView::Scanning { .. }) {
                    return Ok(None);
                }
                let payload = match manual_entry(&raw) {
                    Ok(payload) => payload,
                    Err(e) => {
                        self.apply(CustomerEvent::ScanRejected(Notice::from(&e)));
                        return Err(e);
                    }
                };
                info!(receipt = payload.is_receipt(), id = payload.id(), "scan classified");
                let request = if payload.is_receipt() {
                    CustomerRequest::Receipt {
                        receipt_id: payload.id().to_string(),
                    }
                } else {
                    CustomerRequest::Batch {
                        batch_id: payload.id().to_string(),
                    }
                };
                self.apply(CustomerEvent::Scanned(payload));
                Some(request)
            }
            CustomerAction::Claim => {
                let Some(receipt_id) = self.router.active_receipt().map(str::to_string) else {
                    return Ok(None);
                };
                let Some(token) = self.router.token().map(str::to_string) else {
                    return Ok(None);
                };
                let started = self.apply(CustomerEvent::ClaimStarted {
                    receipt_id: receipt_id.clone(),
                });
                (started == Transition::Applied).then_some(CustomerRequest::Claim { receipt_id, token })
            }
            CustomerAction::ShowBadges => {
                let Some(token) = self.router.token().map(str::to_string) else {
                    return Ok(None);
                };
                self.apply(CustomerEvent::ShowBadges);
                Some(CustomerRequest::Badges {
                    seq: self.router.badge_seq(),
                    token,
                })
            }
            CustomerAction::SwitchAuthForm => self.apply_only(CustomerEvent::SwitchAuthForm),
            CustomerAction::LeaveBadges => self.apply_only(CustomerEvent::LeaveBadges),
            CustomerAction::ScanAnother => self.apply_only(CustomerEvent::ScanAnother),
            CustomerAction::DismissOverlay => self.apply_only(CustomerEvent::DismissOverlay),
            CustomerAction::Logout => self.apply_only(CustomerEvent::Logout),
        };
        Ok(request)
    }

    pub async fn perform(&self, request: CustomerRequest) -> CustomerEvent {
        match request {
            CustomerRequest::Login(credentials) => {
                match self.backend.login(SessionDomain::Customer, &credentials).await {
                    Ok(session) => CustomerEvent::Authenticated(session),
                    Err(e) => CustomerEvent::AuthFailed(auth_notice(&e)),
                }
            }
            CustomerRequest::Register(signup) => match self.backend.register_customer(&signup).await {
                Ok(session) => CustomerEvent::Authenticated(session),
                Err(e) => CustomerEvent::AuthFailed(auth_notice(&e)),
            },
            CustomerRequest::Batch { batch_id } => {
                let result = noticed(self.backend.batch(&batch_id).await);
                let nearby = match &result {
                    Ok(_) => same_farm(self.backend.as_ref(), &batch_id, None).await,
                    Err(_) => Vec::new(),
                };
                CustomerEvent::BatchLoaded {
                    batch_id,
                    result,
                    nearby,
                }
            }
            CustomerRequest::Receipt { receipt_id } => {
                let fetched = self.claims.fetch_receipt(&receipt_id).await;
                let nearby = match &fetched.value {
                    Ok(r) => same_farm(self.backend.as_ref(), &r.batch_id, Some(&r.restaurant_name)).await,
                    Err(_) => Vec::new(),
                };
                CustomerEvent::ReceiptLoaded {
                    receipt_id: fetched.id,
                    result: noticed(fetched.value),
                    nearby,
                }
            }
            CustomerRequest::Claim { receipt_id, token } => {
                let result = self.claims.claim(&receipt_id, Some(&token)).await;
                CustomerEvent::ClaimFinished { receipt_id, result }
            }
            CustomerRequest::Badges { seq, token } => {
                let result = noticed(self.backend.user_badges(&token).await).map(|raw| aggregate(&raw));
                CustomerEvent::BadgesLoaded { seq, result }
            }
        }
    }

    pub fn deliver(&mut self, event: CustomerEvent) -> Transition {
        self.apply(event)
    }

    /// Dispatch, then perform and deliver the request it produced.
    pub async fn run(&mut self, action: CustomerAction) -> Result<(), ValidationError> {
        if let Some(request) = self.dispatch(action)? {
            let event = self.perform(request).await;
            self.deliver(event);
        }
        Ok(())
    }

    fn apply_only(&mut self, event: CustomerEvent) -> Option<CustomerRequest> {
        self.apply(event);
        None
    }

    /// Run a form validation; a failure is also shown on the auth form.
    fn validated<T>(&mut self, f: impl FnOnce() -> Result<T, ValidationError>) -> Result<T, ValidationError> {
        let result = f();
        if let Err(e) = &result {
            self.apply(CustomerEvent::AuthFailed(Notice::from(e)));
        }
        result
    }

    fn apply(&mut self, event: CustomerEvent) -> Transition {
        if let CustomerEvent::ClaimFinished {
            receipt_id,
            result: ClaimResult::InFlight,
        } = &event
        {
            if self.claims.is_claiming(receipt_id) {
                debug!(receipt_id = %receipt_id, "claim still pending, keeping claiming state");
                return Transition::Ignored;
            }
        }
        let signed_in: Option<Session> = match &event {
            CustomerEvent::Authenticated(session) => Some(session.clone()),
            _ => None,
        };
        let had_session = self.router.session().is_some();

        let transition = self.router.apply(event);

        if !matches!(self.router.view(), CustomerView::Scanning { .. }) {
            if let Some(scanner) = &mut self.scanner {
                scanner.stop();
            }
        }

        if transition == Transition::Applied {
            if let Some(session) = signed_in {
                if let Err(e) = self.store.save(&session) {
                    warn!(error = %e, "failed to persist customer session");
                }
            } else if had_session && self.router.session().is_none() {
                if let Err(e) = self.store.clear(SessionDomain::Customer) {
                    warn!(error = %e, "failed to clear customer session");
                }
            }
        }
        transition
    }
}
