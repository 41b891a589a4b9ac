use tracing::{debug, info};

use farmpass_shared::models::{Batch, CreatedReceipt};
use farmpass_shared::{Session, SessionDomain};

use super::{Load, Transition};
use crate::error::Notice;

#[derive(Debug, Clone, PartialEq)]
pub enum RestaurantView {
    Login {
        error: Option<Notice>,
    },
    Register {
        error: Option<Notice>,
    },
    ReceiptForm {
        seq: u64,
        batches: Load<Vec<Batch>>,
        error: Option<Notice>,
        submitting: bool,
    },
    ReceiptCreated {
        receipt: CreatedReceipt,
    },
}

impl RestaurantView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Register { .. } => "register",
            Self::ReceiptForm { .. } => "receipt_form",
            Self::ReceiptCreated { .. } => "receipt_created",
        }
    }
}

#[derive(Debug)]
pub enum RestaurantEvent {
    SwitchAuthForm,
    AuthFailed(Notice),
    Authenticated(Session),
    BatchesLoaded {
        seq: u64,
        result: Result<Vec<Batch>, Notice>,
    },
    Submitting,
    SubmitFailed(Notice),
    ReceiptCreated(CreatedReceipt),
    CreateAnother,
    Logout,
}

/// Restaurant surface: `Login`/`Register`, then `ReceiptForm` and
/// `ReceiptCreated`, never without a restaurant session.
#[derive(Debug)]
pub struct RestaurantRouter {
    session: Option<Session>,
    view: RestaurantView,
    seq: u64,
}

impl RestaurantRouter {
    pub fn new(session: Option<Session>) -> Self {
        let mut router = Self {
            session: session.filter(|s| s.domain == SessionDomain::Restaurant),
            view: RestaurantView::Login { error: None },
            seq: 0,
        };
        if router.session.is_some() {
            router.open_form();
        }
        router
    }

    pub fn view(&self) -> &RestaurantView {
        &self.view
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    /// Name printed on receipts, taken from the account.
    pub fn restaurant_name(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.principal.restaurant_name())
    }

    pub fn batches_seq(&self) -> u64 {
        self.seq
    }

    /// Batches the form may submit, once they have loaded.
    pub fn available_batches(&self) -> Option<&[Batch]> {
        match &self.view {
            RestaurantView::ReceiptForm {
                batches: Load::Ready(batches),
                ..
            } => Some(batches),
            _ => None,
        }
    }

    pub fn apply(&mut self, event: RestaurantEvent) -> Transition {
        let transition = self.step(event);
        match transition {
            Transition::Applied => debug!(view = self.view.name(), "restaurant transition"),
            Transition::Stale => debug!(view = self.view.name(), "stale restaurant response discarded"),
            Transition::Ignored => {}
        }
        transition
    }

    fn step(&mut self, event: RestaurantEvent) -> Transition {
        if self.session.is_none() {
            return self.step_gated(event);
        }
        match event {
            RestaurantEvent::BatchesLoaded { seq, result } => {
                let RestaurantView::ReceiptForm {
                    seq: active,
                    batches,
                    ..
                } = &mut self.view
                else {
                    return Transition::Stale;
                };
                if *active != seq || !batches.is_loading() {
                    return Transition::Stale;
                }
                if result.as_ref().is_err_and(Notice::is_unauthenticated) {
                    return self.force_logout();
                }
                *batches = Load::from_result(result);
                Transition::Applied
            }
            RestaurantEvent::Submitting => match &mut self.view {
                RestaurantView::ReceiptForm {
                    batches: Load::Ready(_),
                    submitting,
                    error,
                    ..
                } if !*submitting => {
                    *submitting = true;
                    *error = None;
                    Transition::Applied
                }
                _ => Transition::Ignored,
            },
            RestaurantEvent::SubmitFailed(notice) => {
                if notice.is_unauthenticated() {
                    return self.force_logout();
                }
                match &mut self.view {
                    RestaurantView::ReceiptForm { submitting, error, .. } => {
                        *submitting = false;
                        *error = Some(notice);
                        Transition::Applied
                    }
                    _ => Transition::Stale,
                }
            }
            RestaurantEvent::ReceiptCreated(receipt) => match &self.view {
                RestaurantView::ReceiptForm { submitting: true, .. } => {
                    info!(receipt_id = %receipt.receipt_id, "receipt created");
                    self.view = RestaurantView::ReceiptCreated { receipt };
                    Transition::Applied
                }
                _ => Transition::Stale,
            },
            RestaurantEvent::CreateAnother => match self.view {
                RestaurantView::ReceiptCreated { .. } => {
                    self.open_form();
                    Transition::Applied
                }
                _ => Transition::Ignored,
            },
            RestaurantEvent::Logout => {
                info!("restaurant signed out");
                self.session = None;
                self.view = RestaurantView::Login { error: None };
                Transition::Applied
            }
            RestaurantEvent::SwitchAuthForm
            | RestaurantEvent::AuthFailed(_)
            | RestaurantEvent::Authenticated(_) => Transition::Ignored,
        }
    }

    fn step_gated(&mut self, event: RestaurantEvent) -> Transition {
        match event {
            RestaurantEvent::SwitchAuthForm => {
                self.view = match self.view {
                    RestaurantView::Register { .. } => RestaurantView::Login { error: None },
                    _ => RestaurantView::Register { error: None },
                };
            }
            RestaurantEvent::AuthFailed(notice) => match &mut self.view {
                RestaurantView::Login { error } | RestaurantView::Register { error } => {
                    *error = Some(notice);
                }
                _ => return Transition::Ignored,
            },
            RestaurantEvent::Authenticated(session) if session.domain == SessionDomain::Restaurant => {
                info!(email = %session.principal.email, "restaurant signed in");
                self.session = Some(session);
                self.open_form();
            }
            RestaurantEvent::BatchesLoaded { .. } | RestaurantEvent::ReceiptCreated(_) => {
                return Transition::Stale;
            }
            _ => return Transition::Ignored,
        }
        Transition::Applied
    }

    fn open_form(&mut self) {
        self.seq += 1;
        self.view = RestaurantView::ReceiptForm {
            seq: self.seq,
            batches: Load::Loading,
            error: None,
            submitting: false,
        };
    }

    fn force_logout(&mut self) -> Transition {
        info!("restaurant session rejected by backend, signing out");
        self.session = None;
        self.view = RestaurantView::Login {
            error: Some(Notice::session_expired()),
        };
        Transition::Applied
    }
}
