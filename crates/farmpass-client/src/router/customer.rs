use tracing::{debug, info};

use farmpass_shared::models::{Batch, NearbyRestaurant, Receipt};
use farmpass_shared::{ScanPayload, Session, SessionDomain};

use super::{Load, Transition};
use crate::badges::BadgeSummary;
use crate::claim::ClaimResult;
use crate::error::{ErrorKind, Notice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    Available,
    Claiming,
    /// Claimed in this run; the celebration has been shown.
    Claimed,
    /// Claimed before, here or elsewhere. Not an error.
    AlreadyClaimed,
    Expired,
}

/// What the receipt view offers for claiming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    Enabled,
    Claiming,
    Expired,
    Hidden,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryPanel {
    pub batch: Batch,
    pub nearby: Vec<NearbyRestaurant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptPanel {
    pub receipt: Receipt,
    pub claim: ClaimState,
    pub notice: Option<Notice>,
    pub nearby: Vec<NearbyRestaurant>,
}

/// Badge-unlocked overlay, independent of the primary view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Celebration {
    pub receipt_id: String,
    pub farm_name: String,
    pub batch_id: String,
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CustomerView {
    Unauthenticated { form: AuthForm, error: Option<Notice> },
    Scanning { error: Option<Notice> },
    /// View only: a product scan never unlocks a badge.
    FarmStory { batch_id: String, story: Load<StoryPanel> },
    ReceiptFlow { receipt_id: String, panel: Load<ReceiptPanel> },
    BadgeCollection { seq: u64, badges: Load<BadgeSummary> },
}

impl CustomerView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::Scanning { .. } => "scanning",
            Self::FarmStory { .. } => "farm_story",
            Self::ReceiptFlow { .. } => "receipt_flow",
            Self::BadgeCollection { .. } => "badge_collection",
        }
    }

    fn scanning() -> Self {
        Self::Scanning { error: None }
    }

    fn login(error: Option<Notice>) -> Self {
        Self::Unauthenticated {
            form: AuthForm::Login,
            error,
        }
    }
}

#[derive(Debug)]
pub enum CustomerEvent {
    SwitchAuthForm,
    AuthFailed(Notice),
    Authenticated(Session),
    Scanned(ScanPayload),
    ScanRejected(Notice),
    BatchLoaded {
        batch_id: String,
        result: Result<Batch, Notice>,
        nearby: Vec<NearbyRestaurant>,
    },
    ReceiptLoaded {
        receipt_id: String,
        result: Result<Receipt, Notice>,
        nearby: Vec<NearbyRestaurant>,
    },
    ClaimStarted { receipt_id: String },
    ClaimFinished { receipt_id: String, result: ClaimResult },
    ShowBadges,
    BadgesLoaded { seq: u64, result: Result<BadgeSummary, Notice> },
    LeaveBadges,
    ScanAnother,
    DismissOverlay,
    Logout,
}

impl CustomerEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::SwitchAuthForm => "switch_auth_form",
            Self::AuthFailed(_) => "auth_failed",
            Self::Authenticated(_) => "authenticated",
            Self::Scanned(_) => "scanned",
            Self::ScanRejected(_) => "scan_rejected",
            Self::BatchLoaded { .. } => "batch_loaded",
            Self::ReceiptLoaded { .. } => "receipt_loaded",
            Self::ClaimStarted { .. } => "claim_started",
            Self::ClaimFinished { .. } => "claim_finished",
            Self::ShowBadges => "show_badges",
            Self::BadgesLoaded { .. } => "badges_loaded",
            Self::LeaveBadges => "leave_badges",
            Self::ScanAnother => "scan_another",
            Self::DismissOverlay => "dismiss_overlay",
            Self::Logout => "logout",
        }
    }

    fn is_response(&self) -> bool {
        matches!(
            self,
            Self::BatchLoaded { .. }
                | Self::ReceiptLoaded { .. }
                | Self::ClaimFinished { .. }
                | Self::BadgesLoaded { .. }
        )
    }
}

/// Customer surface: `Unauthenticated` gates `Scanning`, which leads to
/// `FarmStory` or `ReceiptFlow`; `BadgeCollection` is a side view.
#[derive(Debug)]
pub struct CustomerRouter {
    session: Option<Session>,
    view: CustomerView,
    overlay: Option<Celebration>,
    badge_seq: u64,
}

impl CustomerRouter {
    pub fn new(session: Option<Session>) -> Self {
        let session = session.filter(|s| s.domain == SessionDomain::Customer);
        let view = if session.is_some() {
            CustomerView::scanning()
        } else {
            CustomerView::login(None)
        };
        Self {
            session,
            view,
            overlay: None,
            badge_seq: 0,
        }
    }

    pub fn view(&self) -> &CustomerView {
        &self.view
    }

    pub fn overlay(&self) -> Option<&Celebration> {
        self.overlay.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    /// Receipt shown by the current view, if any.
    pub fn active_receipt(&self) -> Option<&str> {
        match &self.view {
            CustomerView::ReceiptFlow { receipt_id, .. } => Some(receipt_id),
            _ => None,
        }
    }

    pub fn badge_seq(&self) -> u64 {
        self.badge_seq
    }

    pub fn claim_action(&self) -> ClaimAction {
        let CustomerView::ReceiptFlow {
            panel: Load::Ready(panel),
            ..
        } = &self.view
        else {
            return ClaimAction::Hidden;
        };
        match panel.claim {
            ClaimState::Available if panel.receipt.is_expired() => ClaimAction::Expired,
            ClaimState::Available => ClaimAction::Enabled,
            ClaimState::Claiming => ClaimAction::Claiming,
            ClaimState::Expired => ClaimAction::Expired,
            ClaimState::Claimed | ClaimState::AlreadyClaimed => ClaimAction::Hidden,
        }
    }

    pub fn apply(&mut self, event: CustomerEvent) -> Transition {
        let name = event.name();
        let transition = if self.session.is_none() {
            self.step_gated(event)
        } else {
            self.step(event)
        };
        match transition {
            Transition::Applied => debug!(event = name, view = self.view.name(), "customer transition"),
            Transition::Stale => debug!(event = name, view = self.view.name(), "stale response discarded"),
            Transition::Ignored => debug!(event = name, view = self.view.name(), "event ignored"),
        }
        transition
    }

    fn step_gated(&mut self, event: CustomerEvent) -> Transition {
        let CustomerView::Unauthenticated { form, error } = &mut self.view else {
            return Transition::Ignored;
        };
        match event {
            CustomerEvent::SwitchAuthForm => {
                *form = match form {
                    AuthForm::Login => AuthForm::Register,
                    AuthForm::Register => AuthForm::Login,
                };
                *error = None;
                Transition::Applied
            }
            CustomerEvent::AuthFailed(notice) => {
                *error = Some(notice);
                Transition::Applied
            }
            CustomerEvent::Authenticated(session) if session.domain == SessionDomain::Customer => {
                info!(email = %session.principal.email, "customer signed in");
                self.session = Some(session);
                self.view = CustomerView::scanning();
                Transition::Applied
            }
            e if e.is_response() => Transition::Stale,
            _ => Transition::Ignored,
        }
    }

    fn step(&mut self, event: CustomerEvent) -> Transition {
        match event {
            CustomerEvent::SwitchAuthForm
            | CustomerEvent::AuthFailed(_)
            | CustomerEvent::Authenticated(_) => Transition::Ignored,

            CustomerEvent::Scanned(payload) => {
                if !matches!(self.view, CustomerView::Scanning { .. }) {
                    return Transition::Ignored;
                }
                self.view = match payload {
                    ScanPayload::Receipt { receipt_id } => CustomerView::ReceiptFlow {
                        receipt_id,
                        panel: Load::Loading,
                    },
                    ScanPayload::Batch { batch_id } => CustomerView::FarmStory {
                        batch_id,
                        story: Load::Loading,
                    },
                };
                Transition::Applied
            }

            CustomerEvent::ScanRejected(notice) => match &mut self.view {
                CustomerView::Scanning { error } => {
                    *error = Some(notice);
                    Transition::Applied
                }
                _ => Transition::Ignored,
            },

            CustomerEvent::BatchLoaded {
                batch_id,
                result,
                nearby,
            } => {
                let CustomerView::FarmStory { batch_id: active, story } = &mut self.view else {
                    return Transition::Stale;
                };
                if *active != batch_id || !story.is_loading() {
                    return Transition::Stale;
                }
                *story = Load::from_result(result.map(|batch| StoryPanel { batch, nearby }));
                Transition::Applied
            }

            CustomerEvent::ReceiptLoaded {
                receipt_id,
                result,
                nearby,
            } => {
                let CustomerView::ReceiptFlow { receipt_id: active, panel } = &mut self.view else {
                    return Transition::Stale;
                };
                if *active != receipt_id || !panel.is_loading() {
                    return Transition::Stale;
                }
                *panel = Load::from_result(result.map(|receipt| ReceiptPanel {
                    claim: initial_claim_state(&receipt),
                    receipt,
                    notice: None,
                    nearby,
                }));
                Transition::Applied
            }

            CustomerEvent::ClaimStarted { receipt_id } => {
                if self.active_receipt() != Some(receipt_id.as_str())
                    || self.claim_action() != ClaimAction::Enabled
                {
                    return Transition::Ignored;
                }
                if let Some(panel) = self.receipt_panel_mut() {
                    panel.claim = ClaimState::Claiming;
                    panel.notice = None;
                }
                Transition::Applied
            }

            CustomerEvent::ClaimFinished { receipt_id, result } => self.finish_claim(receipt_id, result),

            CustomerEvent::ShowBadges => {
                self.badge_seq += 1;
                self.overlay = None;
                self.view = CustomerView::BadgeCollection {
                    seq: self.badge_seq,
                    badges: Load::Loading,
                };
                Transition::Applied
            }

            CustomerEvent::BadgesLoaded { seq, result } => {
                let CustomerView::BadgeCollection { seq: active, badges } = &mut self.view else {
                    return Transition::Stale;
                };
                if *active != seq || !badges.is_loading() {
                    return Transition::Stale;
                }
                if result.as_ref().is_err_and(Notice::is_unauthenticated) {
                    return self.force_logout();
                }
                *badges = Load::from_result(result);
                Transition::Applied
            }

            CustomerEvent::LeaveBadges => match self.view {
                CustomerView::BadgeCollection { .. } => {
                    self.view = CustomerView::scanning();
                    Transition::Applied
                }
                _ => Transition::Ignored,
            },

            CustomerEvent::ScanAnother => {
                self.overlay = None;
                self.view = CustomerView::scanning();
                Transition::Applied
            }

            CustomerEvent::DismissOverlay => {
                if self.overlay.take().is_some() {
                    Transition::Applied
                } else {
                    Transition::Ignored
                }
            }

            CustomerEvent::Logout => {
                info!("customer signed out");
                self.session = None;
                self.overlay = None;
                self.view = CustomerView::login(None);
                Transition::Applied
            }
        }
    }

    fn finish_claim(&mut self, receipt_id: String, result: ClaimResult) -> Transition {
        // A settled grant still lands on a panel that was reset to available.
        let accepts = match &self.view {
            CustomerView::ReceiptFlow {
                receipt_id: active,
                panel: Load::Ready(p),
            } if *active == receipt_id => {
                p.claim == ClaimState::Claiming || (p.claim == ClaimState::Available && result.is_final())
            }
            _ => false,
        };
        if !accepts {
            return Transition::Stale;
        }
        if result == ClaimResult::Unauthenticated {
            return self.force_logout();
        }

        let mut celebration = None;
        if let Some(panel) = self.receipt_panel_mut() {
            match result {
                ClaimResult::Success {
                    farm_name,
                    batch_id,
                    transaction_hash,
                } => {
                    panel.claim = ClaimState::Claimed;
                    panel.receipt.claimed = true;
                    celebration = Some(Celebration {
                        receipt_id,
                        farm_name,
                        batch_id,
                        transaction_hash,
                    });
                }
                ClaimResult::AlreadyClaimed => {
                    panel.claim = ClaimState::AlreadyClaimed;
                    panel.receipt.claimed = true;
                }
                ClaimResult::Expired => panel.claim = ClaimState::Expired,
                ClaimResult::NetworkError(message) => {
                    panel.claim = ClaimState::Available;
                    panel.notice = Some(Notice::new(ErrorKind::NetworkFailure, message));
                }
                ClaimResult::NotFound => {
                    panel.claim = ClaimState::Available;
                    panel.notice = Some(Notice::new(ErrorKind::NotFound, "Receipt not found."));
                }
                ClaimResult::Rejected { message } => {
                    panel.claim = ClaimState::Available;
                    panel.notice = Some(Notice::new(ErrorKind::Rejected, message));
                }
                // The earlier claim was abandoned; the caller checks it is not still pending.
                ClaimResult::InFlight => panel.claim = ClaimState::Available,
                ClaimResult::Unauthenticated => {}
            }
        }
        if celebration.is_some() {
            self.overlay = celebration;
        }
        Transition::Applied
    }

    fn receipt_panel_mut(&mut self) -> Option<&mut ReceiptPanel> {
        match &mut self.view {
            CustomerView::ReceiptFlow {
                panel: Load::Ready(panel),
                ..
            } => Some(panel),
            _ => None,
        }
    }

    fn force_logout(&mut self) -> Transition {
        info!("customer session rejected by backend, signing out");
        self.session = None;
        self.overlay = None;
        self.view = CustomerView::login(Some(Notice::session_expired()));
        Transition::Applied
    }
}

fn initial_claim_state(receipt: &Receipt) -> ClaimState {
    if receipt.is_expired() {
        ClaimState::Expired
    } else if receipt.claimed {
        ClaimState::AlreadyClaimed
    } else {
        ClaimState::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{batch, customer_session, expired_receipt, receipt, restaurant_session};
    use farmpass_shared::classify;

    const A: &str = "RECEIPT-AAA";
    const B: &str = "RECEIPT-BBB";

    fn signed_in() -> CustomerRouter {
        CustomerRouter::new(Some(customer_session("eve@example.com")))
    }

    fn receipt_loaded(id: &str, r: Receipt) -> CustomerEvent {
        CustomerEvent::ReceiptLoaded {
            receipt_id: id.into(),
            result: Ok(r),
            nearby: vec![],
        }
    }

    fn at_receipt(id: &str) -> CustomerRouter {
        let mut router = signed_in();
        router.apply(CustomerEvent::Scanned(classify(id)));
        router.apply(receipt_loaded(id, receipt(id, "Oak Hill")));
        router
    }

    fn success() -> ClaimResult {
        ClaimResult::Success {
            farm_name: "Oak Hill".into(),
            batch_id: "VEG-001".into(),
            transaction_hash: Some("0xfeed".into()),
        }
    }

    #[test]
    fn test_gate_blocks_everything_but_auth() {
        let mut router = CustomerRouter::new(None);
        assert_eq!(router.view().name(), "unauthenticated");
        assert_eq!(router.apply(CustomerEvent::Scanned(classify(A))), Transition::Ignored);
        assert_eq!(router.apply(CustomerEvent::ShowBadges), Transition::Ignored);
        assert_eq!(
            router.apply(receipt_loaded(A, receipt(A, "Oak Hill"))),
            Transition::Stale
        );

        let wrong_domain = restaurant_session("chef@table.com", "Table");
        assert_eq!(router.apply(CustomerEvent::Authenticated(wrong_domain)), Transition::Ignored);

        assert_eq!(router.apply(CustomerEvent::SwitchAuthForm), Transition::Applied);
        assert!(matches!(
            router.view(),
            CustomerView::Unauthenticated { form: AuthForm::Register, .. }
        ));
        router.apply(CustomerEvent::Authenticated(customer_session("eve@example.com")));
        assert_eq!(router.view().name(), "scanning");
    }

    #[test]
    fn test_restored_restaurant_session_does_not_unlock_customer() {
        let router = CustomerRouter::new(Some(restaurant_session("chef@table.com", "Table")));
        assert!(router.session().is_none());
    }

    #[test]
    fn test_scan_routes_by_payload() {
        let mut router = signed_in();
        router.apply(CustomerEvent::Scanned(classify("VEGMIX-001")));
        assert!(matches!(router.view(), CustomerView::FarmStory { batch_id, .. } if batch_id == "VEGMIX-001"));
        assert_eq!(router.claim_action(), ClaimAction::Hidden);

        // Only the scanner accepts a scan.
        assert_eq!(router.apply(CustomerEvent::Scanned(classify(A))), Transition::Ignored);

        router.apply(CustomerEvent::ScanAnother);
        router.apply(CustomerEvent::Scanned(classify("receipt-x")));
        assert_eq!(router.active_receipt(), Some("receipt-x"));
    }

    #[test]
    fn test_farm_story_never_offers_claim() {
        let mut router = signed_in();
        router.apply(CustomerEvent::Scanned(classify("VEG-001")));
        router.apply(CustomerEvent::BatchLoaded {
            batch_id: "VEG-001".into(),
            result: Ok(batch("VEG-001", "Green Valley")),
            nearby: vec![],
        });
        assert!(matches!(router.view(), CustomerView::FarmStory { story: Load::Ready(_), .. }));
        assert_eq!(router.claim_action(), ClaimAction::Hidden);
        assert_eq!(
            router.apply(CustomerEvent::ClaimStarted { receipt_id: "VEG-001".into() }),
            Transition::Ignored
        );
    }

    #[test]
    fn test_late_response_for_previous_scan_is_discarded() {
        let mut router = signed_in();
        router.apply(CustomerEvent::Scanned(classify(A)));
        router.apply(CustomerEvent::ScanAnother);
        router.apply(CustomerEvent::Scanned(classify(B)));

        assert_eq!(router.apply(receipt_loaded(A, receipt(A, "Oak Hill"))), Transition::Stale);
        assert!(matches!(
            router.view(),
            CustomerView::ReceiptFlow { receipt_id, panel: Load::Loading } if receipt_id == B
        ));

        assert_eq!(router.apply(receipt_loaded(B, receipt(B, "Oak Hill"))), Transition::Applied);
        assert_eq!(router.claim_action(), ClaimAction::Enabled);
    }

    #[test]
    fn test_overlay_opens_once_and_dismisses_independently() {
        let mut router = at_receipt(A);
        assert_eq!(
            router.apply(CustomerEvent::ClaimStarted { receipt_id: A.into() }),
            Transition::Applied
        );
        assert_eq!(router.claim_action(), ClaimAction::Claiming);

        router.apply(CustomerEvent::ClaimFinished {
            receipt_id: A.into(),
            result: success(),
        });
        let overlay = router.overlay().unwrap();
        assert_eq!(overlay.farm_name, "Oak Hill");
        assert_eq!(overlay.transaction_hash.as_deref(), Some("0xfeed"));
        assert_eq!(router.claim_action(), ClaimAction::Hidden);

        assert_eq!(router.apply(CustomerEvent::DismissOverlay), Transition::Applied);
        assert!(router.overlay().is_none());
        assert_eq!(router.view().name(), "receipt_flow");

        // A repeated settlement for the same receipt does not reopen it.
        assert_eq!(
            router.apply(CustomerEvent::ClaimFinished {
                receipt_id: A.into(),
                result: success(),
            }),
            Transition::Stale
        );
        assert!(router.overlay().is_none());
        assert_eq!(router.apply(CustomerEvent::DismissOverlay), Transition::Ignored);
    }

    #[test]
    fn test_already_claimed_is_terminal_not_error() {
        let mut router = at_receipt(A);
        router.apply(CustomerEvent::ClaimStarted { receipt_id: A.into() });
        router.apply(CustomerEvent::ClaimFinished {
            receipt_id: A.into(),
            result: ClaimResult::AlreadyClaimed,
        });
        let CustomerView::ReceiptFlow { panel: Load::Ready(panel), .. } = router.view() else {
            panic!("expected receipt panel");
        };
        assert_eq!(panel.claim, ClaimState::AlreadyClaimed);
        assert!(panel.notice.is_none());
        assert!(router.overlay().is_none());
        assert_eq!(router.claim_action(), ClaimAction::Hidden);
    }

    #[test]
    fn test_failed_claim_keeps_action_with_notice() {
        let mut router = at_receipt(A);
        router.apply(CustomerEvent::ClaimStarted { receipt_id: A.into() });
        router.apply(CustomerEvent::ClaimFinished {
            receipt_id: A.into(),
            result: ClaimResult::NetworkError("timeout".into()),
        });
        let CustomerView::ReceiptFlow { panel: Load::Ready(panel), .. } = router.view() else {
            panic!("expected receipt panel");
        };
        assert_eq!(panel.notice.as_ref().map(|n| n.kind), Some(ErrorKind::NetworkFailure));
        assert_eq!(router.claim_action(), ClaimAction::Enabled);
    }

    #[test]
    fn test_expired_receipt_disables_claim() {
        let mut router = signed_in();
        router.apply(CustomerEvent::Scanned(classify(A)));
        router.apply(receipt_loaded(A, expired_receipt(A)));
        assert_eq!(router.claim_action(), ClaimAction::Expired);
        assert_eq!(
            router.apply(CustomerEvent::ClaimStarted { receipt_id: A.into() }),
            Transition::Ignored
        );

        router.apply(CustomerEvent::ScanAnother);
        router.apply(CustomerEvent::Scanned(classify(B)));
        let claimed_and_expired = Receipt {
            claimed: true,
            ..expired_receipt(B)
        };
        router.apply(receipt_loaded(B, claimed_and_expired));
        assert_eq!(router.claim_action(), ClaimAction::Expired);
        assert!(matches!(
            router.view(),
            CustomerView::ReceiptFlow { panel: Load::Ready(p), .. } if p.claim == ClaimState::Expired
        ));
    }

    #[test]
    fn test_abandoned_claim_returns_to_available() {
        let mut router = at_receipt(A);
        router.apply(CustomerEvent::ClaimStarted { receipt_id: A.into() });
        assert_eq!(
            router.apply(CustomerEvent::ClaimFinished {
                receipt_id: A.into(),
                result: ClaimResult::InFlight,
            }),
            Transition::Applied
        );
        assert_eq!(router.claim_action(), ClaimAction::Enabled);

        // The original claim settling afterwards still shows its grant.
        assert_eq!(
            router.apply(CustomerEvent::ClaimFinished {
                receipt_id: A.into(),
                result: success(),
            }),
            Transition::Applied
        );
        assert_eq!(router.claim_action(), ClaimAction::Hidden);
        assert!(router.overlay().is_some());

        assert_eq!(
            router.apply(CustomerEvent::ClaimFinished {
                receipt_id: A.into(),
                result: ClaimResult::NetworkError("timeout".into()),
            }),
            Transition::Stale
        );
    }

    #[test]
    fn test_rejected_token_forces_login() {
        let mut router = at_receipt(A);
        router.apply(CustomerEvent::ClaimStarted { receipt_id: A.into() });
        router.apply(CustomerEvent::ClaimFinished {
            receipt_id: A.into(),
            result: ClaimResult::Unauthenticated,
        });
        assert!(router.session().is_none());
        assert!(matches!(
            router.view(),
            CustomerView::Unauthenticated { error: Some(n), .. } if n.is_unauthenticated()
        ));
    }

    #[test]
    fn test_badges_side_view() {
        let mut router = at_receipt(A);
        router.apply(CustomerEvent::ShowBadges);
        let first = router.badge_seq();
        router.apply(CustomerEvent::ShowBadges);
        let second = router.badge_seq();

        assert_eq!(
            router.apply(CustomerEvent::BadgesLoaded {
                seq: first,
                result: Ok(BadgeSummary::default()),
            }),
            Transition::Stale
        );
        assert_eq!(
            router.apply(CustomerEvent::BadgesLoaded {
                seq: second,
                result: Ok(BadgeSummary::default()),
            }),
            Transition::Applied
        );

        // Leaving never restores the previous receipt.
        router.apply(CustomerEvent::LeaveBadges);
        assert_eq!(router.view(), &CustomerView::Scanning { error: None });
        assert_eq!(router.apply(CustomerEvent::LeaveBadges), Transition::Ignored);
    }

    #[test]
    fn test_badges_unauthenticated_logs_out() {
        let mut router = signed_in();
        router.apply(CustomerEvent::ShowBadges);
        router.apply(CustomerEvent::BadgesLoaded {
            seq: router.badge_seq(),
            result: Err(Notice::session_expired()),
        });
        assert!(router.session().is_none());
    }

    #[test]
    fn test_logout_from_any_state() {
        let mut router = at_receipt(A);
        router.apply(CustomerEvent::Logout);
        assert!(router.session().is_none());
        assert_eq!(router.view().name(), "unauthenticated");
        assert_eq!(router.apply(CustomerEvent::Logout), Transition::Ignored);
    }
}
