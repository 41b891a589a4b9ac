use tracing::{debug, info};

use farmpass_shared::models::{BatchCreated, FarmRegistration, FarmerDashboard};

use super::{Load, Transition};
use crate::error::Notice;
use crate::wallet::FarmerCredential;

#[derive(Debug, Clone, PartialEq)]
pub enum FarmerView {
    Login {
        error: Option<Notice>,
    },
    Register {
        /// Address of a wallet generated in this form, shown with its key.
        generated_address: Option<String>,
        error: Option<Notice>,
    },
    RegistrationSuccess {
        registration: FarmRegistration,
    },
    Dashboard {
        seq: u64,
        dashboard: Load<FarmerDashboard>,
        /// Last batch created, with the QR value to print.
        created: Option<BatchCreated>,
        error: Option<Notice>,
    },
}

impl FarmerView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Register { .. } => "register",
            Self::RegistrationSuccess { .. } => "registration_success",
            Self::Dashboard { .. } => "dashboard",
        }
    }
}

#[derive(Debug)]
pub enum FarmerEvent {
    SignedIn(FarmerCredential),
    SignInRejected(Notice),
    ShowRegister,
    ShowLogin,
    WalletGenerated(FarmerCredential),
    RegisterRejected(Notice),
    Registered {
        credential: FarmerCredential,
        registration: FarmRegistration,
    },
    ContinueToDashboard,
    Refresh,
    DashboardLoaded {
        seq: u64,
        result: Result<FarmerDashboard, Notice>,
    },
    BatchRejected(Notice),
    BatchCreated(BatchCreated),
    DismissCreated,
    Logout,
}

/// Farmer surface: `Login`, `Register` then `RegistrationSuccess`, and
/// `Dashboard`. The credential lives here, in memory only; nothing past
/// the login and register forms is reachable without it.
#[derive(Debug)]
pub struct FarmerRouter {
    credential: Option<FarmerCredential>,
    draft: Option<FarmerCredential>,
    view: FarmerView,
    seq: u64,
}

impl Default for FarmerRouter {
    fn default() -> Self {
        Self {
            credential: None,
            draft: None,
            view: FarmerView::Login { error: None },
            seq: 0,
        }
    }
}

impl FarmerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &FarmerView {
        &self.view
    }

    pub fn credential(&self) -> Option<&FarmerCredential> {
        self.credential.as_ref()
    }

    /// Wallet generated in the register form, not yet registered.
    pub fn draft(&self) -> Option<&FarmerCredential> {
        self.draft.as_ref()
    }

    pub fn dashboard_seq(&self) -> u64 {
        self.seq
    }

    pub fn apply(&mut self, event: FarmerEvent) -> Transition {
        let transition = self.step(event);
        match transition {
            Transition::Applied => debug!(view = self.view.name(), "farmer transition"),
            Transition::Stale => debug!(view = self.view.name(), "stale farmer response discarded"),
            Transition::Ignored => {}
        }
        transition
    }

    fn step(&mut self, event: FarmerEvent) -> Transition {
        let view = self.view.clone();
        match (event, view) {
            (FarmerEvent::SignedIn(credential), FarmerView::Login { .. }) => {
                info!(address = %credential.address(), "farmer signed in");
                self.credential = Some(credential);
                self.open_dashboard(None);
            }
            (FarmerEvent::SignInRejected(notice), FarmerView::Login { .. }) => {
                self.view = FarmerView::Login { error: Some(notice) };
            }
            (FarmerEvent::ShowRegister, FarmerView::Login { .. }) => {
                self.view = FarmerView::Register {
                    generated_address: None,
                    error: None,
                };
            }
            (FarmerEvent::ShowLogin, FarmerView::Register { .. }) => {
                self.draft = None;
                self.view = FarmerView::Login { error: None };
            }
            (FarmerEvent::WalletGenerated(credential), FarmerView::Register { .. }) => {
                self.view = FarmerView::Register {
                    generated_address: Some(credential.address()),
                    error: None,
                };
                self.draft = Some(credential);
            }
            (FarmerEvent::RegisterRejected(notice), FarmerView::Register { generated_address, .. }) => {
                self.view = FarmerView::Register {
                    generated_address,
                    error: Some(notice),
                };
            }
            (
                FarmerEvent::Registered {
                    credential,
                    registration,
                },
                FarmerView::Register { .. },
            ) => {
                info!(address = %registration.farmer_address, "farm registered");
                self.credential = Some(credential);
                self.draft = None;
                self.view = FarmerView::RegistrationSuccess { registration };
            }
            (FarmerEvent::ContinueToDashboard, FarmerView::RegistrationSuccess { .. })
                if self.credential.is_some() =>
            {
                self.open_dashboard(None);
            }
            (FarmerEvent::Refresh, FarmerView::Dashboard { created, .. }) => {
                self.open_dashboard(created);
            }
            (
                FarmerEvent::DashboardLoaded { seq, result },
                FarmerView::Dashboard {
                    seq: active,
                    dashboard: Load::Loading,
                    created,
                    error,
                },
            ) => {
                if seq != active {
                    return Transition::Stale;
                }
                self.view = FarmerView::Dashboard {
                    seq,
                    dashboard: Load::from_result(result),
                    created,
                    error,
                };
            }
            (FarmerEvent::DashboardLoaded { .. }, _) => return Transition::Stale,
            (FarmerEvent::BatchRejected(notice), FarmerView::Dashboard { seq, dashboard, created, .. }) => {
                self.view = FarmerView::Dashboard {
                    seq,
                    dashboard,
                    created,
                    error: Some(notice),
                };
            }
            (FarmerEvent::BatchCreated(created), FarmerView::Dashboard { .. }) => {
                info!(batch_id = %created.batch_id, "batch created");
                self.open_dashboard(Some(created));
            }
            (FarmerEvent::DismissCreated, FarmerView::Dashboard { seq, dashboard, created: Some(_), error }) => {
                self.view = FarmerView::Dashboard {
                    seq,
                    dashboard,
                    created: None,
                    error,
                };
            }
            (FarmerEvent::Logout, _) => {
                self.credential = None;
                self.draft = None;
                self.view = FarmerView::Login { error: None };
            }
            _ => return Transition::Ignored,
        }
        Transition::Applied
    }

    /// Enter the dashboard with a fresh fetch pending.
    fn open_dashboard(&mut self, created: Option<BatchCreated>) {
        self.seq += 1;
        self.view = FarmerView::Dashboard {
            seq: self.seq,
            dashboard: Load::Loading,
            created,
            error: None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmpass_shared::models::FarmerProfile;

    fn dashboard() -> FarmerDashboard {
        FarmerDashboard {
            farmer: FarmerProfile {
                farm_name: "Green Valley".into(),
                location: "Cornwall".into(),
                address: "0xabc".into(),
            },
            batches: vec![],
        }
    }

    fn registration(cred: &FarmerCredential) -> FarmRegistration {
        FarmRegistration {
            farm_name: "Green Valley".into(),
            farmer_address: cred.address(),
            transaction_hash: Some("0xfa7".into()),
        }
    }

    #[test]
    fn test_dashboard_requires_credential() {
        let mut router = FarmerRouter::new();
        assert_eq!(router.view().name(), "login");
        assert_eq!(router.apply(FarmerEvent::ContinueToDashboard), Transition::Ignored);
        assert_eq!(router.apply(FarmerEvent::Refresh), Transition::Ignored);
        assert_eq!(
            router.apply(FarmerEvent::DashboardLoaded {
                seq: 1,
                result: Ok(dashboard()),
            }),
            Transition::Stale
        );
        assert!(router.credential().is_none());
    }

    #[test]
    fn test_register_flow() {
        let mut router = FarmerRouter::new();
        router.apply(FarmerEvent::ShowRegister);
        let generated = FarmerCredential::generate();
        let address = generated.address();
        router.apply(FarmerEvent::WalletGenerated(generated.clone()));
        assert!(matches!(
            router.view(),
            FarmerView::Register { generated_address: Some(a), .. } if *a == address
        ));
        assert!(router.draft().is_some());

        router.apply(FarmerEvent::Registered {
            registration: registration(&generated),
            credential: generated,
        });
        assert_eq!(router.view().name(), "registration_success");
        assert!(router.draft().is_none());
        assert_eq!(router.credential().map(|c| c.address()), Some(address));

        router.apply(FarmerEvent::ContinueToDashboard);
        assert!(matches!(
            router.view(),
            FarmerView::Dashboard { dashboard: Load::Loading, .. }
        ));
    }

    #[test]
    fn test_refresh_discards_older_fetch() {
        let mut router = FarmerRouter::new();
        router.apply(FarmerEvent::SignedIn(FarmerCredential::generate()));
        let first = router.dashboard_seq();
        router.apply(FarmerEvent::Refresh);

        assert_eq!(
            router.apply(FarmerEvent::DashboardLoaded {
                seq: first,
                result: Ok(dashboard()),
            }),
            Transition::Stale
        );
        assert_eq!(
            router.apply(FarmerEvent::DashboardLoaded {
                seq: router.dashboard_seq(),
                result: Ok(dashboard()),
            }),
            Transition::Applied
        );
    }

    #[test]
    fn test_batch_created_reloads_dashboard() {
        let mut router = FarmerRouter::new();
        router.apply(FarmerEvent::SignedIn(FarmerCredential::generate()));
        router.apply(FarmerEvent::DashboardLoaded {
            seq: router.dashboard_seq(),
            result: Ok(dashboard()),
        });
        let before = router.dashboard_seq();

        router.apply(FarmerEvent::BatchCreated(BatchCreated {
            batch_id: "VEG-20260129-AB12".into(),
            product_name: "Carrots".into(),
            transaction_hash: None,
        }));
        assert!(router.dashboard_seq() > before);
        assert!(matches!(
            router.view(),
            FarmerView::Dashboard { dashboard: Load::Loading, created: Some(c), .. }
                if c.batch_id == "VEG-20260129-AB12"
        ));

        router.apply(FarmerEvent::DismissCreated);
        assert!(matches!(router.view(), FarmerView::Dashboard { created: None, .. }));
    }

    #[test]
    fn test_logout_drops_credential() {
        let mut router = FarmerRouter::new();
        router.apply(FarmerEvent::SignedIn(FarmerCredential::generate()));
        router.apply(FarmerEvent::Logout);
        assert!(router.credential().is_none());
        assert_eq!(router.view(), &FarmerView::Login { error: None });
    }
}
