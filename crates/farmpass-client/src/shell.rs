//! Line-oriented terminal front end.
//!
//! Each line is parsed into a [`Command`] for the active role, handed to
//! that role's portal, and the resulting view is printed. The shell keeps
//! no state of its own beyond the active role.

use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use farmpass_shared::models::explorer_tx_url;
use farmpass_store::SessionStore;

use crate::api::Backend;
use crate::portal::customer::{CustomerAction, CustomerPortal};
use crate::portal::farmer::{BatchForm, FarmerPortal, RegistrationForm};
use crate::portal::restaurant::{RestaurantPortal, RestaurantRegistration};
use crate::router::customer::{AuthForm, ClaimAction, ClaimState, CustomerRouter, CustomerView};
use crate::router::farmer::{FarmerRouter, FarmerView};
use crate::router::restaurant::{RestaurantRouter, RestaurantView};
use crate::router::Load;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Restaurant,
    Farmer,
}

impl Role {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "customer" => Some(Self::Customer),
            "restaurant" => Some(Self::Restaurant),
            "farmer" => Some(Self::Farmer),
            _ => None,
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            Self::Customer => "customer> ",
            Self::Restaurant => "restaurant> ",
            Self::Farmer => "farmer> ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Show,
    Role(Role),
    /// `restaurant <command>`: switch role, then run the command.
    As(Role, Box<Command>),
    Customer(CustomerCommand),
    Restaurant(RestaurantCommand),
    Farmer(FarmerCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CustomerCommand {
    Login { email: String, password: String },
    Register { email: String, password: String, name: String },
    Switch,
    Scan(String),
    Claim,
    Badges,
    Back,
    Again,
    Dismiss,
    Logout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestaurantCommand {
    Login { email: String, password: String },
    Register(RestaurantFields),
    Switch,
    Receipt { batch_id: String, amount: String },
    Another,
    Logout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantFields {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub postcode: String,
    pub restaurant_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FarmerCommand {
    SignIn(String),
    New,
    Back,
    Generate,
    /// `farm name | location | description`, key taken from the generated wallet.
    Register { private_key: String, fields: String },
    Continue,
    Refresh,
    Batch {
        product_type: String,
        quantity: String,
        unit: String,
        product_name: String,
    },
    Dismiss,
    Logout,
}

pub fn parse(role: Role, line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Show);
    };
    let rest: Vec<&str> = words.collect();

    match verb {
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "show" => return Ok(Command::Show),
        "role" | "as" => {
            return rest
                .first()
                .and_then(|w| Role::parse(w))
                .map(Command::Role)
                .ok_or_else(|| "usage: role customer|restaurant|farmer".to_string());
        }
        _ => {}
    }

    if let Some(target) = Role::parse(verb) {
        if rest.is_empty() {
            return Ok(Command::Role(target));
        }
        return match parse(target, &rest.join(" "))? {
            inner @ (Command::Customer(_) | Command::Restaurant(_) | Command::Farmer(_)) => {
                Ok(Command::As(target, Box::new(inner)))
            }
            _ => Err(format!("usage: {verb} <command>")),
        };
    }

    match role {
        Role::Customer => parse_customer(verb, &rest).map(Command::Customer),
        Role::Restaurant => parse_restaurant(verb, &rest).map(Command::Restaurant),
        Role::Farmer => parse_farmer(verb, &rest, line).map(Command::Farmer),
    }
}

fn parse_customer(verb: &str, rest: &[&str]) -> Result<CustomerCommand, String> {
    Ok(match (verb, rest) {
        ("login", [email, password]) => CustomerCommand::Login {
            email: email.to_string(),
            password: password.to_string(),
        },
        ("register", [email, password, name @ ..]) if !name.is_empty() => CustomerCommand::Register {
            email: email.to_string(),
            password: password.to_string(),
            name: name.join(" "),
        },
        ("switch", []) => CustomerCommand::Switch,
        ("scan", [code]) => CustomerCommand::Scan(code.to_string()),
        ("scan", []) => CustomerCommand::Scan(String::new()),
        ("claim", []) => CustomerCommand::Claim,
        ("badges", []) => CustomerCommand::Badges,
        ("back", []) => CustomerCommand::Back,
        ("again", []) => CustomerCommand::Again,
        ("dismiss", []) => CustomerCommand::Dismiss,
        ("logout", []) => CustomerCommand::Logout,
        _ => return Err(format!("unknown customer command: {verb} (try help)")),
    })
}

fn parse_restaurant(verb: &str, rest: &[&str]) -> Result<RestaurantCommand, String> {
    Ok(match (verb, rest) {
        ("login", [email, password]) => RestaurantCommand::Login {
            email: email.to_string(),
            password: password.to_string(),
        },
        ("register", [email, password, confirm, postcode, name @ ..]) if !name.is_empty() => {
            RestaurantCommand::Register(RestaurantFields {
                email: email.to_string(),
                password: password.to_string(),
                confirm_password: confirm.to_string(),
                postcode: postcode.to_string(),
                restaurant_name: name.join(" "),
            })
        }
        ("switch", []) => RestaurantCommand::Switch,
        ("receipt", [batch_id, amount]) => RestaurantCommand::Receipt {
            batch_id: batch_id.to_string(),
            amount: amount.to_string(),
        },
        ("another", []) => RestaurantCommand::Another,
        ("logout", []) => RestaurantCommand::Logout,
        _ => return Err(format!("unknown restaurant command: {verb} (try help)")),
    })
}

fn parse_farmer(verb: &str, rest: &[&str], line: &str) -> Result<FarmerCommand, String> {
    Ok(match (verb, rest) {
        ("signin", [key]) => FarmerCommand::SignIn(key.to_string()),
        ("new", []) => FarmerCommand::New,
        ("back", []) => FarmerCommand::Back,
        ("generate", []) => FarmerCommand::Generate,
        ("register", [_, ..]) => {
            let fields = line.trim_start()["register".len()..].trim();
            let (private_key, fields) = match fields.split_once(' ') {
                Some((key, tail)) if key.starts_with("0x") && !key.contains('|') => {
                    (key.to_string(), tail.trim().to_string())
                }
                _ => (String::new(), fields.to_string()),
            };
            FarmerCommand::Register { private_key, fields }
        }
        ("continue", []) => FarmerCommand::Continue,
        ("refresh", []) => FarmerCommand::Refresh,
        ("batch", [product_type, quantity, unit, name @ ..]) if !name.is_empty() => FarmerCommand::Batch {
            product_type: product_type.to_string(),
            quantity: quantity.to_string(),
            unit: unit.to_string(),
            product_name: name.join(" "),
        },
        ("dismiss", []) => FarmerCommand::Dismiss,
        ("logout", []) => FarmerCommand::Logout,
        _ => return Err(format!("unknown farmer command: {verb} (try help)")),
    })
}

const HELP: &str = "\
roles:       role customer|restaurant|farmer, or prefix one command: farmer refresh
customer:    login <email> <password> | register <email> <password> <name>
             switch | scan <code> | claim | badges | back | again | dismiss | logout
restaurant:  login <email> <password>
             register <email> <password> <confirm> <postcode> <restaurant name>
             switch | receipt <batch-id> <amount> | another | logout
farmer:      signin <private-key> | new | back | generate
             register [<private-key>] <farm name> | <location> | <description>
             continue | refresh | batch <type> <quantity> <unit> <product name>
             dismiss | logout
general:     show | help | quit";

pub struct Shell<B: Backend, S: SessionStore> {
    customer: CustomerPortal<B, S>,
    restaurant: RestaurantPortal<B, S>,
    farmer: FarmerPortal<B>,
    explorer: String,
    role: Role,
}

impl<B: Backend, S: SessionStore> Shell<B, S> {
    /// Each portal gets its own store handle; they only touch their own key.
    pub fn new(backend: Arc<B>, customer_store: S, restaurant_store: S, explorer: String) -> Self {
        Self {
            customer: CustomerPortal::new(backend.clone(), customer_store),
            restaurant: RestaurantPortal::new(backend.clone(), restaurant_store),
            farmer: FarmerPortal::new(backend),
            explorer,
            role: Role::Customer,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn customer(&self) -> &CustomerPortal<B, S> {
        &self.customer
    }

    pub fn restaurant(&self) -> &RestaurantPortal<B, S> {
        &self.restaurant
    }

    pub fn farmer(&self) -> &FarmerPortal<B> {
        &self.farmer
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.restaurant.load_batches().await;
        println!("{HELP}\n");
        println!("{}", self.render());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{}", self.role.prompt());
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            match parse(self.role, &line) {
                Ok(Command::Quit) => break,
                Ok(Command::Help) => println!("{HELP}"),
                Ok(command) => {
                    self.execute(command).await;
                    println!("{}", self.render());
                }
                Err(usage) => println!("{usage}"),
            }
        }
        Ok(())
    }

    pub async fn execute(&mut self, command: Command) {
        let command = match command {
            Command::As(role, inner) => {
                self.role = role;
                *inner
            }
            other => other,
        };
        match command {
            Command::Help | Command::Quit | Command::Show | Command::As(..) => {}
            Command::Role(role) => self.role = role,
            Command::Customer(cmd) => self.customer_command(cmd).await,
            Command::Restaurant(cmd) => self.restaurant_command(cmd).await,
            Command::Farmer(cmd) => self.farmer_command(cmd).await,
        }
    }

    async fn customer_command(&mut self, cmd: CustomerCommand) {
        let action = match cmd {
            CustomerCommand::Login { email, password } => CustomerAction::Login { email, password },
            CustomerCommand::Register { email, password, name } => {
                CustomerAction::Register { email, password, name }
            }
            CustomerCommand::Switch => CustomerAction::SwitchAuthForm,
            CustomerCommand::Scan(code) => CustomerAction::Scan(code),
            CustomerCommand::Claim => CustomerAction::Claim,
            CustomerCommand::Badges => CustomerAction::ShowBadges,
            CustomerCommand::Back => CustomerAction::LeaveBadges,
            CustomerCommand::Again => CustomerAction::ScanAnother,
            CustomerCommand::Dismiss => CustomerAction::DismissOverlay,
            CustomerCommand::Logout => CustomerAction::Logout,
        };
        if let Err(e) = self.customer.run(action).await {
            debug!(error = %e, "customer input rejected");
        }
    }

    async fn restaurant_command(&mut self, cmd: RestaurantCommand) {
        match cmd {
            RestaurantCommand::Login { email, password } => {
                self.restaurant.login(&email, &password).await;
            }
            RestaurantCommand::Register(fields) => {
                let form = RestaurantRegistration {
                    email: fields.email,
                    password: fields.password,
                    confirm_password: fields.confirm_password,
                    restaurant_name: fields.restaurant_name,
                    postcode: fields.postcode,
                };
                self.restaurant.register(&form).await;
            }
            RestaurantCommand::Switch => {
                self.restaurant.switch_auth_form();
            }
            RestaurantCommand::Receipt { batch_id, amount } => {
                self.restaurant.create_receipt(&batch_id, &amount).await;
            }
            RestaurantCommand::Another => {
                self.restaurant.create_another().await;
            }
            RestaurantCommand::Logout => {
                self.restaurant.logout();
            }
        }
    }

    async fn farmer_command(&mut self, cmd: FarmerCommand) {
        match cmd {
            FarmerCommand::SignIn(key) => {
                self.farmer.sign_in(&key).await;
            }
            FarmerCommand::New => {
                self.farmer.show_register();
            }
            FarmerCommand::Back => {
                self.farmer.show_login();
            }
            FarmerCommand::Generate => {
                self.farmer.generate_wallet();
            }
            FarmerCommand::Register { private_key, fields } => {
                let mut parts = fields.splitn(3, '|').map(str::trim);
                let form = RegistrationForm {
                    private_key,
                    farm_name: parts.next().unwrap_or_default().to_string(),
                    location: parts.next().unwrap_or_default().to_string(),
                    description: parts.next().unwrap_or_default().to_string(),
                };
                self.farmer.register(&form).await;
            }
            FarmerCommand::Continue => {
                self.farmer.continue_to_dashboard().await;
            }
            FarmerCommand::Refresh => {
                self.farmer.refresh().await;
            }
            FarmerCommand::Batch {
                product_type,
                quantity,
                unit,
                product_name,
            } => {
                let form = BatchForm {
                    batch_id: self.farmer.suggest_batch_id(&product_type),
                    product_type,
                    product_name,
                    quantity,
                    unit,
                };
                self.farmer.create_batch(&form).await;
            }
            FarmerCommand::Dismiss => {
                self.farmer.dismiss_created();
            }
            FarmerCommand::Logout => {
                self.farmer.logout();
            }
        }
    }

    pub fn render(&self) -> String {
        match self.role {
            Role::Customer => render_customer(self.customer.router(), &self.explorer),
            Role::Restaurant => render_restaurant(self.restaurant.router()),
            Role::Farmer => render_farmer(self.farmer.router(), &self.explorer),
        }
    }
}

fn notice_line(out: &mut String, notice: Option<&crate::error::Notice>) {
    if let Some(n) = notice {
        let _ = writeln!(out, "  ! {n}");
    }
}

fn tx_line(out: &mut String, explorer: &str, hash: Option<&str>) {
    if let Some(hash) = hash.filter(|h| !h.is_empty()) {
        let _ = writeln!(out, "  tx: {}", explorer_tx_url(explorer, hash));
    }
}

pub fn render_customer(router: &CustomerRouter, explorer: &str) -> String {
    let mut out = String::new();
    if let Some(user) = router.session() {
        let _ = writeln!(out, "[signed in as {}]", user.principal.label());
    }

    match router.view() {
        CustomerView::Unauthenticated { form, error } => {
            let _ = writeln!(
                out,
                "{}",
                match form {
                    AuthForm::Login => "Sign in to collect badges (login, or switch to register)",
                    AuthForm::Register => "Create an account (register, or switch to login)",
                }
            );
            notice_line(&mut out, error.as_ref());
        }
        CustomerView::Scanning { error } => {
            let _ = writeln!(out, "Scan a code: scan <code>  (badges to view collection)");
            notice_line(&mut out, error.as_ref());
        }
        CustomerView::FarmStory { batch_id, story } => match story {
            Load::Loading => {
                let _ = writeln!(out, "Loading {batch_id}...");
            }
            Load::Failed(n) => {
                let _ = writeln!(out, "Could not load {batch_id}");
                notice_line(&mut out, Some(n));
            }
            Load::Ready(panel) => {
                let b = &panel.batch;
                let _ = writeln!(out, "{} from {}", b.label(), b.farmer.name);
                if !b.farmer.location.is_empty() {
                    let _ = writeln!(out, "  location: {}", b.farmer.location);
                }
                if let Some(d) = &b.farmer.description {
                    let _ = writeln!(out, "  {d}");
                }
                if !b.farmer.certifications.is_empty() {
                    let _ = writeln!(out, "  certified: {}", b.farmer.certifications.join(", "));
                }
                if let Some(h) = b.harvest_date {
                    let _ = writeln!(out, "  harvested: {}", h.format("%Y-%m-%d"));
                }
                nearby_lines(&mut out, &panel.nearby);
                let _ = writeln!(out, "  (again to scan another)");
            }
        },
        CustomerView::ReceiptFlow { receipt_id, panel } => match panel {
            Load::Loading => {
                let _ = writeln!(out, "Loading receipt {receipt_id}...");
            }
            Load::Failed(n) => {
                let _ = writeln!(out, "Could not load receipt {receipt_id}");
                notice_line(&mut out, Some(n));
            }
            Load::Ready(panel) => {
                let r = &panel.receipt;
                let _ = writeln!(out, "Receipt {}", r.receipt_id);
                let _ = writeln!(out, "  {} at {}", r.product_name.as_deref().unwrap_or(&r.batch_id), r.restaurant_name);
                let _ = writeln!(out, "  farm: {}", r.farm_name);
                if let Some(at) = r.expires_at {
                    let _ = writeln!(out, "  expires: {}", at.format("%Y-%m-%d %H:%M UTC"));
                }
                let status = match (panel.claim, router.claim_action()) {
                    (ClaimState::Claimed, _) => "badge unlocked",
                    (ClaimState::AlreadyClaimed, _) => "already claimed",
                    (_, ClaimAction::Claiming) => "claiming...",
                    (_, ClaimAction::Expired) => "expired",
                    (_, ClaimAction::Enabled) => "ready (claim to unlock your badge)",
                    (_, ClaimAction::Hidden) => "unavailable",
                };
                let _ = writeln!(out, "  status: {status}");
                notice_line(&mut out, panel.notice.as_ref());
                nearby_lines(&mut out, &panel.nearby);
            }
        },
        CustomerView::BadgeCollection { badges, .. } => match badges {
            Load::Loading => {
                let _ = writeln!(out, "Loading badges...");
            }
            Load::Failed(n) => {
                let _ = writeln!(out, "Could not load badges");
                notice_line(&mut out, Some(n));
            }
            Load::Ready(summary) => {
                let _ = writeln!(
                    out,
                    "{} badge(s) from {} farm(s)",
                    summary.total, summary.distinct_farms
                );
                for badge in &summary.badges {
                    let _ = write!(out, "  * {} ({})", badge.farm_name, badge.batch_id);
                    if let Some(at) = badge.unlock_date {
                        let _ = write!(out, " {}", at.format("%Y-%m-%d"));
                    }
                    out.push('\n');
                }
                let _ = writeln!(out, "  (back to return)");
            }
        },
    }

    if let Some(c) = router.overlay() {
        let _ = writeln!(out, "*** Badge unlocked: {} ({}) ***", c.farm_name, c.batch_id);
        tx_line(&mut out, explorer, c.transaction_hash.as_deref());
        let _ = writeln!(out, "  (dismiss, or badges to view collection)");
    }
    out.trim_end().to_string()
}

fn nearby_lines(out: &mut String, nearby: &[farmpass_shared::models::NearbyRestaurant]) {
    if nearby.is_empty() {
        return;
    }
    let _ = writeln!(out, "  also served at:");
    for r in nearby {
        match &r.postcode {
            Some(pc) => {
                let _ = writeln!(out, "    - {} ({pc})", r.name);
            }
            None => {
                let _ = writeln!(out, "    - {}", r.name);
            }
        }
    }
}

pub fn render_restaurant(router: &RestaurantRouter) -> String {
    let mut out = String::new();
    match router.view() {
        RestaurantView::Login { error } => {
            let _ = writeln!(out, "Restaurant sign in (login, or switch to register)");
            notice_line(&mut out, error.as_ref());
        }
        RestaurantView::Register { error } => {
            let _ = writeln!(out, "Register a restaurant (register, or switch to login)");
            notice_line(&mut out, error.as_ref());
        }
        RestaurantView::ReceiptForm {
            batches,
            error,
            submitting,
            ..
        } => {
            let _ = writeln!(
                out,
                "{}: new receipt (receipt <batch-id> <amount>)",
                router.restaurant_name().unwrap_or("Restaurant")
            );
            match batches {
                Load::Loading => {
                    let _ = writeln!(out, "  loading batches...");
                }
                Load::Failed(n) => notice_line(&mut out, Some(n)),
                Load::Ready(list) if list.is_empty() => {
                    let _ = writeln!(out, "  no batches available");
                }
                Load::Ready(list) => {
                    for b in list {
                        let _ = writeln!(out, "  - {} {} ({})", b.batch_id, b.label(), b.farmer.name);
                    }
                }
            }
            if *submitting {
                let _ = writeln!(out, "  submitting...");
            }
            notice_line(&mut out, error.as_ref());
        }
        RestaurantView::ReceiptCreated { receipt } => {
            let _ = writeln!(out, "Receipt created: {}", receipt.receipt_id);
            let _ = writeln!(out, "  batch: {}  amount: {:.2}", receipt.batch_id, receipt.amount_paid);
            if let Some(at) = receipt.expires_at {
                let _ = writeln!(out, "  valid until: {}", at.format("%Y-%m-%d"));
            }
            let _ = writeln!(out, "  QR value: {}", receipt.receipt_id);
            let _ = writeln!(out, "  (another to create a new receipt)");
        }
    }
    out.trim_end().to_string()
}

pub fn render_farmer(router: &FarmerRouter, explorer: &str) -> String {
    let mut out = String::new();
    match router.view() {
        FarmerView::Login { error } => {
            let _ = writeln!(out, "Farmer sign in: signin <private-key>  (new to register a farm)");
            notice_line(&mut out, error.as_ref());
        }
        FarmerView::Register {
            generated_address,
            error,
        } => {
            let _ = writeln!(out, "Register a farm (generate for a new wallet)");
            if let (Some(addr), Some(draft)) = (generated_address, router.draft()) {
                let _ = writeln!(out, "  address: {addr}");
                let _ = writeln!(out, "  private key: {}", draft.private_key_hex());
                let _ = writeln!(out, "  store this key now; it is not shown again");
            }
            notice_line(&mut out, error.as_ref());
        }
        FarmerView::RegistrationSuccess { registration } => {
            let _ = writeln!(out, "Farm registered: {}", registration.farm_name);
            let _ = writeln!(out, "  address: {}", registration.farmer_address);
            tx_line(&mut out, explorer, registration.transaction_hash.as_deref());
            let _ = writeln!(out, "  (continue to open the dashboard)");
        }
        FarmerView::Dashboard {
            dashboard,
            created,
            error,
            ..
        } => {
            if let Some(c) = created {
                let _ = writeln!(out, "Batch created: {} ({})", c.batch_id, c.product_name);
                let _ = writeln!(out, "  QR value: {}", c.batch_id);
                tx_line(&mut out, explorer, c.transaction_hash.as_deref());
            }
            match dashboard {
                Load::Loading => {
                    let _ = writeln!(out, "Loading dashboard...");
                }
                Load::Failed(n) => {
                    let _ = writeln!(out, "Could not load dashboard");
                    notice_line(&mut out, Some(n));
                }
                Load::Ready(d) => {
                    let _ = writeln!(out, "{} ({})", d.farmer.farm_name, d.farmer.location);
                    let _ = writeln!(
                        out,
                        "  batches: {}  unlocks: {}  scans: {}",
                        d.batch_count(),
                        d.total_unlocks(),
                        d.total_scans()
                    );
                    for b in &d.batches {
                        let _ = writeln!(
                            out,
                            "  - {} {} {} {} ({} unlocks, {} scans)",
                            b.batch_id, b.product_name, b.quantity, b.unit, b.unlocks, b.scans
                        );
                    }
                }
            }
            notice_line(&mut out, error.as_ref());
        }
    }
    out.trim_end().to_string()
}
