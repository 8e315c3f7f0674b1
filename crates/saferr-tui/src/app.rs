//! Application state management for the SAFERR console.
//!
//! This module contains the core `App` struct that owns UI state, the data
//! fetched for each page, the session store and background task coordination.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use saferr_core::api::{default_trend_window, ApiClient, ApiError, DEFAULT_SUSPICIOUS_LIMIT, MAX_CODES_PER_REQUEST};
use saferr_core::auth::{GuardState, RouteGuard, Session, SessionStore};
use saferr_core::config::Config;
use saferr_core::models::{
    Brand, BrandSubscription, NewProduct, Product, ProductDistribution, SuspiciousActivity,
    VerificationTrend,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for email and brand name input
const MAX_FIELD_LENGTH: usize = 100;

/// Maximum lengths for the new product form
const MAX_PRODUCT_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 500;
const MAX_IDENTIFIER_LENGTH: usize = 50;

/// Digits allowed in the code count field (10000 is five)
const MAX_COUNT_DIGITS: usize = 5;

/// Step used by +/- on the suspicious activity page
const SUSPICIOUS_LIMIT_STEP: u32 = 5;

/// Largest suspicious activity limit the page will request
const MAX_SUSPICIOUS_LIMIT: u32 = 100;

/// Number of items to scroll on page up/down
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Protected pages of the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Brand,
    Products,
    Codes,
    Trends,
    Suspicious,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Dashboard,
        Page::Brand,
        Page::Products,
        Page::Codes,
        Page::Trends,
        Page::Suspicious,
    ];

    /// Get the display title for this page.
    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Brand => "Brand",
            Page::Products => "Products",
            Page::Codes => "Codes",
            Page::Trends => "Trends",
            Page::Suspicious => "Suspicious",
        }
    }

    /// Page bound to a number key ('1'..='6')
    pub fn from_digit(c: char) -> Option<Self> {
        let index = c.to_digit(10)?.checked_sub(1)? as usize;
        Self::ALL.get(index).copied()
    }

    /// Get the next page (wrapping around)
    pub fn next(&self) -> Self {
        let i = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// Get the previous page (wrapping around)
    pub fn prev(&self) -> Self {
        let i = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    EnteringCount,
    CreatingProduct,
    ConfirmingQuit,
    Quitting,
}

/// Which form the login overlay shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    SignIn,
    Register,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Email,
    Password,
    BrandName,
    Button,
}

impl LoginFocus {
    fn fields(mode: LoginMode) -> &'static [LoginFocus] {
        match mode {
            LoginMode::SignIn => &[LoginFocus::Username, LoginFocus::Password, LoginFocus::Button],
            LoginMode::Register => &[
                LoginFocus::Username,
                LoginFocus::Email,
                LoginFocus::Password,
                LoginFocus::BrandName,
                LoginFocus::Button,
            ],
        }
    }

    /// Next field in `mode` (wrapping around)
    pub fn next(self, mode: LoginMode) -> Self {
        let fields = Self::fields(mode);
        let i = fields.iter().position(|f| *f == self).unwrap_or(0);
        fields[(i + 1) % fields.len()]
    }

    /// Previous field in `mode` (wrapping around)
    pub fn prev(self, mode: LoginMode) -> Self {
        let fields = Self::fields(mode);
        let i = fields.iter().position(|f| *f == self).unwrap_or(0);
        fields[(i + fields.len() - 1) % fields.len()]
    }
}

/// New product form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Name,
    Description,
    Identifier,
    Button,
}

impl ProductField {
    const ORDER: [ProductField; 4] = [
        ProductField::Name,
        ProductField::Description,
        ProductField::Identifier,
        ProductField::Button,
    ];

    pub fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// A product as the server currently has it, with the brand that owns it
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub brand: Option<Brand>,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Data fetched by a background task.
///
/// Sent through an MPSC channel back to the main loop, which applies it.
enum FetchResult {
    /// My brand plus its current subscription (if any)
    Brand(Brand, Option<BrandSubscription>),
    Products(Vec<Product>),
    Distribution(ProductDistribution),
    Trend(VerificationTrend),
    Suspicious(Vec<SuspiciousActivity>),
    /// Full record of one product plus its owning brand
    Detail(ProductDetail),
    /// Codes generated for a product (product_id, codes)
    Codes(String, Vec<String>),
    /// A product was created
    Created(Product),
    /// A fetch failed; the message is shown in the status bar
    Error(String),
}

impl FetchResult {
    /// Results that only make sense for the page that requested them
    fn is_page_scoped(&self) -> bool {
        !matches!(
            self,
            FetchResult::Codes(..) | FetchResult::Created(_) | FetchResult::Error(_)
        )
    }
}

/// A result tagged with the request generation it belongs to
struct Fetched {
    epoch: u64,
    generation: u64,
    result: FetchResult,
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub store: SessionStore,
    guard: RouteGuard,

    // UI State
    pub state: AppState,
    pub current_page: Page,

    // Login form state
    pub login_mode: LoginMode,
    pub login_username: String,
    pub login_email: String,
    pub login_password: String,
    pub login_brand_name: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Selection indices
    pub product_selection: usize,
    pub suspicious_selection: usize,
    pub code_scroll: usize,

    // Page data
    pub brand: Option<Brand>,
    pub subscription: Option<BrandSubscription>,
    pub products: Vec<Product>,
    pub distribution: Option<ProductDistribution>,
    pub trend: Option<VerificationTrend>,
    pub trend_window: (NaiveDate, NaiveDate),
    pub suspicious: Vec<SuspiciousActivity>,
    pub suspicious_limit: u32,

    // Product detail and the new product form
    pub product_detail: Option<ProductDetail>,
    pub product_field: ProductField,
    pub new_product_name: String,
    pub new_product_description: String,
    pub new_product_identifier: String,
    pub product_form_error: Option<String>,

    // Code generation
    pub code_count_input: String,
    pub generated_codes: Vec<String>,
    pub generated_for: Option<String>,

    // Background task channel
    fetch_rx: mpsc::Receiver<Fetched>,
    fetch_tx: mpsc::Sender<Fetched>,
    /// Bumped on every page switch; page-scoped results from older generations are dropped
    generation: u64,
    /// Bumped on sign-in and sign-out; all results from older epochs are dropped
    epoch: u64,
    in_flight: usize,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance around an initialized session store
    pub fn new(config: Config, store: SessionStore) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let guard = store.guard();

        let login_username = std::env::var("SAFERR_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();

        Self {
            config,
            store,
            guard,

            state: AppState::Normal,
            current_page: Page::Dashboard,

            login_mode: LoginMode::SignIn,
            login_username,
            login_email: String::new(),
            login_password: String::new(),
            login_brand_name: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,

            product_selection: 0,
            suspicious_selection: 0,
            code_scroll: 0,

            brand: None,
            subscription: None,
            products: Vec::new(),
            distribution: None,
            trend: None,
            trend_window: default_trend_window(Local::now().date_naive()),
            suspicious: Vec::new(),
            suspicious_limit: DEFAULT_SUSPICIOUS_LIMIT,

            product_detail: None,
            product_field: ProductField::Name,
            new_product_name: String::new(),
            new_product_description: String::new(),
            new_product_identifier: String::new(),
            product_form_error: None,

            code_count_input: String::new(),
            generated_codes: Vec::new(),
            generated_for: None,

            fetch_rx: rx,
            fetch_tx: tx,
            generation: 0,
            epoch: 0,
            in_flight: 0,

            status_message: None,
        }
    }

    fn api(&self) -> Arc<ApiClient> {
        Arc::clone(self.store.api())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn session(&self) -> Option<Session> {
        self.store.session()
    }

    /// Show the login overlay whenever the guard says the user is signed out.
    /// Covers logout, a 401 from any call, and a session expiring in place.
    pub fn sync_auth(&mut self) {
        if self.guard.state() != GuardState::Unauthenticated {
            return;
        }
        if matches!(self.state, AppState::LoggingIn | AppState::Quitting) {
            return;
        }
        if self.brand.is_some() || !self.products.is_empty() {
            info!("Session ended - returning to login");
            self.status_message = Some("Session ended. Please sign in again.".to_string());
        }
        // Fetches still in flight belong to the session that just ended
        self.epoch += 1;
        self.reset_data();
        self.start_login();
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() || self.login_mode == LoginMode::Register {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = self.store.last_error().filter(|_| self.login_mode == LoginMode::SignIn);
    }

    /// Switch the overlay between sign-in and registration
    pub fn toggle_login_mode(&mut self) {
        self.login_mode = match self.login_mode {
            LoginMode::SignIn => LoginMode::Register,
            LoginMode::Register => LoginMode::SignIn,
        };
        self.login_focus = LoginFocus::Username;
        self.login_error = None;
    }

    /// Submit the login or registration form
    pub async fn submit_login(&mut self) {
        if let Some(message) = self.validate_login_form() {
            self.login_error = Some(message);
            return;
        }
        self.login_error = None;

        let ok = match self.login_mode {
            LoginMode::SignIn => {
                self.store
                    .login(self.login_username.trim(), &self.login_password)
                    .await
            }
            LoginMode::Register => {
                self.store
                    .register(
                        self.login_username.trim(),
                        self.login_email.trim(),
                        &self.login_password,
                        self.login_brand_name.trim(),
                    )
                    .await
            }
        };

        if !ok {
            self.login_error = self.store.last_error();
            return;
        }

        self.login_password.clear();
        self.config.last_username = Some(self.login_username.trim().to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.epoch += 1;
        self.state = AppState::Normal;
        self.login_mode = LoginMode::SignIn;
        self.status_message = self
            .session()
            .map(|s| format!("Signed in as {} ({})", s.username, s.brand_name));
        self.refresh_current_page();
    }

    fn validate_login_form(&self) -> Option<String> {
        if self.login_username.trim().is_empty() || self.login_password.is_empty() {
            return Some("Username and password required".to_string());
        }
        if self.login_mode == LoginMode::Register {
            if !self.login_email.contains('@') {
                return Some("A valid email is required".to_string());
            }
            if self.login_brand_name.trim().is_empty() {
                return Some("Brand name required".to_string());
            }
        }
        None
    }

    /// Sign out and drop everything fetched for the previous session
    pub fn logout(&mut self) {
        self.store.logout();
        self.epoch += 1;
        self.reset_data();
        self.status_message = Some("Signed out".to_string());
    }

    fn reset_data(&mut self) {
        self.brand = None;
        self.subscription = None;
        self.products.clear();
        self.product_detail = None;
        self.distribution = None;
        self.trend = None;
        self.suspicious.clear();
        self.generated_codes.clear();
        self.generated_for = None;
        self.code_count_input.clear();
        self.product_selection = 0;
        self.suspicious_selection = 0;
        self.code_scroll = 0;
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn switch_page(&mut self, page: Page) {
        if page == self.current_page {
            return;
        }
        self.current_page = page;
        self.generation += 1;
        self.refresh_current_page();
    }

    pub fn select_next(&mut self, step: usize) {
        match self.current_page {
            Page::Products | Page::Codes => {
                self.product_selection = clamp_index(self.product_selection + step, self.products.len());
            }
            Page::Suspicious => {
                self.suspicious_selection =
                    clamp_index(self.suspicious_selection + step, self.suspicious.len());
            }
            _ => {}
        }
    }

    pub fn select_prev(&mut self, step: usize) {
        match self.current_page {
            Page::Products | Page::Codes => {
                self.product_selection = self.product_selection.saturating_sub(step);
            }
            Page::Suspicious => {
                self.suspicious_selection = self.suspicious_selection.saturating_sub(step);
            }
            _ => {}
        }
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.products.get(self.product_selection)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    // =========================================================================
    // Background Fetching
    // =========================================================================

    /// Spawn a task that fetches what the current page shows
    pub fn refresh_current_page(&mut self) {
        let brand_id = match self.session() {
            Some(s) if self.guard.state() == GuardState::Authenticated => s.brand_id,
            _ => {
                debug!("Not signed in; skipping refresh");
                return;
            }
        };

        let page = self.current_page;
        let window = self.trend_window;
        let limit = self.suspicious_limit;
        let api = self.api();

        self.spawn(async move {
            match page {
                Page::Dashboard => to_result("Distribution", api.fetch_product_distribution().await, FetchResult::Distribution),
                Page::Brand => fetch_brand(&api, &brand_id).await,
                Page::Products | Page::Codes => {
                    to_result("Products", api.fetch_brand_products(&brand_id).await, FetchResult::Products)
                }
                Page::Trends => {
                    to_result("Trends", api.fetch_verification_trends(window.0, window.1).await, FetchResult::Trend)
                }
                Page::Suspicious => {
                    to_result("Suspicious activity", api.fetch_suspicious_activity(limit).await, FetchResult::Suspicious)
                }
            }
        });

        self.status_message = Some(format!("Loading {}...", page.title()));
    }

    /// Generate codes for the selected product using the count field
    pub fn generate_codes(&mut self) {
        let product = match self.selected_product() {
            Some(p) => p.clone(),
            None => {
                self.status_message = Some("Select a product first".to_string());
                return;
            }
        };

        let count = match parse_code_count(&self.code_count_input) {
            Ok(count) => count,
            Err(message) => {
                self.status_message = Some(message);
                return;
            }
        };

        let api = self.api();
        let product_id = product.id.clone();
        self.spawn(async move {
            match api.generate_codes(&product_id, count).await {
                Ok(codes) => FetchResult::Codes(product_id, codes),
                Err(e) => fetch_error("Code generation", &e),
            }
        });

        self.state = AppState::Normal;
        self.status_message = Some(format!("Generating {} codes for {}...", count, product.name));
    }

    /// Load the server's copy of the selected product and its brand
    pub fn load_product_detail(&mut self) {
        let product = match self.selected_product() {
            Some(p) => p.clone(),
            None => return,
        };

        let api = self.api();
        let (product_id, brand_id) = (product.id.clone(), product.brand_id.clone());
        self.spawn(async move {
            let (fetched, brand) =
                futures::future::join(api.fetch_product(&product_id), api.fetch_brand(&brand_id)).await;

            let product = match fetched {
                Ok(product) => product,
                Err(e) => return fetch_error("Product", &e),
            };
            let brand = match brand {
                Ok(brand) => Some(brand),
                Err(e) => {
                    warn!(error = %e, "Brand fetch for product failed");
                    None
                }
            };
            FetchResult::Detail(ProductDetail { product, brand })
        });

        self.status_message = Some(format!("Loading {}...", product.name));
    }

    /// Open the new product form with empty fields
    pub fn start_create_product(&mut self) {
        self.new_product_name.clear();
        self.new_product_description.clear();
        self.new_product_identifier.clear();
        self.product_field = ProductField::Name;
        self.product_form_error = None;
        self.state = AppState::CreatingProduct;
    }

    /// Submit the new product form under the signed-in brand
    pub fn submit_product(&mut self) {
        let name = self.new_product_name.trim();
        if name.is_empty() {
            self.product_form_error = Some("Product name required".to_string());
            self.product_field = ProductField::Name;
            return;
        }
        let brand_id = match self.session() {
            Some(s) => s.brand_id,
            None => {
                self.product_form_error =
                    Some("Cannot create product: your brand information is missing".to_string());
                return;
            }
        };

        let product = NewProduct::new(brand_id, name)
            .with_description(self.new_product_description.trim())
            .with_identifier(self.new_product_identifier.trim());
        let api = self.api();
        self.status_message = Some(format!("Creating {}...", product.name));
        self.spawn(async move {
            match api.create_product(&product).await {
                Ok(created) => FetchResult::Created(created),
                Err(e) => fetch_error("Create product", &e),
            }
        });

        self.product_form_error = None;
        self.state = AppState::Normal;
    }

    pub fn adjust_suspicious_limit(&mut self, increase: bool) {
        let limit = if increase {
            self.suspicious_limit.saturating_add(SUSPICIOUS_LIMIT_STEP)
        } else {
            self.suspicious_limit.saturating_sub(SUSPICIOUS_LIMIT_STEP)
        };
        let limit = limit.clamp(SUSPICIOUS_LIMIT_STEP, MAX_SUSPICIOUS_LIMIT);
        if limit != self.suspicious_limit {
            self.suspicious_limit = limit;
            self.generation += 1;
            self.refresh_current_page();
        }
    }

    /// Shift the trend window by whole windows; never past today
    pub fn shift_trend_window(&mut self, back: bool) {
        let (start, end) = self.trend_window;
        let span = end - start;
        let today = Local::now().date_naive();
        let new_end = if back { start } else { (end + span).min(today) };
        if new_end == end {
            return;
        }
        self.trend_window = (new_end - span, new_end);
        self.generation += 1;
        self.refresh_current_page();
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = FetchResult> + Send + 'static,
    {
        let tx = self.fetch_tx.clone();
        let epoch = self.epoch;
        let generation = self.generation;
        self.in_flight += 1;

        tokio::spawn(async move {
            let result = task.await;
            if let Err(e) = tx.send(Fetched { epoch, generation, result }).await {
                error!(error = %e, "Failed to send fetch result - channel closed");
            }
        });
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(fetched) = self.fetch_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.process_fetch_result(fetched);
        }
    }

    fn process_fetch_result(&mut self, fetched: Fetched) {
        if fetched.epoch != self.epoch {
            debug!("Dropping result from a previous session");
            return;
        }
        if fetched.result.is_page_scoped() && fetched.generation != self.generation {
            debug!("Dropping stale page result");
            return;
        }

        match fetched.result {
            FetchResult::Brand(brand, subscription) => {
                self.brand = Some(brand);
                self.subscription = subscription;
                self.status_message = None;
            }
            FetchResult::Products(products) => {
                self.product_selection = clamp_index(self.product_selection, products.len());
                self.status_message = Some(format!("{} products", products.len()));
                self.products = products;
            }
            FetchResult::Distribution(distribution) => {
                self.distribution = Some(distribution);
                self.status_message = None;
            }
            FetchResult::Trend(trend) => {
                self.trend = Some(trend);
                self.status_message = None;
            }
            FetchResult::Suspicious(items) => {
                self.suspicious_selection = clamp_index(self.suspicious_selection, items.len());
                self.suspicious = items;
                self.status_message = None;
            }
            FetchResult::Detail(detail) => {
                self.status_message = None;
                self.product_detail = Some(detail);
            }
            FetchResult::Created(product) => {
                info!(product = %product.name, "Product created");
                self.status_message = Some(format!("Created product {}", product.name));
                self.products.push(product);
                self.product_selection = self.products.len() - 1;
            }
            FetchResult::Codes(product_id, codes) => {
                self.status_message = Some(format!("Generated {} codes", codes.len()));
                self.generated_codes = codes;
                self.generated_for = Some(product_id);
                self.code_scroll = 0;
            }
            FetchResult::Error(message) => {
                self.status_message = Some(message);
            }
        }
    }
}

/// My brand and its subscription, fetched concurrently
async fn fetch_brand(api: &ApiClient, brand_id: &str) -> FetchResult {
    let (brand, subscription) = futures::future::join(
        api.fetch_my_brand(),
        api.fetch_current_subscription(brand_id),
    )
    .await;

    let brand = match brand {
        Ok(brand) => brand,
        Err(e) => return fetch_error("Brand", &e),
    };
    match subscription {
        Ok(subscription) => FetchResult::Brand(brand, subscription),
        Err(e) => {
            warn!(error = %e, "Subscription fetch failed");
            FetchResult::Brand(brand, None)
        }
    }
}

fn to_result<T>(name: &str, result: Result<T, ApiError>, wrapper: impl FnOnce(T) -> FetchResult) -> FetchResult {
    match result {
        Ok(data) => {
            debug!("{} fetched successfully", name);
            wrapper(data)
        }
        Err(e) => fetch_error(name, &e),
    }
}

fn fetch_error(name: &str, err: &ApiError) -> FetchResult {
    error!(error = %err, "{} fetch failed", name);
    FetchResult::Error(format!("{}: {}", name, err.user_message()))
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

/// Parse the code count field, enforcing the per-request bounds
pub fn parse_code_count(input: &str) -> Result<u32, String> {
    let count: u32 = input
        .trim()
        .parse()
        .map_err(|_| "Enter a number of codes".to_string())?;
    if count == 0 || count > MAX_CODES_PER_REQUEST {
        return Err(format!("Count must be between 1 and {}", MAX_CODES_PER_REQUEST));
    }
    Ok(count)
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a character can be added to the focused login field
pub fn can_add_login_char(focus: LoginFocus, current_len: usize, c: char) -> bool {
    let max = match focus {
        LoginFocus::Username => MAX_USERNAME_LENGTH,
        LoginFocus::Password => MAX_PASSWORD_LENGTH,
        LoginFocus::Email | LoginFocus::BrandName => MAX_FIELD_LENGTH,
        LoginFocus::Button => return false,
    };
    current_len < max && is_valid_input_char(c)
}

/// Check if a character can be added to the focused new product field
pub fn can_add_product_char(field: ProductField, current_len: usize, c: char) -> bool {
    let max = match field {
        ProductField::Name => MAX_PRODUCT_NAME_LENGTH,
        ProductField::Description => MAX_DESCRIPTION_LENGTH,
        ProductField::Identifier => MAX_IDENTIFIER_LENGTH,
        ProductField::Button => return false,
    };
    current_len < max && is_valid_input_char(c)
}

/// Check if a digit can be added to the code count field
pub fn can_add_count_char(current_len: usize, c: char) -> bool {
    current_len < MAX_COUNT_DIGITS && c.is_ascii_digit()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
impl App {
    /// App over an in-memory session record and a server that never answers
    pub(crate) fn for_tests() -> Self {
        use saferr_core::storage::{MemoryStore, SessionStorage};

        let storage = SessionStorage::new(Arc::new(MemoryStore::new()));
        let api = ApiClient::new("http://127.0.0.1:9/api", std::time::Duration::from_secs(1), storage)
            .unwrap();
        App::new(Config::default(), SessionStore::new(Arc::new(api)))
    }

    /// Finish the startup check with `session` restored
    pub(crate) fn restore_session(&self, session: Session) {
        self.store.api().auth_state().finish_initializing(Some(session));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn session(username: &str) -> Session {
        Session {
            token: format!("{}-token", username),
            expiration: Utc::now() + Duration::hours(1),
            user_id: "u1".to_string(),
            username: username.to_string(),
            brand_id: "5f0c1a2b-0000-4000-8000-000000000001".to_string(),
            brand_name: "Acme".to_string(),
        }
    }

    fn product(name: &str) -> Product {
        Product {
            id: format!("{}-id", name),
            name: name.to_string(),
            description: None,
            identifier: None,
            brand_id: "5f0c1a2b-0000-4000-8000-000000000001".to_string(),
        }
    }

    /// Deliver a result as if a task spawned now had finished
    fn deliver(app: &mut App, fetched: Fetched) {
        app.fetch_tx.try_send(fetched).unwrap();
        app.in_flight += 1;
        app.check_background_tasks();
    }

    fn tagged(app: &App, result: FetchResult) -> Fetched {
        Fetched {
            epoch: app.epoch,
            generation: app.generation,
            result,
        }
    }

    #[test]
    fn test_results_from_torn_down_session_are_dropped() {
        let mut app = App::for_tests();
        app.restore_session(session("alice"));
        app.sync_auth();
        assert_eq!(app.state, AppState::Normal);

        let products = tagged(&app, FetchResult::Products(vec![product("alice-secret")]));
        let codes = tagged(&app, FetchResult::Codes("p1".to_string(), vec!["C1".to_string()]));

        // A 401 clears the shared session while both fetches are in flight
        app.store.api().auth_state().clear_session();
        app.sync_auth();
        assert_eq!(app.state, AppState::LoggingIn);

        deliver(&mut app, products);
        deliver(&mut app, codes);
        assert!(app.products.is_empty());
        assert!(app.generated_codes.is_empty());
        assert!(!app.is_loading());
    }

    #[test]
    fn test_results_for_live_session_are_applied() {
        let mut app = App::for_tests();
        app.restore_session(session("alice"));

        let fetched = tagged(&app, FetchResult::Products(vec![product("serum")]));
        deliver(&mut app, fetched);
        assert_eq!(app.products.len(), 1);
    }

    #[test]
    fn test_page_results_dropped_after_page_switch() {
        let mut app = App::for_tests();
        app.current_page = Page::Products;
        let detail = tagged(
            &app,
            FetchResult::Detail(ProductDetail {
                product: product("serum"),
                brand: None,
            }),
        );
        let created = tagged(&app, FetchResult::Created(product("balm")));

        // Not signed in, so the switch spawns nothing
        app.switch_page(Page::Codes);

        deliver(&mut app, detail);
        assert!(app.product_detail.is_none());
        // Creation is not tied to the page that started it
        deliver(&mut app, created);
        assert_eq!(app.products.len(), 1);
    }

    #[test]
    fn test_created_product_is_appended_and_selected() {
        let mut app = App::for_tests();
        app.products = vec![product("serum"), product("toner")];
        let fetched = tagged(&app, FetchResult::Created(product("balm")));
        deliver(&mut app, fetched);

        assert_eq!(app.products.len(), 3);
        assert_eq!(app.selected_product().map(|p| p.name.as_str()), Some("balm"));
        assert_eq!(app.status_message.as_deref(), Some("Created product balm"));
    }

    #[test]
    fn test_submit_product_requires_name() {
        let mut app = App::for_tests();
        app.restore_session(session("alice"));
        app.start_create_product();
        app.new_product_name = "   ".to_string();
        app.product_field = ProductField::Button;

        app.submit_product();
        assert_eq!(app.state, AppState::CreatingProduct);
        assert_eq!(app.product_form_error.as_deref(), Some("Product name required"));
        assert_eq!(app.product_field, ProductField::Name);
        assert!(!app.is_loading());
    }

    #[test]
    fn test_submit_product_needs_a_session() {
        let mut app = App::for_tests();
        app.start_create_product();
        app.new_product_name = "Serum".to_string();

        app.submit_product();
        assert_eq!(app.state, AppState::CreatingProduct);
        assert!(app.product_form_error.is_some());
        assert!(!app.is_loading());
    }

    #[test]
    fn test_logout_clears_product_detail() {
        let mut app = App::for_tests();
        app.restore_session(session("alice"));
        app.product_detail = Some(ProductDetail {
            product: product("serum"),
            brand: None,
        });
        app.logout();
        assert!(app.product_detail.is_none());
        assert!(app.session().is_none());
    }

    #[test]
    fn test_product_field_cycles() {
        assert_eq!(ProductField::Name.next(), ProductField::Description);
        assert_eq!(ProductField::Button.next(), ProductField::Name);
        assert_eq!(ProductField::Name.prev(), ProductField::Button);
    }

    #[test]
    fn test_can_add_product_char() {
        assert!(can_add_product_char(ProductField::Name, 0, 'S'));
        assert!(!can_add_product_char(ProductField::Name, 100, 'S'));
        assert!(can_add_product_char(ProductField::Description, 499, ' '));
        assert!(!can_add_product_char(ProductField::Identifier, 50, '9'));
        assert!(!can_add_product_char(ProductField::Identifier, 0, '\t'));
        assert!(!can_add_product_char(ProductField::Button, 0, 'a'));
    }

    #[test]
    fn test_page_from_digit() {
        assert_eq!(Page::from_digit('1'), Some(Page::Dashboard));
        assert_eq!(Page::from_digit('4'), Some(Page::Codes));
        assert_eq!(Page::from_digit('6'), Some(Page::Suspicious));
        assert_eq!(Page::from_digit('0'), None);
        assert_eq!(Page::from_digit('7'), None);
        assert_eq!(Page::from_digit('x'), None);
    }

    #[test]
    fn test_page_next_prev_wrap() {
        assert_eq!(Page::Dashboard.next(), Page::Brand);
        assert_eq!(Page::Suspicious.next(), Page::Dashboard);
        assert_eq!(Page::Dashboard.prev(), Page::Suspicious);
        assert_eq!(Page::Trends.prev(), Page::Codes);
    }

    #[test]
    fn test_login_focus_cycles_per_mode() {
        assert_eq!(LoginFocus::Username.next(LoginMode::SignIn), LoginFocus::Password);
        assert_eq!(LoginFocus::Button.next(LoginMode::SignIn), LoginFocus::Username);
        assert_eq!(LoginFocus::Username.next(LoginMode::Register), LoginFocus::Email);
        assert_eq!(LoginFocus::Password.next(LoginMode::Register), LoginFocus::BrandName);
        assert_eq!(LoginFocus::Username.prev(LoginMode::Register), LoginFocus::Button);
    }

    #[test]
    fn test_parse_code_count() {
        assert_eq!(parse_code_count("25"), Ok(25));
        assert_eq!(parse_code_count(" 10000 "), Ok(10_000));
        assert!(parse_code_count("0").is_err());
        assert!(parse_code_count("10001").is_err());
        assert!(parse_code_count("").is_err());
        assert!(parse_code_count("abc").is_err());
    }

    #[test]
    fn test_can_add_login_char() {
        assert!(can_add_login_char(LoginFocus::Username, 0, 'a'));
        assert!(!can_add_login_char(LoginFocus::Username, 50, 'a'));
        assert!(can_add_login_char(LoginFocus::Password, 127, '!'));
        assert!(!can_add_login_char(LoginFocus::Password, 128, 'a'));
        assert!(!can_add_login_char(LoginFocus::Email, 0, '\n'));
        assert!(!can_add_login_char(LoginFocus::Button, 0, 'a'));
    }

    #[test]
    fn test_can_add_count_char() {
        assert!(can_add_count_char(0, '7'));
        assert!(!can_add_count_char(0, 'x'));
        assert!(!can_add_count_char(5, '1'));
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(3, 10), 3);
        assert_eq!(clamp_index(12, 10), 9);
        assert_eq!(clamp_index(4, 0), 0);
    }
}
