//! Wire models for the SAFERR REST API.
//!
//! - `LoginRequest`, `RegisterRequest`: authentication payloads
//! - `Brand`: the brand a user manages
//! - `Product`, `NewProduct`: products registered under a brand
//! - `SubscriptionPlan`, `BrandSubscription`: billing plan and usage
//! - `GeneratedCodes`: one-time verification codes
//! - Reporting types: `ProductDistribution`, `VerificationTrend`, `SuspiciousActivity`

pub mod auth;
pub mod brand;
pub mod codes;
pub mod product;
pub mod reporting;
pub mod subscription;

pub use auth::{LoginRequest, RegisterRequest};
pub use brand::Brand;
pub use codes::GeneratedCodes;
pub use product::{NewProduct, Product};
pub use reporting::{
    DailyVerificationCount, ProductDistribution, ProductVerificationCount, SuspiciousActivity,
    VerificationTrend,
};
pub use subscription::{BrandSubscription, PlanLimit, SubscriptionPlan, SubscriptionStatus};
