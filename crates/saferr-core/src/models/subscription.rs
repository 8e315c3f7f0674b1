use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plans use -1 for "no limit"
const UNLIMITED: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanLimit {
    Unlimited,
    Limited(u64),
}

impl PlanLimit {
    fn from_raw(raw: i64) -> Self {
        if raw == UNLIMITED || raw < 0 {
            PlanLimit::Unlimited
        } else {
            PlanLimit::Limited(raw as u64)
        }
    }

    pub fn display(&self) -> String {
        match self {
            PlanLimit::Unlimited => "Unlimited".to_string(),
            PlanLimit::Limited(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SubscriptionPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub max_codes_per_month: i64,
    pub max_verifications_per_month: i64,
    pub is_active: bool,
}

impl SubscriptionPlan {
    pub fn code_limit(&self) -> PlanLimit {
        PlanLimit::from_raw(self.max_codes_per_month)
    }

    pub fn verification_limit(&self) -> PlanLimit {
        PlanLimit::from_raw(self.max_verifications_per_month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
    Suspended,
}

impl SubscriptionStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Expired => "Expired",
            SubscriptionStatus::Cancelled => "Cancelled",
            SubscriptionStatus::Suspended => "Suspended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BrandSubscription {
    pub id: String,
    pub brand_id: String,
    pub subscription_plan_id: String,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub status: SubscriptionStatus,
    pub amount_paid: f64,
    #[serde(default)]
    pub payment_reference: Option<String>,
    pub codes_generated: u64,
    pub verifications_received: u64,
    /// Included by the backend for convenience
    #[serde(default)]
    pub subscription_plan: Option<SubscriptionPlan>,
}

impl BrandSubscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn plan_name(&self) -> &str {
        self.subscription_plan
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown plan")
    }

    /// Codes that can still be generated this month; `None` when unlimited or
    /// the plan is not included in the response
    pub fn remaining_codes(&self) -> Option<u64> {
        match self.subscription_plan.as_ref()?.code_limit() {
            PlanLimit::Unlimited => None,
            PlanLimit::Limited(max) => Some(max.saturating_sub(self.codes_generated)),
        }
    }
}
