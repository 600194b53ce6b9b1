//! Card catalogue and application backend.
//!
//! The tools talk to a [`CardBackend`]; [`InMemoryBackend`] keeps the
//! catalogue fixed at construction and applications in a map for the life
//! of the process.

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::info;

/// Days after which an open application needs a follow-up.
pub const STALE_AFTER_DAYS: i64 = 7;

/// A credit card offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: i64,
    pub bank_name: String,
    pub card_name: String,
    pub annual_fee: Decimal,
    pub signup_bonus: String,
    pub interest_rate: Decimal,
}

/// The catalogue shipped with the service.
pub fn default_catalog() -> Vec<Card> {
    vec![
        Card {
            id: 1,
            bank_name: "Chase Bank".into(),
            card_name: "Chase Sapphire Preferred".into(),
            annual_fee: Decimal::new(9500, 2),
            signup_bonus: "60,000 points after spending $4,000 in first 3 months".into(),
            interest_rate: Decimal::new(1599, 2),
        },
        Card {
            id: 2,
            bank_name: "American Express".into(),
            card_name: "Platinum Card".into(),
            annual_fee: Decimal::new(69500, 2),
            signup_bonus: "100,000 points after spending $6,000 in first 6 months".into(),
            interest_rate: Decimal::new(1999, 2),
        },
        Card {
            id: 3,
            bank_name: "Capital One".into(),
            card_name: "Venture X".into(),
            annual_fee: Decimal::new(39500, 2),
            signup_bonus: "75,000 miles after spending $4,000 in first 3 months".into(),
            interest_rate: Decimal::new(1699, 2),
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Still waiting for a decision.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::UnderReview)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted card application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
    pub customer_name: String,
    pub card_id: i64,
    pub card_name: String,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_decision_date: Option<NaiveDate>,
    pub salary: Decimal,
    pub birthday: NaiveDate,
    pub credit_score: u16,
    pub status_message: String,
    pub next_steps: String,
}

impl Application {
    /// Whole days since submission.
    pub fn processing_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.submitted_at).num_days().max(0)
    }

    /// Open and older than [`STALE_AFTER_DAYS`].
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.processing_days(now) > STALE_AFTER_DAYS
    }
}

/// Input for [`CardBackend::submit`].
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub name: String,
    pub surname: String,
    pub salary: Decimal,
    pub birthday: NaiveDate,
    pub card_id: i64,
    pub card_name: String,
}

/// Result of [`CardBackend::estimate_approval`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalEstimate {
    pub application_id: String,
    pub current_status: ApplicationStatus,
    pub days_processed: i64,
    pub estimated_days_remaining: i64,
    pub estimated_completion_date: NaiveDate,
    pub message: String,
}

/// Business-rule failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(i64),

    #[error("Cannot cancel application that is already {}", .0.as_str().to_lowercase())]
    NotCancellable(ApplicationStatus),

    #[error("{0}")]
    Validation(String),
}

/// Backend operations behind the card desk tools.
#[async_trait]
pub trait CardBackend: Send + Sync {
    async fn cards(&self) -> Vec<Card>;

    async fn card(&self, id: i64) -> Result<Card, BackendError>;

    async fn submit(&self, request: NewApplication) -> Result<Application, BackendError>;

    /// Applications for a customer, matched on full name and then first name.
    async fn customer_applications(&self, customer_name: &str) -> Vec<Application>;

    async fn application(&self, application_id: &str) -> Result<Application, BackendError>;

    async fn cancel(&self, application_id: &str) -> Result<Application, BackendError>;

    async fn estimate_approval(&self, application_id: &str)
    -> Result<ApprovalEstimate, BackendError>;

    /// Open applications processed for more than a week.
    async fn stale_applications(&self) -> Vec<Application>;
}

/// In-process backend.
pub struct InMemoryBackend {
    catalog: Vec<Card>,
    applications: RwLock<BTreeMap<String, Application>>,
}

impl InMemoryBackend {
    pub fn new(catalog: Vec<Card>) -> Self {
        Self {
            catalog,
            applications: RwLock::new(BTreeMap::new()),
        }
    }

    /// Store an application as-is, replacing one with the same id.
    pub async fn insert(&self, application: Application) {
        self.applications
            .write()
            .await
            .insert(application.application_id.clone(), application);
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

/// Rough credit score from the declared salary.
fn estimated_credit_score(salary: Decimal) -> u16 {
    if salary >= Decimal::from(100_000) {
        775
    } else if salary >= Decimal::from(75_000) {
        725
    } else if salary >= Decimal::from(50_000) {
        675
    } else {
        625
    }
}

fn first_name(full_name: &str) -> Option<&str> {
    full_name.split_whitespace().next()
}

#[async_trait]
impl CardBackend for InMemoryBackend {
    async fn cards(&self) -> Vec<Card> {
        self.catalog.clone()
    }

    async fn card(&self, id: i64) -> Result<Card, BackendError> {
        self.catalog
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(BackendError::CardNotFound(id))
    }

    async fn submit(&self, request: NewApplication) -> Result<Application, BackendError> {
        if request.salary <= Decimal::ZERO {
            return Err(BackendError::Validation(
                "Salary must be greater than 0".into(),
            ));
        }
        if request.name.trim().is_empty() {
            return Err(BackendError::Validation("Name is required".into()));
        }
        if request.surname.trim().is_empty() {
            return Err(BackendError::Validation("Surname is required".into()));
        }

        let now = Utc::now();
        let mut applications = self.applications.write().await;
        let application = Application {
            application_id: format!("APP-{:03}", applications.len() + 1),
            customer_name: format!("{} {}", request.name.trim(), request.surname.trim()),
            card_id: request.card_id,
            card_name: request.card_name,
            status: ApplicationStatus::Pending,
            submitted_at: now,
            estimated_decision_date: now.date_naive().checked_add_days(Days::new(7)),
            salary: request.salary,
            birthday: request.birthday,
            credit_score: estimated_credit_score(request.salary),
            status_message: "Application submitted successfully. Initial review in progress."
                .into(),
            next_steps: "We'll contact you within 7-10 business days with a decision.".into(),
        };

        info!(
            application = %application.application_id,
            card = %application.card_name,
            "Application submitted"
        );
        applications.insert(application.application_id.clone(), application.clone());
        Ok(application)
    }

    async fn customer_applications(&self, customer_name: &str) -> Vec<Application> {
        let wanted = customer_name.trim();
        let applications = self.applications.read().await;

        let exact: Vec<Application> = applications
            .values()
            .filter(|a| a.customer_name.eq_ignore_ascii_case(wanted))
            .cloned()
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        // Fall back to the first customer sharing the first name
        let Some(wanted_first) = first_name(wanted) else {
            return Vec::new();
        };
        let Some(matched) = applications
            .values()
            .find(|a| first_name(&a.customer_name).is_some_and(|f| f.eq_ignore_ascii_case(wanted_first)))
            .map(|a| a.customer_name.clone())
        else {
            return Vec::new();
        };
        applications
            .values()
            .filter(|a| a.customer_name == matched)
            .cloned()
            .collect()
    }

    async fn application(&self, application_id: &str) -> Result<Application, BackendError> {
        self.applications
            .read()
            .await
            .get(application_id.trim())
            .cloned()
            .ok_or_else(|| BackendError::ApplicationNotFound(application_id.to_string()))
    }

    async fn cancel(&self, application_id: &str) -> Result<Application, BackendError> {
        let mut applications = self.applications.write().await;
        let application = applications
            .get_mut(application_id.trim())
            .ok_or_else(|| BackendError::ApplicationNotFound(application_id.to_string()))?;

        match application.status {
            ApplicationStatus::Approved | ApplicationStatus::Rejected => {
                Err(BackendError::NotCancellable(application.status))
            }
            _ => {
                application.status = ApplicationStatus::Cancelled;
                application.status_message = "Application cancelled by customer request.".into();
                application.next_steps =
                    "No further action required. You may apply for a new card anytime.".into();
                info!(application = %application.application_id, "Application cancelled");
                Ok(application.clone())
            }
        }
    }

    async fn estimate_approval(
        &self,
        application_id: &str,
    ) -> Result<ApprovalEstimate, BackendError> {
        let application = self.application(application_id).await?;
        let now = Utc::now();
        let days = application.processing_days(now);

        let remaining = match application.status {
            ApplicationStatus::Pending => (7 - days).max(1),
            ApplicationStatus::UnderReview => (5 - days).max(1),
            _ => 0,
        };

        let today = now.date_naive();
        let completion = today
            .checked_add_days(Days::new(remaining as u64))
            .unwrap_or(today);
        let message = if remaining == 0 {
            "Application processing is complete.".to_string()
        } else {
            format!("Estimated {remaining} days remaining for decision.")
        };

        Ok(ApprovalEstimate {
            application_id: application.application_id,
            current_status: application.status,
            days_processed: days,
            estimated_days_remaining: remaining,
            estimated_completion_date: completion,
            message,
        })
    }

    async fn stale_applications(&self) -> Vec<Application> {
        let now = Utc::now();
        self.applications
            .read()
            .await
            .values()
            .filter(|a| a.is_stale(now))
            .cloned()
            .collect()
    }
}
