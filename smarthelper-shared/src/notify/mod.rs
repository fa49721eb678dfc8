/// Outbound webhook notifications
///
/// Email delivery is handled by an external automation platform; the API
/// only posts JSON payloads to its webhook URLs. Notifications are
/// best-effort and fire-and-forget: a delivery failure is logged and
/// never fails the request that triggered it.
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

/// Shared HTTP client plus the configured webhook endpoints
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,

    /// Welcome-email webhook; None disables registration notifications
    registration_url: Option<String>,

    /// Application-decision webhook; None disables decision notifications
    application_url: Option<String>,
}

/// Payload for the welcome email sent after registration
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationNotice {
    /// New user's display name
    pub name: String,

    /// New user's email address
    pub email: String,
}

/// Payload for an application decision email
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDecisionNotice {
    /// Helper's email address (delivery target)
    pub helper_email: String,

    /// Helper's display name
    pub helper_name: String,

    /// Deciding family's display name
    pub family_name: String,

    /// Job title
    pub job_title: String,

    /// Job location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_location: Option<String>,

    /// Job scheduled date (accepted decisions only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_date: Option<String>,

    /// Job scheduled time (accepted decisions only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_time: Option<String>,

    /// Hourly rate (accepted decisions only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_per_hour: Option<i64>,

    /// "accepted" or "rejected"
    pub status: String,

    /// Email subject line
    pub subject: String,

    /// Email body
    pub message: String,
}

impl Notifier {
    /// Creates a notifier sharing the given HTTP client
    pub fn new(
        client: reqwest::Client,
        registration_url: Option<String>,
        application_url: Option<String>,
    ) -> Self {
        Self {
            client,
            registration_url,
            application_url,
        }
    }

    /// Queues the post-registration welcome email
    pub fn send_registration(&self, notice: RegistrationNotice) {
        let Some(url) = self.registration_url.clone() else {
            debug!("Registration webhook not configured, skipping notification");
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            let body = json!({ "name": notice.name, "email": notice.email });
            if let Err(e) = client.post(&url).json(&body).send().await {
                warn!(error = %e, email = %notice.email, "Registration webhook delivery failed");
            }
        });
    }

    /// Queues an application decision email
    pub fn send_application_decision(&self, notice: ApplicationDecisionNotice) {
        let Some(url) = self.application_url.clone() else {
            debug!("Application webhook not configured, skipping notification");
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.post(&url).json(&notice).send().await {
                warn!(
                    error = %e,
                    helper_email = %notice.helper_email,
                    status = %notice.status,
                    "Application decision webhook delivery failed"
                );
            }
        });
    }
}

impl ApplicationDecisionNotice {
    /// Builds the accepted-decision payload with full job details
    pub fn accepted(
        helper_email: String,
        helper_name: String,
        family_name: String,
        job_title: String,
        job_location: Option<String>,
        job_date: Option<String>,
        job_time: Option<String>,
        pay_per_hour: i64,
    ) -> Self {
        let message = format!(
            "Congratulations {helper_name}! {family_name} accepted your application \
             for \"{job_title}\"."
        );

        Self {
            helper_email,
            helper_name,
            family_name,
            job_title,
            job_location,
            job_date,
            job_time,
            pay_per_hour: Some(pay_per_hour),
            status: "accepted".to_string(),
            subject: "Your application was accepted".to_string(),
            message,
        }
    }

    /// Builds the rejected-decision payload
    pub fn rejected(
        helper_email: String,
        helper_name: String,
        family_name: String,
        job_title: String,
    ) -> Self {
        let message = format!(
            "Hi {helper_name}, {family_name} has chosen another applicant \
             for \"{job_title}\". Keep applying!"
        );

        Self {
            helper_email,
            helper_name,
            family_name,
            job_title,
            job_location: None,
            job_date: None,
            job_time: None,
            pay_per_hour: None,
            status: "rejected".to_string(),
            subject: "Update on your application".to_string(),
            message,
        }
    }
}
