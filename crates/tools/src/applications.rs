//! Application tools — submit, look up, cancel and follow up on applications.

use async_trait::async_trait;
use cardwise_core::args::ToolArgs;
use cardwise_core::error::ToolError;
use cardwise_core::tool::Tool;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::backend::{CardBackend, NewApplication};
use crate::to_value;

macro_rules! backend_tool {
    ($ty:ident) => {
        pub struct $ty {
            backend: Arc<dyn CardBackend>,
        }

        impl $ty {
            pub fn new(backend: Arc<dyn CardBackend>) -> Self {
                Self { backend }
            }
        }
    };
}

backend_tool!(SubmitApplicationTool);
backend_tool!(CustomerApplicationsTool);
backend_tool!(ApplicationStatusTool);
backend_tool!(CancelApplicationTool);
backend_tool!(EstimateApprovalTimeTool);
backend_tool!(ApplicationsNeedingAttentionTool);

#[async_trait]
impl Tool for SubmitApplicationTool {
    fn name(&self) -> &str {
        "submitApplication"
    }

    fn description(&self) -> &str {
        "Submit a credit card application. salary is the annual salary in USD \
         (greater than 0), birthday is YYYY-MM-DD"
    }

    fn params(&self) -> &[&str] {
        &["name", "surname", "salary", "birthday", "cardId", "cardName"]
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value, ToolError> {
        let request = NewApplication {
            name: args.string(0, "name")?,
            surname: args.string(1, "surname")?,
            salary: args.decimal(2, "salary")?,
            birthday: args.date(3, "birthday")?,
            card_id: args.integer(4, "cardId")?,
            card_name: args.string(5, "cardName")?,
        };

        let application = self
            .backend
            .submit(request)
            .await
            .map_err(|e| ToolError::failed(self.name(), e.to_string()))?;

        Ok(json!({
            "success": true,
            "message": format!(
                "Application submitted successfully for {}. Your application ID is {}. \
                 You will be contacted within 7-10 business days.",
                application.customer_name, application.application_id
            ),
            "applicationId": application.application_id,
            "applicantName": application.customer_name,
            "cardName": application.card_name,
            "salary": application.salary,
            "estimatedDecisionDate": application.estimated_decision_date,
            "statusMessage": application.status_message,
            "nextSteps": application.next_steps,
        }))
    }
}

#[async_trait]
impl Tool for CustomerApplicationsTool {
    fn name(&self) -> &str {
        "getCustomerApplications"
    }

    fn description(&self) -> &str {
        "Get all applications for a customer by full name (first and last name)"
    }

    fn params(&self) -> &[&str] {
        &["customerName"]
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value, ToolError> {
        // `getCustomerApplications("Jane", "Smith")` means the same as one full name
        let customer_name = match &args {
            ToolArgs::Positional(parts) if parts.len() > 1 => parts.join(" "),
            _ => args.string(0, "customerName")?,
        };
        to_value(
            self.name(),
            &self.backend.customer_applications(&customer_name).await,
        )
    }
}

#[async_trait]
impl Tool for ApplicationStatusTool {
    fn name(&self) -> &str {
        "getApplicationStatus"
    }

    fn description(&self) -> &str {
        "Get detailed status of a specific application"
    }

    fn params(&self) -> &[&str] {
        &["applicationId"]
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value, ToolError> {
        let id = args.string(0, "applicationId")?;
        let application = self
            .backend
            .application(&id)
            .await
            .map_err(|e| ToolError::failed(self.name(), e.to_string()))?;
        to_value(self.name(), &application)
    }
}

#[async_trait]
impl Tool for CancelApplicationTool {
    fn name(&self) -> &str {
        "cancelApplication"
    }

    fn description(&self) -> &str {
        "Cancel a pending or in-review application"
    }

    fn params(&self) -> &[&str] {
        &["applicationId"]
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value, ToolError> {
        let id = args.string(0, "applicationId")?;
        let application = self
            .backend
            .cancel(&id)
            .await
            .map_err(|e| ToolError::failed(self.name(), e.to_string()))?;

        Ok(json!({
            "success": true,
            "message": format!(
                "Application {} has been successfully cancelled.",
                application.application_id
            ),
            "applicationId": application.application_id,
            "customerName": application.customer_name,
        }))
    }
}

#[async_trait]
impl Tool for EstimateApprovalTimeTool {
    fn name(&self) -> &str {
        "estimateApprovalTime"
    }

    fn description(&self) -> &str {
        "Estimate how many days remain until a decision on an application"
    }

    fn params(&self) -> &[&str] {
        &["applicationId"]
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value, ToolError> {
        let id = args.string(0, "applicationId")?;
        let estimate = self
            .backend
            .estimate_approval(&id)
            .await
            .map_err(|e| ToolError::failed(self.name(), e.to_string()))?;
        to_value(self.name(), &estimate)
    }
}

#[async_trait]
impl Tool for ApplicationsNeedingAttentionTool {
    fn name(&self) -> &str {
        "getApplicationsNeedingAttention"
    }

    fn description(&self) -> &str {
        "Get applications that have been pending for a long time and might need follow-up"
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value, ToolError> {
        to_value(self.name(), &self.backend.stale_applications().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ApplicationStatus, InMemoryBackend};

    fn backend() -> Arc<dyn CardBackend> {
        Arc::new(InMemoryBackend::default())
    }

    fn args(raw: &str) -> ToolArgs {
        ToolArgs::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn submit_positional() {
        let tool = SubmitApplicationTool::new(backend());
        let value = tool
            .execute(args(r#""Jane", "Smith", 95000, 1990-03-22, 3, "Venture X""#))
            .await
            .unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["applicationId"], "APP-001");
        assert_eq!(value["applicantName"], "Jane Smith");
        assert!(value["message"].as_str().unwrap().contains("APP-001"));
    }

    #[tokio::test]
    async fn submit_named_with_comma_in_card_name() {
        let tool = SubmitApplicationTool::new(backend());
        let value = tool
            .execute(args(
                r#"{"name": "Jane", "surname": "Smith", "salary": 95000,
                    "birthday": "1990-03-22", "cardId": 2, "cardName": "Platinum Card, Amex"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(value["cardName"], "Platinum Card, Amex");
    }

    #[tokio::test]
    async fn submit_rejects_bad_input() {
        let tool = SubmitApplicationTool::new(backend());

        let err = tool
            .execute(args(r#""Jane", "Smith", 95000, 22.03.1990, 3, "Venture X""#))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));

        let err = tool
            .execute(args(r#""Jane", "Smith", 0, 1990-03-22, 3, "Venture X""#))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "submitApplication failed: Salary must be greater than 0"
        );
    }

    #[tokio::test]
    async fn lookup_status_cancel_flow() {
        let backend = backend();
        SubmitApplicationTool::new(backend.clone())
            .execute(args(r#""Jane", "Smith", 60000, 1990-03-22, 1, "Chase Sapphire Preferred""#))
            .await
            .unwrap();

        let listed = CustomerApplicationsTool::new(backend.clone())
            .execute(args("\"Jane Smith\""))
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["status"], "PENDING");

        // split name parts are joined
        let listed = CustomerApplicationsTool::new(backend.clone())
            .execute(args("\"Jane\", \"Smith\""))
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let status = ApplicationStatusTool::new(backend.clone())
            .execute(args("APP-001"))
            .await
            .unwrap();
        assert_eq!(status["creditScore"], 675);

        let estimate = EstimateApprovalTimeTool::new(backend.clone())
            .execute(args("\"APP-001\""))
            .await
            .unwrap();
        assert_eq!(estimate["estimatedDaysRemaining"], 7);

        let cancelled = CancelApplicationTool::new(backend.clone())
            .execute(args("APP-001"))
            .await
            .unwrap();
        assert_eq!(cancelled["success"], true);

        let status = backend.application("APP-001").await.unwrap();
        assert_eq!(status.status, ApplicationStatus::Cancelled);
    }

    #[tokio::test]
    async fn unknown_application_is_business_error() {
        let err = ApplicationStatusTool::new(backend())
            .execute(args("APP-404"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::failed("getApplicationStatus", "Application not found: APP-404")
        );
    }

    #[tokio::test]
    async fn no_stale_applications_is_empty_list() {
        let value = ApplicationsNeedingAttentionTool::new(backend())
            .execute(args(""))
            .await
            .unwrap();
        assert_eq!(value, json!([]));
    }
}
