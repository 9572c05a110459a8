//! Placeholder advisor used when no API key is configured

use async_trait::async_trait;
use teamboard_advisor::{
    AdvisorError, AssignmentAdvisor, AssignmentContext, AssignmentProposal, TechStackContext,
    TechStackSuggestion,
};

/// Always reports the advisor as unavailable
pub struct UnconfiguredAdvisor;

#[async_trait]
impl AssignmentAdvisor for UnconfiguredAdvisor {
    async fn propose_assignments(
        &self,
        _context: &AssignmentContext,
    ) -> Result<AssignmentProposal, AdvisorError> {
        Err(AdvisorError::request_failed("ANTHROPIC_API_KEY is not set"))
    }

    async fn suggest_tech_stack(
        &self,
        _context: &TechStackContext,
    ) -> Result<TechStackSuggestion, AdvisorError> {
        Err(AdvisorError::request_failed("ANTHROPIC_API_KEY is not set"))
    }
}
