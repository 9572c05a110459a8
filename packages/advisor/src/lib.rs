//! Teamboard Advisor - Text-Generation Collaborator Client
//!
//! Talks to the Anthropic Messages API to propose task assignments and
//! technology-stack suggestions. The `AssignmentAdvisor` trait is the seam
//! the core services depend on, so tests can substitute a deterministic
//! implementation without touching the network.

pub mod client;
pub mod config;
pub mod error;
pub mod proposal;

pub use client::{AnthropicAdvisor, AssignmentAdvisor};
pub use config::AdvisorConfig;
pub use error::AdvisorError;
pub use proposal::{
    AssignmentContext, AssignmentProposal, MemberWorkload, ProposedAssignment, TaskSummary,
    TechStackContext, TechStackSuggestion,
};
