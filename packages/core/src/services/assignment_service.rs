//! Task Assignment Advisor Orchestration
//!
//! Owns the workload bookkeeping, task ordering, and proposal validation
//! around the external advisor. The advisor call happens with no store lock
//! held; all mutations are applied in one transaction only after the full
//! proposal validates, so a rejected proposal leaves the database untouched.
//!
//! Unassigned tasks are ordered by priority score descending, then by the
//! deadline string ascending. Deadlines are display strings ("Dec 20"), so
//! that tie-break is lexicographic, not chronological - kept as-is because
//! the dashboard stores no parseable date to sort on.

use crate::db::EntityStore;
use crate::models::{Task, TeamMember};
use crate::services::error::ServiceError;
use crate::services::mindmap_service::MindmapService;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use teamboard_advisor::{
    AssignmentAdvisor, AssignmentContext, AssignmentProposal, MemberWorkload, ProposedAssignment,
    TaskSummary, TechStackContext,
};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Outcome of a committed auto-assignment run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentReport {
    pub assigned_by: String,
    pub team: Vec<String>,
    pub assignments_made: usize,
    pub assignments: Vec<ProposedAssignment>,
    pub synced: bool,
}

/// Drives auto-assignment and tech-stack suggestions
pub struct AssignmentService {
    store: Arc<dyn EntityStore>,
    advisor: Arc<dyn AssignmentAdvisor>,
    mindmap: Arc<MindmapService>,
    // Task ids with a stack suggestion currently running
    suggestions_in_flight: Arc<Mutex<HashSet<String>>>,
}

impl AssignmentService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        advisor: Arc<dyn AssignmentAdvisor>,
        mindmap: Arc<MindmapService>,
    ) -> Self {
        Self {
            store,
            advisor,
            mindmap,
            suggestions_in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Propose and apply assignments for a project's unassigned tasks.
    ///
    /// Fails without mutating anything when the project has no members or
    /// unassigned tasks, when the advisor is unreachable, or when the
    /// proposal references unknown or already-assigned work.
    pub async fn auto_assign(&self, project_id: &str) -> Result<AssignmentReport, ServiceError> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::project_not_found(project_id))?;

        let members = self.store.list_members().await?;
        if members.is_empty() {
            return Err(ServiceError::NoTeamMembers);
        }

        let mut unassigned = self.store.list_unassigned_tasks(project_id).await?;
        if unassigned.is_empty() {
            return Err(ServiceError::NoUnassignedTasks);
        }
        sort_by_urgency(&mut unassigned);

        let mut workloads = Vec::with_capacity(members.len());
        for member in &members {
            let assigned = self
                .store
                .list_tasks_for_member(project_id, &member.id)
                .await?;
            workloads.push(MemberWorkload {
                id: member.id.clone(),
                name: member.name.clone(),
                role: member.role.clone(),
                assigned_count: assigned.len(),
                assigned_titles: assigned.into_iter().map(|t| t.title).collect(),
            });
        }

        let context = AssignmentContext {
            project_name: project.name.clone(),
            project_description: project.description.clone(),
            unassigned_tasks: unassigned
                .iter()
                .map(|t| TaskSummary {
                    id: t.id.clone(),
                    title: t.title.clone(),
                    priority: t.priority.as_str().to_string(),
                    deadline: t.deadline.clone(),
                })
                .collect(),
            members: workloads,
        };

        // No lock held across the network call
        let proposal = self.advisor.propose_assignments(&context).await?;
        let team = validate_proposal(&proposal, &members, &unassigned)?;

        let pairs: Vec<(String, String)> = proposal
            .assignments
            .iter()
            .map(|a| (a.task_id.clone(), a.member_id.clone()))
            .collect();
        self.store
            .apply_assignments(project_id, &team, &pairs)
            .await?;

        info!(
            project = %project_id,
            team = team.len(),
            assignments = pairs.len(),
            "Auto-assignment committed"
        );

        let synced = match self.mindmap.sync().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Mindmap rebuild after auto-assign failed: {}", e);
                false
            }
        };

        Ok(AssignmentReport {
            assigned_by: "ai".to_string(),
            team,
            assignments_made: pairs.len(),
            assignments: proposal.assignments,
            synced,
        })
    }

    /// Start a background tech-stack suggestion for a task.
    ///
    /// Returns once the worker is spawned; clients observe completion by
    /// polling the task's `techStack` field. At most one suggestion runs per
    /// task at a time.
    pub async fn spawn_tech_stack_suggestion(&self, task_id: &str) -> Result<(), ServiceError> {
        let task = self
            .store
            .get_task(task_id)
            .await?
            .ok_or_else(|| ServiceError::task_not_found(task_id))?;
        let project = self
            .store
            .get_project(&task.project_id)
            .await?
            .ok_or_else(|| ServiceError::project_not_found(&task.project_id))?;

        {
            let mut in_flight = self.suggestions_in_flight.lock().await;
            if !in_flight.insert(task.id.clone()) {
                return Err(ServiceError::SuggestionInProgress { id: task.id });
            }
        }

        let context = TechStackContext {
            task_title: task.title.clone(),
            task_priority: task.priority.as_str().to_string(),
            project_name: project.name,
            project_description: project.description,
        };
        let store = self.store.clone();
        let advisor = self.advisor.clone();
        let in_flight = self.suggestions_in_flight.clone();
        let task_id = task.id;

        tokio::spawn(async move {
            match advisor.suggest_tech_stack(&context).await {
                Ok(suggestion) => match serde_json::to_value(&suggestion) {
                    Ok(value) => match store.set_task_tech_stack(&task_id, &value).await {
                        Ok(true) => info!(task = %task_id, "Tech stack suggestion stored"),
                        Ok(false) => warn!(task = %task_id, "Task deleted before suggestion landed"),
                        Err(e) => error!(task = %task_id, "Failed to store tech stack: {}", e),
                    },
                    Err(e) => error!(task = %task_id, "Failed to serialize tech stack: {}", e),
                },
                Err(e) => warn!(task = %task_id, "Tech stack suggestion failed: {}", e),
            }
            in_flight.lock().await.remove(&task_id);
        });

        Ok(())
    }
}

/// Priority score descending, then deadline string ascending
fn sort_by_urgency(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.priority
            .score()
            .cmp(&a.priority.score())
            .then_with(|| a.deadline.cmp(&b.deadline))
    });
}

/// Check every proposal reference against current state.
///
/// Returns the final team: the proposed team plus any assignment member not
/// listed in it, deduplicated and ordered by member id.
fn validate_proposal(
    proposal: &AssignmentProposal,
    members: &[TeamMember],
    unassigned: &[Task],
) -> Result<Vec<String>, ServiceError> {
    if proposal.assignments.is_empty() {
        return Err(ServiceError::invalid_proposal("proposal assigns no tasks"));
    }

    let known_members: HashSet<&str> = members.iter().map(|m| m.id.as_str()).collect();
    let assignable: HashSet<&str> = unassigned.iter().map(|t| t.id.as_str()).collect();

    let mut team: BTreeSet<String> = BTreeSet::new();
    for member_id in &proposal.team {
        if !known_members.contains(member_id.as_str()) {
            return Err(ServiceError::invalid_proposal(format!(
                "unknown team member id {}",
                member_id
            )));
        }
        team.insert(member_id.clone());
    }

    let mut seen_tasks = HashSet::new();
    for assignment in &proposal.assignments {
        if !known_members.contains(assignment.member_id.as_str()) {
            return Err(ServiceError::invalid_proposal(format!(
                "unknown member id {} in assignment",
                assignment.member_id
            )));
        }
        if !assignable.contains(assignment.task_id.as_str()) {
            return Err(ServiceError::invalid_proposal(format!(
                "task {} is unknown, assigned, or outside the project",
                assignment.task_id
            )));
        }
        if !seen_tasks.insert(assignment.task_id.as_str()) {
            return Err(ServiceError::invalid_proposal(format!(
                "task {} assigned more than once",
                assignment.task_id
            )));
        }
        team.insert(assignment.member_id.clone());
    }

    Ok(team.into_iter().collect())
}
