//! Prompt construction and proposal parsing
//!
//! The advisor is asked for strict JSON, but models sometimes wrap it in
//! prose or markdown fences. `extract_json` pulls the first balanced JSON
//! object out of the response text; parsing after that is strict serde.

use crate::error::AdvisorError;
use serde::{Deserialize, Serialize};

/// One unassigned task, already sorted by urgency upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: String,
    pub title: String,
    pub priority: String,
    pub deadline: String,
}

/// A candidate member with their current in-project workload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWorkload {
    pub id: String,
    pub name: String,
    pub role: String,
    pub assigned_count: usize,
    pub assigned_titles: Vec<String>,
}

/// Everything the advisor sees when proposing assignments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentContext {
    pub project_name: String,
    pub project_description: String,
    pub unassigned_tasks: Vec<TaskSummary>,
    pub members: Vec<MemberWorkload>,
}

/// One task-to-member pairing in a proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedAssignment {
    pub task_id: String,
    pub member_id: String,
    #[serde(default)]
    pub reasoning: String,
}

/// The advisor's full answer: a team plus per-task pairings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentProposal {
    pub team: Vec<String>,
    pub assignments: Vec<ProposedAssignment>,
}

/// Context for a technology-stack suggestion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStackContext {
    pub task_title: String,
    pub task_priority: String,
    pub project_name: String,
    pub project_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStackSuggestion {
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
    pub database: Vec<String>,
    pub tools: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

/// Build the assignment prompt from a prepared context
pub fn build_assignment_prompt(context: &AssignmentContext) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are a project staffing assistant for the project \"{}\".\n",
        context.project_name
    ));
    if !context.project_description.is_empty() {
        prompt.push_str(&format!(
            "Project description: {}\n",
            context.project_description
        ));
    }

    prompt.push_str("\nUnassigned tasks, most urgent first:\n");
    for task in &context.unassigned_tasks {
        prompt.push_str(&format!(
            "- id={} title=\"{}\" priority={} deadline={}\n",
            task.id, task.title, task.priority, task.deadline
        ));
    }

    prompt.push_str("\nAvailable team members and their current workload:\n");
    for member in &context.members {
        prompt.push_str(&format!(
            "- id={} name=\"{}\" role=\"{}\" currently assigned {} task(s)",
            member.id, member.name, member.role, member.assigned_count
        ));
        if !member.assigned_titles.is_empty() {
            prompt.push_str(&format!(": {}", member.assigned_titles.join(", ")));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "\nSelect a team of 2 to 5 members suited to this project and assign \
         between 50% and 70% of the unassigned tasks to them, balancing \
         workload against each member's role. Only use the member and task \
         ids listed above, and never assign a task twice.\n\
         Respond with exactly one JSON object, no other text:\n\
         {\"team\": [\"memberId\", ...], \"assignments\": \
         [{\"taskId\": \"...\", \"memberId\": \"...\", \"reasoning\": \"...\"}]}\n",
    );
    prompt
}

/// Build the tech-stack prompt for a single task
pub fn build_tech_stack_prompt(context: &TechStackContext) -> String {
    format!(
        "Suggest a concrete technology stack for this task.\n\
         Project: \"{}\"\n\
         Project description: {}\n\
         Task: \"{}\" (priority {})\n\n\
         Respond with exactly one JSON object, no other text:\n\
         {{\"frontend\": [\"...\"], \"backend\": [\"...\"], \
         \"database\": [\"...\"], \"tools\": [\"...\"], \"reasoning\": \"...\"}}\n",
        context.project_name,
        context.project_description,
        context.task_title,
        context.task_priority,
    )
}

/// Pull the first balanced top-level JSON object out of free-form text
pub fn extract_json(text: &str) -> Result<&str, AdvisorError> {
    let start = text
        .find('{')
        .ok_or_else(|| AdvisorError::malformed("response contains no JSON object"))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    Err(AdvisorError::malformed("unterminated JSON object in response"))
}

/// Parse an assignment proposal out of raw advisor text
pub fn parse_assignment_proposal(text: &str) -> Result<AssignmentProposal, AdvisorError> {
    let json = extract_json(text)?;
    serde_json::from_str(json).map_err(|e| AdvisorError::malformed(e.to_string()))
}

/// Parse a tech-stack suggestion out of raw advisor text
pub fn parse_tech_stack(text: &str) -> Result<TechStackSuggestion, AdvisorError> {
    let json = extract_json(text)?;
    serde_json::from_str(json).map_err(|e| AdvisorError::malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_prose() {
        let text = "Sure! Here is the plan:\n```json\n{\"team\": [\"m1\"], \
                    \"assignments\": []}\n```\nHope that helps.";
        let json = extract_json(text).unwrap();
        assert_eq!(json, "{\"team\": [\"m1\"], \"assignments\": []}");
    }

    #[test]
    fn test_extract_json_handles_braces_in_strings() {
        let text = "{\"team\": [\"m1\"], \"assignments\": [{\"taskId\": \"t1\", \
                    \"memberId\": \"m1\", \"reasoning\": \"fix the {braces} bug\"}]}";
        let json = extract_json(text).unwrap();
        assert_eq!(json, text);
    }

    #[test]
    fn test_extract_json_missing_object() {
        assert!(extract_json("no json here").is_err());
        assert!(extract_json("{\"unterminated\": true").is_err());
    }

    #[test]
    fn test_parse_assignment_proposal() {
        let text = "{\"team\": [\"m1\", \"m2\"], \"assignments\": \
                    [{\"taskId\": \"t1\", \"memberId\": \"m1\", \
                    \"reasoning\": \"backend fit\"}]}";
        let proposal = parse_assignment_proposal(text).unwrap();
        assert_eq!(proposal.team, vec!["m1", "m2"]);
        assert_eq!(proposal.assignments.len(), 1);
        assert_eq!(proposal.assignments[0].task_id, "t1");
        assert_eq!(proposal.assignments[0].member_id, "m1");
    }

    #[test]
    fn test_parse_assignment_proposal_missing_fields() {
        let err = parse_assignment_proposal("{\"team\": [\"m1\"]}").unwrap_err();
        assert!(matches!(err, AdvisorError::MalformedProposal(_)));
    }

    #[test]
    fn test_parse_tech_stack() {
        let text = "Here you go: {\"frontend\": [\"React\"], \"backend\": \
                    [\"Axum\"], \"database\": [\"SQLite\"], \"tools\": \
                    [\"Docker\"], \"reasoning\": \"small dashboard\"}";
        let suggestion = parse_tech_stack(text).unwrap();
        assert_eq!(suggestion.frontend, vec!["React"]);
        assert_eq!(suggestion.database, vec!["SQLite"]);
        assert_eq!(suggestion.reasoning, "small dashboard");
    }

    #[test]
    fn test_assignment_prompt_lists_tasks_and_members() {
        let context = AssignmentContext {
            project_name: "Apollo".to_string(),
            project_description: "Internal dashboard".to_string(),
            unassigned_tasks: vec![TaskSummary {
                id: "t1".to_string(),
                title: "Build login".to_string(),
                priority: "high".to_string(),
                deadline: "2026-09-01".to_string(),
            }],
            members: vec![MemberWorkload {
                id: "m1".to_string(),
                name: "Dana".to_string(),
                role: "Backend".to_string(),
                assigned_count: 2,
                assigned_titles: vec!["API cleanup".to_string()],
            }],
        };
        let prompt = build_assignment_prompt(&context);
        assert!(prompt.contains("id=t1"));
        assert!(prompt.contains("priority=high"));
        assert!(prompt.contains("id=m1"));
        assert!(prompt.contains("currently assigned 2 task(s)"));
        assert!(prompt.contains("2 to 5 members"));
    }
}
