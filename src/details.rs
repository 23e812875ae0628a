//! Setup instructions and the workflow details view.

use crate::completion::{first_three, generate, PromptKind};
use crate::error::RequestError;
use crate::finder::Finder;
use crate::models::{SetupInstructions, SetupStep, WorkflowDetails};

/// Generate setup steps for a workflow.
///
/// Returns the raw completion text together with the parsed steps. A
/// completion failure yields the templated four-step fallback.
pub async fn setup_instructions(
    finder: &Finder,
    workflow_name: &str,
    nodes: &[String],
) -> Result<SetupInstructions, RequestError> {
    require_name(workflow_name)?;

    let instructions = generate(
        finder.completer.as_ref(),
        PromptKind::SetupSteps,
        workflow_name,
        nodes,
    )
    .await;
    let steps = parse_setup_steps(&instructions);

    Ok(SetupInstructions {
        workflow_name: workflow_name.to_string(),
        instructions,
        steps,
    })
}

/// Build the details view: requirements and detailed info are generated
/// concurrently; the description is passed through or defaulted.
pub async fn workflow_details(
    finder: &Finder,
    workflow_name: &str,
    nodes: &[String],
    description: Option<&str>,
) -> Result<WorkflowDetails, RequestError> {
    require_name(workflow_name)?;

    let completer = finder.completer.as_ref();
    let (requirements, detailed_info) = tokio::join!(
        generate(completer, PromptKind::Requirements, workflow_name, nodes),
        generate(completer, PromptKind::DetailedInfo, workflow_name, nodes)
    );

    let description = match description {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => format!("Workflow using {}", first_three(nodes.iter())),
    };

    Ok(WorkflowDetails {
        workflow_name: workflow_name.to_string(),
        description,
        requirements,
        detailed_info,
        node_count: nodes.len(),
        nodes: nodes.to_vec(),
    })
}

fn require_name(workflow_name: &str) -> Result<(), RequestError> {
    if workflow_name.is_empty() {
        return Err(RequestError::invalid(
            "workflowName and nodes array are required",
        ));
    }
    Ok(())
}

/// Split numbered instructions into steps.
///
/// Blank lines are dropped and a leading `N.` ordinal is stripped. Ids are
/// assigned from 1 in the order the lines appear.
pub fn parse_setup_steps(text: &str) -> Vec<SetupStep> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| SetupStep {
            id: i + 1,
            content: strip_ordinal(line).trim().to_string(),
        })
        .collect()
}

/// Remove a `^\d+\.\s*` prefix, if present.
fn strip_ordinal(line: &str) -> &str {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return line;
    }
    match line[digits..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{finder, FixedEmbedder, RecordingCompleter, ScriptedStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn nodes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn finder_with(completer: Arc<RecordingCompleter>) -> Finder {
        finder(
            Arc::new(FixedEmbedder::new(vec![1.0])),
            Arc::new(ScriptedStore::new(vec![])),
            completer,
        )
    }

    #[test]
    fn test_parse_steps_basic() {
        let steps = parse_setup_steps("1. Do A\n2. Do B");
        assert_eq!(
            steps,
            vec![
                SetupStep {
                    id: 1,
                    content: "Do A".to_string()
                },
                SetupStep {
                    id: 2,
                    content: "Do B".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_steps_blank_lines_and_unnumbered() {
        let steps = parse_setup_steps("Intro line\n\n  \n10.   Tenth\n3.Third\n4) kept\n");
        let contents: Vec<&str> = steps.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["Intro line", "Tenth", "Third", "4) kept"]);
        assert_eq!(steps.last().map(|s| s.id), Some(4));
    }

    #[test]
    fn test_parse_steps_indented_ordinal_is_kept() {
        let steps = parse_setup_steps("  1. indented");
        assert_eq!(steps[0].content, "1. indented");
    }

    #[test]
    fn test_parse_steps_empty() {
        assert!(parse_setup_steps("").is_empty());
        assert!(parse_setup_steps("\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_setup_instructions_parses_completion() {
        let completer = Arc::new(RecordingCompleter::replying(
            "1. Import it\n2. Add Slack credentials\n3. Run a test",
        ));
        let f = finder_with(completer.clone());
        let setup = setup_instructions(&f, "slack alert", &nodes(&["Start", "Slack"]))
            .await
            .unwrap();
        assert_eq!(setup.workflow_name, "slack alert");
        assert_eq!(setup.steps.len(), 3);
        assert_eq!(setup.steps[1].content, "Add Slack credentials");
        assert_eq!(completer.calls(), 1);
    }

    #[tokio::test]
    async fn test_setup_instructions_fallback_parses_to_four_steps() {
        let f = finder_with(Arc::new(RecordingCompleter::failing()));
        let setup = setup_instructions(&f, "x", &nodes(&["Webhook", "Slack"]))
            .await
            .unwrap();
        assert_eq!(setup.steps.len(), 4);
        assert_eq!(setup.steps[1].content, "Configure credentials for: Slack");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let completer = Arc::new(RecordingCompleter::replying("x"));
        let f = finder_with(completer.clone());
        assert!(matches!(
            setup_instructions(&f, "", &[]).await,
            Err(RequestError::InvalidInput(_))
        ));
        assert!(matches!(
            workflow_details(&f, "", &[], None).await,
            Err(RequestError::InvalidInput(_))
        ));
        assert_eq!(completer.calls(), 0);
    }

    #[tokio::test]
    async fn test_details_default_description() {
        let f = finder_with(Arc::new(RecordingCompleter::replying("text")));
        let list = nodes(&["Start", "Slack", "Gmail", "Notion"]);

        let details = workflow_details(&f, "alerts", &list, None).await.unwrap();
        assert_eq!(details.description, "Workflow using Start, Slack, Gmail");
        assert_eq!(details.node_count, 4);
        assert_eq!(details.requirements, "text");
        assert_eq!(details.detailed_info, "text");

        let details = workflow_details(&f, "alerts", &list, Some("")).await.unwrap();
        assert_eq!(details.description, "Workflow using Start, Slack, Gmail");

        let details = workflow_details(&f, "alerts", &list, Some("Mine")).await.unwrap();
        assert_eq!(details.description, "Mine");
    }

    #[tokio::test]
    async fn test_details_runs_two_completions_concurrently() {
        let completer =
            Arc::new(RecordingCompleter::replying("t").with_delay(Duration::from_millis(20)));
        let f = finder_with(completer.clone());
        workflow_details(&f, "alerts", &nodes(&["Slack"]), None)
            .await
            .unwrap();
        assert_eq!(completer.calls(), 2);
        assert_eq!(completer.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_details_fallbacks() {
        let f = finder_with(Arc::new(RecordingCompleter::failing()));
        let details = workflow_details(&f, "Slack Alert", &nodes(&["Start", "Slack"]), None)
            .await
            .unwrap();
        assert!(details
            .requirements
            .starts_with("• API credentials for: Slack\n"));
        assert!(details
            .detailed_info
            .starts_with("This workflow automates tasks using 2 nodes including Start, Slack."));
    }
}
