use pretty_assertions::assert_eq;
use procflow_core::prelude::*;
use procflow_core::{MissingStep, StepField};

/// Author one step the way the interview flow does: id first, then each
/// required field, then both pointers.
fn author(
    graph: &mut ProcessGraph,
    title: &str,
    on_success: StepSelection,
    on_failure: StepSelection,
) -> StepId {
    let id = graph.unique_step_id(title).unwrap();
    graph.add_step(Step::with_id(id.clone())).unwrap();
    assert_eq!(graph.get_step(id.as_str()).unwrap().state(), StepState::Drafting);

    for update in [
        StepUpdate::Description(format!("Work through the {title} stage")),
        StepUpdate::Decision(format!("Is {title} finished?")),
        StepUpdate::SuccessOutcome("Finished".into()),
        StepUpdate::FailureOutcome("Not finished".into()),
    ] {
        graph.update_step(id.as_str(), update).unwrap();
    }
    assert_eq!(graph.get_step(id.as_str()).unwrap().state(), StepState::Complete);

    let success = graph.resolve_selection(&on_success).unwrap();
    let failure = graph.resolve_selection(&on_failure).unwrap();
    graph
        .update_step(id.as_str(), StepUpdate::next(Outcome::Success, Some(success)))
        .unwrap();
    graph
        .update_step(id.as_str(), StepUpdate::next(Outcome::Failure, Some(failure)))
        .unwrap();
    id
}

#[test]
fn test_field_by_field_round_trip() {
    let mut graph = ProcessGraph::new("fulfil_order");

    author(
        &mut graph,
        "Receive Order",
        StepSelection::new_step("Pick Items"),
        StepSelection::End,
    );
    assert_eq!(
        graph.missing_steps(),
        vec![MissingStep {
            referenced_by: StepId::new("Receive Order").unwrap(),
            outcome: Outcome::Success,
            missing: StepId::new("Pick Items").unwrap(),
        }]
    );
    assert!(!graph.is_buildable());

    author(
        &mut graph,
        "Pick Items",
        StepSelection::new_step("Ship Parcel"),
        StepSelection::existing("Receive Order").unwrap(),
    );
    author(&mut graph, "Ship Parcel", StepSelection::End, StepSelection::End);

    assert!(graph.missing_steps().is_empty());
    assert_eq!(graph.drafting_steps().count(), 0);
    assert!(graph.is_buildable());

    let visited: Vec<&str> = graph
        .topological_snapshot()
        .map(|s| s.id().as_str())
        .collect();
    assert_eq!(visited, vec!["Receive Order", "Pick Items", "Ship Parcel"]);
}

#[test]
fn test_drafting_step_reports_each_missing_field() {
    let mut graph = ProcessGraph::new("draft");
    graph
        .add_step(
            Step::new("Label Box")
                .unwrap()
                .with_description("Print and attach the shipping label")
                .with_next_on_success(NextStep::End)
                .with_next_on_failure(NextStep::End),
        )
        .unwrap();

    let fields: Vec<Option<StepField>> = graph
        .validate()
        .with_rule(RuleCode::IncompleteStep)
        .map(|f| f.field)
        .collect();
    assert_eq!(
        fields,
        vec![
            Some(StepField::Decision),
            Some(StepField::SuccessOutcome),
            Some(StepField::FailureOutcome)
        ]
    );
    assert!(graph.finalize().is_err());
}

#[test]
fn test_invalid_edits_are_refused() {
    let mut graph = ProcessGraph::new("refusals");
    author(&mut graph, "Weigh", StepSelection::End, StepSelection::End);

    let err = graph
        .update_step("weigh", StepUpdate::SuccessOutcome(" ".into()))
        .unwrap_err();
    assert_eq!(err, GraphError::EmptyField { field: "success_outcome" });
    assert_eq!(
        graph.get_step("Weigh").unwrap().success_outcome(),
        Some("Finished")
    );

    assert!(graph
        .resolve_selection(&StepSelection::new_step("weigh"))
        .unwrap_err()
        .needs_new_id());
    assert_eq!(graph.unique_step_id("weigh").unwrap().as_str(), "weigh_2");
}

#[test]
fn test_unlinking_pointer_returns_step_to_error_state() {
    let mut graph = ProcessGraph::new("unlink");
    author(&mut graph, "Weigh", StepSelection::End, StepSelection::End);
    assert!(graph.is_buildable());

    graph
        .update_step("Weigh", StepUpdate::NextOnFailure(None))
        .unwrap();
    let report = graph.validate();
    let unset: Vec<_> = report.with_rule(RuleCode::UnsetNextStep).collect();
    assert_eq!(unset.len(), 1);
    assert_eq!(unset[0].field, Some(StepField::NextOnFailure));
}

#[test]
fn test_remove_step_policies() {
    let mut graph = ProcessGraph::new("remove");
    author(
        &mut graph,
        "Weigh",
        StepSelection::new_step("Stamp"),
        StepSelection::End,
    );
    author(&mut graph, "Stamp", StepSelection::End, StepSelection::End);
    graph.add_note(Note::new("N1", "Use the red stamp").unwrap()).unwrap();
    graph.link_note("Stamp", "N1").unwrap();

    let err = graph.remove_step("Stamp", RemovalPolicy::Refuse).unwrap_err();
    assert_eq!(
        err.to_string(),
        "step 'Stamp' is still referenced by: Weigh"
    );
    assert_eq!(graph.len(), 2);

    graph.remove_step("stamp", RemovalPolicy::UnlinkToEnd).unwrap();
    assert_eq!(
        graph.get_step("Weigh").unwrap().next_on_success(),
        Some(&NextStep::End)
    );
    assert!(graph.get_note("N1").unwrap().related_step_id().is_none());

    let report = graph.validate();
    assert!(!report.has_errors());
    assert!(report.contains(RuleCode::OrphanNote));
}
