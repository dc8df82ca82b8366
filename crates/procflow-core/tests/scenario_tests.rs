use pretty_assertions::assert_eq;
use procflow_core::prelude::*;
use procflow_core::{validate, EntityKind, NoteRecord, StepField, StepRecord};
use procflow_test_utils::{complete_step, graph_of, sandwich_from_records, sandwich_process};

fn rules(report: &ValidationReport) -> Vec<RuleCode> {
    report.findings().iter().map(|f| f.rule).collect()
}

#[test]
fn test_sandwich_loop_back_is_valid() {
    let mut graph = sandwich_process();
    assert_eq!(graph.len(), 14);
    assert_eq!(
        graph.entry_step().map(|s| s.id().as_str()),
        Some("Gather Ingredients")
    );

    let start_over = graph.get_step("Start Over").unwrap();
    assert_eq!(
        start_over.next_on_success(),
        Some(&NextStep::step("Gather Ingredients").unwrap())
    );
    assert_eq!(start_over.next_on_failure(), Some(&NextStep::End));

    let report = graph.validate();
    assert_eq!(report.error_count(), 0, "{report}");
    assert!(report.is_clean(), "{report}");
}

#[test]
fn test_dangling_reference_names_step_and_field() {
    let graph = graph_of("dangling", [complete_step("Check Order", "Proceed", "End")]);
    let report = validate(&graph);

    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule, RuleCode::UnresolvedReference);
    assert_eq!(errors[0].step, Some(StepId::new("Check Order").unwrap()));
    assert_eq!(errors[0].field, Some(StepField::NextOnSuccess));
}

#[test]
fn test_unreferenced_step_is_unreachable() {
    let graph = graph_of(
        "unreachable",
        [
            complete_step("Start", "Finish", "End"),
            complete_step("Finish", "End", "End"),
            complete_step("Forgotten", "End", "End"),
        ],
    );
    let report = validate(&graph);

    let unreachable: Vec<_> = report
        .with_rule(RuleCode::UnreachableStep)
        .filter_map(|f| f.step.as_ref())
        .map(StepId::as_str)
        .collect();
    assert_eq!(unreachable, vec!["Forgotten"]);
    assert!(report.contains(RuleCode::MultipleEntrySteps));
}

#[test]
fn test_duplicate_add_leaves_graph_untouched() {
    let mut graph = graph_of("duplicate", [complete_step("Weigh Parcel", "End", "End")]);
    let before: Vec<Step> = graph.steps().cloned().collect();

    let err = graph
        .add_step(complete_step("Weigh Parcel", "Weigh Parcel", "End"))
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::DuplicateId {
            kind: EntityKind::Step,
            id: "Weigh Parcel".to_string()
        }
    );

    let after: Vec<Step> = graph.steps().cloned().collect();
    assert_eq!(before, after);
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_dead_end_cycle_flags_both_members() {
    let graph = graph_of(
        "dead_end",
        [
            complete_step("Ping", "Pong", "Pong"),
            complete_step("Pong", "Ping", "Ping"),
        ],
    );
    let report = validate(&graph);

    let dead: Vec<_> = report
        .with_rule(RuleCode::NoPathToEnd)
        .filter_map(|f| f.step.as_ref())
        .map(StepId::as_str)
        .collect();
    assert_eq!(dead, vec!["Ping", "Pong"]);
    assert_eq!(rules(&report), vec![RuleCode::NoPathToEnd, RuleCode::NoPathToEnd]);
}

#[test]
fn test_cycle_with_exit_is_not_flagged() {
    let graph = graph_of(
        "retry",
        [
            complete_step("Submit", "Review", "End"),
            complete_step("Review", "End", "Submit"),
        ],
    );
    assert!(!validate(&graph).has_errors());
}

#[test]
fn test_direct_construction_reports_duplicates() {
    let (mut steps, mut notes) = procflow_test_utils::sandwich_records();
    steps.push(steps[0].clone());
    notes.push(notes[1].clone());

    let graph =
        ProcessGraph::from_records("dupes", GraphConfig::default(), steps, notes).unwrap();
    assert_eq!(graph.len(), 14);
    assert_eq!(graph.shadowed_steps().len(), 1);

    let report = validate(&graph);
    assert_eq!(
        rules(&report),
        vec![RuleCode::DuplicateStepId, RuleCode::DuplicateNoteId]
    );
}

#[test]
fn test_records_and_api_build_equal_graphs() {
    let api = sandwich_process();
    let records = sandwich_from_records(GraphConfig::default());

    let api_steps: Vec<&Step> = api.steps().collect();
    let record_steps: Vec<&Step> = records.steps().collect();
    assert_eq!(api_steps, record_steps);
    assert_eq!(validate(&api), validate(&records));
}

#[test]
fn test_note_problems() {
    let mut graph = graph_of("notes", [complete_step("Pack Box", "End", "End")]);
    graph
        .add_note(Note::new("N1", "Nobody links this note").unwrap())
        .unwrap();
    graph
        .add_note(
            Note::new("N2", "Points at a step that is gone")
                .unwrap()
                .with_related_step(StepId::new("Label Box").unwrap()),
        )
        .unwrap();

    let report = validate(&graph);
    assert_eq!(
        rules(&report),
        vec![RuleCode::OrphanNote, RuleCode::DanglingNoteTarget]
    );
    assert_eq!(report.error_count(), 1);
}

#[test]
fn test_dangling_note_link_from_records() {
    let (mut steps, _) = procflow_test_utils::sandwich_records();
    steps.truncate(1);
    steps[0].next_on_success = "End".into();
    steps[0].next_on_failure = "End".into();

    let graph = ProcessGraph::from_records("link", GraphConfig::default(), steps, Vec::new())
        .unwrap();
    let report = validate(&graph);
    let finding = report.with_rule(RuleCode::DanglingNoteLink).next().unwrap();
    assert_eq!(finding.field, Some(StepField::NoteId));
    assert_eq!(report.error_count(), 1);
}

fn row(id: &str, note: Option<&str>) -> StepRecord {
    StepRecord {
        id: id.to_string(),
        description: format!("Handle the {id} stage"),
        decision: format!("Is {id} done?"),
        success_outcome: "Done".to_string(),
        failure_outcome: "Not done".to_string(),
        note_id: note.map(str::to_string),
        next_on_success: "End".to_string(),
        next_on_failure: "End".to_string(),
        ..StepRecord::default()
    }
}

#[test]
fn test_note_link_ends_must_agree() {
    let mut steps = vec![row("Pack", Some("N1")), row("Ship", None)];
    steps[0].next_on_success = "Ship".to_string();
    let notes = vec![NoteRecord {
        id: "N1".to_string(),
        content: "Use the double-walled boxes".to_string(),
        related_step_id: Some("Ship".to_string()),
    }];

    let graph = ProcessGraph::from_records("mismatch", GraphConfig::default(), steps, notes)
        .unwrap();
    let report = validate(&graph);
    assert_eq!(rules(&report), vec![RuleCode::NoteLinkMismatch]);

    let finding = &report.findings()[0];
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.step.as_ref().map(StepId::as_str), Some("Pack"));
    assert_eq!(finding.note.as_ref().map(NoteId::as_str), Some("N1"));
    assert!(finding.message.contains("step 'Ship'"));
}

#[test]
fn test_relinked_note_keeps_graph_clean() {
    let mut graph = graph_of(
        "relink",
        [
            complete_step("Pack Box", "Ship Box", "End"),
            complete_step("Ship Box", "End", "End"),
        ],
    );
    graph
        .add_note(Note::new("N1", "Use the double-walled boxes").unwrap())
        .unwrap();
    graph.link_note("Pack Box", "N1").unwrap();
    graph.link_note("Ship Box", "N1").unwrap();

    let report = graph.validate();
    assert!(report.is_clean(), "{report}");
}

#[test]
fn test_finalize_seals_only_buildable_graphs() {
    let mut broken = graph_of("broken", [complete_step("Ping", "Pong", "End")]);
    let report = broken.finalize().unwrap_err();
    assert!(report.contains(RuleCode::UnresolvedReference));

    let mut graph = sandwich_process();
    let process = graph.finalize().unwrap();
    assert_eq!(process.name(), "make_a_sandwich");
    assert_eq!(process.traverse().count(), 14);
    assert_eq!(process.warnings().count(), 0);
}

#[test]
fn test_snapshot_exposes_cached_report() {
    let mut graph = sandwich_process();
    assert!(graph.snapshot().report.is_none());
    graph.validate();

    let snapshot = graph.snapshot();
    assert_eq!(snapshot.name, "make_a_sandwich");
    assert_eq!(snapshot.steps.len(), 14);
    assert_eq!(snapshot.notes.len(), 2);
    assert_eq!(
        snapshot.entry_step.map(StepId::as_str),
        Some("Gather Ingredients")
    );
    assert!(snapshot.report.is_some_and(ValidationReport::is_clean));
}
