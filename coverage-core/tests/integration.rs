mod common;

use common::{ScriptedBackend, fast_config, fast_retry};
use coverage_core::extraction::AttemptStage;
use coverage_core::prelude::*;
use serde::Deserialize;
use serde_json::json;

fn coverage_request() -> CompletionRequest {
    let prompt = Artifacts::new("As a shopper I can pay by card", "")
        .to_prompt(ReportKind::Coverage)
        .unwrap();
    CompletionRequest::new(prompt, CompletionSettings::default())
}

#[tokio::test]
async fn test_fenced_answer_is_filled_with_defaults() {
    let backend = ScriptedBackend::answers(&[
        "Here you go:\n```json\n{\"risk_scores\": [{\"area\": \"payments\", \"score\": 80,}],}\n```",
    ]);
    let orchestrator = ExtractionOrchestrator::with_config(ReportKind::Coverage.schema(), fast_config());

    let (report, metrics) = orchestrator.run(&backend, &coverage_request()).await.unwrap();

    assert_eq!(report.items("risk_scores")[0]["score"], 80);
    assert!(report.items("missing_coverage").is_empty());
    assert!(report.get("prioritized_plan").is_some());
    assert_eq!(metrics.backend_requests, 1);
    assert!(metrics.repaired);
    assert!(!metrics.reprompted);
}

#[tokio::test]
async fn test_reprompts_exactly_once_and_recovers() {
    let backend = ScriptedBackend::answers(&[
        "I think payments are the riskiest area.",
        r#"{"missing_coverage": ["refunds"], "extra": true}"#,
    ]);
    let orchestrator = ExtractionOrchestrator::with_config(ReportKind::Coverage.schema(), fast_config());

    let (report, metrics) = orchestrator.run(&backend, &coverage_request()).await.unwrap();

    assert_eq!(report.items("missing_coverage"), [json!("refunds")]);
    assert_eq!(report.get("extra"), Some(&json!(true)));
    assert_eq!(metrics.backend_requests, 2);
    assert!(metrics.reprompted);

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    let reformat = &requests[1];
    assert_eq!(reformat.settings.temperature, 0.0);
    assert_eq!(reformat.settings.max_tokens, 800);
    let follow_up = reformat.prompt.messages().last().unwrap().content();
    assert!(follow_up.contains("Original output:\nI think payments are the riskiest area."));
    assert!(follow_up.contains("most_impactful_tests"));
}

#[tokio::test]
async fn test_parse_error_keeps_raw_text_and_history() {
    let backend = ScriptedBackend::answers(&["nope", "still nope"]);
    let orchestrator = ExtractionOrchestrator::with_config(ReportKind::Coverage.schema(), fast_config());

    let err = orchestrator.run(&backend, &coverage_request()).await.unwrap_err();

    let ReportError::Parse { raw_text, history, .. } = err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert_eq!(raw_text, "nope");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].stage, AttemptStage::Initial);
    assert_eq!(history[1].stage, AttemptStage::Reformat);
    assert_eq!(history[1].raw_text, "still nope");
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_no_reprompt_fails_after_first_answer() {
    let backend = ScriptedBackend::answers(&["nope", "{}"]);
    let orchestrator = ExtractionOrchestrator::with_config(
        ReportKind::Coverage.schema(),
        fast_config().with_reprompt(false),
    );

    let err = orchestrator.run(&backend, &coverage_request()).await.unwrap_err();

    assert!(matches!(err, ReportError::Parse { ref history, .. } if history.len() == 1));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_backend_error_during_reprompt_is_surfaced() {
    let backend = ScriptedBackend::new(vec![
        Ok("no json here"),
        Err(BackendError::AuthFailed("key revoked".into())),
    ]);
    let orchestrator = ExtractionOrchestrator::with_config(ReportKind::Coverage.schema(), fast_config());

    let err = orchestrator.run(&backend, &coverage_request()).await.unwrap_err();

    assert_eq!(err.as_backend(), Some(&BackendError::AuthFailed("key revoked".into())));
}

#[tokio::test]
async fn test_retries_happen_inside_one_logical_request() {
    let backend = ScriptedBackend::new(vec![
        Err(BackendError::RateLimited("slow down".into())),
        Err(BackendError::ConnectionFailed("reset".into())),
        Ok(r#"{"plan": []}"#),
    ]);
    let orchestrator = ExtractionOrchestrator::with_config(ReportKind::TestPlan.schema(), fast_config());

    let (report, metrics) = orchestrator.run(&backend, &coverage_request()).await.unwrap();

    assert!(report.items("missing_coverage").is_empty());
    assert_eq!(backend.calls(), 3);
    assert_eq!(metrics.backend_requests, 1);
}

#[tokio::test]
async fn test_strict_shape_rejects_wrong_types() {
    let backend = ScriptedBackend::answers(&[r#"{"plan": "not a list"}"#, r#"{"plan": []}"#]);
    let orchestrator = ExtractionOrchestrator::with_config(
        ReportKind::TestPlan.schema(),
        fast_config().with_strict_shape(true),
    );

    let (_, metrics) = orchestrator.run(&backend, &coverage_request()).await.unwrap();

    assert!(metrics.reprompted);
}

#[tokio::test]
async fn test_run_typed_deserializes_report() {
    #[derive(Debug, Deserialize)]
    struct Plan {
        plan: Vec<serde_json::Value>,
        missing_coverage: Vec<String>,
    }

    let backend = ScriptedBackend::answers(&[r#"{"plan": [{"id": "T1"}]}"#]);
    let orchestrator = ExtractionOrchestrator::with_config(ReportKind::TestPlan.schema(), fast_config());

    let (typed, _) = orchestrator
        .run_typed::<Plan, _>(&backend, &coverage_request())
        .await
        .unwrap();

    assert_eq!(typed.plan.len(), 1);
    assert!(typed.missing_coverage.is_empty());
}

#[tokio::test]
async fn test_analyze_then_enrich() {
    let backend = ScriptedBackend::answers(&[
        r#"{"plan": [{"id": "T1", "title": "Pay", "steps": ["Open checkout", "Pay with card"]}]}"#,
    ]);
    let artifacts = Artifacts::new("As a shopper I can pay by card", "");

    let (mut report, _) = analyze(
        &backend,
        &artifacts,
        ReportKind::TestPlan,
        CompletionSettings::default(),
        fast_config(),
    )
    .await
    .unwrap();
    let touched = enrich(&mut report, &EnrichmentTable::default());

    assert_eq!(touched, 1);
    assert!(!report.items("missing_coverage").is_empty());
    let sent = &backend.requests()[0];
    assert_eq!(sent.prompt.system(), ReportKind::TestPlan.system_prompt());
}

#[tokio::test]
async fn test_analyze_rejects_empty_artifacts_without_calling() {
    let backend = ScriptedBackend::answers(&["{}"]);

    let err = analyze(
        &backend,
        &Artifacts::default(),
        ReportKind::Coverage,
        CompletionSettings::default(),
        fast_config(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::Config(_)));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_get_structured_report_with_plain_prompt() {
    let backend = ScriptedBackend::answers(&["`{\"a\": [1]}`"]);
    let schema = ReportSchema::new(["a", "b"]);

    let (report, _) = get_structured_report(
        &backend,
        Prompt::new("Answer in JSON.").with_user("go"),
        schema,
        CompletionSettings::default(),
        fast_config(),
    )
    .await
    .unwrap();

    assert_eq!(report.into_value(), json!({"a": [1], "b": []}));
}

#[tokio::test]
async fn test_route_picks_a_known_kind() {
    let backend = ScriptedBackend::answers(&["test_plan\n"]);

    let kind = route(
        &backend,
        "Write test cases for login",
        &CompletionSettings::default(),
        &fast_retry(2),
    )
    .await
    .unwrap();

    assert_eq!(kind, ReportKind::TestPlan);
    assert_eq!(backend.requests()[0].settings.temperature, 0.0);
}

#[tokio::test]
async fn test_route_unknown_label_is_not_retried() {
    let backend = ScriptedBackend::answers(&["translate", "coverage"]);

    let err = route(
        &backend,
        "Translate this to French",
        &CompletionSettings::default(),
        &fast_retry(3),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::Backend(BackendError::UnknownTool(ref label)) if label == "translate"));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_chat_turns_extend_caller_history() {
    let backend = ScriptedBackend::answers(&["Start with checkout.", "Then refunds."]);
    let options = ChatOptions {
        retry: fast_retry(2),
        ..ChatOptions::default()
    };

    let (conversation, first) =
        chat_turn(&backend, Conversation::new(), "You are a QA lead.", "What first?", &options)
            .await
            .unwrap();
    let (conversation, second) =
        chat_turn(&backend, conversation, "You are a QA lead.", "And next?", &options)
            .await
            .unwrap();

    assert_eq!(first, "Start with checkout.");
    assert_eq!(second, "Then refunds.");
    assert_eq!(conversation.len(), 4);

    let contents: Vec<String> = backend.requests()[1]
        .prompt
        .messages()
        .iter()
        .map(|m| m.content().to_string())
        .collect();
    assert_eq!(
        contents,
        ["You are a QA lead.", "What first?", "Start with checkout.", "And next?"]
    );
}
