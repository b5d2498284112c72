//! End-to-end exchange tests: prompt injection, streaming, guarding

use docforge_core::{
    ChannelDeltaSink, ChatOrchestrator, ExchangeError, ExchangeRequest, Message, ModelConnection,
    NullDeltaSink, PromptMode, ProviderError, Termination, TypographyDefaults,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> ExchangeRequest {
    ExchangeRequest {
        mode: PromptMode::Fix,
        typography: TypographyDefaults::new("SimSun", 12.0),
        messages: vec![Message::user("Clean this up")],
        custom_instruction: None,
        reference_documents: Vec::new(),
    }
}

fn orchestrator_for(server: &MockServer) -> ChatOrchestrator {
    ChatOrchestrator::new(ModelConnection::new(server.uri(), "test-key", "test-model")).unwrap()
}

fn sse_event(content: &str) -> String {
    format!(
        "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n\n",
        serde_json::to_string(content).unwrap()
    )
}

#[tokio::test]
async fn exchange_streams_accumulates_and_guards() {
    let body = format!(
        "{}{}{}data: [DONE]\n\n",
        sse_event("<style>p{}</style>"),
        sse_event("<table style=\"width:600px\"><tr><td>v</td></tr></table>"),
        sse_event("<math><mi>x</mi><mo>+</mo><mi>y</mi></math>"),
    );

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Typography protocol"))
        .and(body_string_contains("\"role\":\"system\""))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let (tx, mut rx) = mpsc::channel(32);
    let mut sink = ChannelDeltaSink::new(tx);

    let outcome = orchestrator
        .run(request(), CancellationToken::new(), &mut sink)
        .await
        .unwrap();
    drop(sink);

    assert!(outcome.is_complete());
    assert!(outcome.raw_text.contains("<style>"));
    assert!(!outcome.html.contains("<style"));
    assert!(outcome.html.contains("width:450pt"));
    assert!(outcome.html.contains("border-collapse:collapse"));
    assert!(outcome.html.contains("x+y"));
    assert!(!outcome.html.contains("<math"));
    assert_eq!(outcome.report.removed_style_tags, 1);
    assert_eq!(outcome.report.tables_processed, 1);
    assert!(outcome.report.math_nodes_removed >= 1);

    // Transcript: the caller's user turn plus the new assistant turn; the
    // hidden system message never appears.
    assert_eq!(outcome.messages.len(), 2);
    assert_eq!(outcome.messages[1].content, outcome.raw_text);

    let mut streamed = String::new();
    while let Some(delta) = rx.recv().await {
        streamed.push_str(&delta);
    }
    assert_eq!(streamed, outcome.raw_text);
}

#[tokio::test]
async fn pre_stream_failure_is_a_hard_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let mut sink = NullDeltaSink;
    let err = orchestrator
        .run(request(), CancellationToken::new(), &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExchangeError::Provider(ProviderError::Authentication(_))
    ));
}

#[tokio::test]
async fn cancellation_settles_quietly_with_partial_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: [DONE]\n\n", "text/event-stream")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let orchestrator = orchestrator.clone();
        let cancel = cancel.clone();
        async move {
            let mut sink = NullDeltaSink;
            orchestrator.run(request(), cancel, &mut sink).await
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = Instant::now();
    cancel.cancel();

    let outcome = handle.await.unwrap().unwrap();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(outcome.termination, Termination::Cancelled));
    assert!(outcome.raw_text.is_empty());
    assert!(!outcome.is_complete());
    // Guard still ran; the report stays truthful for empty input.
    assert!(outcome.report.enforced_body_style);
}

#[tokio::test]
async fn custom_instruction_reaches_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("[User instructions]"))
        .and(body_string_contains("British spelling"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("data: [DONE]\n\n", "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let mut req = request();
    req.custom_instruction = Some("Use British spelling.".to_string());

    let mut sink = NullDeltaSink;
    let outcome = orchestrator
        .run(req, CancellationToken::new(), &mut sink)
        .await
        .unwrap();

    assert!(outcome.is_complete());
    assert!(outcome.raw_text.is_empty());
}

#[tokio::test]
async fn concurrent_exchanges_do_not_share_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!("{}data: [DONE]\n\n", sse_event("<p>ok</p>")),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                let mut sink = NullDeltaSink;
                orchestrator
                    .run(request(), CancellationToken::new(), &mut sink)
                    .await
            })
        })
        .collect();

    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.raw_text, "<p>ok</p>");
    }
}
