//! `LlamaServerEngine` against a mock llama-server.

mod common;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use futures_util::StreamExt;
use npcllm_core::{ChatEngine, ChatRequest, ConversationTurn, EngineError, GenerationFragment};
use npcllm_runtime::{EngineConfig, LlamaServerEngine, RuntimeError, start_engine};

use common::{MockState, spawn_mock};

fn request(text: &str) -> ChatRequest {
    ChatRequest::new(vec![
        ConversationTurn::system("You are a guard at the city gate."),
        ConversationTurn::user(text),
    ])
    .unwrap()
}

async fn engine(parallel: usize) -> (LlamaServerEngine, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let base_url = spawn_mock(Arc::clone(&state)).await;
    let engine = LlamaServerEngine::new(&base_url, parallel, Duration::from_secs(5)).unwrap();
    (engine, state)
}

#[tokio::test]
async fn complete_once_returns_message_content() {
    let (engine, _) = engine(1).await;
    let text = engine.complete_once(&request("Halt!")).await.unwrap();
    assert_eq!(text, "echo: Halt!");
}

#[tokio::test]
async fn complete_once_forwards_generation_parameters() {
    let (engine, _) = engine(1).await;
    let request = request("params")
        .with_max_tokens(NonZeroU32::new(32).unwrap())
        .with_temperature(0.5)
        .unwrap()
        .with_stop(["<|eot_id|>"])
        .unwrap();

    let text = engine.complete_once(&request).await.unwrap();
    assert_eq!(text, "32|0.5|[\"<|eot_id|>\"]");
}

#[tokio::test]
async fn unexpected_reply_shape_falls_back_to_output() {
    let (engine, _) = engine(1).await;
    let text = engine.complete_once(&request("odd shape")).await.unwrap();
    assert_eq!(text, "from output");
}

#[tokio::test]
async fn upstream_error_status_is_reported() {
    let (engine, _) = engine(1).await;
    let err = engine.complete_once(&request("fail")).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Upstream {
            status: 500,
            message: "slot unavailable".to_string(),
        }
    );
}

#[tokio::test]
async fn unreachable_engine_is_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let engine =
        LlamaServerEngine::new(&format!("http://127.0.0.1:{port}"), 1, Duration::from_secs(1))
            .unwrap();
    let err = engine.complete_once(&request("hi")).await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)), "{err:?}");
}

#[tokio::test]
async fn stream_yields_fragments_in_order() {
    let (engine, _) = engine(1).await;
    let stream = engine.complete_stream(&request("Hello?")).await.unwrap();
    let items: Vec<_> = stream
        .map(|item| item.map(GenerationFragment::into_text))
        .collect()
        .await;
    assert_eq!(items, vec![Ok("Hel".to_string()), Ok("lo".to_string())]);
    assert_eq!(engine.available_slots(), 1);
}

#[tokio::test]
async fn stream_error_chunk_is_terminal() {
    let (engine, _) = engine(1).await;
    let stream = engine.complete_stream(&request("break")).await.unwrap();
    let items: Vec<_> = stream
        .map(|item| item.map(GenerationFragment::into_text))
        .collect()
        .await;
    assert_eq!(
        items,
        vec![
            Ok("Hel".to_string()),
            Err(EngineError::Generation("kv cache full".to_string())),
        ]
    );
}

#[tokio::test]
async fn stream_start_failure_is_returned_before_any_fragment() {
    let (engine, _) = engine(1).await;
    let Err(err) = engine.complete_stream(&request("fail")).await else {
        panic!("expected stream start to fail");
    };
    assert!(matches!(err, EngineError::Upstream { status: 500, .. }));
    assert_eq!(engine.available_slots(), 1);
}

#[tokio::test]
async fn generations_are_serialized_until_the_stream_is_dropped() {
    let (engine, state) = engine(1).await;

    let mut held = engine.complete_stream(&request("hold")).await.unwrap();
    let first = held.next().await.unwrap().unwrap();
    assert_eq!(first.text(), "wait");
    assert_eq!(engine.available_slots(), 0);

    let blocked = tokio::time::timeout(
        Duration::from_millis(200),
        engine.complete_once(&request("next")),
    )
    .await;
    assert!(blocked.is_err(), "second generation should wait for the slot");
    assert_eq!(state.completion_calls.load(Ordering::SeqCst), 1);

    drop(held);
    let text = engine.complete_once(&request("next")).await.unwrap();
    assert_eq!(text, "echo: next");
}

#[tokio::test]
async fn two_slots_allow_concurrent_generations() {
    let (engine, _) = engine(2).await;

    let mut held = engine.complete_stream(&request("hold")).await.unwrap();
    assert!(held.next().await.is_some());

    let text = tokio::time::timeout(
        Duration::from_secs(2),
        engine.complete_once(&request("next")),
    )
    .await
    .expect("second slot should be free")
    .unwrap();
    assert_eq!(text, "echo: next");
}

#[tokio::test]
async fn attach_waits_for_model_to_load() {
    let state = Arc::new(MockState::default());
    state.loading_polls.store(2, Ordering::SeqCst);
    let base_url = spawn_mock(Arc::clone(&state)).await;

    let mut config = EngineConfig::attach("/models/npc.gguf", format!("{base_url}/"));
    config.startup_timeout = Duration::from_secs(10);

    let process = start_engine(&config).await.unwrap();
    assert_eq!(process.base_url(), base_url);
    assert!(!process.is_managed());
    assert!(state.health_calls.load(Ordering::SeqCst) >= 3);
    process.shutdown().await.unwrap();
}

#[tokio::test]
async fn attach_times_out_when_engine_never_loads() {
    let state = Arc::new(MockState::default());
    state.loading_polls.store(usize::MAX, Ordering::SeqCst);
    let base_url = spawn_mock(state).await;

    let mut config = EngineConfig::attach("/models/npc.gguf", base_url);
    config.startup_timeout = Duration::from_secs(1);

    let err = start_engine(&config).await.unwrap_err();
    assert!(matches!(err, RuntimeError::StartupTimeout { .. }), "{err:?}");
}
