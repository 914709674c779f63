use std::time::Duration;

use lingua_model::{ErrorKind, Image, OptionSet, Provider, ProviderName, Role};
use lingua_test_model::{PresetReply, TestTransport};
use serde_json::json;

use crate::{AgentBuilder, Attachment, Context, SharedAgent, Window};

fn agent(name: ProviderName, transport: &TestTransport) -> crate::Agent {
    AgentBuilder::with_provider(Provider::new(name, "k"))
        .with_transport(transport.clone())
        .with_system_prompt("You are terse.")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_transcript_grows_by_pairs() {
    let transport = TestTransport::with_replies([
        PresetReply::text(ProviderName::OpenAI, "Hi!"),
        PresetReply::text(ProviderName::OpenAI, "Paris."),
        PresetReply::text(ProviderName::OpenAI, "About 2.1 million."),
    ]);
    let mut agent = agent(ProviderName::OpenAI, &transport);
    let ctx = Context::background();

    for (n, text) in ["Hello", "Capital of France?", "Population?"]
        .into_iter()
        .enumerate()
    {
        agent.chat(&ctx, text, []).await.unwrap();
        assert_eq!(agent.transcript().len(), 2 * (n + 1));
    }
    for (i, turn) in agent.transcript().turns().iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(turn.role, expected);
    }

    let body = transport.last_request().unwrap().json_body().cloned().unwrap();
    assert_eq!(
        body["messages"],
        json!([
            { "role": "system", "content": "You are terse." },
            { "role": "user", "content": "Hello" },
            { "role": "assistant", "content": "Hi!" },
            { "role": "user", "content": "Capital of France?" },
            { "role": "assistant", "content": "Paris." },
            { "role": "user", "content": "Population?" }
        ])
    );
}

#[tokio::test]
async fn test_failed_turn_leaves_transcript_unchanged() {
    let transport = TestTransport::with_replies([
        PresetReply::text(ProviderName::Anthropic, "Hello."),
        PresetReply::api_error(ProviderName::Anthropic, 500, "Internal error"),
        PresetReply::text(ProviderName::Anthropic, "Sure."),
    ]);
    let mut agent = agent(ProviderName::Anthropic, &transport);
    let ctx = Context::background();

    agent.chat(&ctx, "Hi", []).await.unwrap();
    assert_eq!(agent.transcript().len(), 2);

    let err = agent.chat(&ctx, "Tell me more", []).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(agent.transcript().len(), 2);

    // Invalid input never reaches the transport.
    let err = agent.chat(&ctx, "", []).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(agent.transcript().len(), 2);
    assert_eq!(transport.dispatch_count(), 2);

    // The retried turn replays the same history as the failed one.
    agent.chat(&ctx, "Tell me more", []).await.unwrap();
    assert_eq!(agent.transcript().len(), 4);
    let requests = transport.requests();
    assert_eq!(requests[1].json_body(), requests[2].json_body());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_turn_leaves_transcript_unchanged() {
    let transport = TestTransport::with_replies([PresetReply::text(
        ProviderName::Google,
        "too late",
    )]);
    transport.set_delay(Duration::from_secs(10));
    let mut agent = agent(ProviderName::Google, &transport);

    let ctx = Context::with_timeout(Duration::from_secs(1));
    let err = agent.chat(&ctx, "Hi", []).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(agent.transcript().is_empty());
}

#[tokio::test]
async fn test_window_limits_replayed_history() {
    let transport = TestTransport::with_replies([
        PresetReply::text(ProviderName::Grok, "one"),
        PresetReply::text(ProviderName::Grok, "two"),
        PresetReply::text(ProviderName::Grok, "three"),
    ]);
    let mut agent = AgentBuilder::with_provider(Provider::new(ProviderName::Grok, "k"))
        .with_transport(transport.clone())
        .with_window(Window::LastTurns(1))
        .build()
        .unwrap();
    let ctx = Context::background();
    for text in ["a", "b", "c"] {
        agent.chat(&ctx, text, []).await.unwrap();
    }
    assert_eq!(agent.transcript().len(), 6);

    let body = transport.last_request().unwrap().json_body().cloned().unwrap();
    assert_eq!(
        body["messages"],
        json!([
            { "role": "user", "content": "b" },
            { "role": "assistant", "content": "two" },
            { "role": "user", "content": "c" }
        ])
    );
}

#[tokio::test]
async fn test_attachments_and_system_prompt() {
    let transport = TestTransport::with_replies([
        PresetReply::text(ProviderName::Anthropic, "A cat."),
        PresetReply::text(ProviderName::Anthropic, "Yes."),
    ]);
    let mut agent = agent(ProviderName::Anthropic, &transport);
    let ctx = Context::background();

    let image = Image::from_url("https://example.com/cat.png");
    agent
        .chat(&ctx, "What is this?", [Attachment::from(image.clone())])
        .await
        .unwrap();
    assert_eq!(agent.transcript().turns()[0].images, vec![image]);

    agent.set_system_prompt("You are a vet.");
    agent.chat(&ctx, "Is it healthy?", []).await.unwrap();

    let body = transport.last_request().unwrap().json_body().cloned().unwrap();
    assert_eq!(body["system"], json!("You are a vet."));
    // The earlier image is replayed with its turn.
    assert_eq!(body["messages"][0]["content"][0]["type"], json!("image"));
}

#[tokio::test]
async fn test_options_are_validated_per_turn() {
    let transport = TestTransport::default();
    let mut agent = AgentBuilder::with_provider(Provider::new(ProviderName::Anthropic, "k"))
        .with_transport(transport.clone())
        .with_options(OptionSet::new().with_frequency_penalty(0.5))
        .build()
        .unwrap();
    let err = agent
        .chat(&Context::background(), "Hi", [])
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("WithFrequencyPenalty"));
    assert_eq!(transport.dispatch_count(), 0);
}

#[tokio::test]
async fn test_reset() {
    let transport = TestTransport::with_replies([
        PresetReply::text(ProviderName::OpenAI, "Hi!"),
        PresetReply::text(ProviderName::OpenAI, "Hello again!"),
    ]);
    let mut agent = agent(ProviderName::OpenAI, &transport);
    let ctx = Context::background();
    agent.chat(&ctx, "Hello", []).await.unwrap();
    agent.reset();
    assert!(agent.transcript().is_empty());
    assert_eq!(agent.system_prompt(), Some("You are terse."));

    agent.chat(&ctx, "Hello", []).await.unwrap();
    let body = transport.last_request().unwrap().json_body().cloned().unwrap();
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_shared_agent_serializes_turns() {
    let transport = TestTransport::with_replies([
        PresetReply::text(ProviderName::OpenAI, "first"),
        PresetReply::text(ProviderName::OpenAI, "second"),
    ]);
    transport.set_delay(Duration::from_millis(10));
    let shared = SharedAgent::new(agent(ProviderName::OpenAI, &transport));
    let ctx = Context::background();

    let (a, b) = tokio::join!(
        shared.chat(&ctx, "one", []),
        shared.chat(&ctx, "two", []),
    );
    a.unwrap();
    b.unwrap();

    let agent = shared.lock().await;
    assert_eq!(agent.transcript().len(), 4);
    // The second turn saw the first one in its history.
    let requests = transport.requests();
    let messages = &requests[1].json_body().unwrap()["messages"];
    assert_eq!(messages.as_array().map(Vec::len), Some(4));
}
