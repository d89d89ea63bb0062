//! End-to-end conversation turns against a mocked chat route.
//!
//! Each test wires a real `Orchestrator` to `HttpChatClient`, the keyword
//! emotion detector and a temp-dir `MemoryStore`; speech backends are
//! in-memory fakes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use samantha::chat::{ChatClient, HttpChatClient};
use samantha::config::SamanthaConfig;
use samantha::conversation::{ConversationState, Sender, TurnType};
use samantha::emotion::{DisplayEmotion, KeywordEmotionDetector};
use samantha::memory::MemoryStore;
use samantha::runtime::{ConversationEvent, Notice};
use samantha::speech::{
    RecognitionEvent, SpeechCapture, SpeechOutput, SpeechRecognizer, SpeechSynthesizer,
    SynthesisEvent, Utterance, Voice,
};
use samantha::{Orchestrator, TurnOutcome};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct AlwaysOnRecognizer;

impl SpeechRecognizer for AlwaysOnRecognizer {
    fn is_supported(&self) -> bool {
        true
    }
    fn start(&mut self) -> samantha::Result<()> {
        Ok(())
    }
    fn stop(&mut self) {}
}

struct RecordingSynth(Arc<Mutex<Vec<Utterance>>>);

impl SpeechSynthesizer for RecordingSynth {
    fn is_supported(&self) -> bool {
        true
    }
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("Samantha", "en-US")]
    }
    fn speak(&mut self, utterance: Utterance) -> samantha::Result<()> {
        self.0.lock().unwrap().push(utterance);
        Ok(())
    }
    fn cancel(&mut self) {}
}

struct Setup {
    orch: Orchestrator,
    store: MemoryStore,
    spoken: Arc<Mutex<Vec<Utterance>>>,
    events: broadcast::Receiver<ConversationEvent>,
    _dir: tempfile::TempDir,
}

fn setup(server: &MockServer) -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SamanthaConfig::default();
    config.chat.endpoint = format!("{}/api/chat", server.uri());
    config.chat.timeout_secs = 5;
    config.memory.path = Some(dir.path().join("memories.json"));

    let spoken = Arc::new(Mutex::new(Vec::new()));
    let store = MemoryStore::from_config(&config.memory);
    let (tx, events) = broadcast::channel(64);

    let orch = Orchestrator::new(
        SpeechCapture::new(Box::new(AlwaysOnRecognizer)),
        SpeechOutput::new(Box::new(RecordingSynth(Arc::clone(&spoken))), &config.voice),
        Arc::new(HttpChatClient::new(&config.chat).unwrap()),
        Arc::new(KeywordEmotionDetector),
        &config,
    )
    .with_memory(store.clone())
    .with_events(tx);

    Setup {
        orch,
        store,
        spoken,
        events,
        _dir: dir,
    }
}

fn drain(rx: &mut broadcast::Receiver<ConversationEvent>) -> Vec<ConversationEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn test_spoken_turn_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"message": "I'm really happy today"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "That's wonderful! What made it so good?",
            "emotion": "happy",
            "type": "standard"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut s = setup(&server);
    assert!(s.orch.start_listening());

    let pending = s
        .orch
        .handle_recognition(RecognitionEvent::Result {
            transcript: "I'm really happy today".into(),
            is_final: true,
        })
        .await
        .expect("final transcript starts a turn");
    assert_eq!(s.orch.state(), ConversationState::Processing);

    let result = s.orch.chat_client().send(&pending.request).await;
    assert_eq!(
        s.orch.complete_turn(pending.token, result),
        TurnOutcome::Replied
    );
    assert_eq!(s.orch.state(), ConversationState::Speaking);
    let reply = {
        let spoken = s.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "That's wonderful! What made it so good?");
        spoken[0].id
    };

    s.orch.handle_synthesis(SynthesisEvent::Finished(reply));
    assert_eq!(s.orch.state(), ConversationState::Idle);

    let records = s.store.load().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_input, "I'm really happy today");
    assert_eq!(records[0].emotion_summary(), "positive (10/10)");

    let states: Vec<ConversationState> = drain(&mut s.events)
        .into_iter()
        .filter_map(|e| match e {
            ConversationEvent::StateChanged(state) => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        [
            ConversationState::Listening,
            ConversationState::Processing,
            ConversationState::Speaking,
            ConversationState::Idle,
        ]
    );
}

#[tokio::test]
async fn test_backend_failure_falls_back_to_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .mount(&server)
        .await;

    let mut s = setup(&server);
    assert_eq!(
        s.orch.handle_transcript("hello?").await,
        TurnOutcome::Failed
    );
    assert_eq!(s.orch.state(), ConversationState::Idle);

    let messages = s.orch.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(
        messages[1].text,
        "I'm having some trouble connecting to my thoughts. Please try again."
    );
    assert_eq!(messages[1].emotion, Some(DisplayEmotion::Neutral));
    assert!(s.store.load().unwrap().is_empty());

    let notices: Vec<Notice> = drain(&mut s.events)
        .into_iter()
        .filter_map(|e| match e {
            ConversationEvent::Notice(n) => Some(n),
            _ => None,
        })
        .collect();
    assert!(matches!(notices.as_slice(), [Notice::ChatFailed(msg)] if msg.contains("boom")));
}

#[tokio::test]
async fn test_reflection_question_is_answered_next_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"message": "Today was great"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "What made today special?",
            "emotion": "curious",
            "type": "reflection"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "message": "I saw an old friend",
            "reflectionAnswer": {"question": "What made today special?"},
            "history": [
                {"sender": "user", "text": "Today was great"},
                {"sender": "ai", "text": "What made today special?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Old friends are a treasure.",
            "emotion": "happy"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut s = setup(&server);
    s.orch.handle_transcript("Today was great").await;
    assert_eq!(s.orch.messages()[1].turn_type, TurnType::Reflection);
    assert!(s.orch.reflection().is_some());
    s.orch.speech_finished();

    assert_eq!(
        s.orch.handle_transcript("I saw an old friend").await,
        TurnOutcome::Replied
    );
    assert!(s.orch.reflection().is_none());
    assert_eq!(s.store.load().unwrap().len(), 2);
}

#[tokio::test]
async fn test_greeting_reflects_stored_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Hi!"})))
        .mount(&server)
        .await;

    let mut s = setup(&server);
    s.orch.greet(20);
    assert_eq!(
        s.orch.messages()[0].text,
        "Good evening! I'm Samantha. I'm here to be your thoughtful companion."
    );
    s.orch.speech_finished();
    s.orch.handle_transcript("hello").await;

    s.orch.speech_finished();
    s.orch.greet(20);
    assert_eq!(
        s.orch.messages().last().unwrap().text,
        "Good evening! How was your day?"
    );
}
