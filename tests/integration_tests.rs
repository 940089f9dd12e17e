//! Integration tests for the groqchat application.
//!
//! Most tests drive [`ChatApp`] through a scripted provider that records
//! what it was asked.  The final test talks to the real API and is skipped
//! unless GROQ_API_KEY is set.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use groqchat::chat::{ChatApp, ChatEvent, EXAMPLES_SHOWN, PLACEHOLDER_TITLE, SessionId, View};
    use groqchat::{
        ChatCompletionParams, Completion, CompletionProvider, ConversationMemory, Error, Groq,
        GroqBinder, GroqOptions, KnownModel, Message, ProviderBinder, Renderer, Result, Role,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Complete {
            model: KnownModel,
            prompt: String,
            memory: Vec<Message>,
        },
        Generate {
            model: KnownModel,
            prompt: String,
        },
    }

    #[derive(Default)]
    struct Script {
        calls: Vec<Call>,
        binds: usize,
        fail_complete: bool,
        fail_generate: bool,
        title_reply: Option<String>,
    }

    type Shared = Arc<Mutex<Script>>;

    struct ScriptedProvider {
        model: KnownModel,
        memory: ConversationMemory,
        script: Shared,
    }

    #[async_trait::async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn model(&self) -> KnownModel {
            self.model
        }

        fn memory(&self) -> &ConversationMemory {
            &self.memory
        }

        async fn complete(
            &mut self,
            prompt: &str,
            renderer: &mut dyn Renderer,
        ) -> Result<Completion> {
            let fail = {
                let mut script = self.script.lock().unwrap();
                script.calls.push(Call::Complete {
                    model: self.model,
                    prompt: prompt.to_string(),
                    memory: self.memory.messages().to_vec(),
                });
                script.fail_complete
            };
            if fail {
                return Err(Error::service_unavailable("over capacity", None));
            }
            let reply = format!("echo: {prompt}");
            renderer.print_text(&reply);
            renderer.finish_response();
            self.memory.record_turn(prompt, &reply);
            Ok(Completion::text(reply))
        }

        async fn generate(&self, prompt: &str) -> Result<Completion> {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call::Generate {
                model: self.model,
                prompt: prompt.to_string(),
            });
            if script.fail_generate {
                return Err(Error::timeout("title took too long", Some(1.0)));
            }
            let reply = script
                .title_reply
                .clone()
                .unwrap_or_else(|| "  Friendly Greeting \n".to_string());
            Ok(Completion::text(reply))
        }
    }

    struct ScriptedBinder {
        script: Shared,
    }

    impl ProviderBinder for ScriptedBinder {
        fn bind(&self, model: KnownModel) -> Result<Box<dyn CompletionProvider>> {
            self.script.lock().unwrap().binds += 1;
            Ok(Box::new(ScriptedProvider {
                model,
                memory: ConversationMemory::default(),
                script: Arc::clone(&self.script),
            }))
        }
    }

    #[derive(Default)]
    struct Recorder {
        text: String,
        errors: Vec<String>,
        views: usize,
    }

    impl Renderer for Recorder {
        fn print_text(&mut self, text: &str) {
            self.text.push_str(text);
        }

        fn finish_response(&mut self) {}

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, _: &str) {}

        fn render_view(&mut self, _: &View<'_>) {
            self.views += 1;
        }
    }

    fn app() -> (ChatApp, Shared) {
        let script = Shared::default();
        let binder = ScriptedBinder {
            script: Arc::clone(&script),
        };
        (ChatApp::new(KnownModel::Gemma7bIt, Box::new(binder)), script)
    }

    async fn say(app: &mut ChatApp, text: &str) -> Result<()> {
        let mut renderer = Recorder::default();
        app.dispatch(ChatEvent::SubmitMessage(text.to_string()), &mut renderer)
            .await
    }

    async fn send(app: &mut ChatApp, event: ChatEvent) -> Result<()> {
        app.dispatch(event, &mut Recorder::default()).await
    }

    fn active(app: &ChatApp) -> SessionId {
        app.registry().active().unwrap()
    }

    fn completes(script: &Shared) -> Vec<Call> {
        script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Complete { .. }))
            .cloned()
            .collect()
    }

    fn generates(script: &Shared) -> usize {
        script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Generate { .. }))
            .count()
    }

    #[tokio::test]
    async fn hello_creates_one_titled_session() {
        let (mut app, script) = app();
        assert!(app.registry().is_empty());

        let mut renderer = Recorder::default();
        app.dispatch(ChatEvent::SubmitMessage("Hello".to_string()), &mut renderer)
            .await
            .unwrap();

        assert_eq!(renderer.text, "echo: Hello");
        assert_eq!(app.registry().len(), 1);
        let session = app.registry().active_session().unwrap();
        assert_eq!(
            session.messages(),
            &[Message::user("Hello"), Message::assistant("echo: Hello")]
        );
        assert_ne!(session.title(), PLACEHOLDER_TITLE);
        assert_eq!(session.title(), "Friendly Greeting");
        assert!(!app.registry().is_new_session());

        let calls = script.lock().unwrap().calls.clone();
        match &calls[1] {
            Call::Generate { prompt, .. } => {
                assert!(prompt.contains("user: Hello\nassistant: echo: Hello"));
            }
            other => panic!("expected title generation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn roles_alternate_in_commit_order() {
        let (mut app, _) = app();
        say(&mut app, "one").await.unwrap();
        say(&mut app, "two").await.unwrap();

        let roles: Vec<Role> = app
            .registry()
            .active_session()
            .unwrap()
            .messages()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn title_is_generated_exactly_once() {
        let (mut app, script) = app();
        say(&mut app, "one").await.unwrap();
        say(&mut app, "two").await.unwrap();
        say(&mut app, "three").await.unwrap();

        assert_eq!(generates(&script), 1);
        let session = app.registry().active_session().unwrap();
        assert_eq!(session.title(), "Friendly Greeting");
        assert!(session.is_titled());
    }

    #[tokio::test]
    async fn failed_title_is_reported_once_and_not_retried() {
        let (mut app, script) = app();
        script.lock().unwrap().fail_generate = true;

        let err = say(&mut app, "one").await.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.is_provider());
        let session = app.registry().active_session().unwrap();
        assert_eq!(
            session.messages(),
            &[Message::user("one"), Message::assistant("echo: one")]
        );
        assert_eq!(session.title(), PLACEHOLDER_TITLE);
        assert!(session.is_titled());

        say(&mut app, "two").await.unwrap();

        let session = app.registry().active_session().unwrap();
        assert_eq!(session.title(), PLACEHOLDER_TITLE);
        assert!(session.is_titled());
        assert_eq!(session.message_count(), 4);
        assert_eq!(generates(&script), 1);
    }

    #[tokio::test]
    async fn title_is_committed_trimmed_but_otherwise_verbatim() {
        let (mut app, script) = app();
        script.lock().unwrap().title_reply = Some("\n \"New Chat\" about *stars*\t\n".to_string());
        say(&mut app, "Hello").await.unwrap();
        assert_eq!(
            app.registry().active_session().unwrap().title(),
            "\"New Chat\" about *stars*"
        );

        send(&mut app, ChatEvent::NewSession).await.unwrap();
        script.lock().unwrap().title_reply = Some("   ".to_string());
        say(&mut app, "Again").await.unwrap();
        let session = app.registry().active_session().unwrap();
        assert_eq!(session.title(), "");
        assert!(session.is_titled());
    }

    #[tokio::test]
    async fn user_message_is_stored_as_typed() {
        let (mut app, script) = app();
        say(&mut app, "  spaced out \n").await.unwrap();

        let session = app.registry().active_session().unwrap();
        assert_eq!(session.messages()[0], Message::user("  spaced out \n"));
        match &completes(&script)[0] {
            Call::Complete { prompt, .. } => assert_eq!(prompt, "  spaced out \n"),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_failure_leaves_unanswered_user_message() {
        let (mut app, script) = app();
        script.lock().unwrap().fail_complete = true;

        let err = say(&mut app, "Hello").await.unwrap_err();
        assert!(err.is_provider());

        let session = app.registry().active_session().unwrap();
        assert_eq!(session.messages(), &[Message::user("Hello")]);
        assert_eq!(session.title(), PLACEHOLDER_TITLE);
        assert_eq!(generates(&script), 0);

        script.lock().unwrap().fail_complete = false;
        say(&mut app, "Hello").await.unwrap();
        let session = app.registry().active_session().unwrap();
        assert_eq!(session.message_count(), 3);
        assert_eq!(app.registry().len(), 1);
    }

    #[tokio::test]
    async fn model_switch_resets_context_but_keeps_transcript() {
        let (mut app, script) = app();
        say(&mut app, "one").await.unwrap();
        say(&mut app, "two").await.unwrap();

        send(&mut app, ChatEvent::SwitchModel(KnownModel::Llama3_70b8192))
            .await
            .unwrap();
        assert_eq!(app.registry().model(), KnownModel::Llama3_70b8192);
        assert_eq!(app.registry().active_session().unwrap().message_count(), 4);

        say(&mut app, "three").await.unwrap();

        let calls = completes(&script);
        assert_eq!(calls.len(), 3);
        match &calls[1] {
            Call::Complete { model, memory, .. } => {
                assert_eq!(*model, KnownModel::Gemma7bIt);
                assert_eq!(memory.len(), 2);
            }
            other => panic!("unexpected call {other:?}"),
        }
        match &calls[2] {
            Call::Complete {
                model,
                prompt,
                memory,
            } => {
                assert_eq!(*model, KnownModel::Llama3_70b8192);
                assert_eq!(prompt, "three");
                assert!(memory.is_empty());
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(app.registry().active_session().unwrap().message_count(), 6);
    }

    #[tokio::test]
    async fn switching_to_current_model_keeps_context() {
        let (mut app, script) = app();
        say(&mut app, "one").await.unwrap();
        send(&mut app, ChatEvent::SwitchModel(KnownModel::Gemma7bIt))
            .await
            .unwrap();
        say(&mut app, "two").await.unwrap();

        assert_eq!(script.lock().unwrap().binds, 1);
        match &completes(&script)[1] {
            Call::Complete { memory, .. } => assert_eq!(memory.len(), 2),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn sessions_keep_separate_provider_context() {
        let (mut app, script) = app();
        say(&mut app, "alpha").await.unwrap();
        let a = active(&app);

        send(&mut app, ChatEvent::NewSession).await.unwrap();
        assert!(app.registry().is_new_session());
        say(&mut app, "beta").await.unwrap();
        let b = active(&app);
        assert_ne!(a, b);

        send(&mut app, ChatEvent::SelectSession(a)).await.unwrap();
        say(&mut app, "alpha again").await.unwrap();

        match completes(&script).last() {
            Some(Call::Complete { memory, .. }) => {
                assert_eq!(
                    memory,
                    &vec![Message::user("alpha"), Message::assistant("echo: alpha")]
                );
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(app.registry().get(b).unwrap().message_count(), 2);
        assert_eq!(app.registry().get(a).unwrap().message_count(), 4);
    }

    #[tokio::test]
    async fn deleting_active_session_selects_remaining_one() {
        let (mut app, _) = app();
        say(&mut app, "A").await.unwrap();
        let a = active(&app);
        send(&mut app, ChatEvent::NewSession).await.unwrap();
        say(&mut app, "B").await.unwrap();
        let b = active(&app);

        send(&mut app, ChatEvent::SelectSession(a)).await.unwrap();
        send(&mut app, ChatEvent::DeleteSession(a)).await.unwrap();

        assert_eq!(app.registry().active(), Some(b));
        assert!(!app.registry().is_new_session());
        assert_eq!(app.registry().len(), 1);
    }

    #[tokio::test]
    async fn deleting_last_session_returns_to_new_session_mode() {
        let (mut app, _) = app();
        say(&mut app, "only").await.unwrap();
        let id = active(&app);

        send(&mut app, ChatEvent::DeleteSession(id)).await.unwrap();

        assert!(app.registry().is_empty());
        assert!(app.registry().active().is_none());
        assert!(app.registry().is_new_session());
        assert_eq!(app.view().examples.len(), EXAMPLES_SHOWN);
    }

    #[tokio::test]
    async fn deleting_inactive_session_keeps_active_state() {
        let (mut app, _) = app();
        say(&mut app, "A").await.unwrap();
        let a = active(&app);
        send(&mut app, ChatEvent::NewSession).await.unwrap();
        say(&mut app, "B").await.unwrap();

        let before = app.registry().state();
        send(&mut app, ChatEvent::DeleteSession(a)).await.unwrap();
        assert_eq!(app.registry().state(), before);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (mut app, _) = app();
        say(&mut app, "A").await.unwrap();
        let before = app.registry().state();

        let missing = SessionId::generate();
        let err = send(&mut app, ChatEvent::SelectSession(missing))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let err = send(&mut app, ChatEvent::DeleteSession(missing))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(app.registry().state(), before);
        assert_eq!(app.registry().len(), 1);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_creating_a_session() {
        let (mut app, script) = app();
        let err = say(&mut app, "   ").await.unwrap_err();
        assert!(err.is_validation());
        assert!(app.registry().is_empty());
        assert_eq!(script.lock().unwrap().calls.len(), 0);
    }

    #[tokio::test]
    async fn view_reflects_state() {
        let (mut app, _) = app();
        {
            let view = app.view();
            assert!(view.new_session);
            assert!(view.sessions.is_empty());
            assert!(view.transcript.is_empty());
            assert_eq!(view.examples.len(), EXAMPLES_SHOWN);
        }

        let prompt = app.example(1).unwrap();
        assert!(app.example(0).is_err());
        assert!(app.example(EXAMPLES_SHOWN + 1).is_err());
        say(&mut app, prompt).await.unwrap();

        let view = app.view();
        assert!(!view.new_session);
        assert!(view.examples.is_empty());
        assert_eq!(view.sessions.len(), 1);
        assert!(view.sessions[0].active);
        assert_eq!(view.sessions[0].position, 1);
        assert_eq!(view.sessions[0].message_count, 2);
        assert_eq!(view.active_title(), Some("Friendly Greeting"));
        assert_eq!(view.transcript[0], Message::user(prompt));
    }

    #[tokio::test]
    async fn every_app_starts_empty() {
        let (mut first, _) = app();
        say(&mut first, "remember me").await.unwrap();
        assert_eq!(first.registry().len(), 1);
        first.close();

        let (second, _) = app();
        assert!(second.registry().is_empty());
        assert!(second.registry().is_new_session());
        assert_eq!(second.registry().model(), KnownModel::Gemma7bIt);
    }

    #[tokio::test]
    async fn groq_binder_end_to_end() {
        use mockito::Matcher;
        use serde_json::json;

        let mut server = mockito::Server::new_async().await;
        let _stream = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer gsk_test")
            .match_body(Matcher::PartialJson(json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(concat!(
                "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"Hi \"}}]}\n\n",
                "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"there!\"}}]}\n\n",
                "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}],\"x_groq\":{\"id\":\"r1\",\"usage\":{\"prompt_tokens\":5,\"completion_tokens\":2,\"total_tokens\":7}}}\n\n",
                "data: [DONE]\n\n",
            ))
            .create_async()
            .await;
        let _title = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({"stream": false})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"c2","model":"gemma-7b-it","choices":[{"index":0,"message":{"role":"assistant","content":"Greeting Exchange"},"finish_reason":"stop"}],"usage":{"prompt_tokens":20,"completion_tokens":2,"total_tokens":22}}"#,
            )
            .create_async()
            .await;

        let client =
            Groq::with_options(Some("gsk_test".to_string()), Some(server.url()), None).unwrap();
        let binder = GroqBinder::new(client, GroqOptions::default());
        let mut app = ChatApp::new(KnownModel::Gemma7bIt, Box::new(binder));

        let mut renderer = Recorder::default();
        app.dispatch(ChatEvent::SubmitMessage("Hello".to_string()), &mut renderer)
            .await
            .unwrap();

        assert_eq!(renderer.text, "Hi there!");
        assert!(renderer.errors.is_empty());
        let session = app.registry().active_session().unwrap();
        assert_eq!(
            session.messages(),
            &[Message::user("Hello"), Message::assistant("Hi there!")]
        );
        assert_eq!(session.title(), "Greeting Exchange");
    }

    #[tokio::test]
    async fn groq_authentication_failure_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#)
            .create_async()
            .await;

        let client =
            Groq::with_options(Some("gsk_bad".to_string()), Some(server.url()), None).unwrap();
        let mut app = ChatApp::new(
            KnownModel::Gemma7bIt,
            Box::new(GroqBinder::new(client, GroqOptions::default())),
        );

        let err = say(&mut app, "Hello").await.unwrap_err();
        assert!(err.is_authentication());
        assert!(err.is_provider());
        assert_eq!(app.registry().active_session().unwrap().message_count(), 1);
    }

    #[tokio::test]
    async fn test_live_chat_completion() {
        // This test requires GROQ_API_KEY to be set
        let api_key = std::env::var("GROQ_API_KEY").ok();
        if api_key.is_none() {
            eprintln!("Skipping test: GROQ_API_KEY not set");
            return;
        }

        let client = Groq::new(api_key).expect("Failed to create client");
        let params = ChatCompletionParams::new(
            KnownModel::Llama3_8b8192,
            vec![Message::user("Say 'test passed'")],
        )
        .with_max_tokens(Some(10));

        let response = client.send(params).await;
        assert!(
            response.is_ok(),
            "Request should succeed with valid API key"
        );
    }
}
