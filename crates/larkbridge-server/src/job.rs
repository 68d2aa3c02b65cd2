//! Work done on the pool for each accepted message

use larkbridge_core::ChatMessage;

use crate::commands::{self, Command, CommandContext};
use crate::error::{JobError, JobResult};
use crate::postprocess::clean_reply;
use crate::state::AppState;
use crate::store::{MODEL_KEY, ROLE_KEY};

/// User-facing card for a failed message
pub fn error_card(kind: &str, detail: &str, debug: bool) -> String {
    let mut card = format!(
        "🤯 **Oops! An error occurred.**\n\n\
         I encountered a `{}` while trying to process your request. \
         Please try again later or contact an administrator if the problem persists.",
        kind
    );
    if debug {
        card.push_str(&format!("\n\n**Debug Info:**\n```{}```", detail));
    }
    card
}

/// Answer one chat message and record the exchange
///
/// Failures are reported to the chat as an error card, replacing the
/// placeholder when one was posted.
pub async fn process_message(state: &AppState, chat_id: &str, text: &str) {
    let chat = &state.settings.chat;

    let placeholder = if chat.enable_send_and_replace {
        match state.platform.send_message(chat_id, &chat.placeholder_message).await {
            Ok(message_id) => Some(message_id),
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "failed to send placeholder");
                None
            }
        }
    } else {
        None
    };

    if let Err(e) = answer(state, chat_id, text, placeholder.as_deref()).await {
        tracing::error!(chat_id, error = %e, "failed to process message");
        let card = error_card(e.kind(), &e.to_string(), state.settings.debug_mode);
        if let Err(e) = deliver(state, chat_id, placeholder.as_deref(), &card).await {
            tracing::error!(chat_id, error = %e, "failed to send error card");
        }
    }
}

async fn answer(state: &AppState, chat_id: &str, text: &str, placeholder: Option<&str>) -> JobResult<()> {
    let settings = &state.settings;

    let model = state
        .store
        .setting(chat_id, MODEL_KEY)
        .unwrap_or_else(|| settings.model.default_model.clone());
    let role = state
        .store
        .setting(chat_id, ROLE_KEY)
        .unwrap_or_else(|| settings.chat.default_role.clone());

    let user_turn = ChatMessage::user(text);
    let mut messages = vec![ChatMessage::system(state.prompts.system_prompt(&role))];
    messages.extend(state.store.history(chat_id));
    messages.push(user_turn.clone());

    tracing::info!(chat_id, model = %model, role = %role, "running conversation");
    let raw = state.conversation.run(messages, &model).await?;
    let reply = clean_reply(&raw);

    deliver(state, chat_id, placeholder, &reply).await?;

    state.store.append_exchange(
        chat_id,
        user_turn,
        ChatMessage::assistant(reply),
        settings.chat.context_max_messages * 2,
    );
    Ok(())
}

async fn deliver(state: &AppState, chat_id: &str, placeholder: Option<&str>, content: &str) -> JobResult<()> {
    match placeholder {
        Some(message_id) => state.platform.patch_message(message_id, content).await?,
        None => {
            state.platform.send_message(chat_id, content).await?;
        }
    }
    Ok(())
}

/// Execute a slash command and post its reply
pub async fn run_command(state: &AppState, chat_id: &str, command: &Command) {
    let ctx = CommandContext {
        store: &state.store,
        prompts: &state.prompts,
        default_model: &state.settings.model.default_model,
        default_role: &state.settings.chat.default_role,
    };
    let reply = commands::execute(command, chat_id, &ctx);
    tracing::info!(chat_id, command = command.name(), "command handled");

    if let Err(e) = state.platform.send_message(chat_id, &reply).await {
        let e = JobError::from(e);
        tracing::error!(chat_id, error = %e, "failed to send command reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use larkbridge_core::{Completion, MessageRole, MockProvider, Settings, ToolCall};

    use crate::lark::{MockPlatform, Outgoing};
    use crate::state::test_support::mock_state as state_with;

    #[tokio::test]
    async fn test_reply_replaces_placeholder_and_records_history() {
        let (state, provider, platform) = state_with(
            MockProvider::fixed("<think>hmm</think>Hello there!"),
            MockPlatform::new("ou_bot"),
            Settings::default(),
        );

        process_message(&state, "oc_1", "hi").await;

        assert_eq!(
            platform.outgoing(),
            vec![
                Outgoing::Sent {
                    chat_id: "oc_1".to_string(),
                    message_id: "om_mock_1".to_string(),
                    content: "Thinking, please wait...".to_string(),
                },
                Outgoing::Patched {
                    message_id: "om_mock_1".to_string(),
                    content: "Hello there!".to_string(),
                },
            ]
        );

        let request = &provider.requests()[0];
        assert_eq!(request.model, "gpt-4-turbo");
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[0].content, "Be brief.");
        assert_eq!(request.messages.last().unwrap().content, "hi");

        let history = state.store.history("oc_1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "Hello there!");
    }

    #[tokio::test]
    async fn test_chat_settings_pick_model_role_and_history() {
        let mut settings = Settings::default();
        settings.chat.enable_send_and_replace = false;
        let (state, provider, platform) = state_with(MockProvider::fixed("Arr"), MockPlatform::new("ou_bot"), settings);

        state.store.set_setting("oc_1", MODEL_KEY, "gpt-4.1");
        state.store.set_setting("oc_1", ROLE_KEY, "pirate");
        state.store.save_history("oc_1", vec![ChatMessage::user("earlier"), ChatMessage::assistant("reply")]);

        process_message(&state, "oc_1", "ahoy").await;

        let request = &provider.requests()[0];
        assert_eq!(request.model, "gpt-4.1");
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[0].content, "Talk like a pirate.");
        assert_eq!(request.messages[1].content, "earlier");
        assert_eq!(platform.contents(), vec!["Arr".to_string()]);
    }

    #[tokio::test]
    async fn test_history_window_is_bounded() {
        let mut settings = Settings::default();
        settings.chat.context_max_messages = 1;
        let (state, _, _) = state_with(MockProvider::fixed("ok"), MockPlatform::new("ou_bot"), settings);

        process_message(&state, "oc_1", "one").await;
        process_message(&state, "oc_1", "two").await;

        let history = state.store.history("oc_1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "two");
    }

    #[tokio::test]
    async fn test_backend_failure_sends_error_card() {
        let (state, _, platform) = state_with(
            MockProvider::new().then_fail("quota exceeded"),
            MockPlatform::new("ou_bot"),
            Settings::default(),
        );

        process_message(&state, "oc_1", "hi").await;

        let contents = platform.contents();
        assert_eq!(contents.len(), 2);
        assert!(contents[1].contains("`ProviderError`"));
        assert!(!contents[1].contains("Debug Info"));
        assert!(state.store.history("oc_1").is_empty());
    }

    #[tokio::test]
    async fn test_debug_mode_includes_error_detail() {
        let mut settings = Settings::default();
        settings.debug_mode = true;
        settings.chat.enable_send_and_replace = false;
        let (state, _, platform) = state_with(MockProvider::new().then_fail("quota exceeded"), MockPlatform::new("ou_bot"), settings);

        process_message(&state, "oc_1", "hi").await;

        let contents = platform.contents();
        assert_eq!(contents.len(), 1);
        assert!(contents[0].contains("**Debug Info:**"));
        assert!(contents[0].contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_tool_calls_flow_through_the_loop() {
        let provider = MockProvider::new()
            .then_reply(Completion::with_tool_calls(vec![ToolCall::new("call_1", "missing", "{}")]))
            .then_reply(Completion::text("Done."));
        let (state, provider, platform) = state_with(provider, MockPlatform::new("ou_bot"), Settings::default());

        process_message(&state, "oc_1", "use a tool").await;

        assert_eq!(provider.request_count(), 2);
        let tool_turn = provider.requests()[1].messages.last().unwrap().clone();
        assert_eq!(tool_turn.content, "Error: Tool 'missing' not found.");
        assert_eq!(platform.contents().last().unwrap(), "Done.");
    }

    #[tokio::test]
    async fn test_run_command_replies() {
        let (state, _, platform) = state_with(MockProvider::fixed("unused"), MockPlatform::new("ou_bot"), Settings::default());

        run_command(&state, "oc_1", &Command::Model(Some("gpt-4.1".to_string()))).await;

        assert_eq!(platform.contents(), vec!["✅ Model switched to: **gpt-4.1**".to_string()]);
        assert_eq!(state.store.setting("oc_1", MODEL_KEY).as_deref(), Some("gpt-4.1"));
    }

    #[test]
    fn test_error_card() {
        let card = error_card("TimeoutError", "took too long", false);
        assert!(card.starts_with("🤯 **Oops! An error occurred.**"));
        assert!(card.contains("I encountered a `TimeoutError` while trying"));
        assert!(!card.contains("took too long"));

        let card = error_card("TimeoutError", "took too long", true);
        assert!(card.ends_with("\n\n**Debug Info:**\n```took too long```"));
    }
}
