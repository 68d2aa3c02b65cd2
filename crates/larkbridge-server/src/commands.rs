//! Slash commands: `/help`, `/clear`, `/model`, `/role`

use crate::prompts::PromptBook;
use crate::store::{ChatStore, MODEL_KEY, ROLE_KEY};

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    /// Show (None) or switch the model
    Model(Option<String>),
    /// Show (None) or switch the role
    Role(Option<String>),
    Unknown(String),
}

impl Command {
    /// Parse `text` if it starts with `/`; extra arguments are ignored
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }
        let mut parts = text.split_whitespace();
        let name = parts.next()?;
        let arg = parts.next().map(str::to_string);

        Some(match name {
            "/help" => Command::Help,
            "/clear" => Command::Clear,
            "/model" => Command::Model(arg),
            "/role" => Command::Role(arg),
            other => Command::Unknown(other.to_string()),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Command::Help => "/help",
            Command::Clear => "/clear",
            Command::Model(_) => "/model",
            Command::Role(_) => "/role",
            Command::Unknown(name) => name,
        }
    }
}

/// What command execution reads and writes
pub struct CommandContext<'a> {
    pub store: &'a ChatStore,
    pub prompts: &'a PromptBook,
    pub default_model: &'a str,
    pub default_role: &'a str,
}

impl CommandContext<'_> {
    fn current_role(&self, chat_id: &str) -> String {
        self.store
            .setting(chat_id, ROLE_KEY)
            .unwrap_or_else(|| self.default_role.to_string())
    }
}

/// Apply `command` to `chat_id` and return the reply text
pub fn execute(command: &Command, chat_id: &str, ctx: &CommandContext<'_>) -> String {
    match command {
        Command::Help => {
            let roles = ctx
                .prompts
                .roles()
                .iter()
                .map(|r| format!("`{}`", r))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "**🤖 Available Commands**\n\n\
                 - `/help`: Show this help message.\n\
                 - `/clear`: Clear conversation history.\n\
                 - `/model [model_name]`: Show or switch AI model. Current default: `{}`\n\
                 - `/role [role_name]`: Show or switch bot's role. Current role: `{}`\n  \
                 Available roles: {}",
                ctx.default_model,
                ctx.current_role(chat_id),
                roles
            )
        }
        Command::Clear => {
            ctx.store.clear_user_data(chat_id);
            "✨ Conversation history and settings have been cleared.".to_string()
        }
        Command::Model(None) => {
            let current = ctx
                .store
                .setting(chat_id, MODEL_KEY)
                .unwrap_or_else(|| ctx.default_model.to_string());
            format!("ℹ️ Current model: **{}**", current)
        }
        Command::Model(Some(model)) => {
            ctx.store.set_setting(chat_id, MODEL_KEY, model);
            format!("✅ Model switched to: **{}**", model)
        }
        Command::Role(None) => format!("ℹ️ Current role: **{}**", ctx.current_role(chat_id)),
        Command::Role(Some(role)) if !ctx.prompts.contains(role) => {
            format!("❌ Role not found: **{}**.", role)
        }
        Command::Role(Some(role)) => {
            ctx.store.set_setting(chat_id, ROLE_KEY, role);
            ctx.store.clear_history(chat_id);
            format!("🎭 Role switched to: **{}**. Conversation history has been cleared.", role)
        }
        Command::Unknown(name) => format!("🤷‍♀️ Unknown command: **{}**.", name),
    }
}
