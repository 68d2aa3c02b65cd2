//! HTTP surface: the event callback and a health check

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::commands::Command;
use crate::job;
use crate::lark::{resolve_mentions, CallbackPayload};
use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/lark_callback", post(lark_callback))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "message": "Lark bot is running."}))
}

fn reply(msg: &str) -> Response {
    Json(json!({ "msg": msg })).into_response()
}

async fn lark_callback(State(state): State<SharedState>, Json(payload): Json<CallbackPayload>) -> Response {
    if let Some(challenge) = payload.challenge {
        return Json(json!({ "challenge": challenge })).into_response();
    }

    let event_id = payload.header.event_id.as_deref().unwrap_or_default();
    if payload.header.token.as_deref().unwrap_or_default() != state.settings.lark.verification_token {
        tracing::warn!(event_id, "invalid verification token");
        return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "Invalid token" }))).into_response();
    }

    let Some(event) = payload.event else {
        return reply("Ignoring message from bot or empty message");
    };
    let message = match event.message {
        Some(message) if !event.sender.is_app() => message,
        _ => return reply("Ignoring message from bot or empty message"),
    };

    let chat_id = message.chat_id.clone();
    let Some(message_id) = message.message_id.clone() else {
        return reply("Duplicate message ignored");
    };
    if !state.store.mark_processed(&message_id) {
        tracing::info!(event_id, chat_id = %chat_id, message_id = %message_id, "duplicate message ignored");
        return reply("Duplicate message ignored");
    }

    let max_age = Duration::from_secs(state.settings.chat.max_message_age_secs);
    if let Some(age) = message.age(chrono::Utc::now().timestamp_millis()) {
        if age > max_age {
            tracing::warn!(chat_id = %chat_id, message_id = %message_id, age_secs = age.as_secs(), "stale message ignored");
            return reply("Stale message ignored");
        }
    }

    let bot_open_id = if message.is_group() || !message.mentions.is_empty() {
        state.bot_open_id().await
    } else {
        None
    };
    let text = resolve_mentions(&message.text(), &message.mentions, bot_open_id.as_deref());

    if let Some(command) = Command::parse(&text) {
        tracing::info!(chat_id = %chat_id, command = command.name(), "handling command");
        let worker_state = state.clone();
        return match state.pool.submit(async move {
            job::run_command(&worker_state, &chat_id, &command).await;
        }) {
            Ok(_) => reply("Command handled"),
            Err(e) => unavailable(e),
        };
    }

    if text.is_empty() {
        return reply("Empty message content");
    }

    if message.is_group() {
        let Some(bot_open_id) = bot_open_id else {
            tracing::error!(chat_id = %chat_id, "bot open id unknown, cannot check mentions");
            return reply("Could not verify bot mention.");
        };
        if !message.mentions_open_id(&bot_open_id) {
            tracing::debug!(chat_id = %chat_id, "bot not mentioned in group chat");
            return reply("Bot not mentioned");
        }
    }

    tracing::info!(event_id, chat_id = %chat_id, message_id = %message_id, "message accepted");
    let worker_state = state.clone();
    match state.pool.submit(async move {
        job::process_message(&worker_state, &chat_id, &text).await;
    }) {
        Ok(_) => reply("ok"),
        Err(e) => unavailable(e),
    }
}

fn unavailable(e: crate::error::PoolClosed) -> Response {
    tracing::error!(error = %e, "job rejected");
    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "msg": e.to_string() }))).into_response()
}
