use crate::auth::AuthUser;
use crate::chat;
use crate::errors::AppError;
use crate::models::{
    ChatReply, ChatRequest, ChatTurn, DailySummary, HistoryDay, LogKind, LogRecord, NewEntry,
    NewTurnRequest, Profile, ProfileUpdate, StatsResponse,
};
use crate::snapshot::{start_of_day, HealthSnapshot};
use crate::state::AppState;
use crate::stats::{build_stats_at, group_by_day, trend_start};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{Local, TimeZone};
use tracing::info;
use uuid::Uuid;

const CHAT_HISTORY_LIMIT: usize = 50;

pub async fn chat(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(payload) = payload?;
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }

    let reply = chat::respond(state.store.as_ref(), state.assistant.as_ref(), &user_id, message).await?;
    Ok(Json(reply))
}

pub async fn list_messages(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ChatTurn>>, AppError> {
    let turns = state.store.recent_turns(&user_id, CHAT_HISTORY_LIMIT).await?;
    Ok(Json(turns))
}

pub async fn append_message(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<NewTurnRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ChatTurn>), AppError> {
    let Json(payload) = payload?;
    if payload.content.trim().is_empty() {
        return Err(AppError::bad_request("content must not be empty"));
    }

    let turn = state
        .store
        .append_turn(&user_id, payload.role, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(turn)))
}

pub async fn create_log(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<LogRecord>), AppError> {
    let Json(entry) = payload?;
    let record = state.store.insert(&user_id, entry.validated()?).await?;
    info!(kind = record.kind().as_str(), "log entry created");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_log(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<Json<LogRecord>, AppError> {
    let Path(id) = id?;
    let Json(entry) = payload?;
    let kind = entry.kind();

    state
        .store
        .update(&user_id, id, entry.validated()?)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} entry {id} not found", kind.as_str())))
}

pub async fn delete_log(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    params: Result<Path<(String, Uuid)>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path((kind, id)) = params?;
    let kind = LogKind::parse(&kind)
        .ok_or_else(|| AppError::NotFound(format!("unknown log kind {kind}")))?;

    if state.store.delete(&user_id, kind, id).await? {
        info!(kind = kind.as_str(), %id, "log entry deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("{} entry {id} not found", kind.as_str())))
    }
}

pub async fn get_history(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryDay>>, AppError> {
    let records = state.store.history(&user_id).await?;
    Ok(Json(group_by_day(records, &Local)))
}

pub async fn get_summary(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DailySummary>, AppError> {
    let snapshot = HealthSnapshot::today(state.store.as_ref(), &user_id).await?;
    Ok(Json(snapshot.summary(today_string())))
}

pub async fn get_stats(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let today = Local::now().date_naive();
    let since = trend_start(today)
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(start_of_day)
        .unwrap_or_else(|| start_of_day(Local::now()));

    let store = state.store.as_ref();
    let (water, sleep, steps) = tokio::try_join!(
        store.water_since(&user_id, since),
        store.sleep_since(&user_id, since),
        store.steps_since(&user_id, since),
    )?;

    Ok(Json(build_stats_at(today, &Local, &water, &sleep, &steps)))
}

pub async fn get_profile(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.store.profile(&user_id).await?))
}

pub async fn update_profile(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(state.store.update_profile(&user_id, &payload.full_name).await?))
}

fn today_string() -> String {
    Local::now().date_naive().to_string()
}
