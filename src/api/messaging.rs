use rocket::response::stream::{Event, EventStream};
use rocket::serde::json::Json;
use rocket::{Shutdown, State};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::warn;

use crate::api::require_user_with_role;
use crate::auth::{Permission, Role, User, VerifiedCoach};
use crate::db::{
    close_conversation, get_conversation, list_conversations, list_messages,
    mark_messages_read, send_message, start_conversation,
};
use crate::env::AppConfig;
use crate::error::AppError;
use crate::models::{
    Conversation, ConversationSummary, Message, MessageInput, StartConversationInput,
};
use crate::poll::MessagePoller;
use crate::validation::{ApiResult, JsonValidateExt};

/// The conversation, if the user takes part in it. Anyone else gets a 404.
async fn participant_conversation(
    db: &Pool<Sqlite>,
    conversation_id: i64,
    user: &User,
) -> Result<Conversation, AppError> {
    let conversation = get_conversation(db, conversation_id).await?;
    if !conversation.has_participant(user.id) {
        warn!(user_id = %user.id, conversation_id, "Conversation requested by non-participant");
        return Err(AppError::NotFound(format!(
            "Conversation {} not found",
            conversation_id
        )));
    }
    Ok(conversation)
}

#[get("/conversations")]
pub async fn api_list_conversations(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    Ok(Json(list_conversations(db, &user).await?))
}

#[post("/conversations", data = "<request>")]
pub async fn api_start_conversation(
    coach: VerifiedCoach,
    request: Json<StartConversationInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Conversation>> {
    require_user_with_role(db, request.athlete_user_id, Role::Athlete).await?;
    let conversation = start_conversation(db, request.athlete_user_id, coach.user.id).await?;
    Ok(Json(conversation))
}

#[get("/conversations/<id>/messages")]
pub async fn api_list_messages(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<Message>>> {
    participant_conversation(db, id, &user).await?;
    mark_messages_read(db, id, user.id).await?;
    Ok(Json(list_messages(db, id).await?))
}

#[post("/conversations/<id>/messages", data = "<message>")]
pub async fn api_send_message(
    id: i64,
    user: User,
    message: Json<MessageInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Message>> {
    user.require_permission(Permission::SendMessages)?;
    let input = message.validate_custom()?;
    let conversation = participant_conversation(db, id, &user).await?;
    Ok(Json(send_message(db, &conversation, &user, &input.body).await?))
}

#[derive(Serialize)]
pub struct CloseResponse {
    pub id: i64,
    pub closed: bool,
}

#[post("/conversations/<id>/close")]
pub async fn api_close_conversation(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<CloseResponse>> {
    participant_conversation(db, id, &user).await?;
    close_conversation(db, id).await?;
    Ok(Json(CloseResponse { id, closed: true }))
}

/// Server-sent events carrying the conversation's full message list whenever the
/// poller sees it change. The poller stops when the client goes away.
#[get("/conversations/<id>/stream")]
pub async fn api_stream_messages(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
    mut shutdown: Shutdown,
) -> ApiResult<EventStream![]> {
    participant_conversation(db, id, &user).await?;

    let pool = db.inner().clone();
    let mut poller = MessagePoller::spawn(pool.clone(), id, config.poll_interval());

    Ok(EventStream! {
        loop {
            let messages = rocket::tokio::select! {
                snapshot = poller.changed() => match snapshot {
                    Some(messages) => messages,
                    None => break,
                },
                _ = &mut shutdown => break,
            };

            if let Err(err) = mark_messages_read(&pool, id, user.id).await {
                err.log_and_record("Marking streamed messages read");
            }

            yield Event::json(&messages).event("messages");
        }
    })
}
