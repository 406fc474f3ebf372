use rocket::State;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::auth::User;
use crate::db::{
    list_notifications, mark_all_notifications_read, mark_notification_read,
    unread_notification_count,
};
use crate::models::NotificationView;
use crate::validation::ApiResult;

const NOTIFICATION_PAGE_SIZE: i64 = 50;

#[get("/notifications")]
pub async fn api_list_notifications(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<NotificationView>>> {
    let notifications = list_notifications(db, user.id, NOTIFICATION_PAGE_SIZE)
        .await?
        .into_iter()
        .map(NotificationView::from)
        .collect();
    Ok(Json(notifications))
}

#[derive(Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[get("/notifications/unread-count")]
pub async fn api_unread_count(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<UnreadCount>> {
    Ok(Json(UnreadCount {
        unread: unread_notification_count(db, user.id).await?,
    }))
}

#[post("/notifications/<id>/read")]
pub async fn api_mark_notification_read(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<NotificationView>> {
    let notification = mark_notification_read(db, user.id, id).await?;
    Ok(Json(NotificationView::from(notification)))
}

#[derive(Serialize)]
pub struct MarkAllResponse {
    pub marked: u64,
}

#[post("/notifications/read-all")]
pub async fn api_mark_all_read(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<MarkAllResponse>> {
    Ok(Json(MarkAllResponse {
        marked: mark_all_notifications_read(db, user.id).await?,
    }))
}
