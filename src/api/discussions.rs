use rocket::State;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::auth::{Permission, User};
use crate::db::{create_post, create_report, create_thread, get_thread, list_posts, list_threads};
use crate::models::{Post, PostInput, Report, ReportInput, Thread, ThreadInput};
use crate::validation::{ApiResult, JsonValidateExt};

const THREAD_PAGE_SIZE: i64 = 50;

#[get("/discussions")]
pub async fn api_list_threads(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Thread>>> {
    let include_hidden = user.has_permission(Permission::ModerateDiscussions);
    Ok(Json(list_threads(db, include_hidden, THREAD_PAGE_SIZE).await?))
}

#[post("/discussions", data = "<thread>")]
pub async fn api_create_thread(
    user: User,
    thread: Json<ThreadInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Thread>> {
    user.require_permission(Permission::ParticipateInDiscussions)?;
    let input = thread.validate_custom()?;
    Ok(Json(create_thread(db, user.id, &input.title).await?))
}

#[derive(Serialize)]
pub struct ThreadDetail {
    pub thread: Thread,
    pub posts: Vec<Post>,
}

#[get("/discussions/<id>")]
pub async fn api_get_thread(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<ThreadDetail>> {
    let include_hidden = user.has_permission(Permission::ModerateDiscussions);
    let thread = get_thread(db, id, include_hidden).await?;
    let posts = list_posts(db, id, include_hidden).await?;
    Ok(Json(ThreadDetail { thread, posts }))
}

#[post("/discussions/<id>/posts", data = "<post>")]
pub async fn api_create_post(
    id: i64,
    user: User,
    post: Json<PostInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Post>> {
    user.require_permission(Permission::ParticipateInDiscussions)?;
    let input = post.validate_custom()?;
    Ok(Json(create_post(db, id, user.id, &input.body).await?))
}

#[post("/reports", data = "<report>")]
pub async fn api_create_report(
    user: User,
    report: Json<ReportInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Report>> {
    user.require_permission(Permission::ParticipateInDiscussions)?;
    let input = report.validate_custom()?;
    Ok(Json(create_report(db, user.id, &input).await?))
}
