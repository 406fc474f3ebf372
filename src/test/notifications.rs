#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use rocket::tokio;

    use crate::db::{
        create_notification, list_notifications, mark_all_notifications_read,
        mark_notification_read, unread_notification_count,
    };
    use crate::error::AppError;
    use crate::models::{NewNotification, NotificationType};
    use crate::test::test_client::{body_json, login_as, setup_test_client};
    use crate::test::test_db::{TestDb, TestDbBuilder};

    async fn notified_db() -> TestDb {
        TestDbBuilder::new()
            .athlete("athlete@example.com")
            .athlete("other@example.com")
            .build()
            .await
            .expect("Failed to build test database")
    }

    #[tokio::test]
    async fn test_marking_read_twice_keeps_first_timestamp() {
        let test_db = notified_db().await;
        let athlete = test_db.user_id("athlete@example.com");

        let id = create_notification(&test_db.pool, &NewNotification::new_message(athlete, 7))
            .await
            .expect("Failed to create notification");

        let first = mark_notification_read(&test_db.pool, athlete, id)
            .await
            .expect("Failed to mark read");
        let read_at = first.read_at.expect("read_at should be set");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let second = mark_notification_read(&test_db.pool, athlete, id)
            .await
            .expect("Failed to mark read again");
        assert_eq!(second.read_at, Some(read_at));
    }

    #[tokio::test]
    async fn test_notifications_belong_to_their_recipient() {
        let test_db = notified_db().await;
        let athlete = test_db.user_id("athlete@example.com");
        let other = test_db.user_id("other@example.com");

        let id = create_notification(&test_db.pool, &NewNotification::new_message(athlete, 1))
            .await
            .unwrap();

        let result = mark_notification_read(&test_db.pool, other, id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(list_notifications(&test_db.pool, other, 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unread_count_and_mark_all() {
        let test_db = notified_db().await;
        let athlete = test_db.user_id("athlete@example.com");

        for notification in [
            NewNotification::new_message(athlete, 1),
            NewNotification::contact_request(athlete, 2, "State University - Head Coach"),
            NewNotification::new_message(athlete, 3),
        ] {
            create_notification(&test_db.pool, &notification).await.unwrap();
        }

        assert_eq!(unread_notification_count(&test_db.pool, athlete).await.unwrap(), 3);

        let newest = list_notifications(&test_db.pool, athlete, 50).await.unwrap();
        assert_eq!(newest[0].related_id, Some(3));
        mark_notification_read(&test_db.pool, athlete, newest[0].id)
            .await
            .unwrap();
        assert_eq!(unread_notification_count(&test_db.pool, athlete).await.unwrap(), 2);

        let marked = mark_all_notifications_read(&test_db.pool, athlete).await.unwrap();
        assert_eq!(marked, 2);
        assert_eq!(unread_notification_count(&test_db.pool, athlete).await.unwrap(), 0);
    }

    #[test]
    fn test_notification_links() {
        assert_eq!(
            NotificationType::Message.link(Some(4)),
            "/messages?conversation=4"
        );
        assert_eq!(NotificationType::ContactAccepted.link(None), "/messages");
        assert_eq!(NotificationType::ContactRequest.link(Some(9)), "/dashboard");
        assert_eq!(NotificationType::CoachVerified.link(None), "/search");
    }

    #[rocket::async_test]
    async fn test_notification_routes() {
        let test_db = notified_db().await;
        let athlete = test_db.user_id("athlete@example.com");
        create_notification(&test_db.pool, &NewNotification::new_message(athlete, 12))
            .await
            .unwrap();
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "athlete@example.com").await;

        let response = client.get("/api/notifications/unread-count").dispatch().await;
        assert_eq!(body_json(response).await["unread"], 1);

        let response = client.get("/api/notifications").dispatch().await;
        let body = body_json(response).await;
        assert_eq!(body[0]["type"], "MESSAGE");
        assert_eq!(body[0]["link"], "/messages?conversation=12");
        let id = body[0]["id"].as_i64().unwrap();

        let response = client
            .post(format!("/api/notifications/{}/read", id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert!(body_json(response).await["read_at"].is_string());

        let response = client.post("/api/notifications/read-all").dispatch().await;
        assert_eq!(body_json(response).await["marked"], 0);

        let response = client.post("/api/notifications/999/read").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
