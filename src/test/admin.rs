#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use rocket::tokio;
    use serde_json::json;

    use crate::db::{
        get_coach_profile, list_coaches_by_status, list_notifications, set_coach_verification,
        upsert_coach_profile,
    };
    use crate::env::AppConfig;
    use crate::error::AppError;
    use crate::init_setup_rocket;
    use crate::models::{CoachProfileInput, NotificationType, VerificationStatus};
    use crate::test::test_client::{body_json, login_as, setup_test_client};
    use crate::test::test_db::{TestDb, TestDbBuilder};

    async fn admin_db() -> TestDb {
        TestDbBuilder::new()
            .school("State University", Some("OH"))
            .coach("pending@state.edu", "State University", false)
            .coach("verified@state.edu", "State University", true)
            .athlete("athlete@example.com")
            .admin("admin@example.com")
            .build()
            .await
            .expect("Failed to build test database")
    }

    #[tokio::test]
    async fn test_verifying_a_coach_notifies_them() {
        let test_db = admin_db().await;
        let coach = test_db.user_id("pending@state.edu");

        let profile = set_coach_verification(&test_db.pool, coach, VerificationStatus::Verified)
            .await
            .expect("Failed to verify coach");
        assert!(profile.is_verified());

        let notifications = list_notifications(&test_db.pool, coach, 50).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].notification_type,
            NotificationType::CoachVerified
        );
    }

    #[tokio::test]
    async fn test_rejecting_does_not_notify_and_unknown_coach_is_not_found() {
        let test_db = admin_db().await;
        let coach = test_db.user_id("pending@state.edu");

        let profile = set_coach_verification(&test_db.pool, coach, VerificationStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(profile.verification_status, VerificationStatus::Rejected);
        assert!(list_notifications(&test_db.pool, coach, 50).await.unwrap().is_empty());

        let athlete = test_db.user_id("athlete@example.com");
        let result = set_coach_verification(&test_db.pool, athlete, VerificationStatus::Verified).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_coach_edit_goes_back_to_review() {
        let test_db = admin_db().await;
        let coach = test_db.user_id("verified@state.edu");

        let before = get_coach_profile(&test_db.pool, coach).await.unwrap().unwrap();
        assert!(before.is_verified());

        let saved = upsert_coach_profile(
            &test_db.pool,
            coach,
            &CoachProfileInput {
                school: "State University".to_string(),
                school_id: Some(test_db.school_id("State University")),
                title: "Assistant Coach".to_string(),
                sports: vec!["Soccer".to_string()],
                looking_for: Some("Defenders".to_string()),
                camps: Vec::new(),
            },
        )
        .await
        .expect("Failed to save coach profile");

        assert_eq!(saved.verification_status, VerificationStatus::Pending);
        assert_eq!(saved.title, "Assistant Coach");

        let pending: Vec<i64> = list_coaches_by_status(&test_db.pool, VerificationStatus::Pending)
            .await
            .unwrap()
            .iter()
            .map(|c| c.user_id)
            .collect();
        assert!(pending.contains(&coach));
    }

    #[rocket::async_test]
    async fn test_admin_routes() {
        let test_db = admin_db().await;
        let pending = test_db.user_id("pending@state.edu");
        let (client, _) = setup_test_client(test_db).await;

        login_as(&client, "verified@state.edu").await;
        let response = client.get("/api/admin/coaches").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        login_as(&client, "admin@example.com").await;
        let response = client.get("/api/admin/coaches").dispatch().await;
        let body = body_json(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["user_id"], pending);

        let response = client.get("/api/admin/coaches?status=bogus").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .post(format!("/api/admin/coaches/{}/verification", pending))
            .header(ContentType::JSON)
            .body(json!({ "status": "verified" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await["verification_status"], "verified");

        let response = client.get("/api/admin/coaches?status=verified").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(2));

        let response = client.get("/api/admin/coaches").dispatch().await;
        assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(0));

        let response = client.get("/api/admin/reports?status=dismissed").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await, json!([]));

        let response = client.get("/api/admin/reports?status=open").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .post("/api/admin/schools")
            .header(ContentType::JSON)
            .body(json!({ "name": "Lakeside College", "state": "MI" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await["name"], "Lakeside College");

        let response = client.get("/api/search").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_setup_mode_answers_503() {
        let client = Client::tracked(init_setup_rocket(AppConfig::default()))
            .await
            .expect("Failed to build setup client");

        let response = client.get("/api/setup").dispatch().await;
        let body = body_json(response).await;
        assert_eq!(body["setup_required"], true);
        assert_eq!(body["missing"], json!(["DATABASE_URL"]));

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(body_json(response).await["status"], "setup_required");

        let response = client.get("/api/search").dispatch().await;
        assert_eq!(response.status(), Status::ServiceUnavailable);
        assert!(body_json(response).await["errors"]["setup"].is_array());
    }
}
