#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    use crate::test::test_client::{body_json, login_as, setup_test_client};
    use crate::test::test_db::{TestDb, TestDbBuilder, athlete_profile};

    async fn profiles_db() -> TestDb {
        let mut private = athlete_profile("Pat", "Hidden", "Soccer", "WA");
        private.is_public = Some(false);

        TestDbBuilder::new()
            .school("State University", Some("OH"))
            .coach("coach@state.edu", "State University", true)
            .athlete_with_profile("alex@example.com", athlete_profile("Alex", "Johnson", "Basketball", "CA"))
            .athlete_with_profile("pat@example.com", private)
            .athlete("new@example.com")
            .admin("admin@example.com")
            .build()
            .await
            .expect("Failed to build test database")
    }

    #[rocket::async_test]
    async fn test_missing_profile_is_null_not_an_error() {
        let test_db = profiles_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "new@example.com").await;

        let response = client.get("/api/profile").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert!(body["profile"].is_null());
        assert_eq!(body["user"]["email"], "new@example.com");
    }

    #[rocket::async_test]
    async fn test_profile_validation_errors_are_per_field() {
        let test_db = profiles_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "new@example.com").await;

        let response = client
            .put("/api/profile/athlete")
            .header(ContentType::JSON)
            .body(json!({ "grad_year": 2040, "gpa": 4.5, "state": "Ohio" }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body = body_json(response).await;
        assert!(body["errors"]["grad_year"].is_array());
        assert!(body["errors"]["gpa"].is_array());
        assert!(body["errors"]["state"].is_array());
    }

    #[rocket::async_test]
    async fn test_private_profile_visible_to_owner_and_admin_only() {
        let test_db = profiles_db().await;
        let pat = test_db.user_id("pat@example.com");
        let (client, _) = setup_test_client(test_db).await;

        login_as(&client, "coach@state.edu").await;
        let response = client.get(format!("/api/athletes/{}", pat)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);

        login_as(&client, "pat@example.com").await;
        let response = client.get(format!("/api/athletes/{}", pat)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert!(body_json(response).await.get("is_saved").is_none());

        login_as(&client, "admin@example.com").await;
        let response = client.get(format!("/api/athletes/{}", pat)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_highlights_and_shortlist() {
        let test_db = profiles_db().await;
        let alex = test_db.user_id("alex@example.com");
        let (client, _) = setup_test_client(test_db).await;

        login_as(&client, "alex@example.com").await;
        let response = client
            .post("/api/profile/highlights")
            .header(ContentType::JSON)
            .body(json!({ "title": "Senior mixtape", "url": "not a url" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);

        let response = client
            .post("/api/profile/highlights")
            .header(ContentType::JSON)
            .body(
                json!({ "title": "Senior mixtape", "url": "https://video.example.com/alex" })
                    .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        login_as(&client, "coach@state.edu").await;
        let response = client.put(format!("/api/shortlist/{}", alex)).dispatch().await;
        assert_eq!(body_json(response).await["saved"], true);

        let response = client.get(format!("/api/athletes/{}", alex)).dispatch().await;
        let body = body_json(response).await;
        assert_eq!(body["is_saved"], true);
        assert_eq!(body["highlights"][0]["title"], "Senior mixtape");

        let response = client.get("/api/shortlist").dispatch().await;
        let body = body_json(response).await;
        assert_eq!(body[0]["athlete"]["user_id"], alex);

        let response = client
            .post(format!("/api/shortlist/{}/toggle", alex))
            .dispatch()
            .await;
        assert_eq!(body_json(response).await["saved"], false);

        let response = client.get("/api/shortlist").dispatch().await;
        assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(0));

        let coach_id = client.get("/api/auth/me").dispatch().await;
        let coach_id = body_json(coach_id).await["id"].as_i64().unwrap();
        let response = client.put(format!("/api/shortlist/{}", coach_id)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_coach_save_returns_profile_to_review() {
        let test_db = profiles_db().await;
        let state = test_db.school_id("State University");
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "coach@state.edu").await;

        let response = client
            .put("/api/profile/coach")
            .header(ContentType::JSON)
            .body(
                json!({
                    "school": "State University",
                    "school_id": state,
                    "title": "Recruiting Coordinator",
                    "sports": ["Basketball"],
                    "camps": [
                        { "name": "Summer Elite Camp", "location": "Columbus, OH" },
                        { "name": "Fall Showcase" }
                    ]
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["verification_status"], "pending");
        assert_eq!(body["camps"][0]["name"], "Summer Elite Camp");
        assert_eq!(body["camps"][1]["position"], 1);

        let response = client.get("/api/search").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(body_json(response).await["redirect_to"], "/profile");
    }
}
