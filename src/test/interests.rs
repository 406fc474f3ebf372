#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use rocket::tokio;
    use serde_json::json;

    use crate::db::{
        delete_interest, list_interests, suggested_schools, toggle_interest, update_interest,
        upsert_interest,
    };
    use crate::error::AppError;
    use crate::models::{InterestInput, InterestType, InterestUpdate, Visibility};
    use crate::test::test_client::{body_json, login_as, setup_test_client};
    use crate::test::test_db::{TestDb, TestDbBuilder};

    async fn schools_db() -> TestDb {
        TestDbBuilder::new()
            .school("Alpha College", Some("CA"))
            .school("Beta University", Some("TX"))
            .school("Gamma Institute", None)
            .athlete("athlete@example.com")
            .athlete("other@example.com")
            .build()
            .await
            .expect("Failed to build test database")
    }

    async fn school_ids(test_db: &TestDb, athlete: i64) -> Vec<i64> {
        let mut ids: Vec<i64> = list_interests(&test_db.pool, athlete)
            .await
            .expect("Failed to list interests")
            .into_iter()
            .map(|i| i.school_id)
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_original_set() {
        let test_db = schools_db().await;
        let athlete = test_db.user_id("athlete@example.com");
        let alpha = test_db.school_id("Alpha College");
        let beta = test_db.school_id("Beta University");

        upsert_interest(
            &test_db.pool,
            athlete,
            &InterestInput {
                school_id: alpha,
                interest_type: InterestType::TopChoice,
                visibility: Visibility::Private,
            },
        )
        .await
        .expect("Failed to add interest");

        let before = school_ids(&test_db, athlete).await;

        let added = toggle_interest(&test_db.pool, athlete, beta)
            .await
            .expect("Toggle failed")
            .expect("First toggle should add");
        assert_eq!(added.interest_type, InterestType::Like);
        assert_eq!(added.visibility, Visibility::PublicToVerifiedCoaches);

        let removed = toggle_interest(&test_db.pool, athlete, beta)
            .await
            .expect("Toggle failed");
        assert!(removed.is_none());

        assert_eq!(school_ids(&test_db, athlete).await, before);
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_interest_per_school() {
        let test_db = schools_db().await;
        let athlete = test_db.user_id("athlete@example.com");
        let alpha = test_db.school_id("Alpha College");

        let first = upsert_interest(
            &test_db.pool,
            athlete,
            &InterestInput {
                school_id: alpha,
                interest_type: InterestType::Like,
                visibility: Visibility::PublicToVerifiedCoaches,
            },
        )
        .await
        .expect("Failed to add interest");

        let second = upsert_interest(
            &test_db.pool,
            athlete,
            &InterestInput {
                school_id: alpha,
                interest_type: InterestType::Follow,
                visibility: Visibility::PrivateUntilApproved,
            },
        )
        .await
        .expect("Failed to update interest");

        assert_eq!(first.id, second.id);
        assert_eq!(second.interest_type, InterestType::Follow);
        assert_eq!(list_interests(&test_db.pool, athlete).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_interest_in_unknown_school_is_not_found() {
        let test_db = schools_db().await;
        let athlete = test_db.user_id("athlete@example.com");

        let result = upsert_interest(
            &test_db.pool,
            athlete,
            &InterestInput {
                school_id: 9999,
                interest_type: InterestType::Like,
                visibility: Visibility::Private,
            },
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_only() {
        let test_db = schools_db().await;
        let athlete = test_db.user_id("athlete@example.com");
        let other = test_db.user_id("other@example.com");
        let alpha = test_db.school_id("Alpha College");

        let interest = toggle_interest(&test_db.pool, athlete, alpha)
            .await
            .unwrap()
            .unwrap();

        let update = InterestUpdate {
            interest_type: None,
            visibility: Some(Visibility::Private),
        };
        let result = update_interest(&test_db.pool, other, interest.id, &update).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let updated = update_interest(&test_db.pool, athlete, interest.id, &update)
            .await
            .expect("Owner update failed");
        assert_eq!(updated.visibility, Visibility::Private);
        assert_eq!(updated.interest_type, InterestType::Like);

        let result = delete_interest(&test_db.pool, other, interest.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        delete_interest(&test_db.pool, athlete, interest.id)
            .await
            .expect("Owner delete failed");
        assert!(school_ids(&test_db, athlete).await.is_empty());
    }

    #[tokio::test]
    async fn test_suggested_schools_skip_existing_interests() {
        let test_db = schools_db().await;
        let athlete = test_db.user_id("athlete@example.com");
        let beta = test_db.school_id("Beta University");

        toggle_interest(&test_db.pool, athlete, beta).await.unwrap();

        let suggested: Vec<String> = suggested_schools(&test_db.pool, athlete, 6)
            .await
            .expect("Failed to suggest schools")
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(suggested, vec!["Alpha College", "Gamma Institute"]);
    }

    #[rocket::async_test]
    async fn test_interest_routes() {
        let test_db = schools_db().await;
        let alpha = test_db.school_id("Alpha College");
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "athlete@example.com").await;

        let response = client
            .post(format!("/api/interests/toggle/{}", alpha))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["interested"], true);
        let interest_id = body["interest"]["id"].as_i64().expect("Interest id missing");

        let response = client
            .patch(format!("/api/interests/{}", interest_id))
            .header(ContentType::JSON)
            .body(json!({ "interest_type": "TOP_CHOICE" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await["interest_type"], "TOP_CHOICE");

        let response = client.get("/api/interests").dispatch().await;
        let body = body_json(response).await;
        assert_eq!(body[0]["school_name"], "Alpha College");

        let response = client
            .delete(format!("/api/interests/{}", interest_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        let response = client.get("/api/schools?search=beta").dispatch().await;
        let body = body_json(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["name"], "Beta University");
    }

    #[rocket::async_test]
    async fn test_athlete_feed_suggests_schools_without_interest() {
        let test_db = schools_db().await;
        let athlete = test_db.user_id("athlete@example.com");
        let alpha = test_db.school_id("Alpha College");
        toggle_interest(&test_db.pool, athlete, alpha).await.unwrap();
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "athlete@example.com").await;

        let response = client.get("/api/feed").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["suggested_schools"][0]["name"], "Beta University");
        assert_eq!(body["suggested_schools"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["notifications"], json!([]));
    }
}
