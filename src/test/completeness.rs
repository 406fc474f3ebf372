#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    use crate::completeness::{MAX_SCORE, completeness_report, profile_completeness};
    use crate::models::AthleteProfileInput;
    use crate::test::test_client::{body_json, login_as, setup_test_client};
    use crate::test::test_db::{TestDbBuilder, athlete_profile};

    #[test]
    fn test_full_profile_scores_100() {
        let report = completeness_report(&athlete_profile("Alex", "Johnson", "Basketball", "CA"));

        assert_eq!(report.score, 100);
        assert!(report.missing_fields.is_empty());
    }

    #[test]
    fn test_empty_profile_scores_0() {
        let report = completeness_report(&AthleteProfileInput::default());

        assert_eq!(report.score, 0);
        assert_eq!(report.missing_fields.len(), 9);
        assert_eq!(report.missing_fields[0], "first_name");
    }

    #[test]
    fn test_zero_and_blank_values_count_as_unset() {
        let profile = AthleteProfileInput {
            gpa: Some(0.0),
            grad_year: Some(0),
            first_name: Some("   ".to_string()),
            ..athlete_profile("Alex", "Johnson", "Basketball", "CA")
        };

        let report = completeness_report(&profile);

        assert_eq!(report.score, 114 - 14 * 3);
        assert_eq!(report.missing_fields, vec!["first_name", "grad_year", "gpa"]);
    }

    #[test]
    fn test_score_is_capped_until_two_fields_are_missing() {
        let full = athlete_profile("Alex", "Johnson", "Basketball", "CA");
        let no_bio = AthleteProfileInput {
            bio: None,
            ..full.clone()
        };
        let no_bio_or_city = AthleteProfileInput {
            city: None,
            ..no_bio.clone()
        };

        assert_eq!(profile_completeness(&full), MAX_SCORE);
        assert_eq!(profile_completeness(&no_bio), MAX_SCORE);
        assert_eq!(profile_completeness(&no_bio_or_city), 98);
        assert_eq!(completeness_report(&no_bio).missing_fields, vec!["bio"]);
    }

    #[rocket::async_test]
    async fn test_saved_profile_stores_its_score() {
        let test_db = TestDbBuilder::new()
            .athlete("athlete@example.com")
            .build()
            .await
            .expect("Failed to build test database");
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "athlete@example.com").await;

        let response = client.get("/api/dashboard").dispatch().await;
        let body = body_json(response).await;
        assert_eq!(body["redirect_to"], "/onboarding/athlete");
        assert_eq!(body["summary"]["profile_completeness"], 0);

        let response = client
            .put("/api/profile/athlete")
            .header(ContentType::JSON)
            .body(
                json!({
                    "first_name": " Alex ",
                    "last_name": "Johnson",
                    "sport": "Basketball",
                    "state": "ca",
                    "city": "",
                    "positions": ["PG", " "]
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["first_name"], "Alex");
        assert_eq!(body["state"], "CA");
        assert_eq!(body["positions"], json!(["PG"]));
        assert_eq!(body["profile_completeness"], 14 * 5);

        let response = client.get("/api/dashboard").dispatch().await;
        let body = body_json(response).await;
        assert!(body["redirect_to"].is_null());
        assert_eq!(body["summary"]["role"], "athlete");
        assert_eq!(body["summary"]["profile_completeness"], 14 * 5);
    }
}
