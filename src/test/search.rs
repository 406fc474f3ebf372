#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use rocket::tokio;

    use crate::db::{
        get_coach_profile, interested_athletes, save_athlete, search_athletes, upsert_interest,
    };
    use crate::models::{CoachProfile, InterestInput, InterestType, SearchFilters, Visibility};
    use crate::test::test_client::{body_json, login_as, setup_test_client};
    use crate::test::test_db::{TestDb, TestDbBuilder, athlete_profile};

    async fn recruiting_db() -> TestDb {
        let mut private = athlete_profile("Pat", "Hidden", "Basketball", "CA");
        private.is_public = Some(false);

        TestDbBuilder::new()
            .school("State University", Some("OH"))
            .school("City College", Some("NY"))
            .coach("coach@state.edu", "State University", true)
            .unlinked_coach("coach@nowhere.edu", "Nowhere Tech")
            .athlete_with_profile("alex@example.com", athlete_profile("Alex", "Johnson", "Basketball", "CA"))
            .athlete_with_profile("sarah@example.com", athlete_profile("Sarah", "Williams", "Soccer", "TX"))
            .athlete_with_profile("mike@example.com", athlete_profile("Michael", "Davis", "Basketball", "TX"))
            .athlete_with_profile("pat@example.com", private)
            .build()
            .await
            .expect("Failed to build test database")
    }

    async fn coach(test_db: &TestDb, email: &str) -> CoachProfile {
        get_coach_profile(&test_db.pool, test_db.user_id(email))
            .await
            .expect("Failed to load coach")
            .expect("Coach has no profile")
    }

    fn names(results: &[crate::models::SearchResult]) -> Vec<String> {
        results
            .iter()
            .map(|r| r.profile.last_name.clone().unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_search_lists_public_profiles_by_last_name() {
        let test_db = recruiting_db().await;
        let coach = coach(&test_db, "coach@state.edu").await;

        let results = search_athletes(&test_db.pool, &coach, &SearchFilters::default(), 50)
            .await
            .expect("Search failed");

        assert_eq!(names(&results), vec!["Davis", "Johnson", "Williams"]);
    }

    #[tokio::test]
    async fn test_search_filters_are_conjunctive() {
        let test_db = recruiting_db().await;
        let coach = coach(&test_db, "coach@state.edu").await;

        let by_state = SearchFilters {
            state: Some("tx".to_string()),
            ..SearchFilters::default()
        };
        let state_only = search_athletes(&test_db.pool, &coach, &by_state, 50)
            .await
            .expect("Search failed");
        assert_eq!(names(&state_only), vec!["Davis", "Williams"]);

        let by_state_and_sport = SearchFilters {
            sport: Some("Basketball".to_string()),
            ..by_state.clone()
        };
        let narrowed = search_athletes(&test_db.pool, &coach, &by_state_and_sport, 50)
            .await
            .expect("Search failed");
        assert_eq!(names(&narrowed), vec!["Davis"]);
        assert!(narrowed.len() <= state_only.len());

        let by_name = SearchFilters {
            search: Some("  john ".to_string()),
            ..SearchFilters::default()
        };
        let named = search_athletes(&test_db.pool, &coach, &by_name, 50)
            .await
            .expect("Search failed");
        assert_eq!(names(&named), vec!["Johnson"]);

        let too_strict = SearchFilters {
            min_gpa: Some(3.9),
            ..SearchFilters::default()
        };
        let none = search_athletes(&test_db.pool, &coach, &too_strict, 50)
            .await
            .expect("Search failed");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_search_name_matches_wildcards_literally() {
        let test_db = recruiting_db().await;
        let coach = coach(&test_db, "coach@state.edu").await;

        let filters = SearchFilters {
            search: Some("%".to_string()),
            ..SearchFilters::default()
        };
        let results = search_athletes(&test_db.pool, &coach, &filters, 50)
            .await
            .expect("Search failed");

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_shows_only_interests_visible_to_the_coach() {
        let test_db = recruiting_db().await;
        let coach = coach(&test_db, "coach@state.edu").await;
        let state = test_db.school_id("State University");
        let city = test_db.school_id("City College");
        let alex = test_db.user_id("alex@example.com");

        for (school_id, visibility) in [
            (state, Visibility::PrivateUntilApproved),
            (city, Visibility::Private),
        ] {
            upsert_interest(
                &test_db.pool,
                alex,
                &InterestInput {
                    school_id,
                    interest_type: InterestType::TopChoice,
                    visibility,
                },
            )
            .await
            .expect("Failed to add interest");
        }
        save_athlete(&test_db.pool, coach.user_id, alex)
            .await
            .expect("Failed to save athlete");

        let results = search_athletes(&test_db.pool, &coach, &SearchFilters::default(), 50)
            .await
            .expect("Search failed");
        let johnson = results
            .iter()
            .find(|r| r.profile.user_id == alex)
            .expect("Alex missing from results");

        assert_eq!(johnson.interests.len(), 1);
        assert_eq!(johnson.interests[0].school_id, state);
        assert!(johnson.interested_in_my_school);
        assert!(johnson.is_saved);

        let others: Vec<_> = results.iter().filter(|r| r.profile.user_id != alex).collect();
        assert!(others.iter().all(|r| !r.is_saved && !r.interested_in_my_school));
    }

    #[tokio::test]
    async fn test_interested_in_my_school_post_filter() {
        let test_db = recruiting_db().await;
        let state = test_db.school_id("State University");
        let sarah = test_db.user_id("sarah@example.com");
        let mike = test_db.user_id("mike@example.com");

        upsert_interest(
            &test_db.pool,
            sarah,
            &InterestInput {
                school_id: state,
                interest_type: InterestType::Like,
                visibility: Visibility::PublicToVerifiedCoaches,
            },
        )
        .await
        .expect("Failed to add interest");
        upsert_interest(
            &test_db.pool,
            mike,
            &InterestInput {
                school_id: state,
                interest_type: InterestType::Like,
                visibility: Visibility::Private,
            },
        )
        .await
        .expect("Failed to add interest");

        let filters = SearchFilters {
            interested_in_my_school: true,
            ..SearchFilters::default()
        };

        let linked = coach(&test_db, "coach@state.edu").await;
        let results = search_athletes(&test_db.pool, &linked, &filters, 50)
            .await
            .expect("Search failed");
        assert_eq!(names(&results), vec!["Williams"]);

        // Without a linked school the flag has nothing to match against and is ignored.
        let unlinked = coach(&test_db, "coach@nowhere.edu").await;
        let results = search_athletes(&test_db.pool, &unlinked, &filters, 50)
            .await
            .expect("Search failed");
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_interested_athletes_excludes_private_interests() {
        let test_db = recruiting_db().await;
        let state = test_db.school_id("State University");

        for (email, visibility) in [
            ("alex@example.com", Visibility::PublicToVerifiedCoaches),
            ("sarah@example.com", Visibility::PrivateUntilApproved),
            ("mike@example.com", Visibility::Private),
        ] {
            upsert_interest(
                &test_db.pool,
                test_db.user_id(email),
                &InterestInput {
                    school_id: state,
                    interest_type: InterestType::Follow,
                    visibility,
                },
            )
            .await
            .expect("Failed to add interest");
        }

        let athletes = interested_athletes(&test_db.pool, state)
            .await
            .expect("Failed to list interested athletes");

        let mut ids: Vec<i64> = athletes.iter().map(|a| a.athlete.user_id).collect();
        ids.sort();
        let mut expected = vec![
            test_db.user_id("alex@example.com"),
            test_db.user_id("sarah@example.com"),
        ];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[rocket::async_test]
    async fn test_unverified_coach_is_sent_to_profile() {
        let test_db = TestDbBuilder::new()
            .school("State University", Some("OH"))
            .coach("pending@state.edu", "State University", false)
            .build()
            .await
            .expect("Failed to build test database");
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "pending@state.edu").await;

        for uri in ["/api/search", "/api/interested-athletes"] {
            let response = client.get(uri).dispatch().await;
            assert_eq!(response.status(), Status::Forbidden, "{}", uri);
            assert_eq!(body_json(response).await["redirect_to"], "/profile");
        }
    }

    #[rocket::async_test]
    async fn test_athlete_cannot_search() {
        let test_db = TestDbBuilder::new()
            .athlete("athlete@example.com")
            .build()
            .await
            .expect("Failed to build test database");
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "athlete@example.com").await;

        let response = client.get("/api/search?sport=Basketball").dispatch().await;

        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(body_json(response).await["redirect_to"], "/dashboard");
    }

    #[rocket::async_test]
    async fn test_verified_coach_searches_over_http() {
        let test_db = recruiting_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_as(&client, "coach@state.edu").await;

        let response = client
            .get("/api/search?sport=Basketball&state=CA")
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        let results = body.as_array().expect("Expected a list");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["last_name"], "Johnson");
        assert_eq!(results[0]["is_saved"], false);

        let response = client.get("/api/interested-athletes").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["school_linked"], true);
        assert_eq!(body["athletes"].as_array().map(Vec::len), Some(0));
    }
}
