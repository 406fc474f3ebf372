#[cfg(test)]
pub mod test_db {
    use crate::auth::Role;
    use crate::db::{
        create_school, create_user, set_coach_verification, upsert_athlete_profile,
        upsert_coach_profile,
    };
    use crate::error::AppError;
    use crate::models::{AthleteProfileInput, CoachProfileInput, SchoolInput, VerificationStatus};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    pub struct TestUser {
        pub email: String,
        pub role: Role,
        pub athlete_profile: Option<AthleteProfileInput>,
        pub coach_profile: Option<TestCoachProfile>,
    }

    pub struct TestCoachProfile {
        pub school_name: String,
        /// Links `school_id` when a school with this name was added to the builder.
        pub link_school: bool,
        pub verified: bool,
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        schools: Vec<(String, Option<String>)>,
        users: Vec<TestUser>,
    }

    /// A public, fully filled athlete profile.
    pub fn athlete_profile(first: &str, last: &str, sport: &str, state: &str) -> AthleteProfileInput {
        AthleteProfileInput {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            sport: Some(sport.to_string()),
            positions: vec!["PG".to_string()],
            grad_year: Some(2026),
            city: Some("Springfield".to_string()),
            state: Some(state.to_string()),
            bio: Some("Works hard every day.".to_string()),
            gpa: Some(3.5),
            is_public: Some(true),
            ..AthleteProfileInput::default()
        }
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn school(mut self, name: &str, state: Option<&str>) -> Self {
            self.schools
                .push((name.to_string(), state.map(String::from)));
            self
        }

        /// An athlete who has not finished onboarding.
        pub fn athlete(mut self, email: &str) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                role: Role::Athlete,
                athlete_profile: None,
                coach_profile: None,
            });
            self
        }

        pub fn athlete_with_profile(mut self, email: &str, profile: AthleteProfileInput) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                role: Role::Athlete,
                athlete_profile: Some(profile),
                coach_profile: None,
            });
            self
        }

        /// A coach with a profile at `school`. Pass `verified: false` for one still under review.
        pub fn coach(mut self, email: &str, school: &str, verified: bool) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                role: Role::Coach,
                athlete_profile: None,
                coach_profile: Some(TestCoachProfile {
                    school_name: school.to_string(),
                    link_school: true,
                    verified,
                }),
            });
            self
        }

        /// A verified coach whose profile names a school but does not link it.
        pub fn unlinked_coach(mut self, email: &str, school: &str) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                role: Role::Coach,
                athlete_profile: None,
                coach_profile: Some(TestCoachProfile {
                    school_name: school.to_string(),
                    link_school: false,
                    verified: true,
                }),
            });
            self
        }

        pub fn admin(mut self, email: &str) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                role: Role::Admin,
                athlete_profile: None,
                coach_profile: None,
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter("debug")
                    .with_test_writer()
                    .try_init();
            });

            // One connection that never recycles keeps the in-memory database alive.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let mut school_id_map: HashMap<String, i64> = HashMap::new();
            let mut user_id_map: HashMap<String, i64> = HashMap::new();

            for (name, state) in &self.schools {
                let school = create_school(
                    &pool,
                    &SchoolInput {
                        name: name.clone(),
                        division: Some("NCAA D1".to_string()),
                        city: None,
                        state: state.clone(),
                    },
                )
                .await?;
                school_id_map.insert(name.clone(), school.id);
            }

            for user in &self.users {
                let created = create_user(&pool, &user.email, STANDARD_PASSWORD, user.role).await?;
                user_id_map.insert(user.email.clone(), created.id);

                if let Some(profile) = &user.athlete_profile {
                    upsert_athlete_profile(&pool, created.id, profile).await?;
                }

                if let Some(coach) = &user.coach_profile {
                    let school_id = if coach.link_school {
                        school_id_map.get(&coach.school_name).copied()
                    } else {
                        None
                    };

                    upsert_coach_profile(
                        &pool,
                        created.id,
                        &CoachProfileInput {
                            school: coach.school_name.clone(),
                            school_id,
                            title: "Head Coach".to_string(),
                            sports: vec!["Basketball".to_string()],
                            looking_for: None,
                            camps: Vec::new(),
                        },
                    )
                    .await?;

                    if coach.verified {
                        set_coach_verification(&pool, created.id, VerificationStatus::Verified)
                            .await?;
                    }
                }
            }

            Ok(TestDb {
                pool,
                user_id_map,
                school_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
        pub school_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, email: &str) -> i64 {
            self.user_id_map[email]
        }

        pub fn school_id(&self, name: &str) -> i64 {
            self.school_id_map[name]
        }
    }
}

#[cfg(test)]
pub mod test_client {
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::{Value, json};

    use super::test_db::{STANDARD_PASSWORD, TestDb};
    use crate::env::AppConfig;
    use crate::init_rocket;

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = init_rocket(test_db.pool.clone(), AppConfig::default())
            .expect("Failed to build rocket");
        let client = Client::tracked(rocket)
            .await
            .expect("Failed to build test client");
        (client, test_db)
    }

    pub async fn login_as(client: &Client, email: &str) {
        let response = client
            .post("/api/auth/signin")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "password": STANDARD_PASSWORD }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok, "login failed for {}", email);
    }

    pub async fn body_json(response: rocket::local::asynchronous::LocalResponse<'_>) -> Value {
        let body = response.into_string().await.expect("Response has no body");
        serde_json::from_str(&body).expect("Response body is not JSON")
    }
}
