use anyhow::Context;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use recruiting_hub::auth::{Role, User};
use recruiting_hub::db::{
    add_highlight, add_stat, confirm_email, create_email_confirmation, create_school,
    create_thread, create_user, set_coach_verification, upsert_athlete_profile,
    upsert_coach_profile,
};
use recruiting_hub::env::load_environment;
use recruiting_hub::error::AppError;
use recruiting_hub::models::{
    AthleteProfileInput, CoachProfileInput, HighlightInput, SchoolInput, SourceType, StatInput,
    VerificationStatus,
};

const DEMO_PASSWORD: &str = "demo123456";

struct DemoAthlete {
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    sport: &'static str,
    positions: &'static [&'static str],
    grad_year: i32,
    city: &'static str,
    state: &'static str,
    bio: &'static str,
    gpa: f64,
    sat_score: Option<i32>,
    height: (i32, i32),
    weight: i32,
}

const ATHLETES: &[DemoAthlete] = &[
    DemoAthlete {
        email: "athlete1@demo.com",
        first_name: "Alex",
        last_name: "Johnson",
        sport: "Basketball",
        positions: &["PG", "SG"],
        grad_year: 2025,
        city: "Los Angeles",
        state: "CA",
        bio: "Passionate basketball player with 5 years of experience. Looking to play at the college level.",
        gpa: 3.8,
        sat_score: Some(1350),
        height: (6, 2),
        weight: 180,
    },
    DemoAthlete {
        email: "athlete2@demo.com",
        first_name: "Sarah",
        last_name: "Williams",
        sport: "Soccer",
        positions: &["M", "F"],
        grad_year: 2026,
        city: "Austin",
        state: "TX",
        bio: "Dedicated soccer player with strong technical skills and team leadership experience.",
        gpa: 3.9,
        sat_score: None,
        height: (5, 6),
        weight: 130,
    },
    DemoAthlete {
        email: "athlete3@demo.com",
        first_name: "Michael",
        last_name: "Davis",
        sport: "Football",
        positions: &["QB", "WR"],
        grad_year: 2025,
        city: "Miami",
        state: "FL",
        bio: "Quarterback with strong arm and leadership qualities.",
        gpa: 3.6,
        sat_score: None,
        height: (6, 1),
        weight: 195,
    },
];

// (email, school, division, city, state, title, sports)
const COACHES: &[(&str, &str, &str, &str, &str, &str, &[&str])] = &[
    (
        "coach1@demo.com",
        "State University",
        "NCAA D1",
        "Columbus",
        "OH",
        "Head Coach",
        &["Basketball"],
    ),
    (
        "coach2@demo.com",
        "City College",
        "NCAA D3",
        "New York",
        "NY",
        "Assistant Coach",
        &["Soccer", "Football"],
    ),
];

const THREAD_TITLES: &[&str] = &[
    "What should I include in my highlight reel?",
    "Tips for contacting college coaches",
];

/// Creates a user whose email is already confirmed, as if they had clicked the link.
async fn confirmed_user(pool: &SqlitePool, email: &str, role: Role) -> Result<User, AppError> {
    let user = create_user(pool, email, DEMO_PASSWORD, role).await?;
    let code = create_email_confirmation(pool, user.id).await?;
    confirm_email(pool, &code).await
}

async fn seed_athletes(pool: &SqlitePool) -> anyhow::Result<Vec<User>> {
    let mut users = Vec::new();

    for athlete in ATHLETES {
        let user = match confirmed_user(pool, athlete.email, Role::Athlete).await {
            Ok(user) => user,
            Err(e) => {
                eprintln!("Error creating athlete {}: {}", athlete.email, e);
                continue;
            }
        };

        let profile = AthleteProfileInput {
            first_name: Some(athlete.first_name.to_string()),
            last_name: Some(athlete.last_name.to_string()),
            sport: Some(athlete.sport.to_string()),
            positions: athlete.positions.iter().map(|p| p.to_string()).collect(),
            grad_year: Some(athlete.grad_year),
            city: Some(athlete.city.to_string()),
            state: Some(athlete.state.to_string()),
            bio: Some(athlete.bio.to_string()),
            gpa: Some(athlete.gpa),
            sat_score: athlete.sat_score,
            height_feet: Some(athlete.height.0),
            height_inches: Some(athlete.height.1),
            weight: Some(athlete.weight),
            is_public: Some(true),
            ..AthleteProfileInput::default()
        };
        upsert_athlete_profile(pool, user.id, &profile)
            .await
            .with_context(|| format!("profile for {}", athlete.email))?;

        add_highlight(
            pool,
            user.id,
            &HighlightInput {
                title: "Season Highlights".to_string(),
                url: "https://example.com/highlights".to_string(),
            },
        )
        .await?;

        add_stat(
            pool,
            user.id,
            &StatInput {
                season: "2023-2024".to_string(),
                stat_key: "Points per game".to_string(),
                stat_value: "18.5".to_string(),
                source_type: SourceType::SelfReported,
                source_url: None,
            },
        )
        .await?;

        println!("Created athlete: {}", athlete.email);
        users.push(user);
    }

    Ok(users)
}

async fn seed_coaches(pool: &SqlitePool) -> anyhow::Result<()> {
    for (email, school, division, city, state, title, sports) in COACHES {
        let school = create_school(
            pool,
            &SchoolInput {
                name: school.to_string(),
                division: Some(division.to_string()),
                city: Some(city.to_string()),
                state: Some(state.to_string()),
            },
        )
        .await?;

        let user = match confirmed_user(pool, email, Role::Coach).await {
            Ok(user) => user,
            Err(e) => {
                eprintln!("Error creating coach {}: {}", email, e);
                continue;
            }
        };

        upsert_coach_profile(
            pool,
            user.id,
            &CoachProfileInput {
                school: school.name.clone(),
                school_id: Some(school.id),
                title: title.to_string(),
                sports: sports.iter().map(|s| s.to_string()).collect(),
                looking_for: None,
                camps: Vec::new(),
            },
        )
        .await?;
        set_coach_verification(pool, user.id, VerificationStatus::Verified).await?;

        println!("Created coach: {}", email);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }

    let database_url = dotenvy::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    println!("Starting seed...");

    let athletes = seed_athletes(&pool).await?;
    seed_coaches(&pool).await?;

    match confirmed_user(&pool, "admin@demo.com", Role::Admin).await {
        Ok(_) => println!("Created admin: admin@demo.com"),
        Err(e) => eprintln!("Error creating admin: {}", e),
    }

    if let Some(author) = athletes.first() {
        for title in THREAD_TITLES {
            create_thread(&pool, author.id, title).await?;
        }
        println!("Created discussion threads");
    }

    println!("Seed completed!");
    Ok(())
}
