use anyhow::Error;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnProfile,
    EditOwnProfile,
    ViewSchools,
    ParticipateInDiscussions,
    SendMessages,
    ViewNotifications,

    ManageOwnInterests,
    ManageOwnHighlights,
    ManageOwnStats,
    RespondToContactRequests,

    SearchAthletes,
    ViewInterestedAthletes,
    ContactAthletes,
    ManageShortlist,

    VerifyCoaches,
    ModerateDiscussions,
    ManageSchools,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Athlete,
    Coach,
    Admin,
}

static SHARED_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnProfile);
    permissions.insert(Permission::EditOwnProfile);
    permissions.insert(Permission::ViewSchools);
    permissions.insert(Permission::ParticipateInDiscussions);
    permissions.insert(Permission::ViewNotifications);

    permissions
});

static ATHLETE_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(SHARED_PERMISSIONS.iter().copied());

    permissions.insert(Permission::SendMessages);
    permissions.insert(Permission::ManageOwnInterests);
    permissions.insert(Permission::ManageOwnHighlights);
    permissions.insert(Permission::ManageOwnStats);
    permissions.insert(Permission::RespondToContactRequests);

    permissions
});

// Search and contact are further gated on the coach being verified, see `VerifiedCoach`.
static COACH_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(SHARED_PERMISSIONS.iter().copied());

    permissions.insert(Permission::SendMessages);
    permissions.insert(Permission::SearchAthletes);
    permissions.insert(Permission::ViewInterestedAthletes);
    permissions.insert(Permission::ContactAthletes);
    permissions.insert(Permission::ManageShortlist);

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(SHARED_PERMISSIONS.iter().copied());

    permissions.insert(Permission::VerifyCoaches);
    permissions.insert(Permission::ModerateDiscussions);
    permissions.insert(Permission::ManageSchools);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Athlete => &ATHLETE_PERMISSIONS,
            Role::Coach => &COACH_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Athlete => "athlete",
            Role::Coach => "coach",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "athlete" => Ok(Role::Athlete),
            "coach" => Ok(Role::Coach),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }

    /// Where a freshly signed-in user lands.
    pub fn default_route(&self) -> &'static str {
        match self {
            Role::Athlete => "/athlete-feed",
            Role::Coach => "/profile",
            Role::Admin => "/dashboard",
        }
    }

    pub fn onboarding_route(&self) -> &'static str {
        match self {
            Role::Athlete => "/onboarding/athlete",
            Role::Coach => "/onboarding/coach",
            Role::Admin => "/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
