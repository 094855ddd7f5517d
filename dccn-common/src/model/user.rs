//! Users and their profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::countries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

/// Personal data collected at registration
///
/// Names are kept both in English and in Russian; the Russian middle name is
/// optional and empty strings stand for "not provided".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub first_name_rus: String,
    pub middle_name_rus: String,
    pub last_name_rus: String,
    pub affiliation: String,
    pub degree: String,
    /// ISO 3166-1 alpha-2 code, upper case
    pub country: String,
}

impl Profile {
    /// "First Last", skipping blank parts
    pub fn full_name(&self) -> String {
        join_names(&[&self.first_name, &self.last_name])
    }

    /// "First Middle Last" in Russian, skipping blank parts
    pub fn full_name_rus(&self) -> String {
        join_names(&[&self.first_name_rus, &self.middle_name_rus, &self.last_name_rus])
    }

    pub fn country_name(&self) -> &str {
        countries::name_of(&self.country)
    }
}

fn join_names(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// User together with profile, the unit most read paths work with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub user: User,
    pub profile: Profile,
}

impl UserView {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn full_name(&self) -> String {
        self.profile.full_name()
    }
}
