//! Seed records and seeding configuration.

use rust_decimal::Decimal;
use scholaris_models::{
    Role,
    ids::{SchoolId, UserId},
};

/// Suffix marking seeded schools, so `clear-seed` can find them.
pub const SEED_SCHOOL_SUFFIX: &str = "(seed)";
/// Domain of every seeded user's email.
pub const SEED_EMAIL_DOMAIN: &str = "seed.scholaris.test";

pub struct SchoolSeed {
    pub name: String,
}

pub struct UserSeed {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub school_id: SchoolId,
}

pub struct StudentSeed {
    pub school_id: SchoolId,
    pub parent_id: UserId,
    pub full_name: String,
    pub grade: String,
    pub wallet_balance: Decimal,
    pub daily_spending_limit: Option<Decimal>,
    pub nfc_card_id: String,
}

pub struct ItemSeed {
    pub school_id: SchoolId,
    pub name: String,
    pub price: Decimal,
    pub category: String,
}

/// Staff and parent accounts created per school.
#[derive(Clone)]
pub struct UsersPerSchool {
    pub admins: usize,
    pub finance: usize,
    pub canteen_staff: usize,
    pub parents: usize,
}

impl Default for UsersPerSchool {
    fn default() -> Self {
        Self {
            admins: 1,
            finance: 1,
            canteen_staff: 2,
            parents: 20,
        }
    }
}

#[derive(Clone)]
pub struct SeedConfig {
    pub num_schools: usize,
    pub users_per_school: UsersPerSchool,
    pub children_per_parent: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            num_schools: 3,
            users_per_school: UsersPerSchool::default(),
            children_per_parent: 2,
        }
    }
}

impl SeedConfig {
    pub fn new(num_schools: usize) -> Self {
        Self {
            num_schools,
            ..Default::default()
        }
    }

    pub fn with_users(mut self, users: UsersPerSchool) -> Self {
        self.users_per_school = users;
        self
    }

    pub fn with_children_per_parent(mut self, children: usize) -> Self {
        self.children_per_parent = children;
        self
    }

    pub fn total_students_per_school(&self) -> usize {
        self.users_per_school.parents * self.children_per_parent
    }
}
