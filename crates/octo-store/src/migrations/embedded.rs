//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

macro_rules! migration {
    ($id:literal) => {
        Migration {
            id: $id,
            up: include_str!(concat!("../../migrations/", $id, ".up.sql")),
            down: include_str!(concat!("../../migrations/", $id, ".down.sql")),
        }
    };
}

/// Get all embedded migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        migration!("001_create_counters"),
        migration!("002_create_products"),
        migration!("003_create_app_login"),
        migration!("004_create_adapter_details"),
    ]
}
