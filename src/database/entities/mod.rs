pub mod datasets;
pub mod shared_grants;
pub mod team_datasets;
pub mod team_members;
pub mod teams;
pub mod user_sessions;
pub mod users;
pub mod wizard_sessions;
