pub mod dashboards;
pub mod general;
pub mod sources;
pub mod users;
