pub mod auth;
pub mod classroom;
pub mod dashboard;
pub mod submission;
