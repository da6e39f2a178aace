pub mod auth;
pub mod classroom;
pub mod dashboard;
pub mod membership;
pub mod submission;

mod helper;
