pub mod classroom;
pub mod dashboard;
pub mod submission;
pub mod user;
