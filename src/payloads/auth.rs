use crate::errors::DomainError;
use crate::model::user::NewUser;
use crate::validation;
use serde::{Deserialize, Serialize};

/// Local profile of a user authenticated by the identity provider.
#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_teacher: bool,
}

impl RegisterPayload {
    pub fn validate(&self) -> Result<NewUser, DomainError> {
        Ok(NewUser {
            username: validation::username(&self.username)?,
            email: validation::email(&self.email)?,
            first_name: validation::person_name("First name", &self.first_name)?,
            last_name: validation::person_name("Last name", &self.last_name)?,
            is_teacher: self.is_teacher,
        })
    }
}
