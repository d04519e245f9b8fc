use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{not_blank, Resource, Validate};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Body of user create and update.
///
/// `password` is mandatory on create. On update it is only applied when present.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct UserInput {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Default for UserInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            role: Role::Customer,
            active: true,
            password: None,
        }
    }
}

pub const MIN_PASSWORD_LEN: usize = 8;

impl Resource for User {
    const ENDPOINT: &'static str = "users";
    const LABEL: &'static str = "user";
    type Input = UserInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_input(&self) -> UserInput {
        UserInput {
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            active: self.active,
            password: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, Validate)]
pub struct PasswordChange {
    #[validate(custom(function = "not_blank", message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::check;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::parse("customer"), Some(Role::Customer));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn short_password_is_rejected_but_missing_is_not() {
        let mut input = UserInput {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            ..Default::default()
        };
        assert!(input.validate().is_ok());

        input.password = Some("short".into());
        assert_eq!(
            check(&input),
            Err(vec!["Password must be at least 8 characters".to_string()])
        );

        input.password = Some("long enough".into());
        input.email = "not-an-address".into();
        assert_eq!(
            check(&input),
            Err(vec!["Email must be a valid address".to_string()])
        );
    }
}
