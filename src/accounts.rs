//! Local user accounts. Credentials are compared in plaintext; this is a
//! simulator, not an authentication system.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::UserId;

/// Name given to users who register without one.
const DEFAULT_USER_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Creates a new user if `email` is not already registered.
///
/// # Errors
///
/// `DuplicateEmail` if another user has the same email.
pub fn register(
    users: &[User],
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, ValidationError> {
    if users.iter().any(|u| u.email == email) {
        return Err(ValidationError::DuplicateEmail(email.to_string()));
    }
    let name = name.trim();
    Ok(User {
        id: UserId::generate(),
        name: if name.is_empty() {
            DEFAULT_USER_NAME.to_string()
        } else {
            name.to_string()
        },
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Finds the user with exactly matching email and password.
///
/// # Errors
///
/// `InvalidCredentials` if no user matches.
pub fn authenticate<'a>(
    users: &'a [User],
    email: &str,
    password: &str,
) -> Result<&'a User, ValidationError> {
    users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .ok_or(ValidationError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_authenticate() {
        let mut users = Vec::new();
        let u = register(&users, "Ada", "ada@example.com", "pw").expect("new email");
        users.push(u.clone());
        assert_eq!(authenticate(&users, "ada@example.com", "pw"), Ok(&u));
    }

    #[test]
    fn duplicate_email_rejected() {
        let users = vec![register(&[], "Ada", "ada@example.com", "pw").expect("new email")];
        assert_eq!(
            register(&users, "Other", "ada@example.com", "x"),
            Err(ValidationError::DuplicateEmail("ada@example.com".into()))
        );
    }

    #[test]
    fn wrong_password_rejected() {
        let users = vec![register(&[], "Ada", "ada@example.com", "pw").expect("new email")];
        assert_eq!(
            authenticate(&users, "ada@example.com", "PW"),
            Err(ValidationError::InvalidCredentials)
        );
        assert_eq!(
            authenticate(&users, "bob@example.com", "pw"),
            Err(ValidationError::InvalidCredentials)
        );
    }

    #[test]
    fn blank_name_defaults() {
        let u = register(&[], " ", "a@b.c", "pw").expect("new email");
        assert_eq!(u.name, "User");
    }
}
