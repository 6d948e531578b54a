use serde::{Deserialize, Serialize};

use crate::error::RegisterError;
use crate::users::repo_types::User;

/// Raw registration fields as sent by the client, JSON or form encoded.
#[derive(Default, Deserialize)]
pub struct RegistrationForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Fields that passed the presence check.
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    /// Builds the form from decoded key/value pairs. The first value of a
    /// repeated key wins; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "username" => &mut form.username,
                "email" => &mut form.email,
                "password" => &mut form.password,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        form
    }

    /// Requires all three fields to be present and non-empty. Nothing else is
    /// checked: no trimming, no format or strength rules.
    pub fn into_registration(self) -> Result<Registration, RegisterError> {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        match (
            present(self.username),
            present(self.email),
            present(self.password),
        ) {
            (Some(username), Some(email), Some(password)) => Ok(Registration {
                username,
                email,
                password,
            }),
            _ => Err(RegisterError::MissingFields),
        }
    }
}

/// Response returned after a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
    #[serde(rename = "usuario")]
    pub username: String,
    #[serde(rename = "correo")]
    pub email: String,
}

impl From<User> for RegisterResponse {
    fn from(user: User) -> Self {
        Self {
            message: "User registered successfully.".into(),
            user_id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}
