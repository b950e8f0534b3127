use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Raw body of `POST /auth`. One endpoint serves both registration and
/// login, discriminated by the `action` flag.
#[derive(Debug, Deserialize)]
pub struct AuthBody {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// The body resolved once at the entry point; the two variants take
/// independent code paths from here on.
#[derive(Debug)]
pub enum AuthRequest {
    Register {
        email: String,
        password: String,
        name: String,
    },
    Login {
        email: String,
        password: String,
    },
}

impl AuthBody {
    pub fn into_request(self) -> Result<AuthRequest, ApiError> {
        let email = non_empty(self.email);
        let password = non_empty(self.password);
        let (email, password) = match (email, password) {
            (Some(e), Some(p)) => (e, p),
            _ => {
                return Err(ApiError::Validation(
                    "Email and password are required".to_string(),
                ))
            }
        };

        if self.action.as_deref() == Some("register") {
            let name = non_empty(self.name).ok_or_else(|| {
                ApiError::Validation("Name is required for registration".to_string())
            })?;
            Ok(AuthRequest::Register {
                email,
                password,
                name,
            })
        } else {
            Ok(AuthRequest::Login { email, password })
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> AuthBody {
        serde_json::from_str(json).expect("parse body")
    }

    #[test]
    fn dispatches_register_on_action_flag() {
        let req = body(r#"{"action":"register","email":"a@x.com","password":"secret1","name":"A"}"#)
            .into_request()
            .expect("valid register");
        assert!(matches!(req, AuthRequest::Register { .. }));
    }

    #[test]
    fn dispatches_login_when_action_absent_or_unknown() {
        let req = body(r#"{"email":"a@x.com","password":"secret1"}"#)
            .into_request()
            .expect("valid login");
        assert!(matches!(req, AuthRequest::Login { .. }));

        let req = body(r#"{"action":"signin","email":"a@x.com","password":"secret1"}"#)
            .into_request()
            .expect("valid login");
        assert!(matches!(req, AuthRequest::Login { .. }));
    }

    #[test]
    fn rejects_missing_email_or_password() {
        for json in [
            r#"{"password":"secret1"}"#,
            r#"{"email":"a@x.com"}"#,
            r#"{"email":"","password":"secret1"}"#,
            r#"{}"#,
        ] {
            let err = body(json).into_request().unwrap_err();
            assert_eq!(err.to_string(), "Email and password are required");
        }
    }

    #[test]
    fn register_requires_name() {
        let err = body(r#"{"action":"register","email":"a@x.com","password":"secret1"}"#)
            .into_request()
            .unwrap_err();
        assert_eq!(err.to_string(), "Name is required for registration");
    }
}
