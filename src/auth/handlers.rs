use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        repo_types::User,
        services::{validate_login, validate_registration, AuthError},
    },
    session::Session,
    store::{RemoteStore, StoreError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScreen {
    #[default]
    Login,
    Register,
}

/// State of the login/register screen pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthView {
    pub screen: AuthScreen,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl AuthView {
    pub fn login() -> Self {
        Self::default()
    }

    pub fn toggle(self) -> Self {
        let screen = match self.screen {
            AuthScreen::Login => AuthScreen::Register,
            AuthScreen::Register => AuthScreen::Login,
        };
        Self {
            screen,
            error: None,
            notice: None,
        }
    }

    pub fn failed(self, err: &AuthError) -> Self {
        Self {
            error: Some(err.to_string()),
            notice: None,
            ..self
        }
    }

    /// After a successful registration the user is sent to the login screen.
    pub fn registered(self) -> Self {
        Self {
            screen: AuthScreen::Login,
            error: None,
            notice: Some("Registration successful! You can now log in.".into()),
        }
    }
}

fn connection(e: StoreError) -> AuthError {
    error!(error = %e, "user lookup failed");
    AuthError::Connection(e)
}

#[instrument(skip(store, payload), fields(email = %payload.email))]
pub async fn register(
    store: &dyn RemoteStore,
    payload: RegisterRequest,
) -> Result<User, AuthError> {
    if let Err(e) = validate_registration(&payload) {
        warn!(reason = %e, "registration rejected");
        return Err(e);
    }

    // Ensure email is not taken
    if User::find_by_email(store, &payload.email)
        .await
        .map_err(connection)?
        .is_some()
    {
        warn!("email already registered");
        return Err(AuthError::EmailTaken);
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        fullname: payload.fullname,
        email: payload.email,
        password: payload.password,
    };

    let user = match User::create(store, &user).await {
        Ok(u) => u,
        Err(e @ StoreError::Rejected { .. }) => {
            error!(error = %e, "create user rejected");
            return Err(AuthError::RegistrationFailed(e));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(AuthError::Connection(e));
        }
    };

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

#[instrument(skip(store, payload), fields(email = %payload.email))]
pub async fn login(store: &dyn RemoteStore, payload: LoginRequest) -> Result<Session, AuthError> {
    validate_login(&payload)?;

    let user = match User::find_by_email(store, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("login unknown email");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => return Err(connection(e)),
    };

    if user.password != payload.password {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Session::start(user.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Collection, MemoryStore};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ana() -> RegisterRequest {
        RegisterRequest {
            fullname: "Ana Ruiz".into(),
            email: "ana@x.com".into(),
            password: "Abcdef1!".into(),
        }
    }

    /// Counts calls and fails every one of them.
    #[derive(Default)]
    struct OfflineStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteStore for OfflineStore {
        async fn list(
            &self,
            _c: Collection,
            _f: Option<crate::store::Filter<'_>>,
        ) -> Result<Vec<Value>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Connectivity("offline".into()))
        }
        async fn create(&self, _c: Collection, _r: Value) -> Result<Value, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Connectivity("offline".into()))
        }
        async fn update(&self, _c: Collection, _id: &str, _r: Value) -> Result<Value, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Connectivity("offline".into()))
        }
        async fn delete(&self, _c: Collection, _id: &str) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Connectivity("offline".into()))
        }
    }

    #[tokio::test]
    async fn register_then_login_yields_session_for_new_user() {
        let store = MemoryStore::new();
        let user = register(&store, ana()).await.expect("register");
        assert_eq!(user.fullname, "Ana Ruiz");
        assert!(Uuid::parse_str(&user.id).is_ok());

        let session = login(
            &store,
            LoginRequest {
                email: "ana@x.com".into(),
                password: "Abcdef1!".into(),
            },
        )
        .await
        .expect("login");
        assert_eq!(session.user_id(), user.id);
    }

    #[tokio::test]
    async fn duplicate_email_creates_nothing() {
        let store = MemoryStore::new();
        register(&store, ana()).await.unwrap();

        let mut again = ana();
        again.fullname = "Someone Else".into();
        let err = register(&store, again).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(store.records(Collection::Users, &[]).await.len(), 1);
    }

    #[tokio::test]
    async fn weak_password_never_touches_the_store() {
        let store = OfflineStore::default();
        let mut req = ana();
        req.password = "abcdefgh".into();
        let err = register(&store, req).await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let store = MemoryStore::new();
        store
            .insert(
                Collection::Users,
                json!({"id": "u1", "fullname": "Ana", "email": "ana@x.com", "password": "Abcdef1!"}),
            )
            .await
            .unwrap();

        let wrong_password = login(
            &store,
            LoginRequest {
                email: "ana@x.com".into(),
                password: "Abcdef1?".into(),
            },
        )
        .await
        .unwrap_err();
        let unknown = login(
            &store,
            LoginRequest {
                email: "bob@x.com".into(),
                password: "Abcdef1!".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn offline_store_yields_connection_error() {
        let store = OfflineStore::default();
        let err = register(&store, ana()).await.unwrap_err();
        assert!(matches!(err, AuthError::Connection(_)));

        let err = login(
            &store,
            LoginRequest {
                email: "ana@x.com".into(),
                password: "x".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::Connection(_)));
    }

    #[test]
    fn view_toggles_and_clears_messages() {
        let view = AuthView::login().failed(&AuthError::InvalidCredentials);
        assert!(view.error.is_some());
        let view = view.toggle();
        assert_eq!(view.screen, AuthScreen::Register);
        assert!(view.error.is_none());
        let view = view.registered();
        assert_eq!(view.screen, AuthScreen::Login);
        assert!(view.notice.is_some());
    }
}
