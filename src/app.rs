use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::{
    auth::{self, AuthView, LoginRequest, RegisterRequest},
    inventory::{DeviceEditor, InventoryError, InventoryView},
    session::{LocalStorage, Session},
    store::RemoteStore,
};

/// What is currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Auth(AuthView),
    Dashboard,
    Inventory(InventoryView),
    Editor(DeviceEditor),
}

/// Every user action the front end understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ToggleAuth,
    Register(RegisterRequest),
    Login(LoginRequest),
    Logout,
    OpenDashboard,
    OpenInventory,
    Refresh,
    Search(String),
    FilterDate(String),
    ClearFilters,
    ShowDetail(String),
    CloseDetail,
    RequestDelete(String),
    ConfirmDelete(bool),
    NewDevice,
    EditDevice(String),
    SetField { field: String, value: String },
    Submit,
    Cancel,
}

impl Event {
    /// Name for logs; payloads may carry passwords.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ToggleAuth => "toggle_auth",
            Event::Register(_) => "register",
            Event::Login(_) => "login",
            Event::Logout => "logout",
            Event::OpenDashboard => "open_dashboard",
            Event::OpenInventory => "open_inventory",
            Event::Refresh => "refresh",
            Event::Search(_) => "search",
            Event::FilterDate(_) => "filter_date",
            Event::ClearFilters => "clear_filters",
            Event::ShowDetail(_) => "show_detail",
            Event::CloseDetail => "close_detail",
            Event::RequestDelete(_) => "request_delete",
            Event::ConfirmDelete(_) => "confirm_delete",
            Event::NewDevice => "new_device",
            Event::EditDevice(_) => "edit_device",
            Event::SetField { .. } => "set_field",
            Event::Submit => "submit",
            Event::Cancel => "cancel",
        }
    }
}

pub struct App {
    store: Arc<dyn RemoteStore>,
    storage: LocalStorage,
    session: Option<Session>,
    screen: Screen,
    refresh_placeholder: Duration,
}

impl App {
    /// Starts on the dashboard if a previous session is still persisted.
    pub fn new(
        store: Arc<dyn RemoteStore>,
        storage: LocalStorage,
        refresh_placeholder: Duration,
    ) -> Self {
        let session = Session::restore(&storage).unwrap_or_else(|e| {
            warn!(error = %e, "could not read persisted session");
            None
        });
        let screen = if session.is_some() {
            Screen::Dashboard
        } else {
            Screen::Auth(AuthView::login())
        };
        Self {
            store,
            storage,
            session,
            screen,
            refresh_placeholder,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Enters the transitional state some events show while they run.
    /// Returns true when the screen changed.
    pub fn begin(&mut self, event: &Event) -> bool {
        if !matches!(event, Event::Refresh) {
            return false;
        }
        match std::mem::replace(&mut self.screen, Screen::Dashboard) {
            Screen::Inventory(view) => {
                self.screen = Screen::Inventory(view.begin_refresh());
                true
            }
            other => {
                self.screen = other;
                false
            }
        }
    }

    pub async fn dispatch(&mut self, event: Event) -> &Screen {
        debug!(event = event.name(), "dispatch");
        let screen = std::mem::replace(&mut self.screen, Screen::Dashboard);
        self.screen = self.transition(screen, event).await;
        &self.screen
    }

    async fn transition(&mut self, screen: Screen, event: Event) -> Screen {
        let store = Arc::clone(&self.store);
        let store = store.as_ref();

        // Unauthenticated events.
        match (screen, event) {
            (Screen::Auth(view), Event::ToggleAuth) => Screen::Auth(view.toggle()),
            (Screen::Auth(view), Event::Register(req)) => {
                match auth::register(store, req).await {
                    Ok(_) => Screen::Auth(view.registered()),
                    Err(e) => Screen::Auth(view.failed(&e)),
                }
            }
            (Screen::Auth(view), Event::Login(req)) => {
                match auth::login(store, req).await {
                    Ok(session) => {
                        if let Err(e) = session.persist(&self.storage) {
                            error!(error = %e, "could not persist session");
                        }
                        self.session = Some(session);
                        Screen::Dashboard
                    }
                    Err(e) => Screen::Auth(view.failed(&e)),
                }
            }
            (_, Event::Logout) => {
                if let Some(session) = self.session.take() {
                    if let Err(e) = session.end(&self.storage) {
                        error!(error = %e, "could not clear persisted session");
                    }
                }
                Screen::Auth(AuthView::login())
            }
            (screen, event) => match self.session.clone() {
                Some(session) => self.guarded(store, &session, screen, event).await,
                None => {
                    warn!(event = event.name(), "no session, redirecting to login");
                    match screen {
                        s @ Screen::Auth(_) => s,
                        _ => Screen::Auth(AuthView::login()),
                    }
                }
            },
        }
    }

    async fn guarded(
        &self,
        store: &dyn RemoteStore,
        session: &Session,
        screen: Screen,
        event: Event,
    ) -> Screen {
        match (screen, event) {
            (_, Event::OpenDashboard) => Screen::Dashboard,
            (_, Event::OpenInventory) | (Screen::Editor(_), Event::Cancel) => {
                open_inventory(store, session).await
            }
            (_, Event::NewDevice) => Screen::Editor(DeviceEditor::create()),

            // Edit mode carries the selected record into the form.
            (Screen::Inventory(view), Event::EditDevice(id)) => match view.find(&id).cloned() {
                Some(device) => Screen::Editor(DeviceEditor::edit(device)),
                None => Screen::Inventory(view.failed(&InventoryError::NotFound(id))),
            },

            (Screen::Inventory(view), event) => {
                Screen::Inventory(self.on_inventory(store, session, view, event).await)
            }

            (Screen::Editor(editor), Event::SetField { field, value }) => {
                Screen::Editor(editor.set_field(&field, &value))
            }
            (Screen::Editor(editor), Event::Submit) => {
                match editor.submit(store, session).await {
                    // The list is reloaded, never patched in place.
                    Ok(_) => open_inventory(store, session).await,
                    Err(e) => Screen::Editor(editor.failed(&e)),
                }
            }

            (Screen::Auth(_), _) => Screen::Dashboard,
            (screen, event) => {
                debug!(event = event.name(), "event ignored on this screen");
                screen
            }
        }
    }

    async fn on_inventory(
        &self,
        store: &dyn RemoteStore,
        session: &Session,
        view: InventoryView,
        event: Event,
    ) -> InventoryView {
        match event {
            Event::Refresh => {
                // Reloading always leaves the refreshing state.
                let (view, _) = tokio::join!(
                    view.reload(store, session),
                    tokio::time::sleep(self.refresh_placeholder)
                );
                view
            }
            Event::Search(term) => view.searched(&term),
            Event::FilterDate(date) => view.dated(&date),
            Event::ClearFilters => view.without_filters(),
            Event::ShowDetail(id) => view.show_detail(&id),
            Event::CloseDetail => view.close_detail(),
            Event::RequestDelete(id) => view.request_delete(&id),
            Event::ConfirmDelete(yes) => view.confirm_delete(store, session, yes).await,
            other => {
                debug!(event = other.name(), "event ignored on inventory");
                view
            }
        }
    }
}

async fn open_inventory(store: &dyn RemoteStore, session: &Session) -> Screen {
    match InventoryView::load(store, session).await {
        Ok(view) => Screen::Inventory(view),
        Err(e) => Screen::Inventory(InventoryView::default().failed(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::FORM_FIELDS;
    use crate::store::{Collection, Filter, MemoryStore, StoreError};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Reads and account writes work; every device write fails.
    #[derive(Default)]
    struct DeviceWritesFail {
        inner: MemoryStore,
    }

    #[async_trait]
    impl RemoteStore for DeviceWritesFail {
        async fn list(
            &self,
            c: Collection,
            f: Option<Filter<'_>>,
        ) -> Result<Vec<Value>, StoreError> {
            self.inner.list(c, f).await
        }
        async fn create(&self, c: Collection, r: Value) -> Result<Value, StoreError> {
            match c {
                Collection::Users => self.inner.create(c, r).await,
                Collection::Firewalls => Err(StoreError::Rejected {
                    collection: c,
                    status: 500,
                }),
            }
        }
        async fn update(&self, c: Collection, _id: &str, _r: Value) -> Result<Value, StoreError> {
            Err(StoreError::Rejected {
                collection: c,
                status: 500,
            })
        }
        async fn delete(&self, _c: Collection, _id: &str) -> Result<(), StoreError> {
            Err(StoreError::Connectivity("connection reset".into()))
        }
    }

    fn app_with(store: Arc<MemoryStore>, dir: &tempfile::TempDir) -> App {
        let storage = LocalStorage::new(dir.path().join("session.json"));
        App::new(store, storage, Duration::ZERO)
    }

    fn ana_registration() -> Event {
        Event::Register(RegisterRequest {
            fullname: "Ana Ruiz".into(),
            email: "ana@x.com".into(),
            password: "Abcdef1!".into(),
        })
    }

    fn ana_login() -> Event {
        Event::Login(LoginRequest {
            email: "ana@x.com".into(),
            password: "Abcdef1!".into(),
        })
    }

    #[tokio::test]
    async fn guarded_screens_redirect_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(MemoryStore::new()), &dir);
        let screen = app.dispatch(Event::OpenInventory).await;
        assert!(matches!(screen, Screen::Auth(_)));
        let screen = app.dispatch(Event::NewDevice).await;
        assert!(matches!(screen, Screen::Auth(_)));
    }

    #[tokio::test]
    async fn register_login_then_logout() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut app = app_with(store.clone(), &dir);

        app.dispatch(Event::ToggleAuth).await;
        match app.dispatch(ana_registration()).await {
            Screen::Auth(view) => {
                assert_eq!(view.screen, auth::AuthScreen::Login);
                assert!(view.notice.is_some());
            }
            other => panic!("unexpected screen {other:?}"),
        }

        assert_eq!(app.dispatch(ana_login()).await, &Screen::Dashboard);
        let user_id = app.session().unwrap().user_id().to_string();
        let stored = store.records(Collection::Users, &[]).await;
        assert_eq!(stored[0]["id"], serde_json::json!(user_id));

        // A restart picks the persisted session back up.
        let restarted = app_with(store.clone(), &dir);
        assert_eq!(restarted.session().map(|s| s.user_id()), Some(user_id.as_str()));

        app.dispatch(Event::Logout).await;
        assert!(app.session().is_none());
        assert!(app_with(store, &dir).session().is_none());
    }

    #[tokio::test]
    async fn failed_login_stays_on_login_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(MemoryStore::new()), &dir);
        match app.dispatch(ana_login()).await {
            Screen::Auth(view) => assert_eq!(view.error.as_deref(), Some("Invalid credentials.")),
            other => panic!("unexpected screen {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_then_list_then_delete_through_events() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut app = app_with(store.clone(), &dir);
        app.dispatch(ana_registration()).await;
        app.dispatch(ana_login()).await;

        app.dispatch(Event::NewDevice).await;
        for field in FORM_FIELDS {
            app.dispatch(Event::SetField {
                field: field.into(),
                value: format!("{field}-1"),
            })
            .await;
        }
        let id = match app.dispatch(Event::Submit).await {
            Screen::Inventory(view) => {
                assert_eq!(view.visible().len(), 1);
                view.visible()[0].id.clone()
            }
            other => panic!("unexpected screen {other:?}"),
        };

        assert!(app.begin(&Event::Refresh));
        assert!(matches!(app.screen(), Screen::Inventory(v) if v.refreshing));
        match app.dispatch(Event::Refresh).await {
            Screen::Inventory(view) => assert!(!view.refreshing),
            other => panic!("unexpected screen {other:?}"),
        }

        app.dispatch(Event::RequestDelete(id.clone())).await;
        app.dispatch(Event::ConfirmDelete(false)).await;
        assert_eq!(store.records(Collection::Firewalls, &[]).await.len(), 1);

        app.dispatch(Event::RequestDelete(id)).await;
        match app.dispatch(Event::ConfirmDelete(true)).await {
            Screen::Inventory(view) => assert!(view.visible().is_empty()),
            other => panic!("unexpected screen {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_submit_keeps_form() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut app = app_with(store, &dir);
        app.dispatch(ana_registration()).await;
        app.dispatch(ana_login()).await;
        app.dispatch(Event::NewDevice).await;
        app.dispatch(Event::SetField {
            field: "name".into(),
            value: "FW1".into(),
        })
        .await;
        match app.dispatch(Event::Submit).await {
            Screen::Editor(editor) => {
                assert_eq!(editor.form.name, "FW1");
                assert!(editor.error.as_deref().unwrap().contains("hostname"));
            }
            other => panic!("unexpected screen {other:?}"),
        }
    }

    #[tokio::test]
    async fn store_failure_on_submit_keeps_form_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DeviceWritesFail::default());
        let storage = LocalStorage::new(dir.path().join("session.json"));
        let mut app = App::new(store.clone(), storage, Duration::ZERO);
        app.dispatch(ana_registration()).await;
        app.dispatch(ana_login()).await;

        app.dispatch(Event::NewDevice).await;
        for field in FORM_FIELDS {
            app.dispatch(Event::SetField {
                field: field.into(),
                value: format!("{field}-1"),
            })
            .await;
        }
        let before = match app.screen() {
            Screen::Editor(editor) => editor.form.clone(),
            other => panic!("unexpected screen {other:?}"),
        };
        match app.dispatch(Event::Submit).await {
            Screen::Editor(editor) => {
                assert_eq!(editor.form, before);
                assert_eq!(
                    editor.error.as_deref(),
                    Some("An error occurred while saving the device. Please try again.")
                );
            }
            other => panic!("unexpected screen {other:?}"),
        }
        assert!(store.inner.records(Collection::Firewalls, &[]).await.is_empty());
    }

    #[tokio::test]
    async fn store_failure_on_delete_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DeviceWritesFail::default());
        let storage = LocalStorage::new(dir.path().join("session.json"));
        let mut app = App::new(store.clone(), storage, Duration::ZERO);
        app.dispatch(ana_registration()).await;
        app.dispatch(ana_login()).await;
        let user_id = app.session().unwrap().user_id().to_string();
        store
            .inner
            .insert(
                Collection::Firewalls,
                json!({
                    "id": "f1", "collection_id": user_id, "name": "FW1",
                    "hostname": "fw1.local", "version": "1.0", "brand": "Cisco",
                    "model": "ASA5506", "serial_number": "SN1", "location": "Lima",
                    "is_active": true,
                    "created_at": "2025-01-10T09:00:00Z",
                    "updated_at": "2025-01-10T09:00:00Z"
                }),
            )
            .await
            .unwrap();

        app.dispatch(Event::OpenInventory).await;
        app.dispatch(Event::RequestDelete("f1".into())).await;
        match app.dispatch(Event::ConfirmDelete(true)).await {
            Screen::Inventory(view) => {
                assert_eq!(view.visible().len(), 1);
                assert!(view.pending_delete.is_none());
                assert_eq!(view.error.as_deref(), Some("Could not connect to the server."));
            }
            other => panic!("unexpected screen {other:?}"),
        }
        assert!(store.inner.get(Collection::Firewalls, "f1").await.is_some());
    }
}
