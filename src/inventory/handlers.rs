use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    inventory::{
        dto::DeviceForm,
        filter::InventoryFilter,
        repo_types::Device,
        services::{apply_edit, new_device, validate_form, InventoryError},
    },
    session::Session,
    store::RemoteStore,
};

/// The list screen: the session user's devices plus filter, detail modal
/// and delete prompt state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryView {
    devices: Vec<Device>,
    pub filter: InventoryFilter,
    pub selected: Option<Device>,
    pub pending_delete: Option<String>,
    pub refreshing: bool,
    pub error: Option<String>,
}

impl InventoryView {
    #[instrument(skip(store, session), fields(user_id = %session.user_id()))]
    pub async fn load(store: &dyn RemoteStore, session: &Session) -> Result<Self, InventoryError> {
        let devices = Device::list_by_owner(store, session.user_id())
            .await
            .map_err(|e| {
                error!(error = %e, "list devices failed");
                InventoryError::Connection(e)
            })?;
        info!(count = devices.len(), "inventory loaded");
        Ok(Self {
            devices,
            ..Self::default()
        })
    }

    /// Fetches again, keeping the filter. A failed fetch keeps the previous
    /// rows and records the error.
    pub async fn reload(self, store: &dyn RemoteStore, session: &Session) -> Self {
        match Self::load(store, session).await {
            Ok(fresh) => {
                // The detail modal only closes on dismissal or when its record is gone.
                let selected = self.selected.and_then(|s| fresh.find(&s.id).cloned());
                Self {
                    filter: self.filter,
                    selected,
                    ..fresh
                }
            }
            Err(e) => Self {
                refreshing: false,
                error: Some(e.to_string()),
                ..self
            },
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Rows after applying the filter; empty means the empty state is shown.
    pub fn visible(&self) -> Vec<&Device> {
        self.filter.apply(&self.devices)
    }

    pub fn find(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn begin_refresh(self) -> Self {
        Self {
            refreshing: true,
            error: None,
            ..self
        }
    }

    pub fn searched(self, term: &str) -> Self {
        Self {
            filter: self.filter.with_search(term),
            error: None,
            ..self
        }
    }

    pub fn dated(self, date: &str) -> Self {
        match self.filter.clone().with_date(date) {
            Ok(filter) => Self {
                filter,
                error: None,
                ..self
            },
            Err(e) => self.failed(&e),
        }
    }

    pub fn without_filters(self) -> Self {
        Self {
            filter: InventoryFilter::cleared(),
            error: None,
            ..self
        }
    }

    pub fn show_detail(self, id: &str) -> Self {
        match self.find(id).cloned() {
            Some(device) => Self {
                selected: Some(device),
                error: None,
                ..self
            },
            None => self.failed(&InventoryError::NotFound(id.to_string())),
        }
    }

    pub fn close_detail(self) -> Self {
        Self {
            selected: None,
            ..self
        }
    }

    /// Asks for confirmation; nothing is deleted yet.
    pub fn request_delete(self, id: &str) -> Self {
        if self.find(id).is_none() {
            return self.failed(&InventoryError::NotFound(id.to_string()));
        }
        Self {
            pending_delete: Some(id.to_string()),
            error: None,
            ..self
        }
    }

    #[instrument(skip(self, store, session), fields(user_id = %session.user_id()))]
    pub async fn confirm_delete(
        self,
        store: &dyn RemoteStore,
        session: &Session,
        confirmed: bool,
    ) -> Self {
        let Some(id) = self.pending_delete.clone() else {
            return self;
        };
        let view = Self {
            pending_delete: None,
            ..self
        };
        if !confirmed {
            info!(device_id = %id, "delete declined");
            return view;
        }
        if let Err(e) = Device::delete(store, &id).await {
            error!(error = %e, device_id = %id, "delete device failed");
            return view.failed(&InventoryError::Connection(e));
        }
        info!(device_id = %id, "device deleted");
        view.reload(store, session).await
    }

    pub fn failed(self, err: &InventoryError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..self
        }
    }
}

/// Key/value rows of the detail modal. Owner and active flag are not shown.
pub fn detail_rows(device: &Device) -> Vec<(&'static str, String)> {
    let stamp = |t: OffsetDateTime| t.format(&Rfc3339).unwrap_or_else(|_| t.to_string());
    vec![
        ("id", device.id.clone()),
        ("name", device.name.clone()),
        ("hostname", device.hostname.clone()),
        ("version", device.version.clone()),
        ("brand", device.brand.clone()),
        ("model", device.model.clone()),
        ("serial_number", device.serial_number.clone()),
        ("location", device.location.clone()),
        ("created_at", stamp(device.created_at)),
        ("updated_at", stamp(device.updated_at)),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(Device),
}

/// The create/edit form screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEditor {
    pub mode: FormMode,
    pub form: DeviceForm,
    pub error: Option<String>,
}

impl DeviceEditor {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            form: DeviceForm::default(),
            error: None,
        }
    }

    pub fn edit(device: Device) -> Self {
        Self {
            form: DeviceForm::from(&device),
            mode: FormMode::Edit(device),
            error: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    pub fn set_field(mut self, field: &str, value: &str) -> Self {
        if self.form.set(field, value) {
            self.error = None;
        } else {
            self.error = Some(format!("Unknown field {field}."));
        }
        self
    }

    pub fn failed(self, err: &InventoryError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..self
        }
    }

    /// Validates and saves. The form is left untouched so a failed attempt
    /// can be resubmitted.
    #[instrument(skip(self, store, session), fields(user_id = %session.user_id(), editing = self.is_editing()))]
    pub async fn submit(
        &self,
        store: &dyn RemoteStore,
        session: &Session,
    ) -> Result<Device, InventoryError> {
        if let Err(e) = validate_form(&self.form) {
            warn!(reason = %e, "device form rejected");
            return Err(e);
        }
        let now = OffsetDateTime::now_utc();
        match &self.mode {
            FormMode::Edit(original) => {
                if original.owner_id != session.user_id() {
                    warn!(device_id = %original.id, "edit of foreign device refused");
                    return Err(InventoryError::NotFound(original.id.clone()));
                }
                let device = apply_edit(original, self.form.clone(), now);
                let saved = Device::update(store, &device).await.map_err(|e| {
                    error!(error = %e, device_id = %device.id, "update device failed");
                    InventoryError::SaveFailed(e)
                })?;
                info!(device_id = %saved.id, "device updated");
                Ok(saved)
            }
            FormMode::Create => {
                let device = new_device(self.form.clone(), session.user_id(), now);
                let saved = Device::create(store, &device).await.map_err(|e| {
                    error!(error = %e, "create device failed");
                    InventoryError::SaveFailed(e)
                })?;
                info!(device_id = %saved.id, "device created");
                Ok(saved)
            }
        }
    }
}
