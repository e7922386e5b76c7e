use time::{macros::format_description, Date};

use crate::inventory::{repo_types::Device, services::InventoryError};

/// Optional search term and creation-date filter. Both compose with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    search: Option<String>,
    date: Option<Date>,
}

impl InventoryFilter {
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn date(&self) -> Option<Date> {
        self.date
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.date.is_none()
    }

    /// An empty term clears the search.
    pub fn with_search(self, term: &str) -> Self {
        let search = (!term.is_empty()).then(|| term.to_lowercase());
        Self { search, ..self }
    }

    /// Accepts `YYYY-MM-DD`; an empty string clears the date filter.
    pub fn with_date(self, date: &str) -> Result<Self, InventoryError> {
        let date = date.trim();
        if date.is_empty() {
            return Ok(Self { date: None, ..self });
        }
        let parsed = Date::parse(date, format_description!("[year]-[month]-[day]"))
            .map_err(|_| InventoryError::InvalidDate(date.to_string()))?;
        Ok(Self {
            date: Some(parsed),
            ..self
        })
    }

    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn matches(&self, device: &Device) -> bool {
        let by_name = self
            .search
            .as_deref()
            .map_or(true, |term| device.name.to_lowercase().contains(term));
        let by_date = self
            .date
            .map_or(true, |d| device.created_at.date() == d);
        by_name && by_date
    }

    pub fn apply<'a>(&self, devices: &'a [Device]) -> Vec<&'a Device> {
        devices.iter().filter(|d| self.matches(d)).collect()
    }
}
