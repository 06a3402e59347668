//! Site settings stored as name/value rows.

use crate::model::entity::Attributes;
use crate::model::setting::Setting;
use crate::query::Columns;
use crate::repo::{RepoError, SettingRepository};
use log::info;
use rusqlite::Connection;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for settings use-cases.
#[derive(Debug)]
pub enum SettingsServiceError {
    /// Setting names must be non-blank.
    InvalidName(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for SettingsServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid setting name: `{name}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SettingsServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidName(_) => None,
        }
    }
}

impl From<RepoError> for SettingsServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type SettingsResult<T> = Result<T, SettingsServiceError>;

pub struct SettingsService<'conn> {
    repo: SettingRepository<'conn>,
}

impl<'conn> SettingsService<'conn> {
    pub fn new(conn: &'conn Connection) -> SettingsResult<Self> {
        Ok(Self {
            repo: SettingRepository::try_new(conn)?,
        })
    }

    /// Returns the value of `name`; `None` when unset or stored as NULL.
    pub fn get(&self, name: &str) -> SettingsResult<Option<String>> {
        match self.repo.find_by("setting_name", name.trim(), &Columns::All) {
            Ok(setting) => Ok(setting.setting_value),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// All settings keyed by name. NULL values read as empty strings.
    pub fn all(&self) -> SettingsResult<BTreeMap<String, String>> {
        let pairs = self.repo.lists("setting_value", "setting_name")?;
        Ok(pairs
            .into_iter()
            .filter_map(|(name, value)| {
                let name = name.as_str()?.to_string();
                let value = value.as_str().unwrap_or_default().to_string();
                Some((name, value))
            })
            .collect())
    }

    /// Stores `value` under `name`, creating the row when missing.
    pub fn set(&self, name: &str, value: &str) -> SettingsResult<Setting> {
        let name = normalize_name(name)?;
        let mut data = Attributes::new();
        data.insert("setting_value".to_string(), Value::String(value.to_string()));

        if self.repo.update(&data, name, "setting_name")? == 0 {
            data.insert("setting_name".to_string(), Value::String(name.to_string()));
            let created = self.repo.create(&data)?;
            info!("event=setting_set module=service status=ok op=create name={name}");
            return Ok(created);
        }
        info!("event=setting_set module=service status=ok op=update name={name}");
        Ok(self.repo.find_by("setting_name", name, &Columns::All)?)
    }

    /// Stores every pair atomically; returns how many were written.
    pub fn set_many(&self, values: &BTreeMap<String, String>) -> SettingsResult<usize> {
        for name in values.keys() {
            normalize_name(name)?;
        }
        let tx = self.repo.connection().unchecked_transaction().map_err(RepoError::from)?;
        for (name, value) in values {
            self.set(name, value)?;
        }
        tx.commit().map_err(RepoError::from)?;
        Ok(values.len())
    }
}

fn normalize_name(name: &str) -> SettingsResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SettingsServiceError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}
