//! Site-wide key/value setting.

use crate::model::entity::{EntityId, Model};
use crate::query::Operator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Setting {
    pub id: EntityId,
    pub setting_name: String,
    pub setting_value: Option<String>,
}

impl Model for Setting {
    const TABLE: &'static str = "settings";
    const COLUMNS: &'static [&'static str] = &["id", "setting_name", "setting_value"];
    const SEARCHABLE: &'static [(&'static str, Operator)] = &[("setting_name", Operator::Eq)];
}
