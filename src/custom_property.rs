//! User-defined task columns and their typed values.

use crate::error::CustomPropertyError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomPropertyType {
    Text,
    Integer,
    Double,
    Date,
    Boolean,
}

impl CustomPropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomPropertyType::Text => "text",
            CustomPropertyType::Integer => "integer",
            CustomPropertyType::Double => "double",
            CustomPropertyType::Date => "date",
            CustomPropertyType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CustomValue {
    Text(String),
    Integer(i64),
    Double(f64),
    Date(NaiveDate),
    Boolean(bool),
}

impl CustomValue {
    pub fn property_type(&self) -> CustomPropertyType {
        match self {
            CustomValue::Text(_) => CustomPropertyType::Text,
            CustomValue::Integer(_) => CustomPropertyType::Integer,
            CustomValue::Double(_) => CustomPropertyType::Double,
            CustomValue::Date(_) => CustomPropertyType::Date,
            CustomValue::Boolean(_) => CustomPropertyType::Boolean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomColumn {
    pub name: String,
    pub property_type: CustomPropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<CustomValue>,
}

impl CustomColumn {
    pub fn new(name: impl Into<String>, property_type: CustomPropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            default_value: None,
        }
    }
}

/// Column definitions shared by every task of one manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomColumnsStorage {
    columns: Vec<CustomColumn>,
}

impl CustomColumnsStorage {
    pub fn add_column(&mut self, column: CustomColumn) -> Result<(), CustomPropertyError> {
        if self.column(&column.name).is_some() {
            return Err(CustomPropertyError::DuplicateColumn(column.name));
        }
        if let Some(default) = &column.default_value {
            Self::check_type(&column, default)?;
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<CustomColumn> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    pub fn column(&self, name: &str) -> Option<&CustomColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[CustomColumn] {
        &self.columns
    }

    /// Checks that `value` may be stored under `name`.
    pub fn validate(&self, name: &str, value: &CustomValue) -> Result<(), CustomPropertyError> {
        let column = self
            .column(name)
            .ok_or_else(|| CustomPropertyError::UnknownColumn(name.to_string()))?;
        Self::check_type(column, value)
    }

    fn check_type(column: &CustomColumn, value: &CustomValue) -> Result<(), CustomPropertyError> {
        let actual = value.property_type();
        if actual != column.property_type {
            return Err(CustomPropertyError::TypeMismatch {
                column: column.name.clone(),
                expected: column.property_type.as_str(),
                actual: actual.as_str(),
            });
        }
        Ok(())
    }
}

/// Per-task custom values keyed by column name.
pub type CustomValues = BTreeMap<String, CustomValue>;
