//! Object describe types.
//!
//! The describe payload is large and varies between objects and API
//! versions, so every field tolerates absence and unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for one SObject as returned by `sobjects/{name}/describe`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescribeSObjectResult {
    // === Identity ===
    pub name: String,
    pub label: String,
    pub label_plural: String,
    pub key_prefix: Option<String>,
    pub custom: bool,

    // === Capabilities ===
    pub is_subtype: bool,
    pub createable: bool,
    pub deletable: bool,
    pub queryable: bool,
    pub replicateable: bool,
    pub retrieveable: bool,
    pub searchable: bool,
    pub search_layoutable: bool,
    pub triggerable: bool,
    pub undeletable: bool,
    pub updateable: bool,

    // === Contents ===
    pub fields: Vec<FieldDescribe>,
    pub record_type_infos: Vec<RecordTypeInfo>,
    pub supported_scopes: Vec<ScopeInfo>,

    // === API Metadata ===
    pub sobject_describe_option: Option<String>,
    /// Related resource URLs keyed by name (`describe`, `sobject`, `layouts`, ...).
    pub urls: HashMap<String, String>,
}

impl DescribeSObjectResult {
    /// Look up a field by API name, ignoring case.
    pub fn field(&self, name: &str) -> Option<&FieldDescribe> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Fields flagged as external ids, usable as upsert keys.
    pub fn external_id_fields(&self) -> impl Iterator<Item = &FieldDescribe> {
        self.fields.iter().filter(|field| field.external_id)
    }
}

/// Record type information for an SObject.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordTypeInfo {
    pub name: String,
    pub record_type_id: String,
    pub developer_name: Option<String>,
    pub active: bool,
    pub available: bool,
    pub default_record_type_mapping: bool,
    pub master: bool,
    pub urls: RecordTypeUrls,
}

/// URLs attached to a record type.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordTypeUrls {
    pub layout: Option<String>,
}

/// Scope usable in a `USING SCOPE` clause.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScopeInfo {
    pub name: String,
    pub label: String,
}

/// Field metadata.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldDescribe {
    // === Identity ===
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub soap_type: Option<String>,
    pub custom: bool,
    pub inline_help_text: Option<String>,

    // === Size & Precision ===
    pub length: i32,
    pub byte_length: i32,
    pub digits: i32,
    pub precision: i32,
    pub scale: i32,

    // === Capabilities ===
    pub aggregatable: bool,
    pub createable: bool,
    pub updateable: bool,
    pub nillable: bool,
    pub filterable: bool,
    pub sortable: bool,
    pub groupable: bool,
    pub unique: bool,
    pub permissionable: bool,
    pub search_prefilterable: bool,
    pub query_by_distance: bool,

    // === Field Characteristics ===
    pub external_id: bool,
    pub id_lookup: bool,
    pub name_field: bool,
    pub name_pointing: bool,
    pub auto_number: bool,
    pub calculated: bool,
    pub calculated_formula: Option<String>,
    pub case_sensitive: bool,
    pub encrypted: bool,
    pub html_formatted: bool,
    pub high_scale_number: bool,
    pub display_location_in_decimal: bool,
    pub ai_prediction_field: bool,
    pub deprecated_and_hidden: bool,
    pub compound_field_name: Option<String>,
    pub extra_type_info: Option<String>,

    // === Defaults ===
    /// Type depends on the field, so it stays raw JSON.
    pub default_value: Option<serde_json::Value>,
    pub default_value_formula: Option<String>,
    pub defaulted_on_create: bool,
    pub formula_treat_null_number_as_zero: bool,

    // === Relationships ===
    pub reference_to: Vec<String>,
    pub relationship_name: Option<String>,
    pub polymorphic_foreign_key: bool,
    pub cascade_delete: bool,
    pub restricted_delete: bool,
    pub write_requires_master_read: bool,

    // === Picklist ===
    pub picklist_values: Vec<PicklistValue>,
    pub dependent_picklist: bool,
    pub controller_name: Option<String>,
    pub restricted_picklist: bool,
}

impl FieldDescribe {
    /// Active picklist entries.
    pub fn active_picklist_values(&self) -> impl Iterator<Item = &PicklistValue> {
        self.picklist_values.iter().filter(|value| value.active)
    }
}

/// Picklist value for picklist fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PicklistValue {
    pub value: String,
    pub label: String,
    pub active: bool,
    pub default_value: bool,
    pub valid_for: Option<String>,
}
