//! Type inference for sampled document values.
//!
//! [`describe_type`] maps a [`FieldValue`] to a [`TypeLabel`] and
//! [`describe_fields`] walks a document's field map, descending into nested
//! maps. Both are pure: no I/O and no state beyond the configuration.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Serializer};

use crate::config::InferenceConfig;
use crate::models::{DocumentData, FieldDescriptor, FieldValue};

/// Inferred type label of a single value.
///
/// Renders as the label text used in reports, for example `integer`,
/// `reference→users/alice`, `array<?>`, `array<string>` or
/// `array<mixed:boolean,integer>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLabel {
    /// Explicit null
    Null,
    /// `true` or `false`
    Boolean,
    /// Signed 64-bit integer
    Integer,
    /// Double precision number
    Float,
    /// UTF-8 text
    String,
    /// Raw bytes
    Bytes,
    /// Nested map; its entries are described separately
    Map,
    /// Point in time
    Timestamp,
    /// Latitude/longitude pair
    GeoPoint,
    /// Reference to another document, carrying its path
    Reference(String),
    /// Array with no elements
    EmptyArray,
    /// Array whose sampled elements share one label
    Array(Box<TypeLabel>),
    /// Array with differing element labels, sorted and deduplicated
    MixedArray(BTreeSet<String>),
    /// Raw type name of a value matching nothing known
    Raw(String),
}

impl std::fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeLabel::Null => write!(f, "null"),
            TypeLabel::Boolean => write!(f, "boolean"),
            TypeLabel::Integer => write!(f, "integer"),
            TypeLabel::Float => write!(f, "float"),
            TypeLabel::String => write!(f, "string"),
            TypeLabel::Bytes => write!(f, "bytes"),
            TypeLabel::Map => write!(f, "map"),
            TypeLabel::Timestamp => write!(f, "timestamp"),
            TypeLabel::GeoPoint => write!(f, "geopoint"),
            TypeLabel::Reference(path) => write!(f, "reference→{}", path),
            TypeLabel::EmptyArray => write!(f, "array<?>"),
            TypeLabel::Array(element) => write!(f, "array<{}>", element),
            TypeLabel::MixedArray(members) => {
                let joined = members.iter().map(String::as_str).collect::<Vec<_>>();
                write!(f, "array<mixed:{}>", joined.join(","))
            }
            TypeLabel::Raw(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for TypeLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Infers the type label of a value.
///
/// # Arguments
/// * `value` - The value to classify
/// * `config` - Array sampling settings
///
/// # Example
/// ```rust
/// use docsurveyor_core::config::InferenceConfig;
/// use docsurveyor_core::inference::describe_type;
/// use docsurveyor_core::models::FieldValue;
///
/// let value = FieldValue::Array(vec![
///     FieldValue::Integer(1),
///     FieldValue::String("x".into()),
///     FieldValue::Boolean(true),
/// ]);
/// let label = describe_type(&value, &InferenceConfig::default());
/// assert_eq!(label.to_string(), "array<mixed:boolean,integer,string>");
/// ```
pub fn describe_type(value: &FieldValue, config: &InferenceConfig) -> TypeLabel {
    match value {
        FieldValue::Null => TypeLabel::Null,

        // Store-specific shapes
        FieldValue::Timestamp(_) => TypeLabel::Timestamp,
        FieldValue::GeoPoint { .. } => TypeLabel::GeoPoint,
        FieldValue::Reference(path) => TypeLabel::Reference(path.clone()),

        FieldValue::Boolean(_) => TypeLabel::Boolean,
        FieldValue::Integer(_) => TypeLabel::Integer,
        FieldValue::Float(_) => TypeLabel::Float,
        FieldValue::String(_) => TypeLabel::String,
        FieldValue::Bytes(_) => TypeLabel::Bytes,
        FieldValue::Map(_) => TypeLabel::Map,

        FieldValue::Array(elements) => describe_array(elements, config),

        FieldValue::Other { .. } => TypeLabel::Raw(value.type_name().to_string()),
    }
}

fn describe_array(elements: &[FieldValue], config: &InferenceConfig) -> TypeLabel {
    let Some(first) = elements.first() else {
        return TypeLabel::EmptyArray;
    };

    // Without sampling only the first element is inspected, so arrays that
    // are actually mixed still come out as uniform.
    if !config.sample_arrays {
        return TypeLabel::Array(Box::new(describe_type(first, config)));
    }

    let sample_size = elements.len().min(config.array_sample_size);
    let mut labels: BTreeMap<String, TypeLabel> = BTreeMap::new();
    for element in &elements[..sample_size] {
        let label = describe_type(element, config);
        labels.entry(label.to_string()).or_insert(label);
    }

    if labels.len() == 1 {
        match labels.into_values().next() {
            Some(label) => TypeLabel::Array(Box::new(label)),
            None => TypeLabel::EmptyArray,
        }
    } else {
        TypeLabel::MixedArray(labels.into_keys().collect())
    }
}

/// Describes every field of a document in sorted key order.
///
/// Nested maps are described right after their own entry at `level + 1`.
/// The caller counts one analyzed field per returned descriptor.
pub fn describe_fields(
    data: &DocumentData,
    level: usize,
    config: &InferenceConfig,
) -> Vec<FieldDescriptor> {
    let mut descriptors = Vec::new();
    collect_fields(data, level, config, &mut descriptors);
    descriptors
}

fn collect_fields(
    data: &DocumentData,
    level: usize,
    config: &InferenceConfig,
    out: &mut Vec<FieldDescriptor>,
) {
    for (name, value) in data {
        out.push(FieldDescriptor {
            name: name.clone(),
            type_label: describe_type(value, config),
            level,
        });

        if let FieldValue::Map(nested) = value {
            collect_fields(nested, level + 1, config, out);
        }
    }
}
