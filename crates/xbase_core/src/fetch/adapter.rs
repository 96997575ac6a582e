//! JSON array to list-row binding.
//!
//! # Responsibility
//! - Validate a field→slot projection.
//! - Turn a JSON array body into display rows, one per element.
//!
//! # Invariants
//! - `from[i]` is always written into `to[i]`.
//! - Every row carries every projected slot, in projection order.

use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Debug)]
pub enum AdapterError {
    EmptyProjection,
    ProjectionMismatch { fields: usize, slots: usize },
    InvalidJson(serde_json::Error),
    NotAnArray,
    NotAnObject { index: usize },
}

impl Display for AdapterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProjection => write!(f, "projection must map at least one field"),
            Self::ProjectionMismatch { fields, slots } => write!(
                f,
                "projection has {fields} field(s) but {slots} slot(s)"
            ),
            Self::InvalidJson(err) => write!(f, "response body is not valid JSON: {err}"),
            Self::NotAnArray => write!(f, "response body is not a JSON array"),
            Self::NotAnObject { index } => {
                write!(f, "array element {index} is not a JSON object")
            }
        }
    }
}

impl Error for AdapterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidJson(value)
    }
}

/// Row layout plus the positional field→slot correspondence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub(crate) layout: String,
    pub(crate) fields: Vec<String>,
    pub(crate) slots: Vec<String>,
}

impl Projection {
    pub fn new<F, S>(
        layout: impl Into<String>,
        fields: impl IntoIterator<Item = F>,
        slots: impl IntoIterator<Item = S>,
    ) -> AdapterResult<Self>
    where
        F: Into<String>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let slots: Vec<String> = slots.into_iter().map(Into::into).collect();
        if fields.len() != slots.len() {
            return Err(AdapterError::ProjectionMismatch {
                fields: fields.len(),
                slots: slots.len(),
            });
        }
        if fields.is_empty() {
            return Err(AdapterError::EmptyProjection);
        }
        Ok(Self {
            layout: layout.into(),
            fields,
            slots,
        })
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// `(field, slot)` pairs in projection order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.slots.iter().map(String::as_str))
    }
}

/// One slot value of a rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotText {
    pub slot: String,
    pub text: String,
}

/// One visual row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub slots: Vec<SlotText>,
}

impl ListRow {
    /// Text bound to `slot`, if the projection has that slot.
    pub fn text(&self, slot: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|value| value.slot == slot)
            .map(|value| value.text.as_str())
    }
}

/// Rows bound from one JSON array response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonArrayAdapter {
    layout: String,
    rows: Vec<ListRow>,
}

impl JsonArrayAdapter {
    /// Parses `body` and projects each object element onto one row.
    pub fn from_json(body: &str, projection: &Projection) -> AdapterResult<Self> {
        let value: Value = serde_json::from_str(body)?;
        let Value::Array(elements) = value else {
            return Err(AdapterError::NotAnArray);
        };

        let rows = elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let object = element
                    .as_object()
                    .ok_or(AdapterError::NotAnObject { index })?;
                let slots = projection
                    .pairs()
                    .map(|(field, slot)| SlotText {
                        slot: slot.to_string(),
                        text: display_text(object.get(field)),
                    })
                    .collect();
                Ok(ListRow { slots })
            })
            .collect::<AdapterResult<Vec<_>>>()?;

        Ok(Self {
            layout: projection.layout().to_string(),
            rows,
        })
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, position: usize) -> Option<&ListRow> {
        self.rows.get(position)
    }

    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }
}

fn display_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
