//! Typed car listing records and the column identifiers used to address them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric input columns, in feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericColumn {
    Year,
    Distance,
    Owner,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 3] = [Self::Year, Self::Distance, Self::Owner];

    pub fn name(self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Distance => "Distance",
            Self::Owner => "Owner",
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Categorical input columns, in feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalColumn {
    Fuel,
    Location,
    Drive,
    Type,
    Brand,
    Model,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 6] = [
        Self::Fuel,
        Self::Location,
        Self::Drive,
        Self::Type,
        Self::Brand,
        Self::Model,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fuel => "Fuel",
            Self::Location => "Location",
            Self::Drive => "Drive",
            Self::Type => "Type",
            Self::Brand => "Brand",
            Self::Model => "Model",
        }
    }
}

impl fmt::Display for CategoricalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One validated car listing.
///
/// `price` is present for training and evaluation records and absent for
/// records submitted for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Distance")]
    pub distance: i64,
    #[serde(rename = "Owner")]
    pub owner: i64,
    #[serde(rename = "Fuel")]
    pub fuel: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Drive")]
    pub drive: String,
    #[serde(rename = "Type")]
    pub body_type: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Price", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl RawRecord {
    pub fn numeric(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::Year => self.year as f64,
            NumericColumn::Distance => self.distance as f64,
            NumericColumn::Owner => self.owner as f64,
        }
    }

    pub fn categorical(&self, column: CategoricalColumn) -> &str {
        match column {
            CategoricalColumn::Fuel => &self.fuel,
            CategoricalColumn::Location => &self.location,
            CategoricalColumn::Drive => &self.drive,
            CategoricalColumn::Type => &self.body_type,
            CategoricalColumn::Brand => &self.brand,
            CategoricalColumn::Model => &self.model,
        }
    }

    pub fn set_categorical(&mut self, column: CategoricalColumn, value: impl Into<String>) {
        let slot = match column {
            CategoricalColumn::Fuel => &mut self.fuel,
            CategoricalColumn::Location => &mut self.location,
            CategoricalColumn::Drive => &mut self.drive,
            CategoricalColumn::Type => &mut self.body_type,
            CategoricalColumn::Brand => &mut self.brand,
            CategoricalColumn::Model => &mut self.model,
        };
        *slot = value.into();
    }
}
