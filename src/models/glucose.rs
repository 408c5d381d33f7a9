// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Glucose measurement (as reported by LibreLinkUp) and the normalized
//! health record written to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `GlucoseUnits` code for mmol/L.
pub const UNIT_CODE_MMOL_PER_L: i32 = 0;
/// `GlucoseUnits` code for mg/dL.
pub const UNIT_CODE_MG_PER_DL: i32 = 1;

/// Raw glucose measurement embedded in a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseMeasurement {
    /// Sensor timestamp in UTC, `M/d/y h:m:s a`
    #[serde(rename = "FactoryTimestamp")]
    pub factory_timestamp: String,
    /// Same instant in the patient's local time (informational)
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    /// Value in the unit given by `glucose_units`
    #[serde(rename = "Value")]
    pub value: f64,
    /// Upstream's own mg/dL conversion, when present
    #[serde(rename = "ValueInMgPerDl", default)]
    pub value_in_mg_per_dl: Option<f64>,
    #[serde(rename = "MeasurementColor", default)]
    pub measurement_color: i32,
    #[serde(rename = "GlucoseUnits")]
    pub glucose_units: i32,
    /// 1 (falling fast) .. 5 (rising fast); absent on some readings
    #[serde(rename = "TrendArrow", default)]
    pub trend_arrow: Option<i32>,
    #[serde(rename = "isHigh", default)]
    pub is_high: bool,
    #[serde(rename = "isLow", default)]
    pub is_low: bool,
}

/// Concentration unit of a normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseUnit {
    MilligramsPerDeciliter,
}

/// Where the sample was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecimenSource {
    InterstitialFluid,
}

/// Relation of the reading to a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationToMeal {
    Unknown,
}

/// Concentration value with explicit unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodGlucose {
    pub value: f64,
    pub unit: GlucoseUnit,
}

impl BloodGlucose {
    pub fn milligrams_per_deciliter(value: f64) -> Self {
        Self {
            value,
            unit: GlucoseUnit::MilligramsPerDeciliter,
        }
    }
}

/// Provenance of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Application that produced the record
    pub data_origin: String,
    /// Set to the measurement time so mapping stays deterministic
    pub last_modified: DateTime<Utc>,
}

/// Normalized blood glucose record, as stored in the health store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseRecord {
    pub time: DateTime<Utc>,
    /// Offset from UTC in seconds (always 0 for LibreLinkUp readings)
    pub zone_offset_seconds: i32,
    pub level: BloodGlucose,
    pub specimen_source: SpecimenSource,
    pub relation_to_meal: RelationToMeal,
    pub metadata: RecordMetadata,
}

impl GlucoseRecord {
    /// Key identifying the same reading from the same origin.
    ///
    /// Safe to use as a Firestore document ID.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}",
            self.metadata.data_origin.replace('/', "_"),
            self.time.timestamp()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_deserializes_upstream_shape() {
        let json = serde_json::json!({
            "FactoryTimestamp": "1/2/2024 3:04:05 PM",
            "Timestamp": "1/2/2024 10:04:05 AM",
            "type": 1,
            "ValueInMgPerDl": 120,
            "TrendArrow": 3,
            "TrendMessage": null,
            "MeasurementColor": 1,
            "GlucoseUnits": 1,
            "Value": 120,
            "isHigh": false,
            "isLow": false
        });

        let m: GlucoseMeasurement = serde_json::from_value(json).unwrap();
        assert_eq!(m.factory_timestamp, "1/2/2024 3:04:05 PM");
        assert_eq!(m.value, 120.0);
        assert_eq!(m.value_in_mg_per_dl, Some(120.0));
        assert_eq!(m.trend_arrow, Some(3));
        assert_eq!(m.glucose_units, UNIT_CODE_MG_PER_DL);
    }

    #[test]
    fn test_measurement_optional_fields() {
        let json = serde_json::json!({
            "FactoryTimestamp": "1/2/2024 3:04:05 PM",
            "Value": 6.7,
            "GlucoseUnits": 0
        });

        let m: GlucoseMeasurement = serde_json::from_value(json).unwrap();
        assert_eq!(m.value_in_mg_per_dl, None);
        assert_eq!(m.trend_arrow, None);
        assert_eq!(m.measurement_color, 0);
        assert_eq!(m.glucose_units, UNIT_CODE_MMOL_PER_L);
    }
}
