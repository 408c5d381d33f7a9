// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mapping of a raw LibreLinkUp measurement onto a normalized health record.
//!
//! Pure: no I/O, no clock, same input always gives the same record.

use crate::error::SyncError;
use crate::models::glucose::{UNIT_CODE_MG_PER_DL, UNIT_CODE_MMOL_PER_L};
use crate::models::{
    BloodGlucose, GlucoseMeasurement, GlucoseRecord, RecordMetadata, RelationToMeal,
    SpecimenSource,
};
use crate::time_utils::parse_factory_timestamp;

/// Build the health record for one measurement.
///
/// `data_origin` is the provenance tag stored with the record.
pub fn to_record(
    measurement: &GlucoseMeasurement,
    data_origin: &str,
) -> Result<GlucoseRecord, SyncError> {
    let time = parse_factory_timestamp(&measurement.factory_timestamp).map_err(|reason| {
        SyncError::Parse {
            timestamp: measurement.factory_timestamp.clone(),
            reason,
        }
    })?;

    let mg_per_dl = concentration_mg_per_dl(measurement)?;
    if !mg_per_dl.is_finite() || mg_per_dl <= 0.0 {
        return Err(SyncError::MalformedResponse(format!(
            "Glucose value {} is not a positive concentration",
            mg_per_dl
        )));
    }

    Ok(GlucoseRecord {
        time,
        zone_offset_seconds: 0,
        level: BloodGlucose::milligrams_per_deciliter(mg_per_dl),
        specimen_source: SpecimenSource::InterstitialFluid,
        relation_to_meal: RelationToMeal::Unknown,
        metadata: RecordMetadata {
            data_origin: data_origin.to_string(),
            last_modified: time,
        },
    })
}

/// Concentration in mg/dL, refusing to relabel values in other units.
///
/// mmol/L readings are accepted only when upstream also sent its own
/// mg/dL figure.
fn concentration_mg_per_dl(measurement: &GlucoseMeasurement) -> Result<f64, SyncError> {
    match measurement.glucose_units {
        UNIT_CODE_MG_PER_DL => Ok(measurement
            .value_in_mg_per_dl
            .unwrap_or(measurement.value)),
        UNIT_CODE_MMOL_PER_L => measurement
            .value_in_mg_per_dl
            .ok_or(SyncError::UnsupportedUnit(UNIT_CODE_MMOL_PER_L)),
        other => Err(SyncError::UnsupportedUnit(other)),
    }
}
