// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monitored-patient connection returned by LibreLinkUp.

use serde::{Deserialize, Serialize};

use crate::models::GlucoseMeasurement;

/// One patient the logged-in account follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Latest reading; absent when the sensor has not reported yet
    #[serde(default)]
    pub glucose_measurement: Option<GlucoseMeasurement>,
}
