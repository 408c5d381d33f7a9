// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod connection;
pub mod glucose;
pub mod session;

pub use connection::Connection;
pub use glucose::{
    BloodGlucose, GlucoseMeasurement, GlucoseRecord, GlucoseUnit, RecordMetadata,
    RelationToMeal, SpecimenSource,
};
pub use session::{AuthTicket, StoredSession, UserProfile};
