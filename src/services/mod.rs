// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod companion;
pub mod health;
pub mod librelinkup;
pub mod record;
pub mod sync;

pub use companion::{CompanionChannel, CompanionRelay, HttpCompanionChannel, RelayOutcome};
pub use health::{HealthWriter, WriteOutcome};
pub use librelinkup::LinkUpClient;
pub use record::to_record;
pub use sync::{SyncOrchestrator, SyncReport};
