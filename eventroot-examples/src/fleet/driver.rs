//! The driver aggregate, a plain single-type aggregate root.

use eventroot::prelude::*;
use serde::{Deserialize, Serialize};

use super::events::DriverEvent;
use super::named_type;
use super::types::DriverName;
use super::vehicle::Vehicle;

/// Points on a clean licence.
pub const LICENCE_POINTS: u8 = 12;

/// A member of the fleet's driving staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    id: AggregateId,
    recorder: EventRecorder<DriverEvent>,
    name: Option<DriverName>,
    points: u8,
    vehicle: Option<AggregateId>,
}

impl Driver {
    /// Hires a new driver.
    pub fn hire(id: AggregateId, name: DriverName) -> Self {
        let mut driver = Self::with_identity(id);
        driver.record_that(DriverEvent::Hired { name });
        driver
    }

    /// The driver's name, once hired.
    pub fn name(&self) -> Option<&DriverName> {
        self.name.as_ref()
    }

    /// Points left on the licence.
    pub const fn points(&self) -> u8 {
        self.points
    }

    /// The vehicle the driver is assigned to.
    pub fn vehicle(&self) -> Option<&AggregateId> {
        self.vehicle.as_ref()
    }

    /// Puts the driver in charge of `vehicle`.
    pub fn assign(&mut self, vehicle: &Vehicle) -> AggregateResult<()> {
        if self.points == 0 {
            return Err(AggregateError::BusinessRuleViolation(
                "driver's licence is suspended".to_string(),
            ));
        }
        if vehicle.is_retired() {
            return Err(AggregateError::BusinessRuleViolation(
                "cannot assign a retired vehicle".to_string(),
            ));
        }
        self.record_that(DriverEvent::Assigned {
            vehicle: vehicle.aggregate_id().clone(),
        });
        Ok(())
    }

    /// Deducts licence points. Points never drop below zero.
    pub fn penalise(&mut self, points: u8) {
        self.record_that(DriverEvent::Penalised { points });
    }
}

impl AggregateRoot for Driver {
    type Event = DriverEvent;

    fn aggregate_id(&self) -> &AggregateId {
        &self.id
    }

    fn aggregate_type(&self) -> AggregateType {
        named_type("driver")
    }

    fn apply(&mut self, event: &DriverEvent) {
        match event {
            DriverEvent::Hired { name } => {
                self.name = Some(name.clone());
                self.points = LICENCE_POINTS;
            }
            DriverEvent::Assigned { vehicle } => self.vehicle = Some(vehicle.clone()),
            DriverEvent::Penalised { points } => {
                self.points = self.points.saturating_sub(*points);
            }
        }
    }

    fn recorder(&self) -> &EventRecorder<DriverEvent> {
        &self.recorder
    }

    fn recorder_mut(&mut self) -> &mut EventRecorder<DriverEvent> {
        &mut self.recorder
    }
}

impl Reconstitute for Driver {
    fn with_identity(id: AggregateId) -> Self {
        Self {
            id,
            recorder: EventRecorder::new(),
            name: None,
            points: 0,
            vehicle: None,
        }
    }
}
