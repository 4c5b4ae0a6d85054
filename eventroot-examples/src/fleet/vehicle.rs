//! The polymorphic vehicle aggregate.
//!
//! [`Car`] and [`Truck`] are separate aggregate roots over the same
//! [`VehicleEvent`] schema. [`Vehicle`] is the sum type a repository works
//! with; which variant a stream rebuilds into is decided by the
//! `Registered` event that opens it.

use eventroot::prelude::*;
use serde::{Deserialize, Serialize};

use super::events::{VehicleEvent, VehicleKind};
use super::types::{Distance, LicencePlate, Tonnes};

fn violation(message: &str) -> AggregateError {
    AggregateError::BusinessRuleViolation(message.to_string())
}

/// A passenger car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    id: AggregateId,
    recorder: EventRecorder<VehicleEvent>,
    plate: Option<LicencePlate>,
    odometer: u64,
    retired: bool,
}

impl Car {
    /// A car with no history, ready for replay.
    pub fn blank(id: AggregateId) -> Self {
        Self {
            id,
            recorder: EventRecorder::new(),
            plate: None,
            odometer: 0,
            retired: false,
        }
    }
}

impl AggregateRoot for Car {
    type Event = VehicleEvent;

    fn aggregate_id(&self) -> &AggregateId {
        &self.id
    }

    fn aggregate_type(&self) -> AggregateType {
        VehicleKind::Car.aggregate_type()
    }

    fn apply(&mut self, event: &VehicleEvent) {
        match event {
            VehicleEvent::Registered { plate, .. } => self.plate = Some(plate.clone()),
            VehicleEvent::Driven { distance } => {
                let km: u32 = (*distance).into();
                self.odometer += u64::from(km);
            }
            VehicleEvent::Retired => self.retired = true,
            VehicleEvent::CargoLoaded { .. } | VehicleEvent::CargoUnloaded => {}
        }
    }

    fn recorder(&self) -> &EventRecorder<VehicleEvent> {
        &self.recorder
    }

    fn recorder_mut(&mut self) -> &mut EventRecorder<VehicleEvent> {
        &mut self.recorder
    }
}

/// A goods vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truck {
    id: AggregateId,
    recorder: EventRecorder<VehicleEvent>,
    plate: Option<LicencePlate>,
    odometer: u64,
    cargo: Option<Tonnes>,
    retired: bool,
}

impl Truck {
    /// A truck with no history, ready for replay.
    pub fn blank(id: AggregateId) -> Self {
        Self {
            id,
            recorder: EventRecorder::new(),
            plate: None,
            odometer: 0,
            cargo: None,
            retired: false,
        }
    }
}

impl AggregateRoot for Truck {
    type Event = VehicleEvent;

    fn aggregate_id(&self) -> &AggregateId {
        &self.id
    }

    fn aggregate_type(&self) -> AggregateType {
        VehicleKind::Truck.aggregate_type()
    }

    fn apply(&mut self, event: &VehicleEvent) {
        match event {
            VehicleEvent::Registered { plate, .. } => self.plate = Some(plate.clone()),
            VehicleEvent::Driven { distance } => {
                let km: u32 = (*distance).into();
                self.odometer += u64::from(km);
            }
            VehicleEvent::CargoLoaded { weight } => self.cargo = Some(*weight),
            VehicleEvent::CargoUnloaded => self.cargo = None,
            VehicleEvent::Retired => self.retired = true,
        }
    }

    fn recorder(&self) -> &EventRecorder<VehicleEvent> {
        &self.recorder
    }

    fn recorder_mut(&mut self) -> &mut EventRecorder<VehicleEvent> {
        &mut self.recorder
    }
}

/// Any vehicle in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vehicle {
    /// A car
    Car(Car),
    /// A truck
    Truck(Truck),
}

impl Vehicle {
    /// Registers a new vehicle of the given kind.
    pub fn register(kind: VehicleKind, id: AggregateId, plate: LicencePlate) -> Self {
        let mut vehicle = match kind {
            VehicleKind::Car => Self::Car(Car::blank(id)),
            VehicleKind::Truck => Self::Truck(Truck::blank(id)),
        };
        vehicle.record_that(VehicleEvent::Registered { kind, plate });
        vehicle
    }

    /// Which variant this is.
    pub const fn kind(&self) -> VehicleKind {
        match self {
            Self::Car(_) => VehicleKind::Car,
            Self::Truck(_) => VehicleKind::Truck,
        }
    }

    /// The registration plate, once registered.
    pub fn plate(&self) -> Option<&LicencePlate> {
        match self {
            Self::Car(car) => car.plate.as_ref(),
            Self::Truck(truck) => truck.plate.as_ref(),
        }
    }

    /// Total kilometres driven.
    pub const fn odometer(&self) -> u64 {
        match self {
            Self::Car(car) => car.odometer,
            Self::Truck(truck) => truck.odometer,
        }
    }

    /// Cargo currently on board; cars never carry any.
    pub const fn cargo(&self) -> Option<Tonnes> {
        match self {
            Self::Car(_) => None,
            Self::Truck(truck) => truck.cargo,
        }
    }

    /// Whether the vehicle has been taken out of service.
    pub const fn is_retired(&self) -> bool {
        match self {
            Self::Car(car) => car.retired,
            Self::Truck(truck) => truck.retired,
        }
    }

    /// Records a completed trip.
    pub fn drive(&mut self, distance: Distance) -> AggregateResult<()> {
        if self.is_retired() {
            return Err(violation("a retired vehicle cannot be driven"));
        }
        self.record_that(VehicleEvent::Driven { distance });
        Ok(())
    }

    /// Loads cargo onto a truck.
    pub fn load_cargo(&mut self, weight: Tonnes) -> AggregateResult<()> {
        let Self::Truck(truck) = self else {
            return Err(violation("cars do not carry cargo"));
        };
        if truck.retired {
            return Err(violation("a retired truck cannot be loaded"));
        }
        if truck.cargo.is_some() {
            return Err(violation("truck is already loaded"));
        }
        self.record_that(VehicleEvent::CargoLoaded { weight });
        Ok(())
    }

    /// Unloads a truck's cargo.
    pub fn unload_cargo(&mut self) -> AggregateResult<()> {
        if self.cargo().is_none() {
            return Err(violation("nothing to unload"));
        }
        self.record_that(VehicleEvent::CargoUnloaded);
        Ok(())
    }

    /// Takes the vehicle out of service.
    pub fn retire(&mut self) -> AggregateResult<()> {
        if self.is_retired() {
            return Err(violation("vehicle is already retired"));
        }
        if self.cargo().is_some() {
            return Err(violation("unload the truck before retiring it"));
        }
        self.record_that(VehicleEvent::Retired);
        Ok(())
    }
}

impl AggregateRoot for Vehicle {
    type Event = VehicleEvent;

    fn aggregate_id(&self) -> &AggregateId {
        match self {
            Self::Car(car) => car.aggregate_id(),
            Self::Truck(truck) => truck.aggregate_id(),
        }
    }

    fn aggregate_type(&self) -> AggregateType {
        self.kind().aggregate_type()
    }

    fn apply(&mut self, event: &VehicleEvent) {
        match self {
            Self::Car(car) => car.apply(event),
            Self::Truck(truck) => truck.apply(event),
        }
    }

    fn recorder(&self) -> &EventRecorder<VehicleEvent> {
        match self {
            Self::Car(car) => car.recorder(),
            Self::Truck(truck) => truck.recorder(),
        }
    }

    fn recorder_mut(&mut self) -> &mut EventRecorder<VehicleEvent> {
        match self {
            Self::Car(car) => car.recorder_mut(),
            Self::Truck(truck) => truck.recorder_mut(),
        }
    }
}
