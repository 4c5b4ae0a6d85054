//! Events of the fleet domain.

use eventroot::prelude::*;
use serde::{Deserialize, Serialize};

use super::named_type;
use super::types::{Distance, DriverName, LicencePlate, Tonnes};

/// The concrete kinds of vehicle sharing the vehicle event schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleKind {
    /// A passenger car
    Car,
    /// A goods vehicle that can carry cargo
    Truck,
}

impl VehicleKind {
    /// The kind's name as stored in event metadata.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Truck => "truck",
        }
    }

    /// The kind as an aggregate type.
    pub fn aggregate_type(self) -> AggregateType {
        named_type(self.name())
    }
}

/// Everything that can happen to a vehicle, whatever its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleEvent {
    /// First event of every vehicle stream; `kind` decides the variant.
    Registered {
        /// Which variant this vehicle is
        kind: VehicleKind,
        /// Its registration plate
        plate: LicencePlate,
    },
    /// A trip was completed.
    Driven {
        /// Kilometres covered
        distance: Distance,
    },
    /// Cargo was loaded onto a truck.
    CargoLoaded {
        /// Weight loaded
        weight: Tonnes,
    },
    /// A truck's cargo was unloaded.
    CargoUnloaded,
    /// The vehicle was taken out of service.
    Retired,
}

impl DomainEvent for VehicleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "VehicleRegistered",
            Self::Driven { .. } => "VehicleDriven",
            Self::CargoLoaded { .. } => "CargoLoaded",
            Self::CargoUnloaded => "CargoUnloaded",
            Self::Retired => "VehicleRetired",
        }
    }

    fn aggregate_type_hint(&self) -> Option<AggregateType> {
        match self {
            Self::Registered { kind, .. } => Some(kind.aggregate_type()),
            _ => None,
        }
    }
}

/// Events of the driver aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverEvent {
    /// The driver joined the fleet.
    Hired {
        /// The driver's name
        name: DriverName,
    },
    /// The driver was put in charge of a vehicle.
    Assigned {
        /// The vehicle's aggregate id
        vehicle: AggregateId,
    },
    /// Points were taken off the driver's licence.
    Penalised {
        /// Points deducted
        points: u8,
    },
}

impl DomainEvent for DriverEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Hired { .. } => "DriverHired",
            Self::Assigned { .. } => "DriverAssigned",
            Self::Penalised { .. } => "DriverPenalised",
        }
    }
}
