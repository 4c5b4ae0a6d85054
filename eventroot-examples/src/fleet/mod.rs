//! Fleet example: a polymorphic vehicle aggregate and a plain driver aggregate
//!
//! Cars and trucks are recorded into streams named `vehicle-<id>` with one
//! shared event schema. Loading a vehicle reads the `Registered` event at
//! the head of its stream to decide whether to rebuild a car or a truck.

pub mod driver;
pub mod events;
pub mod types;
pub mod vehicle;

pub use driver::Driver;
pub use events::{DriverEvent, VehicleEvent, VehicleKind};
pub use vehicle::{Car, Truck, Vehicle};

use eventroot::prelude::*;

/// Repository serving every kind of vehicle.
pub type VehicleRepository<S> = AggregateRepository<Vehicle, S, TaggedTranslator<Vehicle>>;

/// Repository for drivers.
pub type DriverRepository<S> = AggregateRepository<Driver, S, DefaultTranslator<Driver>>;

pub(crate) fn named_type(name: &'static str) -> AggregateType {
    AggregateType::try_new(name).expect("fleet aggregate type names are non-empty")
}

/// The base type shared by cars and trucks.
pub fn vehicle_type() -> AggregateType {
    named_type("vehicle")
}

/// Translator that rebuilds cars and trucks from the first event's kind.
pub fn vehicle_translator() -> TaggedTranslator<Vehicle> {
    TaggedTranslator::new(PayloadDiscriminator)
        .register(VehicleKind::Car.aggregate_type(), |id| {
            Vehicle::Car(Car::blank(id))
        })
        .register(VehicleKind::Truck.aggregate_type(), |id| {
            Vehicle::Truck(Truck::blank(id))
        })
}

/// A vehicle repository over `store`.
pub fn vehicle_repository<S>(store: S) -> VehicleRepository<S>
where
    S: EventStore<Event = VehicleEvent>,
{
    let translator = vehicle_translator();
    let mapping = translator.mapping(vehicle_type());
    AggregateRepository::new(store, translator, mapping)
}

/// A driver repository over `store`.
pub fn driver_repository<S>(store: S) -> DriverRepository<S>
where
    S: EventStore<Event = DriverEvent>,
{
    AggregateRepository::new(
        store,
        DefaultTranslator::new(),
        AggregateTypeMapping::single(named_type("driver")),
    )
}
