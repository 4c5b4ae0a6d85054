//! Fleet example application
//!
//! Registers a car and a truck, records some activity, saves both through
//! one vehicle repository and loads them back as the right variants. Log
//! output is controlled with `RUST_LOG`.

use std::sync::Arc;

use anyhow::Result;
use eventroot::config::RepositoryConfig;
use eventroot::prelude::*;
use eventroot::snapshot::{SnapshotPolicy, SnapshotThreshold};
use eventroot_examples::fleet::types::{Distance, DriverName, LicencePlate, Tonnes};
use eventroot_examples::fleet::{
    driver_repository, vehicle_repository, Driver, DriverEvent, Vehicle, VehicleEvent,
    VehicleKind,
};
use eventroot_memory::{InMemoryEventStore, InMemorySnapshotStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting fleet example");

    let vehicle_store: InMemoryEventStore<VehicleEvent> = InMemoryEventStore::new();
    let snapshots = Arc::new(InMemorySnapshotStore::<Vehicle>::new());
    let vehicles = vehicle_repository(vehicle_store.clone())
        .with_config(RepositoryConfig::new().with_snapshot_policy(
            SnapshotPolicy::EveryNEvents(SnapshotThreshold::try_new(5)?),
        ))
        .with_snapshot_store(snapshots.clone());
    let drivers = driver_repository(InMemoryEventStore::<DriverEvent>::new());

    let car_id = AggregateId::generate();
    let truck_id = AggregateId::generate();

    let mut car = Vehicle::register(
        VehicleKind::Car,
        car_id.clone(),
        LicencePlate::try_new("ca12 rrr")?,
    );
    car.drive(Distance::try_new(42)?)?;
    vehicles.save_aggregate_root(&mut car).await?;

    let mut truck = Vehicle::register(
        VehicleKind::Truck,
        truck_id.clone(),
        LicencePlate::try_new("tr55 uck")?,
    );
    truck.load_cargo(Tonnes::try_new(18)?)?;
    truck.drive(Distance::try_new(310)?)?;
    truck.unload_cargo()?;
    truck.drive(Distance::try_new(290)?)?;
    vehicles.save_aggregate_root(&mut truck).await?;
    info!(snapshots = snapshots.len(), "Truck crossed the snapshot threshold");

    for id in [&car_id, &truck_id] {
        let vehicle = vehicles.load(id).await?;
        info!(
            id = %id,
            kind = vehicle.kind().name(),
            plate = ?vehicle.plate().map(ToString::to_string),
            odometer = vehicle.odometer(),
            version = %vehicle.version(),
            "Loaded vehicle"
        );
    }

    let mut stale = vehicles.load(&car_id).await?;
    let mut fresh = vehicles.load(&car_id).await?;
    fresh.drive(Distance::try_new(7)?)?;
    vehicles.save_aggregate_root(&mut fresh).await?;
    stale.drive(Distance::try_new(9)?)?;
    if let Err(error) = vehicles.save_aggregate_root(&mut stale).await {
        warn!(%error, "Stale copy of the car was rejected");
    }

    let mut driver = Driver::hire(
        AggregateId::generate(),
        DriverName::try_new("Grace Hopper")?,
    );
    let truck = vehicles.load(&truck_id).await?;
    driver.assign(&truck)?;
    drivers.save_aggregate_root(&mut driver).await?;

    let driver = drivers.load(driver.aggregate_id()).await?;
    info!(
        driver = ?driver.name().map(ToString::to_string),
        vehicle = ?driver.vehicle().map(ToString::to_string),
        points = driver.points(),
        "Driver assigned"
    );

    info!("Fleet example complete");
    Ok(())
}
