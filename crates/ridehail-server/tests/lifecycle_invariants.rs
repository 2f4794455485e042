//! Model-style property test: arbitrary intent sequences never violate the
//! ride invariants, whatever mix of actors and statuses is thrown at them.

mod common;

use common::TestWorld;
use proptest::prelude::*;
use ridehail_core::RideStore;
use ridehail_proto::{PrincipalId, RideStatus};

const RIDER: u64 = 1;
const ADMIN: u64 = 3;
const DRIVERS: [u64; 2] = [100, 101];

/// One step of the random schedule.
#[derive(Debug, Clone, Copy)]
enum Op {
    Accept { driver: u64 },
    Update { actor: u64, status: RideStatus },
}

fn any_actor() -> impl Strategy<Value = u64> {
    proptest::sample::select(vec![RIDER, ADMIN, DRIVERS[0], DRIVERS[1]])
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::sample::select(DRIVERS.to_vec()).prop_map(|driver| Op::Accept { driver }),
        (any_actor(), proptest::sample::select(RideStatus::ALL.to_vec()))
            .prop_map(|(actor, status)| Op::Update { actor, status }),
    ]
}

#[test]
fn prop_random_schedules_preserve_ride_invariants() {
    proptest!(|(ops in prop::collection::vec(any_op(), 1..30))| {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let world = TestWorld::new();
            let rider = world.add_rider(RIDER).await;
            world.add_principal(ADMIN, ridehail_proto::Role::Admin, false, false).await;
            for id in DRIVERS {
                world.add_driver(id).await;
            }

            let ride = world.request(rider.id, 10.0).await;
            let mut previous = world.rides.find(ride.id).await.unwrap().unwrap();

            for op in &ops {
                // Individual intents may fail; invariants must hold regardless.
                match *op {
                    Op::Accept { driver } => {
                        let _ = world.coordinator.accept_ride(ride.id, PrincipalId(driver)).await;
                    }
                    Op::Update { actor, status } => {
                        let _ = world
                            .coordinator
                            .update_status(ride.id, status, PrincipalId(actor))
                            .await;
                    }
                }

                let current = world.rides.find(ride.id).await.unwrap().unwrap();

                // Requested rides have no driver.
                if current.status == RideStatus::Requested {
                    prop_assert_eq!(current.driver, None);
                }

                // The driver slot, once assigned, never changes hands.
                if let Some(assigned) = previous.driver {
                    prop_assert_eq!(current.driver, Some(assigned));
                }

                // Every observed state change follows the lifecycle graph.
                if current.status != previous.status {
                    prop_assert!(
                        previous.status.allows(current.status),
                        "off-graph transition {} -> {}",
                        previous.status,
                        current.status
                    );
                }

                // Terminal states stay terminal.
                if previous.status.is_terminal() {
                    prop_assert_eq!(current.status, previous.status);
                }

                previous = current;
            }
            Ok(())
        })?;
    });
}
