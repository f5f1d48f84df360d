//! fleetcycle-balancer: which balancers serve an instance, and taking it
//! out of (and back into) their rotation.
//!
//! # Architecture
//!
//! ```text
//! FleetMembership::resolve(groups, names)
//!   ├── per balancer kind (classic, target group), concurrently
//!   │   └── per configured name, concurrently
//!   │       ├── resolve name → balancer id (not found → skipped)
//!   │       └── healthy members → shared dedup set
//!   └── merged instance set (first seen wins)
//!
//! Coordinator::drain / restore(instance)
//!   └── one unit per (balancer, instance) pair across both kinds,
//!       all concurrent: deregister + wait  /  register + wait
//! ```
//!
//! Both balancer kinds sit behind the `BalancerGroup` capability trait;
//! the resolver and coordinator never branch on kind.

pub mod coordinator;
pub mod group;
pub mod resolver;

pub use coordinator::{Coordinator, Transition};
pub use group::{BalancerGroup, ClassicGroup, GroupFuture, TargetGroups};
pub use resolver::{
    BalancerMembership, FleetMembership, FleetPlan, GroupMembership, MembershipRef,
    PlannedBalancer, PlannedInstance,
};
