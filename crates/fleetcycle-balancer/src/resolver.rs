//! Membership resolution: which instances are healthy behind which balancers.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use fleetcycle_core::{BalancerKind, CycleResult, InstanceId};

use crate::group::BalancerGroup;

/// Healthy members of one resolved balancer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancerMembership {
    /// The configured name.
    pub name: String,
    /// The id drain/restore address (the name for classic balancers,
    /// the target group id otherwise).
    pub balancer_id: String,
    pub members: Vec<InstanceId>,
}

impl BalancerMembership {
    pub fn contains(&self, instance: &InstanceId) -> bool {
        self.members.contains(instance)
    }
}

/// Resolution result for one balancer kind.
pub struct GroupMembership {
    pub group: Arc<dyn BalancerGroup>,
    /// Balancers that exist, in configured order.
    pub balancers: Vec<BalancerMembership>,
    /// Healthy instances across this kind's balancers, each listed once.
    pub instances: Vec<InstanceId>,
}

impl fmt::Debug for GroupMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupMembership")
            .field("kind", &self.group.kind())
            .field("balancers", &self.balancers)
            .field("instances", &self.instances)
            .finish()
    }
}

impl GroupMembership {
    pub fn kind(&self) -> BalancerKind {
        self.group.kind()
    }

    /// Query every configured name concurrently.
    ///
    /// A name that does not resolve is skipped. Any other failure aborts
    /// resolution for this kind.
    pub async fn resolve(
        group: Arc<dyn BalancerGroup>,
        names: &[String],
    ) -> CycleResult<GroupMembership> {
        let kind = group.kind();
        let names = unique_names(names);
        let seen: Mutex<BTreeSet<InstanceId>> = Mutex::new(BTreeSet::new());

        let querier: &dyn BalancerGroup = group.as_ref();
        let seen_ref = &seen;
        let queries = names.iter().map(move |name| {
            let (group, seen) = (querier, seen_ref);
            async move {
                let Some(balancer_id) = group.resolve(name).await? else {
                    debug!(%kind, balancer = %name, "balancer not found, skipping");
                    return Ok(None);
                };

                let mut members = group.healthy_members(&balancer_id).await?;
                dedup_in_order(&mut members);
                {
                    let mut seen = seen.lock().unwrap_or_else(|p| p.into_inner());
                    seen.extend(members.iter().cloned());
                }

                debug!(
                    %kind,
                    balancer = %name,
                    id = %balancer_id,
                    healthy = members.len(),
                    "balancer resolved"
                );
                CycleResult::Ok(Some(BalancerMembership {
                    name: name.clone(),
                    balancer_id,
                    members,
                }))
            }
        });

        let balancers: Vec<BalancerMembership> =
            try_join_all(queries).await?.into_iter().flatten().collect();
        let instances: Vec<InstanceId> = seen
            .into_inner()
            .unwrap_or_else(|p| p.into_inner())
            .into_iter()
            .collect();

        info!(
            %kind,
            balancers = balancers.len(),
            instances = instances.len(),
            "membership resolved"
        );

        Ok(GroupMembership {
            group,
            balancers,
            instances,
        })
    }
}

/// A balancer an instance is a member of.
#[derive(Clone, Copy)]
pub struct MembershipRef<'a> {
    pub group: &'a dyn BalancerGroup,
    pub balancer: &'a BalancerMembership,
}

impl fmt::Debug for MembershipRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group.kind(), self.balancer.balancer_id)
    }
}

/// Resolved membership for a whole run. Read-only once built.
#[derive(Debug)]
pub struct FleetMembership {
    pub groups: Vec<GroupMembership>,
    /// Union of every kind's healthy instances, first seen wins.
    pub instances: Vec<InstanceId>,
}

impl FleetMembership {
    /// Resolve every balancer kind concurrently and merge their instance sets.
    pub async fn resolve(
        groups: Vec<Arc<dyn BalancerGroup>>,
        names: &[String],
    ) -> CycleResult<FleetMembership> {
        let groups = try_join_all(
            groups
                .into_iter()
                .map(|group| GroupMembership::resolve(group, names)),
        )
        .await?;

        let fleet = FleetMembership::from_groups(groups);
        if fleet.instances.is_empty() {
            warn!("no healthy instances found behind the configured balancers");
        }
        Ok(fleet)
    }

    /// Merge per-kind results. Group order decides which kind "sees" an
    /// instance first; the per-balancer lists are kept untouched.
    pub fn from_groups(groups: Vec<GroupMembership>) -> FleetMembership {
        let mut seen = HashSet::new();
        let mut instances = Vec::new();
        for group in &groups {
            for instance in &group.instances {
                if seen.insert(instance.clone()) {
                    instances.push(instance.clone());
                }
            }
        }
        FleetMembership { groups, instances }
    }

    /// Every balancer, of any kind, that reported `instance` healthy.
    pub fn memberships_of(&self, instance: &InstanceId) -> Vec<MembershipRef<'_>> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.balancers
                    .iter()
                    .filter(move |b| b.contains(instance))
                    .map(move |b| MembershipRef {
                        group: g.group.as_ref(),
                        balancer: b,
                    })
            })
            .collect()
    }

    /// Serializable view of what a run would do.
    pub fn plan(&self) -> FleetPlan {
        let instances = self
            .instances
            .iter()
            .map(|instance| PlannedInstance {
                instance: instance.clone(),
                balancers: self
                    .memberships_of(instance)
                    .into_iter()
                    .map(|m| PlannedBalancer {
                        kind: m.group.kind(),
                        name: m.balancer.name.clone(),
                        balancer_id: m.balancer.balancer_id.clone(),
                    })
                    .collect(),
            })
            .collect();
        FleetPlan { instances }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetPlan {
    pub instances: Vec<PlannedInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedInstance {
    pub instance: InstanceId,
    pub balancers: Vec<PlannedBalancer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedBalancer {
    pub kind: BalancerKind,
    pub name: String,
    pub balancer_id: String,
}

fn unique_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|n| seen.insert(n.as_str()))
        .cloned()
        .collect()
}

fn dedup_in_order(members: &mut Vec<InstanceId>) {
    let mut seen = HashSet::new();
    members.retain(|m| seen.insert(m.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use fleetcycle_core::ProviderError;
    use fleetcycle_core::fake::FakeCloud;

    use crate::group::{ClassicGroup, TargetGroups};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn groups(cloud: &FakeCloud) -> Vec<Arc<dyn BalancerGroup>> {
        let classic: Arc<dyn BalancerGroup> =
            Arc::new(ClassicGroup::new(Arc::new(cloud.clone()), TIMEOUT));
        let target_groups: Arc<dyn BalancerGroup> =
            Arc::new(TargetGroups::new(Arc::new(cloud.clone()), TIMEOUT));
        vec![classic, target_groups]
    }

    #[tokio::test]
    async fn missing_names_are_skipped() {
        let cloud = FakeCloud::new().with_classic("web", &[("i-1", "InService")]);
        let fleet = FleetMembership::resolve(groups(&cloud), &names(&["web", "ghost"]))
            .await
            .unwrap();

        assert_eq!(fleet.instances, vec![InstanceId::from("i-1")]);
        assert_eq!(fleet.groups[0].balancers.len(), 1);
        assert!(fleet.groups[1].balancers.is_empty());
    }

    #[tokio::test]
    async fn same_kind_duplicates_recorded_once() {
        let cloud = FakeCloud::new()
            .with_classic("a", &[("i-1", "InService"), ("i-2", "InService")])
            .with_classic("b", &[("i-2", "InService"), ("i-3", "OutOfService")]);
        let classic: Arc<dyn BalancerGroup> =
            Arc::new(ClassicGroup::new(Arc::new(cloud), TIMEOUT));

        let group = GroupMembership::resolve(classic, &names(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(
            group.instances,
            vec![InstanceId::from("i-1"), InstanceId::from("i-2")]
        );
        // Each balancer keeps its own entry for the shared instance.
        assert!(group.balancers[0].contains(&InstanceId::from("i-2")));
        assert!(group.balancers[1].contains(&InstanceId::from("i-2")));
        assert!(!group.balancers[1].contains(&InstanceId::from("i-3")));
    }

    #[tokio::test]
    async fn cross_kind_instance_merged_once_with_two_memberships() {
        let cloud = FakeCloud::new()
            .with_classic("clb-a", &[("i-1", "InService")])
            .with_target_group("alb-b", "tg-b", &[("i-1", "healthy")]);
        let fleet = FleetMembership::resolve(groups(&cloud), &names(&["clb-a", "alb-b"]))
            .await
            .unwrap();

        assert_eq!(fleet.instances, vec![InstanceId::from("i-1")]);
        let memberships = fleet.memberships_of(&InstanceId::from("i-1"));
        assert_eq!(memberships.len(), 2);
        assert_eq!(memberships[0].group.kind(), BalancerKind::Classic);
        assert_eq!(memberships[0].balancer.balancer_id, "clb-a");
        assert_eq!(memberships[1].group.kind(), BalancerKind::TargetGroup);
        assert_eq!(memberships[1].balancer.balancer_id, "tg-b");
    }

    #[tokio::test]
    async fn non_not_found_error_aborts_resolution() {
        let cloud = FakeCloud::new()
            .with_classic("web", &[("i-1", "InService")])
            .fail_on("clb.health web", ProviderError::Api("throttled".into()));
        let err = FleetMembership::resolve(groups(&cloud), &names(&["web"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("throttled"));
    }

    #[tokio::test]
    async fn resolution_is_idempotent() {
        let cloud = FakeCloud::new()
            .with_classic("a", &[("i-3", "InService"), ("i-1", "InService")])
            .with_classic("b", &[("i-2", "InService")])
            .with_target_group("c", "tg-c", &[("i-2", "healthy"), ("i-4", "healthy")]);
        let list = names(&["a", "b", "c"]);

        let first = FleetMembership::resolve(groups(&cloud), &list).await.unwrap();
        let second = FleetMembership::resolve(groups(&cloud), &list).await.unwrap();

        assert_eq!(first.instances, second.instances);
        assert_eq!(first.plan(), second.plan());
        for (a, b) in first.groups.iter().zip(&second.groups) {
            assert_eq!(a.balancers, b.balancers);
        }
    }

    #[tokio::test]
    async fn duplicate_configured_names_queried_once() {
        let cloud = FakeCloud::new().with_classic("web", &[("i-1", "InService")]);
        let classic: Arc<dyn BalancerGroup> =
            Arc::new(ClassicGroup::new(Arc::new(cloud.clone()), TIMEOUT));

        let group = GroupMembership::resolve(classic, &names(&["web", "web"]))
            .await
            .unwrap();
        assert_eq!(group.balancers.len(), 1);
        assert_eq!(cloud.calls_matching("clb.health").len(), 1);
    }

    #[tokio::test]
    async fn plan_serializes_memberships() {
        let cloud = FakeCloud::new()
            .with_classic("clb-a", &[("i-1", "InService")])
            .with_target_group("alb-b", "tg-b", &[("i-1", "healthy"), ("i-2", "healthy")]);
        let fleet = FleetMembership::resolve(groups(&cloud), &names(&["clb-a", "alb-b"]))
            .await
            .unwrap();

        let json = serde_json::to_value(fleet.plan()).unwrap();
        assert_eq!(json["instances"][0]["instance"], "i-1");
        assert_eq!(json["instances"][0]["balancers"][0]["kind"], "classic");
        assert_eq!(json["instances"][0]["balancers"][1]["kind"], "target-group");
        assert_eq!(json["instances"][1]["balancers"].as_array().unwrap().len(), 1);
    }
}
