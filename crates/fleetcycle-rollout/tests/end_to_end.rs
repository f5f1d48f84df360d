//! Full runs against the scripted in-memory cloud.
//!
//! Covers the ordering guarantees of a run:
//! - drain completes on every balancer before the action starts
//! - restore starts only after the action returns
//! - instances never overlap
//! - the first failure stops the run, the deadline bounds it

use std::time::Duration;

use fleetcycle_core::fake::FakeCloud;
use fleetcycle_core::{
    CycleError, CyclePhase, InstanceId, MaintenanceOutcome, ProviderError, RunConfig,
};
use fleetcycle_rollout::{Providers, Stage, plan, run_maintenance};

fn config(extra: &str) -> RunConfig {
    timed_config("0s", "0s", extra)
}

fn timed_config(cool_down: &str, stabilization: &str, extra: &str) -> RunConfig {
    let toml_str = format!(
        r#"
region = "eu-west-1"
balancers = ["clb-a", "alb-b"]

[timing]
cool_down = "{cool_down}"
stabilization = "{stabilization}"
poll_interval = "1ms"
{extra}
"#
    );
    toml::from_str(&toml_str).unwrap()
}

fn two_kinds() -> FakeCloud {
    FakeCloud::new()
        .with_classic("clb-a", &[("i-1", "InService"), ("i-2", "InService")])
        .with_target_group("alb-b", "tg-b", &[("i-1", "healthy"), ("i-2", "healthy")])
}

fn position(calls: &[String], line: &str) -> usize {
    calls
        .iter()
        .position(|c| c == line)
        .unwrap_or_else(|| panic!("call {line:?} not made; calls: {calls:#?}"))
}

fn last_position(calls: &[String], prefix: &str) -> usize {
    calls
        .iter()
        .rposition(|c| c.starts_with(prefix))
        .unwrap_or_else(|| panic!("no call starting with {prefix:?}"))
}

// ── Reboot across both balancer kinds ──────────────────────────────

#[tokio::test]
async fn reboot_cycles_each_instance_through_both_kinds() {
    let cloud = two_kinds();
    let report = run_maintenance(&config(""), &Providers::uniform(cloud.clone()))
        .await
        .unwrap();

    assert_eq!(
        report.instances(),
        vec![InstanceId::from("i-1"), InstanceId::from("i-2")]
    );
    assert!(report.records.iter().all(|r| r.outcome.is_success()));
    assert!(report.records.iter().all(|r| r.balancers == 2));

    let calls = cloud.calls();
    for id in ["i-1", "i-2"] {
        let drained_classic = position(&calls, &format!("clb.wait_deregistered clb-a {id}"));
        let drained_target = position(&calls, &format!("tg.wait_deregistered tg-b {id}"));
        let stop = position(&calls, &format!("ec2.stop {id}"));
        let wait_stopped = position(&calls, &format!("ec2.wait_stopped {id}"));
        let start = position(&calls, &format!("ec2.start {id}"));
        let status_ok = position(&calls, &format!("ec2.wait_status_ok {id}"));
        let register_classic = position(&calls, &format!("clb.register clb-a {id}"));
        let register_target = position(&calls, &format!("tg.register tg-b {id}"));

        assert!(drained_classic < stop && drained_target < stop);
        assert!(stop < wait_stopped && wait_stopped < start && start < status_ok);
        assert!(status_ok < register_classic && status_ok < register_target);
    }

    assert_eq!(cloud.classic_state("clb-a", "i-1").as_deref(), Some("InService"));
    assert_eq!(cloud.target_state("tg-b", "i-2").as_deref(), Some("healthy"));
}

#[tokio::test]
async fn instances_never_overlap() {
    let cloud = two_kinds();
    run_maintenance(&config(""), &Providers::uniform(cloud.clone()))
        .await
        .unwrap();

    let calls = cloud.calls();
    let first_done = position(&calls, "clb.wait_in_service clb-a i-1")
        .max(position(&calls, "tg.wait_in_service tg-b i-1"));
    let second_begins = position(&calls, "clb.deregister clb-a i-2")
        .min(position(&calls, "tg.deregister tg-b i-2"));
    assert!(first_done < second_begins);
}

#[tokio::test]
async fn missing_balancer_name_is_skipped() {
    let cloud = FakeCloud::new().with_target_group("alb-b", "tg-b", &[("i-1", "healthy")]);
    let report = run_maintenance(&config(""), &Providers::uniform(cloud.clone()))
        .await
        .unwrap();

    assert_eq!(report.instances(), vec![InstanceId::from("i-1")]);
    assert_eq!(cloud.calls_matching("tg.deregister"), vec!["tg.deregister tg-b i-1"]);
    assert_eq!(cloud.calls_matching("tg.register"), vec!["tg.register tg-b i-1"]);
    assert!(cloud.calls_matching("clb.deregister").is_empty());
}

#[tokio::test]
async fn no_healthy_instances_is_an_empty_success() {
    let cloud = FakeCloud::new()
        .with_classic("clb-a", &[("i-1", "OutOfService")])
        .with_target_group("alb-b", "tg-b", &[("i-1", "unhealthy")]);
    let report = run_maintenance(&config(""), &Providers::uniform(cloud.clone()))
        .await
        .unwrap();

    assert!(report.records.is_empty());
    assert!(cloud.calls_matching("ec2.").is_empty());
}

// ── Fail-fast ──────────────────────────────────────────────────────

#[tokio::test]
async fn first_failure_stops_the_run() {
    let cloud = two_kinds().fail_on("ec2.start i-1", ProviderError::Api("insufficient capacity".into()));
    let failure = run_maintenance(&config(""), &Providers::uniform(cloud.clone()))
        .await
        .unwrap_err();

    assert_eq!(
        failure.stage(),
        &Stage::Cycling {
            instance: "i-1".into(),
            phase: CyclePhase::Acting,
        }
    );
    assert!(failure.to_string().contains("start instance failed for i-1"));
    assert!(failure.completed().is_empty());
    assert_eq!(failure.progress.records.len(), 1);
    assert!(!failure.progress.records[0].outcome.is_success());

    // i-1 stays drained, i-2 is never touched.
    assert!(cloud.calls_matching("clb.register").is_empty());
    assert!(cloud.calls_matching("tg.register").is_empty());
    assert!(cloud.calls().iter().all(|c| !c.ends_with("i-2")));
}

#[tokio::test]
async fn failure_on_second_instance_keeps_first_completed() {
    let cloud = two_kinds().fail_on(
        "tg.wait_deregistered tg-b i-2",
        ProviderError::Api("max attempts exceeded".into()),
    );
    let failure = run_maintenance(&config(""), &Providers::uniform(cloud.clone()))
        .await
        .unwrap_err();

    assert_eq!(failure.completed(), vec![InstanceId::from("i-1")]);
    assert_eq!(
        failure.stage(),
        &Stage::Cycling {
            instance: "i-2".into(),
            phase: CyclePhase::Draining,
        }
    );
    assert!(cloud.calls_matching("ec2.stop i-2").is_empty());
}

// ── Deadline ───────────────────────────────────────────────────────

#[tokio::test]
async fn deadline_abandons_the_in_flight_step() {
    let cloud = two_kinds().hang_on("ec2.wait_stopped i-1");
    let failure = run_maintenance(
        &config("run_timeout = \"50ms\""),
        &Providers::uniform(cloud.clone()),
    )
    .await
    .unwrap_err();

    assert!(matches!(failure.source, CycleError::DeadlineExceeded { .. }));
    assert_eq!(
        failure.stage(),
        &Stage::Cycling {
            instance: "i-1".into(),
            phase: CyclePhase::Acting,
        }
    );
    assert!(cloud.calls_matching("ec2.start").is_empty());
    assert!(cloud.calls_matching("clb.register").is_empty());

    assert_eq!(failure.progress.records.len(), 1);
    let record = &failure.progress.records[0];
    assert_eq!(record.instance, InstanceId::from("i-1"));
    assert_eq!(record.balancers, 2);
    assert!(!record.outcome.is_success());
    assert!(matches!(
        &record.outcome,
        MaintenanceOutcome::Failed { reason } if reason.contains("deadline")
    ));
}

#[tokio::test]
async fn deadline_covers_membership_resolution() {
    let cloud = two_kinds().hang_on("clb.health clb-a");
    let failure = run_maintenance(
        &config("run_timeout = \"50ms\""),
        &Providers::uniform(cloud.clone()),
    )
    .await
    .unwrap_err();

    assert!(matches!(failure.source, CycleError::DeadlineExceeded { .. }));
    assert_eq!(failure.stage(), &Stage::Resolving);
    assert!(cloud.calls_matching("clb.deregister").is_empty());
    assert!(failure.progress.records.is_empty());
}

// ── Timed holds ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn next_instance_waits_out_stabilization() {
    let cloud = two_kinds();
    let config = timed_config("0s", "30s", "");
    let providers = Providers::uniform(cloud.clone());

    let watch = async {
        tokio::time::sleep(Duration::from_secs(29)).await;
        let before = cloud.calls_matching("clb.deregister clb-a i-2");
        let registered = cloud.calls_matching("clb.register clb-a i-1");
        tokio::time::sleep(Duration::from_secs(2)).await;
        let after = cloud.calls_matching("clb.deregister clb-a i-2");
        (before, registered, after)
    };
    let (result, (before, registered, after)) =
        tokio::join!(run_maintenance(&config, &providers), watch);

    assert!(result.is_ok());
    assert_eq!(registered, vec!["clb.register clb-a i-1"]);
    assert!(before.is_empty());
    assert_eq!(after, vec!["clb.deregister clb-a i-2"]);
}

#[tokio::test(start_paused = true)]
async fn remote_command_restore_waits_out_cool_down() {
    let cloud = FakeCloud::new()
        .with_classic("clb-a", &[("i-1", "InService")])
        .with_agent("i-1", "Online")
        .with_command_script("i-1", &["InProgress", "Success"]);
    let config = timed_config("20s", "0s", REMOTE);
    let providers = Providers::uniform(cloud.clone());

    let watch = async {
        tokio::time::sleep(Duration::from_secs(19)).await;
        let before = cloud.calls_matching("clb.register");
        let polls = cloud.calls_matching("ssm.status").len();
        tokio::time::sleep(Duration::from_secs(2)).await;
        let after = cloud.calls_matching("clb.register");
        (before, polls, after)
    };
    let (result, (before, polls, after)) =
        tokio::join!(run_maintenance(&config, &providers), watch);

    assert!(result.is_ok());
    assert_eq!(polls, 2);
    assert!(before.is_empty());
    assert_eq!(after, vec!["clb.register clb-a i-1"]);
}

// ── Remote command ─────────────────────────────────────────────────

const REMOTE: &str = r#"
[maintenance]
mode = "remote-command"
command = "yum -y update"
"#;

#[tokio::test]
async fn remote_command_runs_between_drain_and_restore() {
    let cloud = FakeCloud::new()
        .with_classic("clb-a", &[("i-1", "InService")])
        .with_agent("i-1", "Online")
        .with_command_script("i-1", &["Pending", "InProgress", "Success"]);
    let report = run_maintenance(&config(REMOTE), &Providers::uniform(cloud.clone()))
        .await
        .unwrap();

    assert_eq!(report.instances(), vec![InstanceId::from("i-1")]);
    assert_eq!(
        cloud.calls_matching("ssm.send"),
        vec!["ssm.send AWS-RunShellScript i-1 600"]
    );
    assert_eq!(cloud.calls_matching("ssm.status cmd-1 i-1").len(), 3);

    let calls = cloud.calls();
    assert!(position(&calls, "clb.wait_deregistered clb-a i-1") < position(&calls, "ssm.describe i-1"));
    assert!(last_position(&calls, "ssm.status") < position(&calls, "clb.register clb-a i-1"));
    assert!(cloud.calls_matching("ec2.").is_empty());
}

#[tokio::test]
async fn offline_agent_fails_without_dispatch() {
    let cloud = FakeCloud::new()
        .with_classic("clb-a", &[("i-1", "InService")])
        .with_agent("i-1", "ConnectionLost");
    let failure = run_maintenance(&config(REMOTE), &Providers::uniform(cloud.clone()))
        .await
        .unwrap_err();

    assert!(matches!(failure.source, CycleError::AgentOffline { .. }));
    assert!(cloud.calls_matching("ssm.send").is_empty());
    assert!(cloud.calls_matching("clb.register").is_empty());
}

#[tokio::test]
async fn failed_command_stops_the_run() {
    let cloud = FakeCloud::new()
        .with_classic("clb-a", &[("i-1", "InService")])
        .with_agent("i-1", "Online")
        .with_command_script("i-1", &["InProgress", "Failed"]);
    let failure = run_maintenance(&config(REMOTE), &Providers::uniform(cloud.clone()))
        .await
        .unwrap_err();

    assert!(matches!(failure.source, CycleError::CommandFailed { .. }));
    assert_eq!(cloud.calls_matching("ssm.status").len(), 2);
}

// ── Validation and planning ────────────────────────────────────────

#[tokio::test]
async fn invalid_config_fails_before_any_call() {
    let cloud = two_kinds();
    let failure = run_maintenance(
        &config("api_timeout = \"soon\""),
        &Providers::uniform(cloud.clone()),
    )
    .await
    .unwrap_err();

    assert_eq!(failure.stage(), &Stage::Validating);
    assert!(matches!(failure.source, CycleError::Config(_)));
    assert!(cloud.calls().is_empty());
}

#[tokio::test]
async fn plan_resolves_without_side_effects() {
    let cloud = two_kinds();
    let plan = plan(&config(""), &Providers::uniform(cloud.clone()))
        .await
        .unwrap();

    assert_eq!(plan.instances.len(), 2);
    assert_eq!(plan.instances[0].balancers.len(), 2);
    assert!(cloud.calls().iter().all(|c| {
        c.starts_with("clb.describe")
            || c.starts_with("clb.health")
            || c.starts_with("tg.resolve")
            || c.starts_with("tg.health")
    }));
}
