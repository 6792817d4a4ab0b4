use std::rc::Rc;

use dslab_tracesim::core::trace::scaling::helpers::default_scaling_policy;
use dslab_tracesim::core::trace::sim_trace_workload::SimTraceWorkload;
use dslab_tracesim::core::trace::workload::TraceWorkload;
use dslab_tracesim::simulation_callbacks::RunUntilAllWorkloadsAreFinishedCallbacks;
use dslab_tracesim::simulator::TraceSimulation;
use dslab_tracesim::test_util::helpers::{
    default_test_simulation_config, example_fragments, init_logger,
};

fn example_workload() -> Box<TraceWorkload> {
    Box::new(TraceWorkload::from_fragments(example_fragments()).unwrap())
}

fn checkpointed_workload() -> Box<TraceWorkload> {
    let mut builder = TraceWorkload::builder_with(2000, 500, 2.0, default_scaling_policy());
    for fragment in example_fragments() {
        builder.add(fragment.duration, fragment.cpu_usage, fragment.core_count);
    }
    Box::new(builder.build().unwrap())
}

#[test]
fn test_hosts_are_created_from_config() {
    let sim = TraceSimulation::new(Rc::new(default_test_simulation_config(Some(
        r#"
    - machine_count: 3
      machine_template:
        name: small
        core_count: 2
        cpu_capacity: 2.0
    "#,
    ))));

    assert_eq!(4, sim.hosts.len());
    assert_eq!(8.0, sim.host("host_0").borrow().machine().cpu_capacity);
    assert_eq!(2, sim.host("small_2").borrow().machine().core_count);
}

#[test]
fn test_single_workload_runs_until_trace_end() {
    init_logger();
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    sim.submit_workload("host_0", example_workload(), 0.0);

    sim.run_until_no_events();

    let metrics = sim.metrics_collector.borrow();
    assert_eq!(1, metrics.workloads_finished);
    assert_eq!(5000.0, metrics.workload_makespan_stats.mean());
    assert_eq!(0, metrics.checkpoints);
    assert_eq!(4.0, metrics.host_demand_stats.max());
    assert_eq!(0.0, metrics.host_demand_stats.min());
    assert_eq!(0.0, metrics.overcommitted_demand_stats.max());
    assert_eq!(5000.0, sim.sim.time());
    assert_eq!(0, sim.host("host_0").borrow().running_workload_count());
}

#[test]
fn test_checkpoint_truncates_running_workload() {
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    let workload_id = sim.submit_workload("host_0", checkpointed_workload(), 0.0);

    sim.step_for_duration(2200.0);

    {
        let host = sim.host("host_0");
        let host = host.borrow();
        let running = host
            .get_running_workload(workload_id)
            .unwrap()
            .downcast_ref::<SimTraceWorkload>()
            .unwrap();
        assert!(running.is_paused());
        assert_eq!(2, running.workload().fragments().len());
        // aggregates still describe the whole trace
        assert_eq!(4.0, running.workload().max_cpu_demand());
        assert_eq!(0.0, host.total_demand());
    }

    sim.run_until_no_events();

    let metrics = sim.metrics_collector.borrow();
    assert_eq!(1, metrics.checkpoints);
    assert_eq!(1, metrics.workloads_finished);
    assert_eq!(5500.0, metrics.workload_makespan_stats.mean());
}

#[test]
fn test_failure_restores_workload_from_last_checkpoint() {
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    sim.submit_workload("host_0", checkpointed_workload(), 0.0);
    sim.fail_host("host_0", 4000.0, 1000.0);

    sim.run_until_no_events();

    let metrics = sim.metrics_collector.borrow();
    assert_eq!(1, metrics.host_failures);
    assert_eq!(1, metrics.workload_restarts);
    assert_eq!(1, metrics.checkpoints);
    assert_eq!(1, metrics.workloads_finished);
    // recovered at 5000, restarted at 5100 from trace time 2000
    assert_eq!(8100.0, metrics.workload_makespan_stats.mean());
    assert!(!sim.host("host_0").borrow().is_failed());
}

#[test]
fn test_failure_without_checkpoint_restarts_from_beginning() {
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    sim.submit_workload("host_0", example_workload(), 0.0);
    sim.fail_host("host_0", 2000.0, 500.0);

    sim.run_until_no_events();

    let metrics = sim.metrics_collector.borrow();
    assert_eq!(1, metrics.workload_restarts);
    assert_eq!(7600.0, metrics.workload_makespan_stats.mean());
}

#[test]
fn test_failure_during_checkpoint_write_restores_previous_snapshot() {
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    sim.submit_workload("host_0", checkpointed_workload(), 0.0);
    // checkpoint write lasts from 2000 to 2500
    sim.fail_host("host_0", 2200.0, 100.0);

    sim.run_until_no_events();

    let metrics = sim.metrics_collector.borrow();
    assert_eq!(1, metrics.workload_restarts);
    assert_eq!(1, metrics.checkpoints);
    // restarted at 2400 from the beginning, checkpoint written again from 4400 to 4900
    assert_eq!(7900.0, metrics.workload_makespan_stats.mean());
    assert!(metrics.workload_makespan_stats.mean() > 5500.0);
}

#[test]
fn test_overlapping_failures_extend_downtime() {
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    sim.submit_workload("host_0", example_workload(), 0.0);
    sim.fail_host("host_0", 1000.0, 1000.0);
    sim.fail_host("host_0", 1500.0, 1000.0);
    // ends before the current downtime
    sim.fail_host("host_0", 1600.0, 100.0);

    sim.step_for_duration(2200.0);
    assert!(sim.host("host_0").borrow().is_failed());

    sim.run_until_no_events();

    let metrics = sim.metrics_collector.borrow();
    assert_eq!(3, metrics.host_failures);
    assert_eq!(1, metrics.workload_restarts);
    // recovered at 2500, restarted at 2600 from the beginning
    assert_eq!(7600.0, metrics.workload_makespan_stats.mean());
}

#[test]
#[should_panic(expected = "scheduled to the past")]
fn test_failure_in_the_past_panics() {
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    sim.submit_workload("host_0", example_workload(), 0.0);
    sim.step_for_duration(1500.0);
    sim.fail_host("host_0", 500.0, 100.0);
}

#[test]
fn test_workload_submitted_to_failed_host_waits_for_recovery() {
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    sim.fail_host("host_0", 0.0, 1000.0);
    sim.submit_workload("host_0", example_workload(), 100.0);

    sim.run_until_no_events();

    let metrics = sim.metrics_collector.borrow();
    assert_eq!(0, metrics.workload_restarts);
    assert_eq!(1, metrics.workloads_finished);
    assert_eq!(5900.0, metrics.workload_makespan_stats.mean());
}

#[test]
fn test_overcommitted_host_does_not_delay_workloads() {
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    for _ in 0..2 {
        let mut builder = TraceWorkload::builder();
        builder.add(1000, 6.0, 4);
        sim.submit_workload("host_0", Box::new(builder.build().unwrap()), 0.0);
    }

    sim.run_until_no_events();

    let metrics = sim.metrics_collector.borrow();
    assert_eq!(2, metrics.workloads_finished);
    assert_eq!(12.0, metrics.host_demand_stats.max());
    assert_eq!(4.0, metrics.overcommitted_demand_stats.max());
    assert_eq!(0.0, metrics.overcommitted_demand_stats.min());
    assert_eq!(1000.0, metrics.workload_makespan_stats.max());
}

#[test]
fn test_run_with_callbacks_prints_metrics() {
    let output_file = std::env::temp_dir().join("dslab_tracesim_test_metrics.json");
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(Some(&format!(
        r#"
    metrics_printer:
      format: JSON
      output_file: {}
    "#,
        output_file.display()
    )))));
    sim.submit_workload("host_0", checkpointed_workload(), 0.0);
    sim.submit_workload("host_0", example_workload(), 1000.0);

    sim.run_with_callbacks(Box::new(RunUntilAllWorkloadsAreFinishedCallbacks {}));

    let printed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_file).unwrap()).unwrap();
    assert_eq!(2, printed["counters"]["workloads_submitted"]);
    assert_eq!(2, printed["counters"]["workloads_finished"]);
    assert_eq!(1, printed["counters"]["checkpoints"]);
    assert_eq!(5500.0, printed["timings"]["workload_makespan"]["max"]);
    assert_eq!(0.0, printed["timings"]["overcommitted_demand"]["max"]);
}

#[test]
#[should_panic(expected = "Unknown host")]
fn test_submit_to_unknown_host_panics() {
    let mut sim = TraceSimulation::new(Rc::new(default_test_simulation_config(None)));
    sim.submit_workload("missing", example_workload(), 0.0);
}
