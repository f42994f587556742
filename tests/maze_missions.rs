//! End-to-end missions on the simulated maze
//!
//! Each test runs calibration, exploration and replay against the mock
//! device with a fixed seed, so the recorded routes are reproducible.

use marga::control::Robot;
use marga::core::driver::RobotDriver;
use marga::devices::mock::maze::NodeKind;
use marga::devices::mock::{MockDriver, SimulationProbe};
use marga::navigation::{Explorer, Navigator, Replayer};
use marga::streaming::{DiagnosticEvent, Diagnostics};
use marga::{Error, MargaConfig, Mission, Route};

fn sim_config(maze: &str) -> MargaConfig {
    let mut config = MargaConfig::default();
    config.device.simulation.maze_file = Some(maze.to_string());
    config.device.simulation.random_seed = 7;
    config.device.simulation.time_limit_s = 300.0;
    config
}

fn sim_robot(config: &MargaConfig) -> (Robot, SimulationProbe) {
    let (mut driver, line) = MockDriver::new(config).unwrap();
    driver.initialize().unwrap();
    let probe = driver.probe();
    (Robot::new(Box::new(driver), Box::new(line)), probe)
}

/// The follower stops as soon as the bar centre is on the finish pad, so
/// measure the bar rather than the axle, which trails it by the bar offset.
fn assert_at_finish(probe: &SimulationProbe, config: &MargaConfig) {
    let sim = &config.device.simulation;
    let (node, _) = probe.nearest_node().unwrap();
    assert_eq!(node.kind, NodeKind::Finish);

    let bar = probe.pose().transform(sim.chassis.sensor_offset_mm, 0.0);
    let distance = bar.distance(probe.maze().finish());
    assert!(
        distance < sim.line.finish_pad_radius_mm + 2.0,
        "bar stopped {:.1} mm from the finish",
        distance
    );

    let elapsed_us = probe.sim_time_us();
    assert!(elapsed_us > 0 && elapsed_us < (sim.time_limit_s * 1e6) as u64);
}

#[test]
fn test_tee_maze_mission() {
    let config = sim_config("mazes/tee.txt");
    let (mut robot, probe) = sim_robot(&config);
    let (diagnostics, receiver) = Diagnostics::channel();

    let report = Mission::new(config.clone(), diagnostics).run(&mut robot).unwrap();
    assert_eq!(report.attempts.len(), 1);
    let attempt = &report.attempts[0];
    assert_eq!(attempt.raw.to_string(), "LTLTLF");
    assert_eq!(attempt.optimized.to_string(), "RF");
    assert_at_finish(&probe, &config);
    assert_eq!(probe.beeps(), 2);

    let routes: Vec<String> = receiver
        .try_iter()
        .filter_map(|event| match event {
            DiagnosticEvent::RawRoute(r) | DiagnosticEvent::OptimizedRoute(r) => Some(r.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(routes, vec!["LTLTLF", "RF"]);
}

#[test]
fn test_ladder_maze_mission() {
    let config = sim_config("mazes/ladder.txt");
    let (mut robot, probe) = sim_robot(&config);

    let report = Mission::new(config.clone(), Diagnostics::disabled()).run(&mut robot).unwrap();
    let attempt = &report.attempts[0];
    assert_eq!(attempt.raw.to_string(), "SLTSLF");
    assert_eq!(attempt.optimized.to_string(), "SRLF");
    assert!(attempt.replay.len() < attempt.exploration.len());
    assert_at_finish(&probe, &config);
}

#[test]
fn test_two_attempts_reuse_calibration() {
    let mut config = sim_config("mazes/tee.txt");
    config.mission.attempts = 2;
    let (mut robot, probe) = sim_robot(&config);

    let report = Mission::new(config.clone(), Diagnostics::disabled()).run(&mut robot).unwrap();
    assert_eq!(report.attempts.len(), 2);
    for attempt in &report.attempts {
        assert_eq!(attempt.optimized.to_string(), "RF");
    }
    assert_eq!(probe.beeps(), 4);
    assert_at_finish(&probe, &config);
}

#[test]
fn test_raw_route_replays_the_exploration() {
    let config = sim_config("mazes/tee.txt");
    let (mut robot, probe) = sim_robot(&config);
    let navigator = Navigator::new(&config, Diagnostics::disabled());

    robot.wait_for_button(config.drive.button_poll_ms).unwrap();
    marga::control::maneuver::calibrate(
        &mut robot,
        config.drive.calibration_speed,
        config.drive.calibration_spin_ms,
    )
    .unwrap();

    robot.wait_for_button(config.drive.button_poll_ms).unwrap();
    let exploration = Explorer::new(&navigator, config.route.max_nodes)
        .explore(&mut robot, config.drive.explore_speed)
        .unwrap();

    // Unoptimized, the route walks the same nodes again
    robot.wait_for_button(config.drive.button_poll_ms).unwrap();
    let replay = Replayer::new(&navigator)
        .replay(&mut robot, &exploration.route, config.drive.replay_speed)
        .unwrap();

    let explored: Vec<_> = exploration.visits.iter().map(|v| v.node).collect();
    let replayed: Vec<_> = replay.iter().map(|v| v.node).collect();
    assert_eq!(explored, replayed);
    assert_at_finish(&probe, &config);
}

#[test]
fn test_wrong_route_is_rejected_during_replay() {
    let config = sim_config("mazes/tee.txt");
    let (mut robot, _probe) = sim_robot(&config);
    let navigator = Navigator::new(&config, Diagnostics::disabled());

    robot.wait_for_button(config.drive.button_poll_ms).unwrap();
    marga::control::maneuver::calibrate(
        &mut robot,
        config.drive.calibration_speed,
        config.drive.calibration_spin_ms,
    )
    .unwrap();
    robot.wait_for_button(config.drive.button_poll_ms).unwrap();

    // Straight on at the junction ends at the stub, which only allows T
    let route: Route = "SF".parse().unwrap();
    let err = Replayer::new(&navigator)
        .replay(&mut robot, &route, config.drive.replay_speed)
        .unwrap_err();
    assert!(matches!(err, Error::RouteMismatch { .. }));
    robot.stop().unwrap();
}

#[test]
fn test_dead_sensor_fails_calibration() {
    let mut config = sim_config("mazes/tee.txt");
    config.sensors.timeout_ticks = 300;
    config.device.simulation.faulty_channels = vec![5];
    let (mut robot, probe) = sim_robot(&config);
    let (diagnostics, receiver) = Diagnostics::channel();

    let err = Mission::new(config, diagnostics).run(&mut robot).unwrap_err();
    assert!(matches!(err, Error::NotCalibrated));
    assert_eq!(probe.tracks(), (0, 0));
    assert_eq!(probe.beeps(), 0);

    let last = receiver.try_iter().last().unwrap();
    assert_eq!(last.render(), "Error: Sensors not calibrated: channel bounds have not separated\n");
}
