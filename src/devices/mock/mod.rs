//! Mock device driver for hardware-free maze runs
//!
//! Simulates the Zumo chassis on an ASCII maze so the complete mission
//! (calibration, exploration, optimization, replay) runs off hardware.
//!
//! # Overview
//!
//! | Component | Simulation Method |
//! |-----------|-------------------|
//! | Tracks | Differential-drive kinematics, speed proportional to percent |
//! | Reflectance bar | Distance from each sensor to the tape, soft edges, noise |
//! | RC discharge | Falling edges fed to [`Acquisition`] in tick order |
//! | Sensor fault | Channel never falls; the safety timeout ends the cycle |
//! | Button | Auto-confirm, or [`SimulationProbe::press_button`] |
//! | Buzzer | Logged |
//!
//! # Pacing
//!
//! The simulation thread is the acquisition producer and runs one RC cycle
//! per sample the control loop asks for:
//!
//! ```text
//! wait for demand
//!   ─▶ apply pending reset (operator carried robot to start)
//!   ─▶ integrate previous cycle's duration at current track speeds
//!   ─▶ begin cycle, feed falling edges (or timeout), publish
//! ```
//!
//! Track commands are stored before the control loop posts its next demand,
//! so every run with a fixed `random_seed` is exactly reproducible. Simulated
//! time runs as fast as the host allows; past `time_limit_s` the stream
//! closes and the control loop sees [`Error::SensorStreamClosed`].
//!
//! # Thread Model
//!
//! ```text
//! ┌─────────────────┐  commands (atomics)  ┌─────────────────┐
//! │  Control Loop   │─────────────────────▶│ Simulation Loop │
//! │   (Robot)       │◀─────────────────────│   (mock-sim)    │
//! └─────────────────┘  LineSample publish  └─────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: simulation parameters
//! - [`maze`]: ASCII maze parsing and tape geometry
//! - [`physics`]: differential-drive kinematics
//! - [`reflectance`]: sensor bar and discharge model

pub mod config;
pub mod maze;
pub mod physics;
pub mod reflectance;

use crate::config::{MargaConfig, SensorsConfig};
use crate::core::driver::RobotDriver;
use crate::core::types::{Command, LineSample, SENSOR_COUNT};
use crate::error::{Error, Result};
use crate::sensors::acquisition::{ticks_to_us, Acquisition, SensorControl};
use crate::sensors::{line_channel, LinePublisher, SensorLink};

use config::SimulationConfig;
use maze::{Maze, MazeNode};
use parking_lot::Mutex;
use physics::Pose;
use reflectance::ReflectanceModel;

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long the simulation thread waits for demand before rechecking shutdown
const DEMAND_POLL: Duration = Duration::from_millis(50);

/// Shared state for thread communication
struct SharedState {
    /// Signed track setpoints, percent
    left: AtomicI32,
    right: AtomicI32,
    shutdown: AtomicBool,
    /// Put the robot back on the start pose before the next cycle
    reset_requested: AtomicBool,
    /// Manual button press waiting to be read
    button: AtomicBool,
    beeps: AtomicU32,
    sim_time_us: AtomicU64,
    pose: Mutex<Pose>,
}

impl SharedState {
    fn new(start: Pose) -> Self {
        Self {
            left: AtomicI32::new(0),
            right: AtomicI32::new(0),
            shutdown: AtomicBool::new(false),
            reset_requested: AtomicBool::new(false),
            button: AtomicBool::new(false),
            beeps: AtomicU32::new(0),
            sim_time_us: AtomicU64::new(0),
            pose: Mutex::new(start),
        }
    }

    fn set_tracks(&self, left: i32, right: i32) {
        self.left.store(left, Ordering::Release);
        self.right.store(right, Ordering::Release);
    }
}

/// Read-only window into the running simulation, plus the operator button
#[derive(Clone)]
pub struct SimulationProbe {
    shared: Arc<SharedState>,
    maze: Arc<Maze>,
}

impl SimulationProbe {
    /// Axle pose after the most recent cycle
    pub fn pose(&self) -> Pose {
        *self.shared.pose.lock()
    }

    /// Maze node closest to the axle and its distance (mm)
    pub fn nearest_node(&self) -> Option<(MazeNode, f32)> {
        self.maze.nearest_node(self.pose().position())
    }

    /// Simulated time (µs)
    pub fn sim_time_us(&self) -> u64 {
        self.shared.sim_time_us.load(Ordering::Acquire)
    }

    /// Beeps sounded so far
    pub fn beeps(&self) -> u32 {
        self.shared.beeps.load(Ordering::Acquire)
    }

    /// Current track setpoints (percent, signed)
    pub fn tracks(&self) -> (i32, i32) {
        (
            self.shared.left.load(Ordering::Acquire),
            self.shared.right.load(Ordering::Acquire),
        )
    }

    /// Press the start button once (used when `auto_confirm` is off)
    pub fn press_button(&self) {
        self.shared.button.store(true, Ordering::Release);
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }
}

/// Mock device driver for simulating the robot on a maze
pub struct MockDriver {
    config: SimulationConfig,
    sensors: SensorsConfig,
    maze: Arc<Maze>,
    shared: Arc<SharedState>,
    control: Arc<SensorControl>,
    publisher: Option<LinePublisher>,
    simulation_handle: Option<JoinHandle<()>>,
}

impl MockDriver {
    /// Build the driver and the line source fed by its simulation thread.
    /// The simulation starts on [`RobotDriver::initialize`].
    pub fn new(config: &MargaConfig) -> Result<(Self, SensorLink)> {
        let sim = config.device.simulation.clone();
        let maze = match &sim.maze_file {
            Some(path) => Maze::load(path, sim.spacing_mm)?,
            None => Maze::builtin(sim.spacing_mm)?,
        };
        log::info!("Loaded maze: {}", maze);

        let control = Arc::new(SensorControl::new());
        let (publisher, subscriber) = line_channel();
        let link = SensorLink::new(subscriber, Arc::clone(&control));

        let driver = Self {
            shared: Arc::new(SharedState::new(maze.start())),
            maze: Arc::new(maze),
            config: sim,
            sensors: config.sensors.clone(),
            control,
            publisher: Some(publisher),
            simulation_handle: None,
        };
        Ok((driver, link))
    }

    pub fn probe(&self) -> SimulationProbe {
        SimulationProbe {
            shared: Arc::clone(&self.shared),
            maze: Arc::clone(&self.maze),
        }
    }

    fn shutdown_all(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.set_tracks(0, 0);
        // Never started: dropping the publisher closes the stream
        self.publisher.take();

        if let Some(handle) = self.simulation_handle.take() {
            if handle.join().is_err() {
                log::error!("Simulation thread panicked");
            }
        }
    }
}

impl RobotDriver for MockDriver {
    fn initialize(&mut self) -> Result<()> {
        log::info!("Initializing mock device driver");
        let publisher = self
            .publisher
            .take()
            .ok_or_else(|| Error::Other("Mock device already initialized".to_string()))?;

        let simulation = Simulation {
            acquisition: Acquisition::new(&self.sensors, Arc::clone(&self.control)),
            reflectance: ReflectanceModel::new(&self.config),
            maze: Arc::clone(&self.maze),
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
            charge_ticks: self.sensors.charge_ticks,
            timeout_ticks: self.sensors.timeout_ticks,
        };

        let handle = thread::Builder::new()
            .name("mock-sim".to_string())
            .spawn(move || simulation.run(publisher))
            .map_err(|e| Error::ThreadSpawn(format!("mock-sim: {}", e)))?;
        self.simulation_handle = Some(handle);

        log::info!("Mock device driver initialized");
        Ok(())
    }

    fn send_command(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Tracks { left, right } => {
                self.shared.set_tracks(left.signed() as i32, right.signed() as i32);
                log::trace!("Tracks: left={} right={}", left.signed(), right.signed());
            }
            Command::Stop => self.shared.set_tracks(0, 0),
            Command::Beep(pattern) => {
                self.shared.beeps.fetch_add(1, Ordering::AcqRel);
                log::info!("Beep ({:?})", pattern);
            }
            Command::Shutdown => {
                log::info!("Shutdown command received");
                self.shutdown_all();
            }
        }
        Ok(())
    }

    fn button_pressed(&mut self) -> bool {
        let pressed = self.config.auto_confirm || self.shared.button.swap(false, Ordering::AcqRel);
        if pressed {
            // Operator places the robot at the entrance before confirming
            self.shared.reset_requested.store(true, Ordering::Release);
        }
        pressed
    }
}

impl Drop for MockDriver {
    fn drop(&mut self) {
        self.shutdown_all();
    }
}

/// State owned by the simulation thread
struct Simulation {
    acquisition: Acquisition,
    reflectance: ReflectanceModel,
    maze: Arc<Maze>,
    shared: Arc<SharedState>,
    config: SimulationConfig,
    charge_ticks: u16,
    timeout_ticks: u16,
}

impl Simulation {
    /// Main simulation loop
    fn run(mut self, publisher: LinePublisher) {
        let limit_us = (self.config.time_limit_s as f64 * 1e6) as u64;
        let speed_scale = self.config.chassis.max_track_speed_mm_s / 100.0;
        let track_width = self.config.chassis.track_width_mm;
        let mut pose = self.maze.start();
        let mut now_us = 0u64;
        let mut pending_us = 0u64;

        log::info!("Simulation loop started at ({:.0}, {:.0})", pose.x, pose.y);

        while !self.shared.shutdown.load(Ordering::Acquire) {
            if !publisher.wait_for_demand(DEMAND_POLL) {
                continue;
            }

            if self.shared.reset_requested.swap(false, Ordering::AcqRel) {
                pose = self.maze.start();
                log::debug!("Robot placed at start");
            } else {
                let left = self.shared.left.load(Ordering::Acquire) as f32 * speed_scale;
                let right = self.shared.right.load(Ordering::Acquire) as f32 * speed_scale;
                pose = physics::step(pose, left, right, pending_us as f32 / 1e6, track_width);
            }
            now_us += pending_us;
            if now_us > limit_us {
                log::warn!("Simulation time limit of {} s reached", self.config.time_limit_s);
                break;
            }

            let (sample, cycle_ticks) = self.cycle(&pose, now_us);
            pending_us = ticks_to_us(cycle_ticks);
            *self.shared.pose.lock() = pose;
            self.shared.sim_time_us.store(now_us, Ordering::Release);
            if let Some(sample) = sample {
                publisher.publish(sample);
            }
        }

        log::info!("Simulation loop terminated at {:.1} s", now_us as f64 / 1e6);
    }

    /// One RC cycle: discharge edges in time order, timeout if any channel
    /// hangs. Returns the sample and the cycle length in ticks.
    fn cycle(&mut self, pose: &Pose, now_us: u64) -> (Option<LineSample>, u32) {
        let timeout = self.timeout_ticks;
        let ticks = self.reflectance.read(&self.maze, pose);
        let mut edges: Vec<(usize, u16)> = ticks
            .iter()
            .enumerate()
            .filter_map(|(ch, &t)| t.filter(|&t| t < timeout).map(|t| (ch, t)))
            .collect();
        edges.sort_by_key(|&(_, t)| t);

        self.acquisition.begin_cycle(now_us);
        let mut sample = None;
        for &(ch, t) in &edges {
            sample = self.acquisition.on_falling_edge(ch, t);
        }

        let discharge = if edges.len() < SENSOR_COUNT {
            sample = self.acquisition.on_timer_expired();
            timeout
        } else {
            edges.last().map_or(0, |&(_, t)| t)
        };
        (sample, self.charge_ticks as u32 + discharge as u32)
    }
}
