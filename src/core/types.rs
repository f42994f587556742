//! Core data types shared by the sensor pipeline, the control loop and devices.
//!
//! Key types:
//! - [`LineState`]: 6-bit snapshot of which sensors see the line
//! - [`NodeType`]: classification of an intersection
//! - [`Move`] / [`Reaction`]: what the robot does at a node
//! - [`Command`]: outbound commands to the motor/buzzer collaborators
//!
//! # Sensor bit order
//!
//! ```text
//!   sensor index:   0   1   2   3   4   5
//!   bit:            5   4   3   2   1   0
//!                  left ◀────────────▶ right
//! ```
//!
//! Sensor 0 (leftmost) is the most significant bit, so `0b001100` means the
//! line sits under the two centre sensors.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Number of reflectance channels on the sensor bar
pub const SENSOR_COUNT: usize = 6;

/// Binary line-position code, one bit per sensor (bit set = line seen)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineState(u8);

impl LineState {
    /// Nothing under any sensor
    pub const EMPTY: Self = Self(0x00);
    /// Line under the two centre sensors
    pub const CENTER: Self = Self(0x0C);
    /// Branch to the left plus the centre line
    pub const LEFT: Self = Self(0x3C);
    /// Branch to the right plus the centre line
    pub const RIGHT: Self = Self(0x0F);
    /// Line under every sensor
    pub const ALL: Self = Self(0x3F);
    /// Distinguished marker painted at the maze exit
    pub const FINISH: Self = Self(0x2D);

    const MASK: u8 = 0x3F;

    /// Create from raw bits; bits above the sixth are discarded.
    pub const fn new(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    /// Build a state from per-sensor flags, index 0 being the leftmost sensor.
    pub fn from_sensors(seen: [bool; SENSOR_COUNT]) -> Self {
        let mut bits = 0u8;
        for (i, seen) in seen.into_iter().enumerate() {
            if seen {
                bits |= Self::sensor_bit(i);
            }
        }
        Self(bits)
    }

    /// Bit used by the sensor at `index`
    #[inline]
    pub const fn sensor_bit(index: usize) -> u8 {
        1 << (SENSOR_COUNT - 1 - index)
    }

    /// Raw bits
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the sensor at `index` sees the line
    #[inline]
    pub fn sees(self, index: usize) -> bool {
        index < SENSOR_COUNT && self.0 & Self::sensor_bit(index) != 0
    }

    /// All bits of `mask` are set
    #[inline]
    pub fn contains(self, mask: LineState) -> bool {
        self.0 & mask.0 == mask.0
    }

    /// At least one bit of `mask` is set
    #[inline]
    pub fn intersects(self, mask: LineState) -> bool {
        self.0 & mask.0 != 0
    }

    /// Either centre sensor sees the line
    #[inline]
    pub fn touches_center(self) -> bool {
        self.intersects(Self::CENTER)
    }

    /// The follower must stop here: finish marker, full bar, left or right
    /// branch, or nothing at all.
    pub fn is_node(self) -> bool {
        matches!(
            self,
            Self::FINISH | Self::ALL | Self::LEFT | Self::RIGHT | Self::EMPTY
        )
    }

    /// Line centred under one or both middle sensors.
    pub fn is_centered(self) -> bool {
        matches!(self.0, 0x0C | 0x04 | 0x08)
    }
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..SENSOR_COUNT {
            f.write_str(if self.sees(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for LineState {
    type Err = Error;

    /// Parse six '0'/'1' characters, leftmost sensor first.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != SENSOR_COUNT {
            return Err(Error::Other(format!(
                "line state needs {} digits, got {:?}",
                SENSOR_COUNT, s
            )));
        }
        let mut seen = [false; SENSOR_COUNT];
        for (i, c) in s.chars().enumerate() {
            seen[i] = match c {
                '1' => true,
                '0' => false,
                other => return Err(Error::InvalidSymbol(other)),
            };
        }
        Ok(Self::from_sensors(seen))
    }
}

/// One completed acquisition cycle as seen by consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSample {
    /// Binary line position
    pub state: LineState,
    /// Every channel has min < max
    pub calibrated: bool,
    /// Monotonic cycle counter (first published cycle is 1)
    pub cycle: u64,
    /// Cycle start on the acquisition clock (microseconds)
    pub timestamp_us: u64,
}

/// Local topology of an intersection
///
/// | Variant | Code | Branches |
/// |---------|------|----------|
/// | DeadEnd | `0` | none |
/// | FullCross | `1` | left, straight, right |
/// | StraightLeftCross | `2` | left, straight |
/// | StraightRightCross | `3` | straight, right |
/// | LeftRightCross | `4` | left, right |
/// | LeftTurn | `5` | left only |
/// | RightTurn | `6` | right only |
/// | MazeEnd | `7` | exit marker |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    DeadEnd,
    FullCross,
    StraightLeftCross,
    StraightRightCross,
    LeftRightCross,
    LeftTurn,
    RightTurn,
    MazeEnd,
}

impl NodeType {
    /// Single-character diagnostic code
    pub fn code(self) -> char {
        match self {
            Self::DeadEnd => '0',
            Self::FullCross => '1',
            Self::StraightLeftCross => '2',
            Self::StraightRightCross => '3',
            Self::LeftRightCross => '4',
            Self::LeftTurn => '5',
            Self::RightTurn => '6',
            Self::MazeEnd => '7',
        }
    }

    /// Nodes where the route decides which branch to take
    pub fn is_decision(self) -> bool {
        matches!(
            self,
            Self::FullCross | Self::StraightLeftCross | Self::StraightRightCross | Self::LeftRightCross
        )
    }
}

/// Spin direction (in place, one track forward and one reverse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spin {
    Left,
    Right,
}

/// Route symbol: a recorded decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Finish,
    Left,
    Right,
    TurnAround,
    Straight,
}

impl Move {
    /// Route alphabet character
    pub fn symbol(self) -> char {
        match self {
            Self::Finish => 'F',
            Self::Left => 'L',
            Self::Right => 'R',
            Self::TurnAround => 'T',
            Self::Straight => 'S',
        }
    }

    /// Inverse of [`Move::symbol`]
    pub fn from_symbol(c: char) -> Result<Self> {
        match c {
            'F' => Ok(Self::Finish),
            'L' => Ok(Self::Left),
            'R' => Ok(Self::Right),
            'T' => Ok(Self::TurnAround),
            'S' => Ok(Self::Straight),
            other => Err(Error::InvalidSymbol(other)),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// What the robot did at a node
///
/// Forced turns (`l`, `r`) happen at corners with a single way out; they are
/// performed but never recorded in the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    Move(Move),
    Forced(Spin),
}

impl Reaction {
    /// Diagnostic character
    pub fn symbol(self) -> char {
        match self {
            Self::Move(m) => m.symbol(),
            Self::Forced(Spin::Left) => 'l',
            Self::Forced(Spin::Right) => 'r',
        }
    }

    /// The route symbol, if this reaction is recorded
    pub fn recorded(self) -> Option<Move> {
        match self {
            Self::Move(m) => Some(m),
            Self::Forced(_) => None,
        }
    }

    /// True once the maze exit has been reached
    pub fn is_finish(self) -> bool {
        self == Self::Move(Move::Finish)
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Track rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Velocity setpoint for one track, percent of full PWM duty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackVelocity {
    pub direction: Direction,
    /// 0..=100
    pub percent: u8,
}

impl TrackVelocity {
    /// Forward at `percent` (clamped to 100)
    pub fn forward(percent: u8) -> Self {
        Self {
            direction: Direction::Forward,
            percent: percent.min(100),
        }
    }

    /// Reverse at `percent` (clamped to 100)
    pub fn reverse(percent: u8) -> Self {
        Self {
            direction: Direction::Reverse,
            percent: percent.min(100),
        }
    }

    /// Signed percentage, negative when reversing
    pub fn signed(self) -> i16 {
        match self.direction {
            Direction::Forward => self.percent as i16,
            Direction::Reverse => -(self.percent as i16),
        }
    }
}

/// Buzzer patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeepPattern {
    Single,
    Double,
}

/// Commands accepted by a [`RobotDriver`](crate::core::driver::RobotDriver)
///
/// Track setpoints travel as a pair so one control decision always updates
/// both tracks together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set both track velocities
    Tracks {
        left: TrackVelocity,
        right: TrackVelocity,
    },
    /// Stop both tracks
    Stop,
    /// Sound the buzzer
    Beep(BeepPattern),
    /// Stop the device and release its threads
    Shutdown,
}

impl Command {
    /// Both tracks forward at the same speed
    pub fn forward(speed: u8) -> Self {
        Self::Tracks {
            left: TrackVelocity::forward(speed),
            right: TrackVelocity::forward(speed),
        }
    }

    /// Spin in place
    pub fn spin(direction: Spin, speed: u8) -> Self {
        match direction {
            Spin::Left => Self::Tracks {
                left: TrackVelocity::reverse(speed),
                right: TrackVelocity::forward(speed),
            },
            Spin::Right => Self::Tracks {
                left: TrackVelocity::forward(speed),
                right: TrackVelocity::reverse(speed),
            },
        }
    }
}
