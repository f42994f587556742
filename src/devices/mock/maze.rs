//! ASCII maze loader
//!
//! # Format
//!
//! ```text
//! # comment lines start with '#'
//!   o F        o  plain node        -  corridor between row neighbours
//!   | |        S  start (one only)  |  corridor between column neighbours
//! o-o-o        F  finish (one only)
//!   |
//!   S
//! ```
//!
//! Nodes sit on even rows and even columns; corridor characters sit between
//! two nodes. Node `(row, col)` is placed at `x = col/2 * spacing`,
//! `y = -row/2 * spacing` (millimetres, north up). The robot starts with its
//! axle on `S`, facing along the single corridor leaving it.

use super::physics::Pose;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Course used when no maze file is configured
pub const DEFAULT_MAZE: &str = include_str!("../../../mazes/tee.txt");

/// A point on the course (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Straight stretch of tape between two nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    /// Shortest distance from `p` to any point of the segment
    pub fn distance_to(&self, p: Point) -> f32 {
        let dx = self.b.x - self.a.x;
        let dy = self.b.y - self.a.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return p.distance(self.a);
        }
        let t = (((p.x - self.a.x) * dx + (p.y - self.a.y) * dy) / len_sq).clamp(0.0, 1.0);
        p.distance(Point::new(self.a.x + t * dx, self.a.y + t * dy))
    }
}

/// Node marking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Plain,
    Start,
    Finish,
}

/// A grid node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MazeNode {
    pub row: usize,
    pub col: usize,
    pub kind: NodeKind,
    pub position: Point,
}

/// Parsed course: tape segments plus start and finish
#[derive(Debug, Clone)]
pub struct Maze {
    nodes: Vec<MazeNode>,
    segments: Vec<Segment>,
    start: Pose,
    finish: Point,
}

impl Maze {
    /// Load a maze file
    pub fn load<P: AsRef<Path>>(path: P, spacing_mm: f32) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidMaze(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&text, spacing_mm)
    }

    /// Parse maze text
    pub fn parse(text: &str, spacing_mm: f32) -> Result<Self> {
        let mut grid: Vec<Vec<char>> = text
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .map(|line| line.trim_end().chars().collect())
            .collect();
        while grid.first().is_some_and(|row| row.is_empty()) {
            grid.remove(0);
        }
        while grid.last().is_some_and(|row| row.is_empty()) {
            grid.pop();
        }

        let mut nodes = Vec::new();
        let mut index: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges = Vec::new();

        for (row, chars) in grid.iter().enumerate() {
            for (col, &c) in chars.iter().enumerate() {
                let kind = match c {
                    ' ' => continue,
                    'o' => NodeKind::Plain,
                    'S' => NodeKind::Start,
                    'F' => NodeKind::Finish,
                    '-' if row % 2 == 0 && col % 2 == 1 => {
                        edges.push(((row, col - 1), (row, col + 1)));
                        continue;
                    }
                    '|' if row % 2 == 1 && col % 2 == 0 => {
                        edges.push(((row - 1, col), (row + 1, col)));
                        continue;
                    }
                    other => {
                        return Err(Error::InvalidMaze(format!(
                            "Unexpected {:?} at row {}, column {}",
                            other, row, col
                        )))
                    }
                };
                if row % 2 == 1 || col % 2 == 1 {
                    return Err(Error::InvalidMaze(format!(
                        "Node {:?} at row {}, column {} is off the grid",
                        c, row, col
                    )));
                }
                index.insert((row, col), nodes.len());
                nodes.push(MazeNode {
                    row,
                    col,
                    kind,
                    position: Point::new((col / 2) as f32 * spacing_mm, -((row / 2) as f32) * spacing_mm),
                });
            }
        }

        let mut segments = Vec::with_capacity(edges.len());
        let mut degree = vec![0usize; nodes.len()];
        let mut neighbour: HashMap<usize, usize> = HashMap::new();
        for (from, to) in edges {
            let (Some(&a), Some(&b)) = (index.get(&from), index.get(&to)) else {
                return Err(Error::InvalidMaze(format!(
                    "Corridor between {:?} and {:?} does not join two nodes",
                    from, to
                )));
            };
            degree[a] += 1;
            degree[b] += 1;
            neighbour.insert(a, b);
            neighbour.insert(b, a);
            segments.push(Segment {
                a: nodes[a].position,
                b: nodes[b].position,
            });
        }

        let start = single(&nodes, NodeKind::Start)?;
        let finish = single(&nodes, NodeKind::Finish)?;
        if degree[start] != 1 {
            return Err(Error::InvalidMaze(format!(
                "Start needs exactly one corridor, has {}",
                degree[start]
            )));
        }
        let ahead = neighbour
            .get(&start)
            .map(|&n| nodes[n].position)
            .ok_or_else(|| Error::InvalidMaze("Start has no corridor".to_string()))?;
        let origin = nodes[start].position;
        let heading = (ahead.y - origin.y).atan2(ahead.x - origin.x);

        Ok(Self {
            start: Pose::new(origin.x, origin.y, heading),
            finish: nodes[finish].position,
            nodes,
            segments,
        })
    }

    /// The built-in course
    pub fn builtin(spacing_mm: f32) -> Result<Self> {
        Self::parse(DEFAULT_MAZE, spacing_mm)
    }

    /// Distance from `p` to the nearest tape centreline
    pub fn distance_to_line(&self, p: Point) -> f32 {
        self.segments
            .iter()
            .map(|s| s.distance_to(p))
            .fold(f32::INFINITY, f32::min)
    }

    /// Closest node to `p` and its distance
    pub fn nearest_node(&self, p: Point) -> Option<(MazeNode, f32)> {
        self.nodes
            .iter()
            .map(|n| (*n, n.position.distance(p)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn node_at(&self, row: usize, col: usize) -> Option<&MazeNode> {
        self.nodes.iter().find(|n| n.row == row && n.col == col)
    }

    pub fn start(&self) -> Pose {
        self.start
    }

    pub fn finish(&self) -> Point {
        self.finish
    }

    pub fn nodes(&self) -> &[MazeNode] {
        &self.nodes
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} corridors, start ({:.0}, {:.0})",
            self.nodes.len(),
            self.segments.len(),
            self.start.x,
            self.start.y
        )
    }
}

fn single(nodes: &[MazeNode], kind: NodeKind) -> Result<usize> {
    let mut found = nodes.iter().enumerate().filter(|(_, n)| n.kind == kind).map(|(i, _)| i);
    match (found.next(), found.next()) {
        (Some(i), None) => Ok(i),
        (None, _) => Err(Error::InvalidMaze(format!("No {:?} node", kind))),
        (Some(_), Some(_)) => Err(Error::InvalidMaze(format!("More than one {:?} node", kind))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_builtin_maze() {
        let maze = Maze::builtin(200.0).unwrap();
        assert_eq!(maze.nodes().len(), 6);
        assert_eq!(maze.segments().len(), 5);

        // S at row 4, column 2, facing north
        let start = maze.start();
        assert_relative_eq!(start.x, 200.0);
        assert_relative_eq!(start.y, -400.0);
        assert_relative_eq!(start.theta, FRAC_PI_2);

        assert_eq!(maze.finish(), Point::new(400.0, 0.0));
        assert_eq!(maze.node_at(2, 0).map(|n| n.kind), Some(NodeKind::Plain));
    }

    #[test]
    fn test_distance_to_line() {
        let maze = Maze::builtin(200.0).unwrap();
        // On the start corridor
        assert_relative_eq!(maze.distance_to_line(Point::new(200.0, -300.0)), 0.0);
        // Beside it
        assert_relative_eq!(maze.distance_to_line(Point::new(215.0, -300.0)), 15.0);
        // Beyond the west dead end
        assert_relative_eq!(maze.distance_to_line(Point::new(-10.0, -200.0)), 10.0);
    }

    #[test]
    fn test_nearest_node() {
        let maze = Maze::builtin(200.0).unwrap();
        let (node, d) = maze.nearest_node(Point::new(395.0, 3.0)).unwrap();
        assert_eq!(node.kind, NodeKind::Finish);
        assert!(d < 6.0);
    }

    #[test]
    fn test_start_must_be_single_corridor() {
        let text = "o-S-F\n";
        assert!(matches!(Maze::parse(text, 200.0), Err(Error::InvalidMaze(_))));
    }

    #[test]
    fn test_requires_finish() {
        assert!(Maze::parse("S-o\n", 200.0).is_err());
        assert!(Maze::parse("S-F\n  |\n  F\n", 200.0).is_err());
    }

    #[test]
    fn test_dangling_corridor() {
        assert!(Maze::parse("S-F-\n", 200.0).is_err());
        assert!(Maze::parse("S-F\n|\n", 200.0).is_err());
    }

    #[test]
    fn test_node_off_grid() {
        assert!(Maze::parse("S-F\n o\n", 200.0).is_err());
    }

    #[test]
    fn test_east_start_heading() {
        let maze = Maze::parse("# comment\n\nS-o-F\n", 100.0).unwrap();
        assert_relative_eq!(maze.start().theta, 0.0);
        assert_relative_eq!(maze.finish().x, 200.0);
    }
}
