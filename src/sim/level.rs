//! Tile grid and level layouts
//!
//! A level is authored as rows of glyphs, one glyph per tile:
//!
//! | glyph | tile |
//! |-------|------|
//! | `#` | wall |
//! | `.` | floor |
//! | `S` | safe zone (floor, cosmetic) |
//! | `P` | spawn tile (safe zone) |
//! | `G` | goal tile |
//! | `>` `<` `^` `v` | floor with a hazard starting in that direction |
//!
//! Loading turns the grid into the static data the world needs: solids
//! (horizontal runs of wall tiles, row-major), the goal rectangle (bounding
//! box of all goal tiles), the spawn position and the hazards.

use glam::Vec2;

use super::collision::{GoalArea, Obstacle};
use super::geometry::Rect;
use super::hazard::Hazard;
use crate::consts::{HAZARD_DIAMETER, HAZARD_SPEED, TILE_SIZE};
use crate::error::LevelError;
use crate::tile_origin;

/// What occupies a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Floor,
    Wall,
    Safe,
    Goal,
}

/// The built-in level: a walled arena with a safe zone on the left and the
/// goal strip on the right.
pub const LEVEL_ONE: [&str; 10] = [
    "######################",
    "######################",
    "#SSSS#.......#...GGG##",
    "#SSSS#.>.....#...GGG##",
    "#SSPS............GGG##",
    "#SSSS.....<......GGG##",
    "#SSSS#...#.......GGG##",
    "#SSSS#...#.....>.GGG##",
    "######################",
    "######################",
];

/// Parsed level layout
#[derive(Debug, Clone)]
pub struct Level {
    /// Tiles indexed `[row][col]`
    tiles: Vec<Vec<TileKind>>,
    spawn_tile: (usize, usize),
    hazards: Vec<Hazard>,
}

impl Level {
    /// Parse a layout of equal-width glyph rows
    pub fn parse(rows: &[&str]) -> Result<Self, LevelError> {
        let width = rows.first().map(|r| r.chars().count()).ok_or(LevelError::Empty)?;
        if width == 0 {
            return Err(LevelError::Empty);
        }

        let mut tiles = Vec::with_capacity(rows.len());
        let mut spawn_tile = None;
        let mut hazards = Vec::new();
        let mut has_goal = false;

        for (row, line) in rows.iter().enumerate() {
            let actual = line.chars().count();
            if actual != width {
                return Err(LevelError::RaggedRow {
                    row,
                    expected: width,
                    actual,
                });
            }

            let mut tile_row = Vec::with_capacity(width);
            for (col, glyph) in line.chars().enumerate() {
                let kind = match glyph {
                    '#' => TileKind::Wall,
                    '.' => TileKind::Floor,
                    'S' => TileKind::Safe,
                    'G' => {
                        has_goal = true;
                        TileKind::Goal
                    }
                    'P' => {
                        if spawn_tile.replace((col, row)).is_some() {
                            return Err(LevelError::DuplicateSpawn);
                        }
                        TileKind::Safe
                    }
                    '>' | '<' | '^' | 'v' => {
                        let direction = match glyph {
                            '>' => Vec2::X,
                            '<' => Vec2::NEG_X,
                            '^' => Vec2::NEG_Y,
                            _ => Vec2::Y,
                        };
                        let center = tile_origin(col, row) + Vec2::splat(TILE_SIZE / 2.0);
                        hazards.push(Hazard::new(center, direction * HAZARD_SPEED, HAZARD_DIAMETER));
                        TileKind::Floor
                    }
                    other => {
                        return Err(LevelError::UnknownGlyph {
                            glyph: other,
                            col,
                            row,
                        });
                    }
                };
                tile_row.push(kind);
            }
            tiles.push(tile_row);
        }

        if !has_goal {
            return Err(LevelError::MissingGoal);
        }
        let spawn_tile = spawn_tile.ok_or(LevelError::MissingSpawn)?;

        Ok(Self {
            tiles,
            spawn_tile,
            hazards,
        })
    }

    /// The built-in level
    pub fn level_one() -> Result<Self, LevelError> {
        Self::parse(&LEVEL_ONE)
    }

    pub fn columns(&self) -> usize {
        self.tiles.first().map_or(0, Vec::len)
    }

    pub fn rows(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile(&self, col: usize, row: usize) -> Option<TileKind> {
        self.tiles.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Tile coordinates of the spawn
    pub fn spawn_tile(&self) -> (usize, usize) {
        self.spawn_tile
    }

    /// Pixel position the agent spawns at
    pub fn spawn_point(&self) -> Vec2 {
        tile_origin(self.spawn_tile.0, self.spawn_tile.1)
    }

    /// Horizontal runs of wall tiles, in row-major order
    pub fn obstacles(&self) -> Vec<Obstacle> {
        let mut solids = Vec::new();
        for (row, tiles) in self.tiles.iter().enumerate() {
            let mut col = 0;
            while col < tiles.len() {
                if tiles[col] != TileKind::Wall {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < tiles.len() && tiles[col] == TileKind::Wall {
                    col += 1;
                }
                let top_left = tile_origin(start, row);
                let bottom_right = tile_origin(col, row + 1);
                solids.push(Obstacle::new(Rect::from_corners(top_left, bottom_right)));
            }
        }
        solids
    }

    /// Bounding box of every goal tile
    pub fn goal_area(&self) -> GoalArea {
        let mut min = (usize::MAX, usize::MAX);
        let mut max = (0, 0);
        for (row, tiles) in self.tiles.iter().enumerate() {
            for (col, kind) in tiles.iter().enumerate() {
                if *kind == TileKind::Goal {
                    min = (min.0.min(col), min.1.min(row));
                    max = (max.0.max(col), max.1.max(row));
                }
            }
        }
        // parse() guarantees at least one goal tile
        GoalArea::new(Rect::from_corners(
            tile_origin(min.0, min.1),
            tile_origin(max.0 + 1, max.1 + 1),
        ))
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }
}
