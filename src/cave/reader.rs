use std::collections::BTreeMap;

use crate::cave::grid::Cell;
use crate::cave::grid::Grid;
use crate::cave::grid::Point;
use crate::cave::world::World;
use crate::cave::world::WorldConfig;
use crate::error::ReadError;

/// parses a map file: a block of cell rows (top row first, the way maps are
/// authored), a blank line, then metadata lines. Grid rows are stored
/// bottom-first internally, so the block is reversed and short rows are
/// right-padded with [`Cell::Empty`] to the widest row's length.
///
/// a malformed metadata line is logged and skipped rather than failing the
/// whole parse; a missing robot or lift is fatal.
pub fn read_world(text: &str) -> Result<World, ReadError> {
    let mut lines = text.lines();
    let mut grid_lines: Vec<&str> = Vec::new();
    for line in &mut lines {
        if line.is_empty() {
            break;
        }
        grid_lines.push(line);
    }
    if grid_lines.is_empty() {
        return Err(ReadError::EmptyGrid);
    }

    let width = grid_lines.iter().map(|l| l.len()).max().unwrap_or(0);
    let mut rows: Vec<Vec<Cell>> = grid_lines
        .iter()
        .map(|line| {
            let mut row: Vec<Cell> = line
                .chars()
                .map(|c| Cell::try_from(c).unwrap_or(Cell::Wall))
                .collect();
            row.resize(width, Cell::Empty);
            row
        })
        .collect();
    rows.reverse();
    let grid = Grid::new(rows);

    let mut water = -1_i32;
    let mut flooding = 0_u32;
    let mut waterproof = 10_u32;
    let mut num_razors = 0_u32;
    let mut beard_growth = 25_u32;
    let mut trampoline_targets: BTreeMap<u8, u8> = BTreeMap::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut words = line.split_whitespace();
        match words.next() {
            Some("Water") => {
                let mut raw = 0_i32;
                parse_into(&mut raw, words.next(), line);
                water = raw - 1;
            }
            Some("Flooding") => parse_into(&mut flooding, words.next(), line),
            Some("Waterproof") => parse_into(&mut waterproof, words.next(), line),
            Some("Razors") => parse_into(&mut num_razors, words.next(), line),
            Some("Growth") => parse_into(&mut beard_growth, words.next(), line),
            Some("Trampoline") => {
                let label = words.next().and_then(|w| w.chars().next());
                let target_word = words.find(|w| w.chars().all(|c| c.is_ascii_digit()));
                match (label, target_word.and_then(|w| w.parse::<u8>().ok())) {
                    (Some(label @ 'A'..='I'), Some(target)) if (1..=9).contains(&target) => {
                        trampoline_targets.insert(label as u8 - b'A', target - 1);
                    }
                    _ => log::warn!("skipping malformed trampoline metadata line: {line:?}"),
                }
            }
            _ => log::warn!("skipping unrecognized metadata line: {line:?}"),
        }
    }

    if !grid.positions().any(|p| grid.get(p) == Cell::Robot) {
        return Err(ReadError::MissingRobot);
    }
    if !grid
        .positions()
        .any(|p| matches!(grid.get(p), Cell::ClosedLift | Cell::OpenLift))
    {
        return Err(ReadError::MissingLift);
    }

    let trampolines = resolve_trampolines(&grid, &trampoline_targets);

    Ok(World::from_config(WorldConfig {
        grid,
        water,
        flooding,
        waterproof,
        num_razors,
        beard_growth,
        trampolines,
    }))
}

fn parse_into<T: std::str::FromStr>(slot: &mut T, word: Option<&str>, line: &str) {
    match word.and_then(|w| w.parse().ok()) {
        Some(value) => *slot = value,
        None => log::warn!("skipping malformed metadata line: {line:?}"),
    }
}

fn resolve_trampolines(
    grid: &Grid,
    labels: &BTreeMap<u8, u8>,
) -> BTreeMap<Point, Point> {
    let mut sources: BTreeMap<u8, Point> = BTreeMap::new();
    let mut targets: BTreeMap<u8, Point> = BTreeMap::new();
    for p in grid.positions() {
        match grid.get(p) {
            Cell::TrampolineSource(label) => {
                sources.insert(label, p);
            }
            Cell::TrampolineTarget(label) => {
                targets.insert(label, p);
            }
            _ => {}
        }
    }

    let mut resolved = BTreeMap::new();
    for (&source_label, &target_label) in labels {
        if let (Some(&source), Some(&target)) =
            (sources.get(&source_label), targets.get(&target_label))
        {
            resolved.insert(source, target);
        } else {
            log::warn!(
                "trampoline {} targets {} but one endpoint is missing from the grid",
                (b'A' + source_label) as char,
                target_label + 1
            );
        }
    }
    resolved
}
