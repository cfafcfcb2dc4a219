use std::fmt;

/// A cell position. Origin is bottom-left; `x` rightward, `y` upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// the 8-neighbourhood of this point, used by beard growth and shaving.
    pub fn ring(self) -> [Point; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }

    pub fn manhattan(self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// One labelled trampoline source (A-I) or target (1-9). Stored as a zero-based
/// index so `TrampolineSource(0)` pairs naturally with `TrampolineTarget(0)`.
pub type Label = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Wall,
    Empty,
    Earth,
    Rock,
    Lambda,
    ClosedLift,
    OpenLift,
    Robot,
    Beard,
    Razor,
    TrampolineSource(Label),
    TrampolineTarget(Label),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Cell::Wall => '#',
            Cell::Empty => ' ',
            Cell::Earth => '.',
            Cell::Rock => '*',
            Cell::Lambda => '\\',
            Cell::ClosedLift => 'L',
            Cell::OpenLift => 'O',
            Cell::Robot => 'R',
            Cell::Beard => 'W',
            Cell::Razor => '!',
            Cell::TrampolineSource(i) => (b'A' + i) as char,
            Cell::TrampolineTarget(i) => (b'1' + i) as char,
        };
        write!(f, "{c}")
    }
}

impl TryFrom<char> for Cell {
    type Error = char;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        Ok(match c {
            '#' => Cell::Wall,
            ' ' => Cell::Empty,
            '.' => Cell::Earth,
            '*' => Cell::Rock,
            '\\' => Cell::Lambda,
            'L' => Cell::ClosedLift,
            'O' => Cell::OpenLift,
            'R' => Cell::Robot,
            'W' => Cell::Beard,
            '!' => Cell::Razor,
            'A'..='I' => Cell::TrampolineSource(c as u8 - b'A'),
            '1'..='9' => Cell::TrampolineTarget(c as u8 - b'1'),
            other => return Err(other),
        })
    }
}

/// A rectangular, row-major grid of cells. Row 0 is the bottom row. Reading or
/// writing outside the grid's extent is treated as a solid boundary (`Wall`):
/// the physics rules never need to distinguish "off the map" from "a wall".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, p: Point) -> Cell {
        if p.x < 0 || p.y < 0 {
            return Cell::Wall;
        }
        self.rows
            .get(p.y as usize)
            .and_then(|row| row.get(p.x as usize))
            .copied()
            .unwrap_or(Cell::Wall)
    }

    pub fn set(&mut self, p: Point, cell: Cell) {
        debug_assert!(p.x >= 0 && p.y >= 0, "write outside grid extent: {p:?}");
        self.rows[p.y as usize][p.x as usize] = cell;
    }

    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        let width = self.width();
        (0..self.height()).flat_map(move |y| {
            (0..width).map(move |x| Point::new(x as i32, y as i32))
        })
    }

    /// flat byte rendering used as the canonical fingerprint for dominance
    /// pruning: identical grids always render to the same bytes.
    pub fn fingerprint(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.width() * self.height());
        for row in &self.rows {
            for cell in row {
                bytes.push(cell.to_string().as_bytes()[0]);
            }
        }
        bytes
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate().rev() {
            for cell in row {
                write!(f, "{cell}")?;
            }
            if i > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let grid = Grid::new(vec![vec![Cell::Empty; 3]; 2]);
        assert_eq!(grid.get(Point::new(-1, 0)), Cell::Wall);
        assert_eq!(grid.get(Point::new(3, 0)), Cell::Wall);
        assert_eq!(grid.get(Point::new(0, 2)), Cell::Wall);
    }

    #[test]
    fn roundtrip_cell_chars() {
        for c in ['#', ' ', '.', '*', '\\', 'L', 'O', 'R', 'W', '!', 'A', 'I', '1', '9'] {
            let cell = Cell::try_from(c).unwrap();
            assert_eq!(cell.to_string(), c.to_string());
        }
    }

    #[test]
    fn ring_has_eight_distinct_neighbours() {
        let p = Point::new(4, 4);
        let ring = p.ring();
        assert_eq!(ring.len(), 8);
        assert!(!ring.contains(&p));
    }
}
