use std::fmt;

use crate::cave::world::World;

/// the terminal rendering consumed by the interactive CLI: the grid followed
/// by a one-line status bar. Piped output skips this in favour of the bare
/// path string; see `bin/solve.rs`.
impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.grid())?;
        write!(
            f,
            "moves {} | lambdas {} | score {} | water {} | razors {} | {:?}",
            self.num_moves(),
            self.lambdas_collected(),
            self.score(),
            self.water(),
            self.num_razors(),
            self.state(),
        )
    }
}
