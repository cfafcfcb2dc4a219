use std::fmt;
use std::str::FromStr;

/// One robot command. `L/R/U/D` move, `W` waits, `A` aborts, `S` shaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Wait,
    Abort,
    Shave,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Down,
        Action::Wait,
        Action::Abort,
        Action::Shave,
    ];

    /// the robot-move delta, or `(0, 0)` for actions that don't relocate the robot.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
            Action::Up => (0, 1),
            Action::Down => (0, -1),
            Action::Wait | Action::Abort | Action::Shave => (0, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Action::Left | Action::Right)
    }

    pub fn letter(self) -> char {
        match self {
            Action::Left => 'L',
            Action::Right => 'R',
            Action::Up => 'U',
            Action::Down => 'D',
            Action::Wait => 'W',
            Action::Abort => 'A',
            Action::Shave => 'S',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl TryFrom<char> for Action {
    type Error = char;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        Ok(match c.to_ascii_uppercase() {
            'L' => Action::Left,
            'R' => Action::Right,
            'U' => Action::Up,
            'D' => Action::Down,
            'W' => Action::Wait,
            'A' => Action::Abort,
            'S' => Action::Shave,
            other => return Err(other),
        })
    }
}

impl FromStr for Action {
    type Err = char;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Action::try_from(c),
            _ => Err('\0'),
        }
    }
}

/// renders a sequence of actions the way the solver reports them on stdout.
pub fn path_string(actions: &[Action]) -> String {
    actions.iter().map(|a| a.letter()).collect()
}

/// parses a string of action letters, stopping (and reporting how far it got)
/// at the first character that isn't a valid action letter.
pub fn parse_path(s: &str) -> (Vec<Action>, Option<char>) {
    let mut actions = Vec::with_capacity(s.len());
    for c in s.chars() {
        match Action::try_from(c) {
            Ok(action) => actions.push(action),
            Err(bad) => return (actions, Some(bad)),
        }
    }
    (actions, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::try_from(action.letter()).unwrap(), action);
        }
    }

    #[test]
    fn path_string_matches_letters() {
        let actions = vec![Action::Right, Action::Right, Action::Up];
        assert_eq!(path_string(&actions), "RRU");
    }

    #[test]
    fn parse_path_stops_at_bad_char() {
        let (actions, bad) = parse_path("RRx");
        assert_eq!(actions, vec![Action::Right, Action::Right]);
        assert_eq!(bad, Some('x'));
    }
}
