//! Terminal command parsing and the wander bot

use rand::Rng;
use shared::Position;

/// Largest distance the wander bot moves on either axis per step
pub const WANDER_STEP: f64 = 10.0;

/// Half-width of the square the wander bot stays inside
pub const WANDER_BOUND: f64 = 500.0;

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `/move <x> <y>`
    Move(Position),
    /// Any line that is not a command
    Chat(String),
    /// `/who`
    Who,
    /// `/quit`
    Quit,
    /// A command that could not be understood, with a hint for the user
    Invalid(String),
}

/// Parses one line from stdin
///
/// Blank lines yield `None`. Lines starting with `/` are commands; anything
/// else is sent as chat, verbatim.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed.starts_with('/') {
        return Some(Command::Chat(line.trim_end().to_string()));
    }

    let mut parts = trimmed.split_whitespace();
    let command = match parts.next() {
        Some("/move") => {
            let coords: Vec<&str> = parts.collect();
            match coords.as_slice() {
                [x, y] => match (x.parse::<f64>(), y.parse::<f64>()) {
                    (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => {
                        Command::Move(Position::new(x, y))
                    }
                    _ => Command::Invalid("coordinates must be numbers".to_string()),
                },
                _ => Command::Invalid("usage: /move <x> <y>".to_string()),
            }
        }
        Some("/who") => Command::Who,
        Some("/quit") => Command::Quit,
        Some(other) => Command::Invalid(format!("unknown command {}", other)),
        None => return None,
    };

    Some(command)
}

/// Random walk for the `--wander` bot
#[derive(Debug, Clone)]
pub struct Wanderer {
    position: Position,
    step: f64,
}

impl Wanderer {
    pub fn new(step: f64) -> Self {
        Self {
            position: Position::ORIGIN,
            step,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Takes one step and returns the new position
    pub fn next_position<R: Rng>(&mut self, rng: &mut R) -> Position {
        let dx = rng.gen_range(-self.step..=self.step);
        let dy = rng.gen_range(-self.step..=self.step);

        self.position = Position::new(
            (self.position.x + dx).clamp(-WANDER_BOUND, WANDER_BOUND),
            (self.position.y + dy).clamp(-WANDER_BOUND, WANDER_BOUND),
        );
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_chat() {
        assert_eq!(
            parse_command("hello world  \n"),
            Some(Command::Chat("hello world".to_string()))
        );
    }

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(parse_command("   \n"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(
            parse_command("/move 5 -7.5"),
            Some(Command::Move(Position::new(5.0, -7.5)))
        );
    }

    #[test]
    fn test_parse_move_errors() {
        assert!(matches!(
            parse_command("/move 5"),
            Some(Command::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/move left up"),
            Some(Command::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/move NaN 1"),
            Some(Command::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_other_commands() {
        assert_eq!(parse_command("/who"), Some(Command::Who));
        assert_eq!(parse_command("  /quit  "), Some(Command::Quit));
        assert_eq!(
            parse_command("/dance"),
            Some(Command::Invalid("unknown command /dance".to_string()))
        );
    }

    #[test]
    fn test_wanderer_starts_at_origin() {
        let wanderer = Wanderer::new(WANDER_STEP);
        assert_eq!(wanderer.position(), Position::ORIGIN);
    }

    #[test]
    fn test_wanderer_steps_are_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut wanderer = Wanderer::new(WANDER_STEP);
        let mut previous = wanderer.position();

        for _ in 0..1000 {
            let next = wanderer.next_position(&mut rng);
            assert!((next.x - previous.x).abs() <= WANDER_STEP);
            assert!((next.y - previous.y).abs() <= WANDER_STEP);
            assert!(next.x.abs() <= WANDER_BOUND);
            assert!(next.y.abs() <= WANDER_BOUND);
            previous = next;
        }
    }

    #[test]
    fn test_wanderer_is_deterministic_for_seed() {
        let mut first = Wanderer::new(WANDER_STEP);
        let mut second = Wanderer::new(WANDER_STEP);
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);

        for _ in 0..10 {
            assert_eq!(
                first.next_position(&mut rng_a),
                second.next_position(&mut rng_b)
            );
        }
    }
}
