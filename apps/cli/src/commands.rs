/// A line typed at the prompt. Lines starting with `:` are commands,
/// anything else is an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Replay,
    Hint,
    Stats,
    Json,
    Allow(Vec<String>),
    Length(u8),
    Help,
    Quit,
    Guess(String),
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Some(Command::Guess(line.to_string()));
        };
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        let command = match name.to_ascii_lowercase().as_str() {
            "n" | "next" => Command::Next,
            "r" | "replay" => Command::Replay,
            "h" | "hint" => Command::Hint,
            "s" | "stats" => Command::Stats,
            "json" => Command::Json,
            "allow" => Command::Allow(split_items(args)),
            "length" | "len" => match args.parse() {
                Ok(steps) => Command::Length(steps),
                Err(_) => Command::Invalid(format!("expected a run length, got {args:?}")),
            },
            "?" | "help" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => Command::Invalid(format!("unknown command :{other}")),
        };
        Some(command)
    }
}

/// Comma separated when a comma is present, so names with spaces survive.
fn split_items(args: &str) -> Vec<String> {
    let items: Vec<&str> = if args.contains(',') {
        args.split(',').collect()
    } else {
        args.split_whitespace().collect()
    };
    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

pub const HELP: &str = "\
Type your answer and press enter. Commands:
  :next (:n)        new prompt
  :replay (:r)      hear it again
  :hint (:h)        play the reference song (interval mode)
  :stats (:s)       per-item accuracy
  :json             session snapshot as JSON
  :allow A, B, ...  restrict the items drawn
  :length N         tetrachord run length (1-7)
  :quit (:q)        leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_guesses() {
        assert_eq!(
            Command::parse("  Major 3rd "),
            Some(Command::Guess("Major 3rd".into()))
        );
        assert_eq!(Command::parse("c4"), Some(Command::Guess("c4".into())));
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn commands_and_aliases() {
        assert_eq!(Command::parse(":n"), Some(Command::Next));
        assert_eq!(Command::parse(":REPLAY"), Some(Command::Replay));
        assert_eq!(Command::parse(":json"), Some(Command::Json));
        assert_eq!(Command::parse(":length 6"), Some(Command::Length(6)));
        assert!(matches!(
            Command::parse(":length six"),
            Some(Command::Invalid(_))
        ));
        assert!(matches!(Command::parse(":dance"), Some(Command::Invalid(_))));
    }

    #[test]
    fn allow_splits_on_commas_or_spaces() {
        assert_eq!(
            Command::parse(":allow C4 D4  E4"),
            Some(Command::Allow(vec!["C4".into(), "D4".into(), "E4".into()]))
        );
        assert_eq!(
            Command::parse(":allow Major 3rd, Tritone,"),
            Some(Command::Allow(vec!["Major 3rd".into(), "Tritone".into()]))
        );
    }
}
