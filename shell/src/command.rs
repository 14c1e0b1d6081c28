/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Index(String),
    /// Raw query text after the keyword; parsed by `textdex_core::Query`.
    Search(String),
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word.to_ascii_lowercase().as_str() {
            "quit" if rest.is_empty() => Command::Quit,
            "index" if !rest.is_empty() => Command::Index(rest.to_string()),
            "search" => Command::Search(rest.to_string()),
            _ => Command::Unknown(line.to_string()),
        }
    }
}
