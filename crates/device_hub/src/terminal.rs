/// Operator console used for numbered lists, prompts and reports
use std::io::{self, BufRead, Write};

/// Line-oriented operator console
pub trait Terminal {
    /// Print one line of operator-facing output
    fn write_line(&mut self, line: &str);

    /// Show `message` and block for one line of input.
    ///
    /// Returns `None` at end of input. Trailing whitespace is stripped.
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>>;
}

/// Terminal over the process's stdin and stdout
#[derive(Debug, Default)]
pub struct StdTerminal;

impl StdTerminal {
    pub fn new() -> Self {
        Self
    }
}

impl Terminal for StdTerminal {
    fn write_line(&mut self, line: &str) {
        println!("{}", line);
    }

    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", message)?;
        stdout.flush()?;

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input)? {
            0 => Ok(None),
            _ => Ok(Some(input.trim_end().to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::collections::VecDeque;

    /// Terminal fed from a fixed list of answers
    #[derive(Debug, Default)]
    pub struct ScriptedTerminal {
        answers: VecDeque<String>,
        pub output: Vec<String>,
        pub prompts: Vec<String>,
    }

    impl ScriptedTerminal {
        pub fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn printed(&self, needle: &str) -> bool {
            self.output.iter().any(|line| line.contains(needle))
        }
    }

    impl Terminal for ScriptedTerminal {
        fn write_line(&mut self, line: &str) {
            self.output.push(line.to_string());
        }

        fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
            self.prompts.push(message.to_string());
            Ok(self.answers.pop_front().map(|a| a.trim_end().to_string()))
        }
    }
}
