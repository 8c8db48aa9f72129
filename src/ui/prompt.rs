// Username prompt used once, after the first Last.fm authorization

use std::io::{self, BufRead, Write};

/// Synchronously obtain the Last.fm username. `None` means the user cancelled.
pub trait UsernamePrompt {
    fn ask_username(&self, suggestion: Option<&str>) -> Option<String>;
}

/// Asks on the terminal until a non-empty answer (or end of input)
pub struct ConsolePrompt;

impl ConsolePrompt {
    fn read_answer(
        input: &mut impl BufRead,
        output: &mut impl Write,
        suggestion: Option<&str>,
    ) -> io::Result<Option<String>> {
        loop {
            match suggestion {
                Some(s) => write!(output, "Last.fm username [{}]: ", s)?,
                None => write!(output, "Last.fm username: ")?,
            }
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            let answer = line.trim();
            if !answer.is_empty() {
                return Ok(Some(answer.to_string()));
            }
            if let Some(s) = suggestion {
                return Ok(Some(s.to_string()));
            }
        }
    }
}

impl UsernamePrompt for ConsolePrompt {
    fn ask_username(&self, suggestion: Option<&str>) -> Option<String> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        match Self::read_answer(&mut stdin.lock(), &mut stdout, suggestion) {
            Ok(answer) => answer,
            Err(e) => {
                log::error!("Failed to read username: {}", e);
                None
            }
        }
    }
}

/// Headless answer taken from the command line, environment or config
pub struct FixedUsername(pub String);

impl UsernamePrompt for FixedUsername {
    fn ask_username(&self, _suggestion: Option<&str>) -> Option<String> {
        log::info!("Using configured username {}", self.0);
        Some(self.0.clone())
    }
}
