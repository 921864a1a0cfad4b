use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::session::Session;

const MENU: &str = "\
Please select an option:
  1. load <path>      load an audio file
  2. enroll <label>   add the loaded file as a training sample
  3. train            train the model
  4. classify         identify the speaker of the loaded file
  5. exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(Option<String>),
    Enroll(Option<String>),
    Train,
    Classify,
    Exit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        match word.to_ascii_lowercase().as_str() {
            "1" | "load" => Some(Command::Load(arg)),
            "2" | "enroll" => Some(Command::Enroll(arg)),
            "3" | "train" if arg.is_none() => Some(Command::Train),
            "4" | "classify" if arg.is_none() => Some(Command::Classify),
            "5" | "exit" | "quit" if arg.is_none() => Some(Command::Exit),
            _ => None,
        }
    }
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, text: &str) -> Result<Option<String>> {
    write!(output, "{} ", text)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Reads commands until `exit` or end of input, printing one status line per
/// command.
pub fn run<R: BufRead, W: Write>(session: &mut Session, mut input: R, mut output: W) -> Result<()> {
    writeln!(output, "Speaker identification")?;
    writeln!(output, "----------------------")?;
    writeln!(output, "{}", MENU)?;

    loop {
        let Some(line) = prompt(&mut input, &mut output, ">")? else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        let Some(command) = Command::parse(&line) else {
            writeln!(output, "Invalid option! Type 1-5 or a command name.")?;
            continue;
        };

        let outcome = match command {
            Command::Exit => break,
            Command::Load(arg) => {
                let path = match arg {
                    Some(path) => path,
                    None => match prompt(&mut input, &mut output, "Path to the audio file:")? {
                        Some(path) => path,
                        None => break,
                    },
                };
                session.load(Path::new(&path))
            }
            Command::Enroll(arg) => {
                let label = match arg {
                    Some(label) => label,
                    None => match prompt(&mut input, &mut output, "Speaker's numeric label:")? {
                        Some(label) => label,
                        None => break,
                    },
                };
                session.enroll_input(&label)
            }
            Command::Train => session.train(),
            Command::Classify => session.classify(),
        };

        match outcome {
            Ok(status) => writeln!(output, "{}", status)?,
            Err(err) => {
                log::debug!("Command failed: {:?}", err);
                writeln!(output, "Error: {:#}", err)?;
            }
        }
    }

    writeln!(output, "Bye.")?;
    Ok(())
}
