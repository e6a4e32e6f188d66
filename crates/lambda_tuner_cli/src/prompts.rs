//! Line-oriented prompts for the interactive session.

use std::io::{self, BufRead, Write};

use lambda_tuner_core::{normalize_payload, FunctionIdentity};

pub const ARN_PROMPT: &str = "Enter the Lambda function ARN";
pub const CUSTOM_EVENT_PROMPT: &str = "Do you want to use custom JSON test event data?";
pub const EVENT_PROMPT: &str = "Please paste your JSON-formatted test event data:";
pub const REENTER_PROMPT: &str = "Invalid JSON. Do you want to re-enter the data?";
pub const VISUALIZE_PROMPT: &str = "Would you like to see a visualization of the results?";

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Asks until a well-formed ARN is entered.
    pub fn ask_function_arn(&mut self) -> io::Result<FunctionIdentity> {
        loop {
            let answer = self.ask(ARN_PROMPT)?;
            match FunctionIdentity::parse(&answer) {
                Ok(identity) => return Ok(identity),
                Err(error) => writeln!(self.output, "{error}")?,
            }
        }
    }

    /// Accepts y/yes/n/no in any case; anything else asks again.
    pub fn ask_yes_no(&mut self, question: &str) -> io::Result<bool> {
        loop {
            let answer = self.ask(&format!("{question} [y/n]"))?;
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer yes or no.")?,
            }
        }
    }

    /// Optional test event. Invalid JSON offers a re-entry; declining it
    /// continues without a payload.
    pub fn ask_payload(&mut self) -> io::Result<Option<Vec<u8>>> {
        if !self.ask_yes_no(CUSTOM_EVENT_PROMPT)? {
            return Ok(None);
        }
        loop {
            let answer = self.ask(EVENT_PROMPT)?;
            match normalize_payload(Some(&answer)) {
                Ok(Some(payload)) => return Ok(Some(payload)),
                Ok(None) | Err(_) => {
                    if !self.ask_yes_no(REENTER_PROMPT)? {
                        writeln!(self.output, "Proceeding without custom test event data.")?;
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn ask(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(line.trim().to_string())
    }
}
