//! Interactive drill loop.
//!
//! Reads one command or move per input line and paces opponent replies with a
//! real sleep when `pace` is set. Everything else is delegated to the API; the
//! session itself never sees wall-clock time.

use colored::Colorize;
use repertoire::api::TrainerApi;
use repertoire::commands::helpers::movetext;
use repertoire::drill::{
    session_complete_message, Advance, DrillEvent, DrillMode, DrillState, MoveOutcome,
};
use repertoire::error::Result;
use repertoire::rules::RulesEngine;
use repertoire::store::KeyValueStore;
use std::io::{BufRead, Write};

const HELP_LINE: &str =
    "Enter a move (Nf3, e2e4 or `e2 e4`), or: hint, reveal, restart, next, moves, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum DrillInput {
    Quit,
    Help,
    Hint,
    Reveal,
    Restart,
    Next,
    Moves,
    Squares {
        from: String,
        to: String,
        promotion: Option<char>,
    },
    San(String),
}

impl DrillInput {
    fn parse(input: &str) -> Self {
        match input.to_ascii_lowercase().as_str() {
            "quit" | "q" | "exit" => return DrillInput::Quit,
            "help" | "?" => return DrillInput::Help,
            "hint" | "h" => return DrillInput::Hint,
            "reveal" | "show" => return DrillInput::Reveal,
            "restart" => return DrillInput::Restart,
            "next" | "skip" => return DrillInput::Next,
            "moves" => return DrillInput::Moves,
            _ => {}
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        if let [from, to, rest @ ..] = parts.as_slice() {
            if is_square(from) && is_square(to) && rest.len() <= 1 {
                let promotion = rest.first().and_then(|p| p.chars().next());
                return DrillInput::Squares {
                    from: from.to_ascii_lowercase(),
                    to: to.to_ascii_lowercase(),
                    promotion,
                };
            }
        }
        DrillInput::San(input.to_string())
    }
}

fn is_square(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 2
        && (b'a'..=b'h').contains(&bytes[0].to_ascii_lowercase())
        && (b'1'..=b'8').contains(&bytes[1])
}

pub struct DrillLoop<'a, S: KeyValueStore, W: Write> {
    api: &'a mut TrainerApi<S>,
    mode: DrillMode,
    out: W,
    pace: bool,
}

impl<'a, S: KeyValueStore, W: Write> DrillLoop<'a, S, W> {
    pub fn new(api: &'a mut TrainerApi<S>, mode: DrillMode, out: W, pace: bool) -> Self {
        Self {
            api,
            mode,
            out,
            pace,
        }
    }

    /// Drives the session that `start` opened until it ends, the input runs
    /// out, or the user quits. The session is always left on return.
    pub fn run<R: BufRead>(mut self, start: Advance, input: R) -> Result<()> {
        let result = self.drive(start, input);
        self.api.leave(self.mode);
        result
    }

    fn drive<R: BufRead>(&mut self, start: Advance, input: R) -> Result<()> {
        if !self.show_advance(&start)? || !self.roll_over()? {
            return Ok(());
        }
        writeln!(self.out, "{}", HELP_LINE.dimmed())?;
        self.prompt()?;

        for line in input.lines() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() {
                self.prompt()?;
                continue;
            }

            match DrillInput::parse(text) {
                DrillInput::Quit => return Ok(()),
                DrillInput::Help => writeln!(self.out, "{}", HELP_LINE.dimmed())?,
                DrillInput::Hint => self.hint()?,
                DrillInput::Reveal => self.reveal()?,
                DrillInput::Restart => {
                    if let Some(advance) = self.api.restart(self.mode)? {
                        self.show_advance(&advance)?;
                    }
                }
                DrillInput::Next => match self.api.next(self.mode)? {
                    Some(advance) => {
                        if !self.show_advance(&advance)? {
                            return Ok(());
                        }
                    }
                    None => writeln!(
                        self.out,
                        "{}",
                        "Finish this line first, or type reveal to give up on it.".yellow()
                    )?,
                },
                DrillInput::Moves => self.moves()?,
                DrillInput::Squares {
                    from,
                    to,
                    promotion,
                } => {
                    let outcome = self.api.submit_move(self.mode, &from, &to, promotion)?;
                    self.handle_outcome(text, outcome)?;
                }
                DrillInput::San(san) => {
                    let outcome = self.api.submit_san(self.mode, &san)?;
                    self.handle_outcome(text, outcome)?;
                }
            }

            if !self.roll_over()? {
                return Ok(());
            }
            self.prompt()?;
        }
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }

    fn status(&self) -> Option<String> {
        self.api
            .session(self.mode)
            .and_then(|s| s.status())
            .map(str::to_string)
    }

    fn state(&self) -> DrillState {
        self.api
            .session(self.mode)
            .map_or(DrillState::Idle, |s| s.state())
    }

    /// Prints a newly started line. Returns false once the session is over.
    fn show_advance(&mut self, advance: &Advance) -> Result<bool> {
        match advance {
            Advance::Started {
                name,
                playing_as,
                opponent_opened,
                ..
            } => {
                writeln!(self.out)?;
                writeln!(
                    self.out,
                    "{} {}",
                    name.bold(),
                    format!("(you play {})", playing_as).dimmed()
                )?;
                if let Some(san) = opponent_opened {
                    writeln!(self.out, "Opponent plays {}", san.cyan())?;
                }
                Ok(true)
            }
            Advance::SessionComplete { completed } => {
                writeln!(self.out, "{}", session_complete_message(*completed).green())?;
                Ok(false)
            }
        }
    }

    /// Moves past finished lines. Returns false once the session is over.
    fn roll_over(&mut self) -> Result<bool> {
        while self.state() == DrillState::Complete {
            if let Some(progress) = self.api.session(self.mode).map(|s| s.progress()) {
                writeln!(self.out, "{}", progress.to_string().dimmed())?;
            }
            let Some(advance) = self.api.next(self.mode)? else {
                break;
            };
            if !self.show_advance(&advance)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn hint(&mut self) -> Result<()> {
        match self.api.hint(self.mode)? {
            Some(piece) => writeln!(self.out, "Hint: move your {}", piece.name().to_lowercase())?,
            None => writeln!(self.out, "{}", "No hint available right now.".dimmed())?,
        }
        Ok(())
    }

    fn reveal(&mut self) -> Result<()> {
        match self.api.reveal(self.mode)? {
            Some(reveal) => {
                writeln!(self.out, "Answer: {}", movetext(&reveal.moves).cyan())?;
                if self.state() != DrillState::Complete && !reveal.remaining.is_empty() {
                    writeln!(self.out, "Still to play: {}", reveal.remaining.join(" "))?;
                }
            }
            None => writeln!(self.out, "{}", "Nothing to reveal.".dimmed())?,
        }
        Ok(())
    }

    fn moves(&mut self) -> Result<()> {
        let history = self
            .api
            .session(self.mode)
            .map(|s| s.engine().history())
            .unwrap_or_default();
        if history.is_empty() {
            writeln!(self.out, "{}", "No moves yet.".dimmed())?;
        } else {
            writeln!(self.out, "{}", movetext(&history))?;
        }
        Ok(())
    }

    fn handle_outcome(&mut self, input: &str, outcome: MoveOutcome) -> Result<()> {
        match outcome {
            MoveOutcome::Illegal => {
                writeln!(self.out, "{}", format!("Can't play {} here.", input).red())?;
            }
            MoveOutcome::Mismatch { .. } => {
                let status = self.status().unwrap_or_else(|| "Wrong move!".into());
                writeln!(self.out, "{}", status.red())?;
            }
            MoveOutcome::Matched { san } => {
                writeln!(self.out, "{} {}", "✓".green(), san)?;
                self.await_reply()?;
            }
            MoveOutcome::Completed { san, flawless } => {
                writeln!(self.out, "{} {}", "✓".green(), san)?;
                self.print_completion(flawless)?;
            }
        }
        Ok(())
    }

    fn print_completion(&mut self, flawless: bool) -> Result<()> {
        if let Some(status) = self.status() {
            let status = if flawless { status.green() } else { status.yellow() };
            writeln!(self.out, "{}", status)?;
        }
        Ok(())
    }

    /// Lets the reply delay pass and prints what the opponent did.
    fn await_reply(&mut self) -> Result<()> {
        let delay = self.mode.policy().reply_delay;
        if self.pace {
            std::thread::sleep(delay);
        }
        for event in self.api.advance(self.mode, delay)? {
            match event {
                DrillEvent::OpponentMoved { san } => {
                    writeln!(self.out, "Opponent plays {}", san.cyan())?;
                }
                DrillEvent::Completed { flawless } => self.print_completion(flawless)?,
                DrillEvent::LineBroken { .. } => {
                    if let Some(status) = self.status() {
                        writeln!(self.out, "{}", status.red())?;
                    }
                }
                DrillEvent::StatusCleared => {}
            }
        }
        Ok(())
    }
}
