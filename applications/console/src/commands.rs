//! Console commands
//!
//! One command per input line. Parsing only checks syntax; range checks that
//! depend on the queue happen when the command runs.

use crate::error::{ConsoleError, Result};
use jukebox_core::{Destination, Requester};
use jukebox_playback::PlaybackEngine;
use std::str::FromStr;

/// Volume step of `up` / `down`, in percent
const VOLUME_STEP: u32 = 20;

pub const HELP: &str = "\
Commands:
  play <query>     play now (current item is skipped)
  queue <query>    add to the end of the queue
  skip             skip the current item
  pause | resume   pause or resume playback
  stop             clear the queue and stop
  volume <n>       set the volume in percent (0 mutes)
  up | down        volume +/- 20%
  mute             set the volume to 0
  remove <n>       remove queue entry n
  jump <n>         play queue entry n next, dropping the ones before it
  status           show the player
  join <channel>   move yourself to another channel
  help             show this help
  quit             stop playback and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(String),
    Queue(String),
    Skip,
    Pause,
    Resume,
    Stop,
    Volume(u32),
    Up,
    Down,
    Mute,
    Remove(usize),
    Jump(usize),
    Status,
    Join(String),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        let command = match word.to_lowercase().as_str() {
            "play" | "p" => Self::Play(required(rest, "play <query>")?),
            "queue" | "q" => Self::Queue(required(rest, "queue <query>")?),
            "skip" | "next" => Self::Skip,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "stop" | "clear" => Self::Stop,
            "volume" | "vol" => Self::Volume(parse_volume(rest)?),
            "up" => Self::Up,
            "down" => Self::Down,
            "mute" => Self::Mute,
            "remove" => Self::Remove(parse_position(rest, "remove <n>")?),
            "jump" => Self::Jump(parse_position(rest, "jump <n>")?),
            "status" | "s" => Self::Status,
            "join" => Self::Join(required(rest, "join <channel>")?),
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => {
                return Err(ConsoleError::command(format!(
                    "Unknown command '{other}', type help for a list"
                )));
            }
        };
        Ok(command)
    }
}

fn required(arg: &str, usage: &str) -> Result<String> {
    if arg.is_empty() {
        Err(ConsoleError::command(format!("Usage: {usage}")))
    } else {
        Ok(arg.to_string())
    }
}

fn parse_volume(arg: &str) -> Result<u32> {
    let value: i64 = arg
        .parse()
        .map_err(|_| ConsoleError::command("Usage: volume <n>"))?;
    u32::try_from(value).map_err(|_| ConsoleError::command("Volume must be a positive number"))
}

fn parse_position(arg: &str, usage: &str) -> Result<usize> {
    arg.parse()
        .map_err(|_| ConsoleError::command(format!("Usage: {usage}")))
}

/// Result of running a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Quit,
}

/// Runs commands for one console user against the engine
pub struct Console {
    engine: PlaybackEngine,
    destinations: Vec<Destination>,
    here: Destination,
    requester: Requester,
}

impl Console {
    /// The user starts in the first destination
    pub fn new(
        engine: PlaybackEngine,
        destinations: Vec<Destination>,
        requester: Requester,
    ) -> Result<Self> {
        let here = destinations
            .first()
            .cloned()
            .ok_or_else(|| ConsoleError::Config("no destinations configured".to_string()))?;
        Ok(Self {
            engine,
            destinations,
            here,
            requester,
        })
    }

    /// Destination the user is in
    pub fn here(&self) -> &Destination {
        &self.here
    }

    pub async fn execute(&mut self, command: Command) -> Result<Outcome> {
        if command.needs_presence() {
            self.engine.authorize(Some(&self.here))?;
        }

        let reply = match command {
            Command::Play(query) => {
                self.request(&query, false).await?;
                "Playing next".to_string()
            }
            Command::Queue(query) => {
                self.request(&query, true).await?;
                format!("Added to the queue ({} waiting)", self.engine.queue_size())
            }
            Command::Skip => {
                self.engine.request_skip();
                "Skipping".to_string()
            }
            Command::Pause => {
                self.engine.request_pause()?;
                "Paused".to_string()
            }
            Command::Resume => {
                self.engine.request_resume()?;
                "Resumed".to_string()
            }
            Command::Stop => {
                self.engine.request_clear();
                "Queue cleared".to_string()
            }
            Command::Volume(percent) => self.set_volume(percent)?,
            Command::Up => self.set_volume(self.engine.volume().saturating_add(VOLUME_STEP))?,
            Command::Down => self.set_volume(self.engine.volume().saturating_sub(VOLUME_STEP))?,
            Command::Mute => self.set_volume(0)?,
            Command::Remove(position) => {
                let index = self.queue_index(position)?;
                let removed = self.engine.request_remove(index)?;
                format!("Removed {}", removed.media.title)
            }
            Command::Jump(position) => {
                let index = self.queue_index(position)?;
                self.engine.request_jump(index)?;
                format!("Jumping to entry {position}")
            }
            Command::Status => self.engine.queue_status(None).to_string(),
            Command::Join(name) => self.join(&name)?,
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Reply(reply))
    }

    async fn request(&self, query: &str, add_to_queue: bool) -> Result<()> {
        self.engine
            .request_media(self.here.clone(), self.requester.clone(), query, add_to_queue)
            .await?;
        Ok(())
    }

    fn set_volume(&self, percent: u32) -> Result<String> {
        self.engine.request_set_volume(percent)?;
        Ok(format!("Volume set to {percent}%"))
    }

    /// Map a 1-based queue position to an index
    fn queue_index(&self, position: usize) -> Result<usize> {
        let size = self.engine.queue_size();
        if size == 0 {
            return Err(ConsoleError::command("The queue is empty"));
        }
        if position == 0 || position > size {
            return Err(ConsoleError::command(format!(
                "Please enter a valid number between 1 and {size}"
            )));
        }
        Ok(position - 1)
    }

    fn join(&mut self, name: &str) -> Result<String> {
        let destination = self
            .destinations
            .iter()
            .find(|d| d.id.as_str() == name || d.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| ConsoleError::command(format!("Unknown channel '{name}'")))?;
        self.here = destination;
        Ok(format!("You are now in {}", self.here.name))
    }
}

impl Command {
    /// Whether the user has to share the output's destination
    ///
    /// Requests only need the user to be somewhere; the item plays where it
    /// was requested.
    fn needs_presence(&self) -> bool {
        !matches!(
            self,
            Self::Play(_)
                | Self::Queue(_)
                | Self::Status
                | Self::Join(_)
                | Self::Help
                | Self::Quit
        )
    }
}
