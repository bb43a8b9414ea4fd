//! Console status surface
//!
//! Prints the status snapshot whenever something a user would notice
//! changes. Plain progress ticks are not reprinted.

use async_trait::async_trait;
use jukebox_core::ObserverGone;
use jukebox_playback::{PlayerState, StatusObserver, StatusSnapshot};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// What a reprint is keyed on
#[derive(Debug, Clone, PartialEq)]
struct Shown {
    state: PlayerState,
    title: Option<String>,
    upcoming: usize,
    volume_label: String,
}

impl Shown {
    fn of(snapshot: &StatusSnapshot) -> Self {
        Self {
            state: snapshot.state,
            title: snapshot.now_playing.as_ref().map(|np| np.media.title.clone()),
            upcoming: snapshot.upcoming.len() + snapshot.hidden_entries,
            volume_label: snapshot.volume_label.clone(),
        }
    }
}

pub struct ConsoleObserver<W> {
    surface_id: String,
    out: Mutex<W>,
    last: Mutex<Option<Shown>>,
}

impl ConsoleObserver<io::Stdout> {
    pub fn stdout(surface_id: impl Into<String>) -> Self {
        Self::new(surface_id, io::stdout())
    }
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(surface_id: impl Into<String>, out: W) -> Self {
        Self {
            surface_id: surface_id.into(),
            out: Mutex::new(out),
            last: Mutex::new(None),
        }
    }

    fn render(&self, snapshot: &StatusSnapshot) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        write!(out, "{snapshot}")?;
        out.flush()
    }
}

#[async_trait]
impl<W: Write + Send> StatusObserver for ConsoleObserver<W> {
    fn surface_id(&self) -> &str {
        &self.surface_id
    }

    async fn update(&self, snapshot: &StatusSnapshot) -> Result<(), ObserverGone> {
        let shown = Shown::of(snapshot);
        {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if last.as_ref() == Some(&shown) {
                return Ok(());
            }
            *last = Some(shown);
        }

        // A closed stdout means nobody is watching anymore
        self.render(snapshot).map_err(|_| ObserverGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukebox_core::{Destination, MediaDescriptor, Requester};
    use jukebox_playback::NowPlaying;

    fn snapshot(state: PlayerState, elapsed_secs: u64) -> StatusSnapshot {
        let media = MediaDescriptor::new("Song A", "Band", 180, "https://media.example/a");
        StatusSnapshot {
            state,
            progress: Some(jukebox_playback::readable_time_progress(elapsed_secs, 180)),
            volume_label: "100% volume".to_string(),
            now_playing: Some(NowPlaying {
                media,
                destination: Destination::new("lounge", "Lounge"),
                requester: Requester::new("console", "console"),
                elapsed_secs,
            }),
            upcoming: Vec::new(),
            hidden_entries: 0,
        }
    }

    fn printed(observer: &ConsoleObserver<Vec<u8>>) -> String {
        String::from_utf8(observer.out.lock().unwrap().clone()).unwrap()
    }

    #[tokio::test]
    async fn progress_ticks_are_not_reprinted() {
        let observer = ConsoleObserver::new("console", Vec::new());

        observer.update(&snapshot(PlayerState::Playing, 1)).await.unwrap();
        observer.update(&snapshot(PlayerState::Playing, 2)).await.unwrap();
        observer.update(&snapshot(PlayerState::Paused, 2)).await.unwrap();

        let text = printed(&observer);
        assert_eq!(text.matches("Song A").count(), 2);
        assert!(text.contains("Playing, 00:01/03:00, 100% volume"));
        assert!(text.contains("Paused, 00:02/03:00, 100% volume"));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn closed_output_reports_gone() {
        let observer = ConsoleObserver::new("console", ClosedPipe);
        assert_eq!(
            observer.update(&snapshot(PlayerState::Playing, 0)).await,
            Err(ObserverGone)
        );
    }
}
