//! Status snapshots
//!
//! A `StatusSnapshot` is a point-in-time, read-only rendering of the engine:
//! player state, the item playing with its progress, the volume label, and
//! the first few upcoming entries. Observers receive one after every state
//! change and on every loop tick while an item plays.

use crate::queue::Queue;
use crate::types::{PlayerState, QueueEntry};
use crate::volume::Volume;
use jukebox_core::{Destination, MediaDescriptor, Requester};
use serde::Serialize;
use std::fmt;

/// Item currently held by the playback loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowPlaying {
    /// Media being played
    pub media: MediaDescriptor,

    /// Destination it plays into
    pub destination: Destination,

    /// Who requested it
    pub requester: Requester,

    /// Seconds played so far, excluding pauses, capped at the media length
    pub elapsed_secs: u64,
}

/// One pending entry as listed in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingEntry {
    /// 1-based queue position (what users type for remove/jump)
    pub position: usize,

    /// Queued media
    pub media: MediaDescriptor,

    /// Destination it will play into
    pub destination: Destination,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Player state
    pub state: PlayerState,

    /// `"MM:SS/MM:SS"` (or hour-qualified) progress, when something plays
    pub progress: Option<String>,

    /// `"<n>% volume"` or `"muted"`
    pub volume_label: String,

    /// Item currently playing
    pub now_playing: Option<NowPlaying>,

    /// First upcoming entries, in play order
    pub upcoming: Vec<UpcomingEntry>,

    /// Pending entries not listed in `upcoming`
    pub hidden_entries: usize,
}

impl StatusSnapshot {
    pub(crate) fn capture(
        state: PlayerState,
        now_playing: Option<&QueueEntry>,
        elapsed_secs: u64,
        volume: Volume,
        queue: &Queue,
        max_listed: usize,
    ) -> Self {
        let now_playing = now_playing.map(|entry| NowPlaying {
            media: entry.media.clone(),
            destination: entry.destination.clone(),
            requester: entry.requester.clone(),
            elapsed_secs: elapsed_secs.min(entry.media.duration_secs),
        });

        let progress = now_playing
            .as_ref()
            .map(|np| readable_time_progress(np.elapsed_secs, np.media.duration_secs));

        let upcoming = queue
            .iter()
            .take(max_listed)
            .enumerate()
            .map(|(idx, entry)| UpcomingEntry {
                position: idx + 1,
                media: entry.media.clone(),
                destination: entry.destination.clone(),
            })
            .collect::<Vec<_>>();

        Self {
            state,
            progress,
            volume_label: volume.label(),
            now_playing,
            hidden_entries: queue.len().saturating_sub(upcoming.len()),
            upcoming,
        }
    }

    /// `"<State>, <progress>, <volume>"`; progress omitted when idle
    pub fn headline(&self) -> String {
        match &self.progress {
            Some(progress) => format!("{}, {}, {}", self.state, progress, self.volume_label),
            None => format!("{}, {}", self.state, self.volume_label),
        }
    }

    /// Title and detail line for the item playing
    pub fn now_playing_line(&self) -> Option<(String, String)> {
        self.now_playing.as_ref().map(|np| {
            let detail = match np.media.view_count {
                Some(views) => format!(
                    "**{}**, **{} Views**",
                    np.media.author,
                    human_readable_number(views)
                ),
                None => format!("**{}**", np.media.author),
            };
            (np.media.title.clone(), detail)
        })
    }

    /// Title and detail line for each listed upcoming entry
    pub fn upcoming_lines(&self) -> Vec<(String, String)> {
        self.upcoming
            .iter()
            .map(|entry| {
                (
                    format!("{}) {}", entry.position, entry.media.title),
                    format!("**{}** in _{}_", entry.media.author, entry.destination.name),
                )
            })
            .collect()
    }

    /// `"...and N more"` when the queue is longer than the listing
    pub fn overflow_marker(&self) -> Option<String> {
        (self.hidden_entries > 0).then(|| format!("...and {} more", self.hidden_entries))
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline())?;
        if let Some((title, detail)) = self.now_playing_line() {
            writeln!(f, "  {title}")?;
            writeln!(f, "    {detail}")?;
        }
        for (title, detail) in self.upcoming_lines() {
            writeln!(f, "  {title} - {detail}")?;
        }
        if let Some(marker) = self.overflow_marker() {
            writeln!(f, "  {marker}")?;
        }
        Ok(())
    }
}

/// Progress string such as `"02:42/04:41"`
///
/// Both halves switch to `HH:MM:SS` once the length reaches one hour, so the
/// two sides always line up.
/// Hours keep counting past 24 instead of wrapping to `00`.
pub fn readable_time_progress(progress_secs: u64, length_secs: u64) -> String {
    let with_hours = length_secs >= 3600;
    format!(
        "{}/{}",
        clock(progress_secs, with_hours),
        clock(length_secs, with_hours)
    )
}

fn clock(secs: u64, with_hours: bool) -> String {
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    if with_hours {
        format!("{:02}:{:02}:{:02}", secs / 3600, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Compact counter such as `"1.2K"`, `"34M"` or `"1.1B"`
///
/// One decimal, truncated (never rounded up into the next unit).
pub fn human_readable_number(n: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

    for (scale, suffix) in UNITS {
        if n >= scale {
            let tenths = n / (scale / 10);
            let (whole, frac) = (tenths / 10, tenths % 10);
            return if frac == 0 {
                format!("{whole}{suffix}")
            } else {
                format!("{whole}.{frac}{suffix}")
            };
        }
    }
    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, duration_secs: u64) -> QueueEntry {
        QueueEntry::new(
            Destination::new("7", "Lounge"),
            Requester::new("u1", "alice"),
            MediaDescriptor::new(title, "Band", duration_secs, "src").with_view_count(1_234),
        )
    }

    #[test]
    fn progress_under_an_hour() {
        assert_eq!(readable_time_progress(75, 200), "01:15/03:20");
        assert_eq!(readable_time_progress(0, 59), "00:00/00:59");
        assert_eq!(readable_time_progress(162, 281), "02:42/04:41");
    }

    #[test]
    fn progress_hour_qualified() {
        assert_eq!(readable_time_progress(75, 4000), "00:01:15/01:06:40");
        assert_eq!(readable_time_progress(3600, 3600), "01:00:00/01:00:00");
        assert_eq!(readable_time_progress(10, 3599), "00:10/59:59");
    }

    #[test]
    fn progress_past_a_day_keeps_counting_hours() {
        assert_eq!(readable_time_progress(90_000, 100_000), "25:00:00/27:46:40");
    }

    #[test]
    fn compact_numbers() {
        assert_eq!(human_readable_number(0), "0");
        assert_eq!(human_readable_number(999), "999");
        assert_eq!(human_readable_number(1_000), "1K");
        assert_eq!(human_readable_number(1_234), "1.2K");
        assert_eq!(human_readable_number(999_999), "999.9K");
        assert_eq!(human_readable_number(3_400_000), "3.4M");
        assert_eq!(human_readable_number(34_000_000), "34M");
        assert_eq!(human_readable_number(1_150_000_000), "1.1B");
    }

    #[test]
    fn idle_snapshot() {
        let snapshot =
            StatusSnapshot::capture(PlayerState::Empty, None, 0, Volume::new(0), &Queue::new(), 24);

        assert_eq!(snapshot.headline(), "Empty, muted");
        assert!(snapshot.progress.is_none());
        assert!(snapshot.now_playing_line().is_none());
        assert!(snapshot.overflow_marker().is_none());
    }

    #[test]
    fn playing_snapshot_caps_progress_at_length() {
        let current = entry("Song", 200);
        let snapshot = StatusSnapshot::capture(
            PlayerState::Playing,
            Some(&current),
            500,
            Volume::new(100),
            &Queue::new(),
            24,
        );

        assert_eq!(snapshot.progress.as_deref(), Some("03:20/03:20"));
        assert_eq!(snapshot.headline(), "Playing, 03:20/03:20, 100% volume");
        assert_eq!(
            snapshot.now_playing_line(),
            Some(("Song".to_string(), "**Band**, **1.2K Views**".to_string()))
        );
    }

    #[test]
    fn listing_is_bounded_with_overflow_marker() {
        let mut queue = Queue::new();
        for i in 0..5 {
            queue.append(entry(&format!("q{i}"), 60));
        }

        let snapshot =
            StatusSnapshot::capture(PlayerState::Playing, None, 0, Volume::new(50), &queue, 3);

        assert_eq!(snapshot.upcoming.len(), 3);
        assert_eq!(snapshot.hidden_entries, 2);
        assert_eq!(snapshot.overflow_marker().as_deref(), Some("...and 2 more"));

        let lines = snapshot.upcoming_lines();
        assert_eq!(lines[0].0, "1) q0");
        assert_eq!(lines[2].0, "3) q2");
        assert_eq!(lines[0].1, "**Band** in _Lounge_");
    }

    #[test]
    fn snapshot_serializes_for_remote_surfaces() {
        let current = entry("Song", 200);
        let snapshot = StatusSnapshot::capture(
            PlayerState::Playing,
            Some(&current),
            12,
            Volume::new(100),
            &Queue::new(),
            24,
        );

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "Playing");
        assert_eq!(json["progress"], "00:12/03:20");
        assert_eq!(json["now_playing"]["media"]["title"], "Song");
        assert_eq!(json["now_playing"]["destination"]["name"], "Lounge");
    }

    #[test]
    fn display_renders_every_section() {
        let current = entry("Now", 120);
        let mut queue = Queue::new();
        queue.append(entry("Next", 60));

        let text = StatusSnapshot::capture(
            PlayerState::Paused,
            Some(&current),
            30,
            Volume::new(40),
            &queue,
            24,
        )
        .to_string();

        assert!(text.starts_with("Paused, 00:30/02:00, 40% volume\n"));
        assert!(text.contains("  Now\n"));
        assert!(text.contains("1) Next - **Band** in _Lounge_"));
    }
}
