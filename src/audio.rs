//! Audio playback for phase completion sounds.

use crate::engine::EngineEvent;
use crate::models::TimerMode;
use rodio::source::{SineWave, Source, Zero};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
}

/// Short tone sequences played at transition points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chime {
    /// Work finished: descending pair.
    WorkDone,
    /// Break finished: ascending pair.
    BreakDone,
    /// Daily goal reached: rising triad.
    GoalReached,
}

impl Chime {
    /// Picks the chime for an engine event, if it has one.
    pub fn for_event(event: &EngineEvent) -> Option<Self> {
        match event {
            EngineEvent::PhaseCompleted {
                mode: TimerMode::Work,
            } => Some(Self::WorkDone),
            EngineEvent::PhaseCompleted { .. } => Some(Self::BreakDone),
            EngineEvent::MilestoneReached { percent: 100 } => Some(Self::GoalReached),
            _ => None,
        }
    }

    /// Frequencies in Hz, played in order.
    fn tones(self) -> &'static [f32] {
        match self {
            Self::WorkDone => &[1046.5, 880.0],
            Self::BreakDone => &[880.0, 1046.5],
            Self::GoalReached => &[880.0, 1108.7, 1318.5],
        }
    }
}

pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioPlayer {
    /// Creates a new audio player.
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    pub fn play_chime(&self, chime: Chime) {
        if let Err(e) = self.play_tones(chime.tones()) {
            warn!(error = %e, ?chime, "Failed to play chime");
        }
    }

    fn play_tones(&self, tones: &[f32]) -> Result<(), AudioError> {
        let sink = Sink::try_new(&self.handle)?;

        for (i, &freq) in tones.iter().enumerate() {
            if i > 0 {
                let silence = Zero::<f32>::new(1, 44100).take_duration(Duration::from_millis(50));
                sink.append(silence);
            }
            let tone = SineWave::new(freq)
                .take_duration(Duration::from_millis(160))
                .amplify(0.3);
            sink.append(tone);
        }
        sink.detach(); // Play in background

        Ok(())
    }
}
