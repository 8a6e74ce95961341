//! Audio cues and background music
//!
//! The simulation only raises [`SoundCue`]s; an [`AudioSink`] turns them into
//! sound. On the web that is the Web Audio [`AudioManager`], procedurally
//! generated with oscillators, no external files.

use crate::progression::TrackId;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Player fired
    Shoot,
    /// Enemy destroyed / bomb
    Explosion,
    /// Power-up collected or combo extended
    Powerup,
    /// Player lost a life
    Hit,
    LevelUp,
    /// Boss encounter starting
    Boss,
}

impl SoundCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Shoot => "shoot",
            SoundCue::Explosion => "explosion",
            SoundCue::Powerup => "powerup",
            SoundCue::Hit => "hit",
            SoundCue::LevelUp => "levelUp",
            SoundCue::Boss => "boss",
        }
    }
}

/// Fire-and-forget audio output
pub trait AudioSink {
    fn play_cue(&mut self, cue: SoundCue);

    /// One music note
    fn play_note(&mut self, freq: f32, duration_ms: f64);
}

/// Silent sink
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_cue(&mut self, _cue: SoundCue) {}
    fn play_note(&mut self, _freq: f32, _duration_ms: f64) {}
}

/// Keeps everything it is asked to play
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub cues: Vec<SoundCue>,
    pub notes: Vec<f32>,
}

impl AudioSink for RecordingAudio {
    fn play_cue(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }

    fn play_note(&mut self, freq: f32, _duration_ms: f64) {
        self.notes.push(freq);
    }
}

/// Delay between melody notes (ms)
pub const NOTE_INTERVAL_MS: f64 = 500.0;
/// Audible length of each note (ms)
pub const NOTE_LENGTH_MS: f64 = 400.0;

/// Loops a track's melody, one note per interval, while playing
#[derive(Debug, Clone)]
pub struct MusicSequencer {
    track: TrackId,
    playing: bool,
    next_note: usize,
    clock_ms: f64,
    due_ms: f64,
}

impl Default for MusicSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicSequencer {
    pub fn new() -> Self {
        Self {
            track: TrackId::default(),
            playing: false,
            next_note: 0,
            clock_ms: 0.0,
            due_ms: 0.0,
        }
    }

    /// Start `track` from its first note (played on the next advance)
    pub fn start(&mut self, track: TrackId) {
        self.track = track;
        self.playing = true;
        self.next_note = 0;
        self.clock_ms = 0.0;
        self.due_ms = 0.0;
        log::debug!("Music started: {}", track.name());
    }

    pub fn stop(&mut self) {
        if self.playing {
            log::debug!("Music stopped");
        }
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn track(&self) -> TrackId {
        self.track
    }

    /// Advance by `elapsed_ms`, emitting every note that fell due
    pub fn advance(&mut self, elapsed_ms: f64, sink: &mut dyn AudioSink) {
        if !self.playing {
            return;
        }
        let melody = self.track.melody();
        if melody.is_empty() {
            return;
        }

        self.clock_ms += elapsed_ms;
        while self.clock_ms >= self.due_ms {
            sink.play_note(melody[self.next_note], NOTE_LENGTH_MS);
            self.next_note = (self.next_note + 1) % melody.len();
            self.due_ms += NOTE_INTERVAL_MS;
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundCue};

    /// Web Audio output
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        music_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                music_volume: 1.0,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_volumes(&mut self, master: f32, sfx: f32, music: f32) {
            self.master_volume = master.clamp(0.0, 1.0);
            self.sfx_volume = sfx.clamp(0.0, 1.0);
            self.music_volume = music.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn volume(&self, channel: f32) -> f32 {
            if self.muted {
                0.0
            } else {
                self.master_volume * channel
            }
        }

        fn context(&self) -> Option<&AudioContext> {
            let ctx = self.ctx.as_ref()?;
            // Browsers suspend until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            Some(ctx)
        }

        /// Oscillator routed through a gain node to the output
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Frequency sweep `from` -> `to` with a decaying envelope
        fn sweep(
            ctx: &AudioContext,
            osc_type: OscillatorType,
            from: f32,
            to: f32,
            peak: f32,
            secs: f64,
        ) {
            let Some((osc, gain)) = Self::create_osc(ctx, from, osc_type) else {
                return;
            };
            let t = ctx.current_time();

            osc.frequency().set_value_at_time(from, t).ok();
            if to != from {
                osc.frequency()
                    .exponential_ramp_to_value_at_time(to, t + secs)
                    .ok();
            }
            gain.gain().set_value_at_time(peak, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + secs)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + secs).ok();
        }

        /// Three-step arpeggio
        fn play_level_up(ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = Self::create_osc(ctx, 523.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            osc.frequency().set_value_at_time(523.0, t).ok();
            osc.frequency().set_value_at_time(659.0, t + 0.1).ok();
            osc.frequency().set_value_at_time(784.0, t + 0.2).ok();
            gain.gain().set_value_at_time(0.2 * vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }
    }

    impl AudioSink for AudioManager {
        fn play_cue(&mut self, cue: SoundCue) {
            let vol = self.volume(self.sfx_volume);
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = self.context() else { return };

            match cue {
                SoundCue::Shoot => {
                    Self::sweep(ctx, OscillatorType::Sine, 800.0, 200.0, 0.1 * vol, 0.1)
                }
                SoundCue::Explosion => {
                    Self::sweep(ctx, OscillatorType::Sawtooth, 200.0, 50.0, 0.3 * vol, 0.5)
                }
                SoundCue::Powerup => {
                    Self::sweep(ctx, OscillatorType::Sine, 400.0, 800.0, 0.2 * vol, 0.2)
                }
                SoundCue::Hit => {
                    Self::sweep(ctx, OscillatorType::Square, 100.0, 100.0, 0.3 * vol, 0.2)
                }
                SoundCue::LevelUp => Self::play_level_up(ctx, vol),
                SoundCue::Boss => {
                    Self::sweep(ctx, OscillatorType::Sawtooth, 60.0, 40.0, 0.2 * vol, 1.0)
                }
            }
        }

        fn play_note(&mut self, freq: f32, duration_ms: f64) {
            // Music bus sits at 0.1 of the note envelope
            let vol = self.volume(self.music_volume) * 0.1;
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = self.context() else { return };
            let Some((osc, gain)) = Self::create_osc(ctx, freq, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();
            let secs = duration_ms / 1000.0;

            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(0.3 * vol, t + 0.05)
                .ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + secs).ok();

            osc.start().ok();
            osc.stop_with_when(t + secs).ok();
        }
    }
}
