//! Audio voice state. Oscillator/waveform state is owned here independently of whether a
//! host chooses to play it back; the `playback` feature additionally wires a [Device] that
//! turns that state into actual sound via `rodio`.

/// The number of bytes making up an XO-CHIP audio pattern (128 bits, `F002`).
const PATTERN_SIZE_BYTES: usize = 16;
/// The number of distinct playback tracks MEGACHIP's `FX75`/`FX85` address.
const MEGACHIP_AUDIO_TRACKS: usize = 1;

/// Which kind of oscillator a [Voice] is currently producing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Waveform {
    /// A fixed 50% duty-cycle square wave at a fixed pitch (classic/CHIP-8E/SCHIP buzzer).
    Pulse,
    /// An XO-CHIP 128-bit arbitrary pattern, stepped at a pitch derived from `pattern_pitch`.
    Pattern,
    /// A MEGACHIP PCM byte stream played back from program memory.
    ByteStream,
}

/// The state of a single audio oscillator, stepped once per output sample by a host's audio
/// callback (not owned by this crate).
#[derive(Clone, Debug, PartialEq)]
pub struct Voice {
    pub waveform: Waveform,
    /// Current phase accumulator, in the range `[0.0, 1.0)`.
    pub phase: f32,
    /// Playback pitch; for [Waveform::Pattern] this is derived from `FX3A`'s `pattern_pitch`.
    pub frequency_hz: f32,
    /// The 128-bit XO-CHIP waveform pattern, MSB-first within each byte.
    pub pattern: [u8; PATTERN_SIZE_BYTES],
    /// `true` while the voice should be audibly playing.
    pub playing: bool,
}

impl Default for Voice {
    fn default() -> Self {
        Voice {
            waveform: Waveform::Pulse,
            phase: 0.0,
            frequency_hz: 440.0,
            pattern: [0u8; PATTERN_SIZE_BYTES],
            playing: false,
        }
    }
}

impl Voice {
    /// Returns the next sample in `[-1.0, 1.0]` and advances the phase accumulator by one
    /// sample's worth of phase at the given output sample rate, without mutating `playing`.
    pub fn next_sample(&mut self, sample_rate_hz: f32) -> f32 {
        if !self.playing {
            return 0.0;
        }
        let sample = match self.waveform {
            Waveform::Pulse => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Pattern => {
                let bit_index = (self.phase * 128.0) as usize % 128;
                let byte = self.pattern[bit_index / 8];
                if byte & (0x80 >> (bit_index % 8)) != 0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::ByteStream => 0.0,
        };
        self.phase = (self.phase + self.frequency_hz / sample_rate_hz).fract();
        sample
    }
}

/// Sets the XO-CHIP pattern pitch from `FX3A`'s operand, per `4000 * 2^((Vx - 64) / 48)`
/// (the formula used by the reference XO-CHIP implementation to derive playback rate from
/// the pitch register).
pub(crate) fn pitch_to_frequency(pitch: u8) -> f32 {
    4000.0 * 2f32.powf((pitch as f32 - 64.0) / 48.0)
}

/// The complete audio state owned by a [Processor](crate::processor::Processor): one voice
/// per dialect-supported kind, plus MEGACHIP's discrete track voices.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioState {
    pub voice: Voice,
    pub tracks: [Voice; MEGACHIP_AUDIO_TRACKS],
}

impl Default for AudioState {
    fn default() -> Self {
        AudioState {
            voice: Voice::default(),
            tracks: std::array::from_fn(|_| Voice::default()),
        }
    }
}

#[cfg(feature = "playback")]
mod device {
    use rodio::{source::SineWave, OutputStream, Sink};

    /// A `rodio`-backed audio output device, optional via the `playback` Cargo feature. This
    /// is a host-facing convenience; the authoritative voice *state* lives in [super::Voice]
    /// regardless of whether a host links this type in.
    pub struct Device {
        _stream: OutputStream,
        sink: Sink,
    }

    impl Device {
        /// Constructor that returns a [Device] instance whose audio source is a basic
        /// sinewave at the pitch 440hz (A). The stream begins in a paused state.
        pub fn new() -> Self {
            let (_stream, stream_handle) = OutputStream::try_default().unwrap();
            let sink: Sink = Sink::try_new(&stream_handle).unwrap();
            let device: Device = Device { _stream, sink };
            device.sink.append(SineWave::new(440.0));
            device.sink.pause();
            device
        }

        /// Resumes playback if the stream is paused.
        pub fn play(&self) {
            self.sink.play();
        }

        /// Pauses playback if the stream is playing.
        pub fn pause(&self) {
            self.sink.pause();
        }

        /// Returns true if the stream is currently paused, otherwise false.
        pub fn is_paused(&self) -> bool {
            self.sink.is_paused()
        }
    }
}

#[cfg(feature = "playback")]
pub use device::Device;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_voice_alternates_sign() {
        let mut voice = Voice {
            waveform: Waveform::Pulse,
            playing: true,
            ..Voice::default()
        };
        let first = voice.next_sample(8000.0);
        assert_eq!(first, 1.0);
    }

    #[test]
    fn test_silent_voice_returns_zero() {
        let mut voice = Voice::default();
        assert_eq!(voice.next_sample(8000.0), 0.0);
    }

    #[test]
    fn test_pitch_to_frequency_midpoint() {
        let frequency = pitch_to_frequency(64);
        assert!((frequency - 4000.0).abs() < 0.01);
    }

    #[test]
    fn test_pattern_voice_reads_msb_first() {
        let mut pattern = [0u8; PATTERN_SIZE_BYTES];
        pattern[0] = 0b1000_0000;
        let mut voice = Voice {
            waveform: Waveform::Pattern,
            playing: true,
            pattern,
            phase: 0.0,
            ..Voice::default()
        };
        assert_eq!(voice.next_sample(8000.0), 1.0);
    }
}
