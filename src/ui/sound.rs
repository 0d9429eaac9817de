/// Sound engine: procedural 8-bit style cues via rodio.
///
/// Every effect is generated as an in-memory WAV buffer at init time.
/// One-shots are fire-and-forget (detached sinks). The footstep and the
/// ambient loop each own a sink so they never stack up.
///
/// Compile without the "sound" feature to disable audio entirely (the
/// stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// One buffer per effect.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Sfx {
    Hurt,
    Step,
    Throw,
    Pickup,
    EnemyHurt,
    EnemyDie,
    BossAggro,
    BossHit,
    Win,
    Lose,
}

impl Sfx {
    pub const ALL: [Sfx; 10] = [
        Sfx::Hurt,
        Sfx::Step,
        Sfx::Throw,
        Sfx::Pickup,
        Sfx::EnemyHurt,
        Sfx::EnemyDie,
        Sfx::BossAggro,
        Sfx::BossHit,
        Sfx::Win,
        Sfx::Lose,
    ];

    /// Effect for a one-shot cue. Ambient cues and signals have none.
    pub fn for_event(event: GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::CharacterHurt => Some(Sfx::Hurt),
            GameEvent::WalkStep => Some(Sfx::Step),
            GameEvent::FireballThrown => Some(Sfx::Throw),
            GameEvent::ItemPicked => Some(Sfx::Pickup),
            GameEvent::EnemyHurt => Some(Sfx::EnemyHurt),
            GameEvent::EnemyDied => Some(Sfx::EnemyDie),
            GameEvent::BossAggro => Some(Sfx::BossAggro),
            GameEvent::BossHit => Some(Sfx::BossHit),
            GameEvent::WinJingle => Some(Sfx::Win),
            GameEvent::LoseJingle => Some(Sfx::Lose),
            GameEvent::AmbientStart
            | GameEvent::AmbientStop
            | GameEvent::Lost
            | GameEvent::Won
            | GameEvent::RestartRequested => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use super::Sfx;
    use crate::sim::event::GameEvent;

    pub(super) const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Sfx, Arc<Vec<u8>>>,
        ambient_buf: Arc<Vec<u8>>,
        ambient: Option<Sink>,
        steps: Option<Sink>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio output unavailable: {e}");
                    return None;
                }
            };

            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| (sfx, Arc::new(make_wav(&generate(sfx)))))
                .collect();

            Some(SoundEngine {
                _stream: stream,
                handle,
                buffers,
                ambient_buf: Arc::new(make_wav(&gen_ambient())),
                ambient: None,
                steps: None,
            })
        }

        fn decode(buf: &Arc<Vec<u8>>) -> Option<Decoder<Cursor<Vec<u8>>>> {
            Decoder::new(Cursor::new(buf.as_ref().clone())).ok()
        }

        fn play_detached(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(&sfx) else { return };
            if let (Ok(sink), Some(src)) = (Sink::try_new(&self.handle), Self::decode(buf)) {
                sink.append(src);
                sink.detach(); // fire-and-forget
            }
        }

        /// Footsteps: start a new step only once the previous one has finished.
        fn play_step(&mut self) {
            if self.steps.as_ref().is_some_and(|s| !s.empty()) {
                return;
            }
            let Some(buf) = self.buffers.get(&Sfx::Step) else { return };
            if let (Ok(sink), Some(src)) = (Sink::try_new(&self.handle), Self::decode(buf)) {
                sink.append(src);
                self.steps = Some(sink);
            }
        }

        fn start_ambient(&mut self) {
            if self.ambient.is_some() {
                return;
            }
            if let (Ok(sink), Some(src)) =
                (Sink::try_new(&self.handle), Self::decode(&self.ambient_buf))
            {
                sink.set_volume(0.4);
                sink.append(src.repeat_infinite());
                self.ambient = Some(sink);
            }
        }

        fn stop_ambient(&mut self) {
            if let Some(sink) = self.ambient.take() {
                sink.stop();
            }
        }

        pub fn play(&mut self, event: GameEvent) {
            match event {
                GameEvent::AmbientStart => self.start_ambient(),
                GameEvent::AmbientStop => {
                    self.stop_ambient();
                    if let Some(s) = self.steps.take() {
                        s.stop();
                    }
                }
                GameEvent::WalkStep => self.play_step(),
                other => {
                    if let Some(sfx) = Sfx::for_event(other) {
                        self.play_detached(sfx);
                    }
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    pub(super) fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Hurt => gen_sweep(520.0, 180.0, 0.18, 0.3, 0.35),
            Sfx::Step => gen_noise_tap(0.05),
            Sfx::Throw => gen_whoosh(),
            Sfx::Pickup => gen_arpeggio(&[1047.0, 1319.0, 1568.0], 0.045, 0.25),
            Sfx::EnemyHurt => gen_sweep(260.0, 120.0, 0.14, 0.5, 0.3),
            Sfx::EnemyDie => gen_arpeggio(&[330.0, 247.0, 165.0], 0.09, 0.3),
            Sfx::BossAggro => gen_sweep(90.0, 60.0, 0.6, 0.2, 0.45),
            Sfx::BossHit => gen_sweep(180.0, 70.0, 0.2, 0.6, 0.35),
            Sfx::Win => gen_fanfare(),
            Sfx::Lose => gen_arpeggio(&[440.0, 370.0, 311.0, 261.0], 0.14, 0.3),
        }
    }

    fn tone(t: f32, freq: f32) -> f32 {
        (t * freq * 2.0 * PI).sin()
    }

    /// Pitch glide from `from` to `to` with a `noise` share of LCG noise.
    fn gen_sweep(from: f32, to: f32, duration: f32, noise: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 0x2545_f491;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let hiss = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.7);
                ((phase * 2.0 * PI).sin() * (1.0 - noise) + hiss * noise) * env * volume
            })
            .collect()
    }

    /// Short filtered noise burst.
    fn gen_noise_tap(duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        let mut last = 0.0_f32;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                last = last * 0.8 + noise * 0.2; // crude low-pass
                let env = 1.0 - i as f32 / n as f32;
                last * env * 0.5
            })
            .collect()
    }

    fn gen_whoosh() -> Vec<f32> {
        let duration = 0.22;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 777;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let crackle = tone(ti, 150.0 + t * 500.0);
                let env = (t * PI).sin();
                (noise * 0.7 + crackle * 0.3) * env * 0.3
            })
            .collect()
    }

    fn gen_arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                // Square-ish wave (sine + 3rd harmonic) for retro feel
                let wave = tone(t, freq) * 0.7 + tone(t, freq * 3.0) * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Victory: ascending fanfare with a sustained last note
    fn gen_fanfare() -> Vec<f32> {
        let mut samples = gen_arpeggio(&[523.0, 659.0, 784.0], 0.1, 0.3);
        let last_freq = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.35) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let wave = tone(t, last_freq) * 0.6 + tone(t, last_freq * 2.0) * 0.3;
            samples.push(wave * env * 0.3);
        }
        samples
    }

    /// Ambient bed: slow two-chord drone, loops seamlessly at whole cycles.
    fn gen_ambient() -> Vec<f32> {
        let chords = [[110.0_f32, 165.0, 220.0], [98.0, 147.0, 196.0]];
        let chord_dur = 2.0;
        let mut samples = Vec::new();
        for chord in &chords {
            let n = (SAMPLE_RATE as f32 * chord_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let swell = (i as f32 / n as f32 * PI).sin();
                let wave: f32 = chord.iter().map(|&f| tone(t, f)).sum::<f32>() / chord.len() as f32;
                samples.push(wave * swell * 0.2);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&mut self, _event: GameEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_and_ambient_have_no_one_shot() {
        for e in [GameEvent::Lost, GameEvent::Won, GameEvent::RestartRequested,
                  GameEvent::AmbientStart, GameEvent::AmbientStop] {
            assert_eq!(Sfx::for_event(e), None);
        }
        assert_eq!(Sfx::for_event(GameEvent::BossHit), Some(Sfx::BossHit));
        assert_eq!(Sfx::for_event(GameEvent::WinJingle), Some(Sfx::Win));
    }

    #[cfg(feature = "sound")]
    #[test]
    fn wav_buffers_are_well_formed() {
        for sfx in Sfx::ALL {
            let samples = inner::generate(sfx);
            assert!(!samples.is_empty(), "{sfx:?}");
            let wav = inner::make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let rate = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
            assert_eq!(rate, inner::SAMPLE_RATE);
        }
    }
}
