/// Sound engine: procedural chiptune effects via rodio.
///
/// Every effect is synthesised into an in-memory WAV buffer once, at
/// startup, and played fire-and-forget on a detached Sink.
///
/// Built without the "sound" feature, `SoundEngine` is a stub whose
/// `play` does nothing.

use crate::sim::event::GameEvent;

/// The effects the game can make.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Fire,
    Fizzle,
    Explosion,
    EnemyDown,
    Die,
    Win,
}

/// Which effect, if any, a step event makes.
pub fn sfx_for(event: &GameEvent) -> Option<Sfx> {
    match event {
        GameEvent::FireballLaunched { .. } => Some(Sfx::Fire),
        GameEvent::FireballFizzled { .. } => Some(Sfx::Fizzle),
        GameEvent::Explosion { .. } => Some(Sfx::Explosion),
        GameEvent::EnemyBurned { .. } | GameEvent::EnemyShot { .. } => Some(Sfx::EnemyDown),
        GameEvent::PlayerCaught { .. } => Some(Sfx::Die),
        GameEvent::LevelPassed => Some(Sfx::Win),
        GameEvent::EnemyMoved { .. }
        | GameEvent::PlayerMoved { .. }
        | GameEvent::PlayerBlocked { .. } => None,
    }
}

/// Effects for one tick, each at most once, in event order.
pub fn sfx_for_tick(events: &[GameEvent]) -> Vec<Sfx> {
    let mut out: Vec<Sfx> = Vec::new();
    for sfx in events.iter().filter_map(sfx_for) {
        if !out.contains(&sfx) {
            out.push(sfx);
        }
    }
    out
}

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        fire: Arc<Vec<u8>>,
        fizzle: Arc<Vec<u8>>,
        explosion: Arc<Vec<u8>>,
        enemy_down: Arc<Vec<u8>>,
        die: Arc<Vec<u8>>,
        win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        /// None when no output device is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                fire: Arc::new(make_wav(&gen_fire())),
                fizzle: Arc::new(make_wav(&gen_fizzle())),
                explosion: Arc::new(make_wav(&gen_explosion())),
                enemy_down: Arc::new(make_wav(&gen_enemy_down())),
                die: Arc::new(make_wav(&gen_die())),
                win: Arc::new(make_wav(&gen_win())),
            })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match sfx {
                Sfx::Fire => &self.fire,
                Sfx::Fizzle => &self.fizzle,
                Sfx::Explosion => &self.explosion,
                Sfx::EnemyDown => &self.enemy_down,
                Sfx::Die => &self.die,
                Sfx::Win => &self.win,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators (mono f32 samples)
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Fire: rising whoosh, sine sweep 300Hz → 1200Hz with a little hiss
    fn gen_fire() -> Vec<f32> {
        let n = samples_for(0.14);
        let mut rng = StdRng::seed_from_u64(7);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 300.0 + t * 900.0;
                phase += freq * 2.0 * PI / SAMPLE_RATE as f32;
                let hiss: f32 = rng.gen_range(-1.0..1.0);
                let env = (1.0 - t).powf(0.7);
                (phase.sin() * 0.7 + hiss * 0.3) * env * 0.25
            })
            .collect()
    }

    /// Fizzle: short damp pop
    fn gen_fizzle() -> Vec<f32> {
        let n = samples_for(0.06);
        let mut rng = StdRng::seed_from_u64(11);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let noise: f32 = rng.gen_range(-1.0..1.0);
                let thump = (i as f32 / SAMPLE_RATE as f32 * 140.0 * 2.0 * PI).sin();
                (noise * 0.4 + thump * 0.6) * (1.0 - t) * 0.2
            })
            .collect()
    }

    /// Explosion: noise burst over a falling rumble
    fn gen_explosion() -> Vec<f32> {
        let n = samples_for(0.25);
        let mut rng = StdRng::seed_from_u64(23);
        let mut phase = 0.0_f32;
        let mut smoothed = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 120.0 - t * 80.0;
                phase += freq * 2.0 * PI / SAMPLE_RATE as f32;
                let noise: f32 = rng.gen_range(-1.0..1.0);
                // one-pole lowpass so the burst thuds instead of hissing
                smoothed += (noise - smoothed) * 0.3;
                let env = (1.0 - t).powf(1.5);
                (smoothed * 0.7 + phase.sin() * 0.3) * env * 0.35
            })
            .collect()
    }

    /// Enemy down: two quick falling square-ish notes
    fn gen_enemy_down() -> Vec<f32> {
        let notes = [880.0_f32, 587.0]; // A5, D5
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = samples_for(0.05);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                let wave = (t * freq * 2.0 * PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * PI).sin() * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Death: slow minor descent, faded out
    fn gen_die() -> Vec<f32> {
        let notes = [392.0_f32, 349.0, 311.0, 233.0]; // G4 F4 Eb4 Bb3
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = samples_for(0.14);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                samples.push((t * freq * 2.0 * PI).sin() * env * 0.3);
            }
        }
        let fade_len = samples.len() / 3;
        let total = samples.len();
        for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade_len as f32;
        }
        samples
    }

    /// Door reached: major arpeggio with a held top note
    fn gen_win() -> Vec<f32> {
        let notes = [(523.0_f32, 0.09), (659.0, 0.09), (784.0, 0.09), (1047.0, 0.3)];
        let mut samples = Vec::new();
        for &(freq, dur) in &notes {
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(2.0);
                let wave = (t * freq * 2.0 * PI).sin() * 0.7
                    + (t * freq * 2.0 * 2.0 * PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder (16-bit PCM mono)
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let channels: u16 = 1;
        let bits: u16 = 16;
        let block_align = channels * bits / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API (stub when the sound feature is off)
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}
