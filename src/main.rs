// src/main.rs

use std::f32::consts::TAU;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use waveform_cache::{Clip, Recorder, SessionConfig, SummaryRequest};

fn main() -> Result<(), anyhow::Error> {
    let args: Vec<String> = std::env::args().collect();
    let config = if args.len() > 1 {
        SessionConfig::load_from_disk(&args[1])?
    } else {
        SessionConfig::default()
    };

    let clip = Arc::new(Clip::new(&config.clip));
    let rate = config.clip.sample_rate;
    let channels = config.clip.channels;
    println!("Clip {} | {} Hz | {} channel(s)", clip.id(), rate, channels);

    // 1. Record three seconds of a 220 Hz tone, 10ms per block
    let mut recorder = Recorder::start(clip.clone(), &config.capture)?;
    let block_frames = (rate / 100) as usize;
    let mut phase = 0usize;
    for _ in 0..300 {
        let mut block = Vec::with_capacity(block_frames * channels);
        for _ in 0..block_frames {
            let s = (TAU * 220.0 * phase as f32 / rate as f32).sin() * 0.8;
            block.extend(std::iter::repeat_n(s, channels));
            phase += 1;
        }
        let mut offset = 0;
        while offset < block.len() {
            let n = recorder.push_interleaved(&block[offset..]);
            if n == 0 {
                thread::sleep(Duration::from_millis(1));
            }
            offset += n;
        }
    }
    println!("Captured {:.2}s so far", recorder.record_time().as_secs_f64());

    // 2. Zoom and scroll while part of the take is still uncommitted
    let steps = [
        ("initial", SummaryRequest::new(0.0, 100.0, 200)),
        ("redraw", SummaryRequest::new(0.0, 100.0, 200)),
        ("scroll right", SummaryRequest::new(0.5, 100.0, 200)),
        ("scroll left", SummaryRequest::new(0.25, 100.0, 200)),
        ("zoom in", SummaryRequest::new(0.25, 400.0, 200)),
    ];
    for (label, request) in steps {
        let view = {
            let mut cache = clip.waveform_cache().lock().map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
            cache.fetch(&clip, 0, request)?
        };
        let peak = view.maxima().iter().copied().fold(0.0f32, f32::max);
        let loudest = view.rms().iter().copied().fold(0.0f32, f32::max);
        println!(
            "{:<13} {:?} | peak {:.3} | rms {:.3}",
            label,
            view.outcome(),
            peak,
            loudest
        );
    }

    recorder.stop()?;
    println!("Stopped. {} frames recorded.", clip.read_channel(0)?.committed_len());
    Ok(())
}
