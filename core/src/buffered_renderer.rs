use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicI64, AtomicUsize, Ordering},
        Arc, RwLock,
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, Receiver};
use tracing::debug;

use crate::{AudioPipe, AudioStreamParams};

const RENDER_TIME_HISTORY: usize = 100;

#[derive(Debug, Clone)]
struct BufferedRendererStats {
    /// Samples currently buffered. Negative while the reader waits for the render thread.
    samples: Arc<AtomicI64>,

    /// Samples left in the buffer after the last read.
    last_samples_after_read: Arc<AtomicI64>,

    /// Samples requested by the last read.
    last_request_samples: Arc<AtomicI64>,

    /// Most recent render loads, newest first. 1.0 means the whole time window was spent rendering.
    render_time: Arc<RwLock<VecDeque<f64>>>,

    /// Frames rendered per iteration.
    render_size: Arc<AtomicUsize>,
}

/// Read-only view of the [`BufferedRenderer`] statistics.
#[derive(Debug, Clone)]
pub struct BufferedRendererStatsReader {
    stats: BufferedRendererStats,
}

impl BufferedRendererStatsReader {
    pub fn samples(&self) -> i64 {
        self.stats.samples.load(Ordering::Relaxed)
    }

    pub fn last_samples_after_read(&self) -> i64 {
        self.stats.last_samples_after_read.load(Ordering::Relaxed)
    }

    pub fn last_request_samples(&self) -> i64 {
        self.stats.last_request_samples.load(Ordering::Relaxed)
    }

    pub fn render_size(&self) -> usize {
        self.stats.render_size.load(Ordering::Relaxed)
    }

    pub fn average_renderer_load(&self) -> f64 {
        match self.stats.render_time.read() {
            Ok(queue) if !queue.is_empty() => queue.iter().sum::<f64>() / queue.len() as f64,
            _ => 0.0,
        }
    }

    pub fn last_renderer_load(&self) -> f64 {
        match self.stats.render_time.read() {
            Ok(queue) => queue.front().copied().unwrap_or(0.0),
            Err(_) => 0.0,
        }
    }
}

/// Renders an [`AudioPipe`] ahead of time on a dedicated thread.
///
/// The audio driver callback only copies already rendered samples, so a slow
/// render iteration is absorbed by the buffer instead of causing a dropout.
/// The render thread works in small windows to keep the added latency low.
///
/// Meant for realtime playback only.
pub struct BufferedRenderer {
    stats: BufferedRendererStats,

    /// Rendered sample windows from the render thread.
    receive: Receiver<Vec<f32>>,

    /// Unread part of the last received window.
    remainder: Vec<f32>,

    stream_params: AudioStreamParams,
}

impl BufferedRenderer {
    /// Spawns the render thread. `render_size` is in frames.
    pub fn new<F: 'static + AudioPipe + Send>(
        mut render: F,
        stream_params: AudioStreamParams,
        render_size: usize,
    ) -> Self {
        let (tx, rx) = unbounded();

        let samples = Arc::new(AtomicI64::new(0));
        let last_request_samples = Arc::new(AtomicI64::new(0));
        let render_size = Arc::new(AtomicUsize::new(render_size.max(1)));
        let last_samples_after_read = Arc::new(AtomicI64::new(0));
        let render_time = Arc::new(RwLock::new(VecDeque::new()));

        let sample_rate = stream_params.sample_rate.max(1);
        let channels = stream_params.channels.count() as usize;

        {
            let samples = samples.clone();
            let last_request_samples = last_request_samples.clone();
            let render_size = render_size.clone();
            let render_time = render_time.clone();
            thread::spawn(move || loop {
                let size = render_size.load(Ordering::SeqCst);

                // Slightly shorter than real time so a late thread catches up.
                let delay = Duration::from_secs(1) * size as u32 / sample_rate * 90 / 100;

                // Wait while more than ~10% ahead of what the reader asks for.
                loop {
                    let samples = samples.load(Ordering::SeqCst);
                    let last_requested = last_request_samples.load(Ordering::SeqCst);
                    if samples > last_requested * 110 / 100 {
                        spin_sleep::sleep(delay / 10);
                    } else {
                        break;
                    }
                }

                let start = Instant::now();
                let end = start + delay;

                let mut vec = vec![0.0; size * channels];
                render.read_samples(&mut vec);

                samples.fetch_add(vec.len() as i64, Ordering::SeqCst);
                if tx.send(vec).is_err() {
                    debug!("buffered renderer dropped, stopping render thread");
                    break;
                }

                if let Ok(mut queue) = render_time.write() {
                    let elapsed = start.elapsed().as_secs_f64();
                    let total = delay.as_secs_f64().max(f64::EPSILON);
                    queue.push_front(elapsed / total);
                    queue.truncate(RENDER_TIME_HISTORY);
                }

                let now = Instant::now();
                if end > now {
                    spin_sleep::sleep(end - now);
                }
            });
        }

        Self {
            stats: BufferedRendererStats {
                samples,
                last_request_samples,
                render_time,
                render_size,
                last_samples_after_read,
            },
            receive: rx,
            remainder: Vec::new(),
            stream_params,
        }
    }

    /// Fills `dest` from the remainder and then from the render queue,
    /// blocking until enough samples are available.
    pub fn read(&mut self, dest: &mut [f32]) {
        let samples = self
            .stats
            .samples
            .fetch_sub(dest.len() as i64, Ordering::SeqCst);
        self.stats
            .last_request_samples
            .store(dest.len() as i64, Ordering::SeqCst);

        let len = dest.len().min(self.remainder.len());
        dest[..len].copy_from_slice(&self.remainder[..len]);
        self.remainder.drain(..len);
        let mut i = len;

        while i < dest.len() {
            let mut buf = match self.receive.recv() {
                Ok(buf) => buf,
                Err(_) => {
                    // Render thread is gone; output silence instead of stalling the driver.
                    dest[i..].fill(0.0);
                    break;
                }
            };

            let len = buf.len().min(dest.len() - i);
            dest[i..i + len].copy_from_slice(&buf[..len]);
            buf.drain(..len);
            i += len;

            self.remainder = buf;
        }

        self.stats
            .last_samples_after_read
            .store(samples, Ordering::Relaxed);
    }

    /// Sets the number of frames rendered per iteration.
    pub fn set_render_size(&self, size: usize) {
        self.stats.render_size.store(size.max(1), Ordering::SeqCst);
    }

    pub fn get_buffer_stats(&self) -> BufferedRendererStatsReader {
        BufferedRendererStatsReader {
            stats: self.stats.clone(),
        }
    }
}

impl AudioPipe for BufferedRenderer {
    fn stream_params(&self) -> &'_ AudioStreamParams {
        &self.stream_params
    }

    fn read_samples_unchecked(&mut self, to: &mut [f32]) {
        self.read(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelCount, FunctionAudioPipe};

    #[test]
    fn reads_across_window_boundaries() {
        let params = AudioStreamParams::new(48000, ChannelCount::Stereo);
        let mut counter = 0.0f32;
        let pipe = FunctionAudioPipe::new(params, move |out| {
            for s in out.iter_mut() {
                *s = counter;
                counter += 1.0;
            }
        });

        let mut renderer = BufferedRenderer::new(pipe, params, 48);

        let mut first = vec![0.0; 60];
        renderer.read(&mut first);
        let mut second = vec![0.0; 100];
        renderer.read(&mut second);

        let joined: Vec<f32> = first.into_iter().chain(second).collect();
        for (i, s) in joined.iter().enumerate() {
            assert_eq!(*s, i as f32);
        }
    }
}
