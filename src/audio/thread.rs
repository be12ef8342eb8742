use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::DeviceError;

use super::device::PlaybackDevice;

type Reply<T> = Sender<Result<T, DeviceError>>;

enum AudioCmd {
    Load(PathBuf, Reply<()>),
    Play(Reply<()>),
    Pause(Reply<()>),
    Resume(Reply<()>),
    Stop(Reply<()>),
    SetVolume(f32, Reply<()>),
    Seek(Duration, Reply<()>),
    Position(Reply<Duration>),
    IsBusy(Reply<bool>),
    /// Fade out over the given duration, stop, and exit the thread.
    Quit(Duration),
}

/// Handle to the thread that owns the real output device.
///
/// Every device call becomes a message processed in arrival order, so the
/// audio thread is the one place device state changes. Callers wait at most
/// `timeout` for an answer. A load or play that completes after its caller
/// gave up is undone with a stop, so a timed-out start never leaves sound
/// playing behind the caller's back.
pub struct AudioThread {
    tx: Sender<AudioCmd>,
    timeout: Duration,
    join: Option<JoinHandle<()>>,
}

impl AudioThread {
    /// Start the audio thread and open the device on it with `open`.
    pub fn spawn<F>(open: F, timeout: Duration) -> Result<Self, DeviceError>
    where
        F: FnOnce() -> Result<Box<dyn PlaybackDevice>, DeviceError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), DeviceError>>();

        let join = thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || {
                let device = match open() {
                    Ok(device) => {
                        let _ = ready_tx.send(Ok(()));
                        device
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                command_loop(device, rx);
            })
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        match ready_rx.recv_timeout(timeout) {
            Ok(Ok(())) => Ok(Self {
                tx,
                timeout,
                join: Some(join),
            }),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) => Err(DeviceError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(DeviceError::Disconnected),
        }
    }

    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> AudioCmd) -> Result<T, DeviceError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(make(reply_tx))
            .map_err(|_| DeviceError::Disconnected)?;
        match reply_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(DeviceError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(DeviceError::Disconnected),
        }
    }

    /// Fade out, stop the device and wait for the thread to exit.
    pub fn shutdown(&mut self, fade_out: Duration) {
        let Some(join) = self.join.take() else {
            return;
        };
        let _ = self.tx.send(AudioCmd::Quit(fade_out));
        let _ = join.join();
    }
}

impl Drop for AudioThread {
    fn drop(&mut self) {
        self.shutdown(Duration::ZERO);
    }
}

impl PlaybackDevice for AudioThread {
    fn load(&mut self, location: &Path) -> Result<(), DeviceError> {
        let location = location.to_path_buf();
        self.request(|r| AudioCmd::Load(location, r))
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        self.request(AudioCmd::Play)
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        self.request(AudioCmd::Pause)
    }

    fn resume(&mut self) -> Result<(), DeviceError> {
        self.request(AudioCmd::Resume)
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.request(AudioCmd::Stop)
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), DeviceError> {
        self.request(|r| AudioCmd::SetVolume(volume, r))
    }

    fn seek(&mut self, position: Duration) -> Result<(), DeviceError> {
        self.request(|r| AudioCmd::Seek(position, r))
    }

    fn position(&mut self) -> Result<Duration, DeviceError> {
        self.request(AudioCmd::Position)
    }

    fn is_busy(&mut self) -> Result<bool, DeviceError> {
        self.request(AudioCmd::IsBusy)
    }
}

fn command_loop(mut device: Box<dyn PlaybackDevice>, rx: Receiver<AudioCmd>) {
    let mut volume = 1.0_f32;

    while let Ok(cmd) = rx.recv() {
        match cmd {
            AudioCmd::Load(location, reply) => {
                if reply.send(device.load(&location)).is_err() {
                    stop_abandoned(device.as_mut(), "load");
                }
            }
            AudioCmd::Play(reply) => {
                if reply.send(device.play()).is_err() {
                    stop_abandoned(device.as_mut(), "play");
                }
            }
            AudioCmd::Pause(reply) => {
                let _ = reply.send(device.pause());
            }
            AudioCmd::Resume(reply) => {
                let _ = reply.send(device.resume());
            }
            AudioCmd::Stop(reply) => {
                let _ = reply.send(device.stop());
            }
            AudioCmd::SetVolume(v, reply) => {
                let result = device.set_volume(v);
                if result.is_ok() {
                    volume = v;
                }
                let _ = reply.send(result);
            }
            AudioCmd::Seek(position, reply) => {
                let _ = reply.send(device.seek(position));
            }
            AudioCmd::Position(reply) => {
                let _ = reply.send(device.position());
            }
            AudioCmd::IsBusy(reply) => {
                let _ = reply.send(device.is_busy());
            }
            AudioCmd::Quit(fade_out) => {
                fade_out_device(device.as_mut(), volume, fade_out);
                if let Err(e) = device.stop() {
                    tracing::debug!("stop on quit failed: {e}");
                }
                break;
            }
        }
    }
}

/// The reply channel is gone: the caller timed out and reported failure.
fn stop_abandoned(device: &mut dyn PlaybackDevice, what: &str) {
    tracing::warn!("{what} finished after the caller timed out; stopping");
    if let Err(e) = device.stop() {
        tracing::debug!("stop after abandoned {what} failed: {e}");
    }
}

/// Ramp the volume down to silence over `fade_out`.
pub(super) fn fade_out_device(device: &mut dyn PlaybackDevice, from: f32, fade_out: Duration) {
    if fade_out.is_zero() || !device.is_busy().unwrap_or(false) {
        return;
    }
    let steps: u32 = 20;
    let step = (fade_out / steps).max(Duration::from_millis(1));
    for n in 1..=steps {
        let t = n as f32 / steps as f32;
        if device.set_volume(from * (1.0 - t)).is_err() {
            return;
        }
        thread::sleep(step);
    }
}
