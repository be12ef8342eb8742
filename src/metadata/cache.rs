use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::library::{Catalog, Track};

use super::reader::TagReader;

/// Fill in whatever `reader` can find for `track`.
///
/// Never fails: on any error the track comes back unchanged. Fields the tags
/// leave empty keep their current values, so resolving twice is harmless.
pub fn resolve(reader: &dyn TagReader, track: &Track) -> Track {
    let mut out = track.clone();
    match reader.read_tags(&track.location) {
        Ok(info) => {
            if let Some(title) = info.title {
                out.title = title;
            }
            if info.artist.is_some() {
                out.artist = info.artist;
            }
            if info.album.is_some() {
                out.album = info.album;
            }
            if let Some(d) = info.duration {
                out.duration = d;
            }
            if let Some(art) = info.artwork {
                out.artwork = Some(Arc::new(art));
            }
        }
        Err(e) => tracing::debug!("metadata: {e}"),
    }
    out
}

/// A resolved track on its way back to the foreground.
#[derive(Debug)]
pub struct MetadataUpdate {
    pub generation: u64,
    pub index: usize,
    pub track: Track,
}

/// Jobs queued or running, by catalog generation and location.
type InFlight = Arc<Mutex<HashSet<(u64, PathBuf)>>>;

struct Job {
    generation: u64,
    index: usize,
    track: Track,
}

/// Background tag resolution.
///
/// A fixed pool of workers pulls jobs from a shared queue. Results go out on
/// one channel, in completion order, to whoever owns the receiver handed out
/// by [`MetadataCache::new`]. Workers never touch the catalog themselves.
pub struct MetadataCache {
    jobs: Option<Sender<Job>>,
    in_flight: InFlight,
    workers: Vec<JoinHandle<()>>,
}

impl MetadataCache {
    pub fn new(reader: Arc<dyn TagReader>, workers: usize) -> (Self, Receiver<MetadataUpdate>) {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (update_tx, update_rx) = mpsc::channel::<MetadataUpdate>();
        let job_rx = Arc::new(Mutex::new(job_rx));
        let in_flight = InFlight::default();

        let workers = (0..workers.max(1))
            .map(|n| {
                let reader = reader.clone();
                let job_rx = job_rx.clone();
                let update_tx = update_tx.clone();
                let in_flight = in_flight.clone();
                thread::Builder::new()
                    .name(format!("metadata-{n}"))
                    .spawn(move || worker_loop(reader, job_rx, update_tx, in_flight))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!("could not start metadata worker: {e}");
                    None
                }
            })
            .collect();

        (
            Self {
                jobs: Some(job_tx),
                in_flight,
                workers,
            },
            update_rx,
        )
    }

    /// Queue one track. Returns `false` when that location is already being
    /// resolved for the same generation or no worker is running.
    ///
    /// A job left over from an older generation does not count: its result
    /// will be dropped, so the new catalog needs its own.
    pub fn request(&self, generation: u64, index: usize, track: &Track) -> bool {
        let Some(jobs) = self.jobs.as_ref() else {
            return false;
        };
        if self.workers.is_empty() {
            return false;
        }
        let key = (generation, track.location.clone());
        if let Ok(mut set) = self.in_flight.lock() {
            if !set.insert(key.clone()) {
                return false;
            }
        }
        let job = Job {
            generation,
            index,
            track: track.clone(),
        };
        if jobs.send(job).is_err() {
            if let Ok(mut set) = self.in_flight.lock() {
                set.remove(&key);
            }
            return false;
        }
        true
    }

    /// Queue every track of `catalog` that has no duration yet.
    pub fn request_catalog(&self, catalog: &Catalog) -> usize {
        catalog
            .tracks()
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.has_duration())
            .filter(|(i, t)| self.request(catalog.generation(), *i, t))
            .count()
    }

    /// Stop accepting work and wait for the workers to exit.
    pub fn shutdown(mut self) {
        self.jobs.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    reader: Arc<dyn TagReader>,
    jobs: Arc<Mutex<Receiver<Job>>>,
    updates: Sender<MetadataUpdate>,
    in_flight: InFlight,
) {
    loop {
        // Hold the lock only while taking a job, not while reading tags.
        let job = match jobs.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => return,
        };
        let Ok(job) = job else {
            return;
        };

        let track = resolve(reader.as_ref(), &job.track);
        if let Ok(mut set) = in_flight.lock() {
            set.remove(&(job.generation, job.track.location.clone()));
        }
        let update = MetadataUpdate {
            generation: job.generation,
            index: job.index,
            track,
        };
        if updates.send(update).is_err() {
            // Nobody is listening any more.
            return;
        }
    }
}
