//! IMU state collection
//!
//! Samples the vehicle's IMU state on a background thread at a fixed interval. A sample which
//! cannot be read is recorded as `None` so the collected series keeps its timing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::FlightCtrlError;
use crate::fc::{FlightController, ImuState};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Session relative path collected states are saved to when a collection stops.
const IMU_SAVE_PATH: &str = "imu/imu_states.json";

/// Longest time the sampling thread sleeps before checking whether it has been stopped.
const STOP_POLL_PERIOD: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Collects IMU samples. At most one collection runs at a time.
#[derive(Default)]
pub struct ImuCollector {
    samples: Arc<Mutex<Vec<Option<ImuState>>>>,
    worker: Mutex<Option<ImuWorker>>,
}

struct ImuWorker {
    active: Arc<AtomicBool>,
    join_handle: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ImuCollector {
    /// Start sampling every `interval`, the first sample is taken immediately.
    pub fn start(
        &self,
        fc: Arc<dyn FlightController>,
        interval: Duration,
    ) -> Result<(), FlightCtrlError> {
        if interval == Duration::from_millis(0) {
            return Err(FlightCtrlError::Validation(
                "Interval must be a positive integer".into(),
            ));
        }

        let mut worker = self.worker.lock()?;
        if worker.is_some() {
            return Err(FlightCtrlError::AlreadyActive("IMU collection"));
        }

        let active = Arc::new(AtomicBool::new(true));
        let active_clone = active.clone();
        let samples = self.samples.clone();

        let join_handle = thread::Builder::new()
            .name("imu_collection".into())
            .spawn(move || sample_loop(fc, active_clone, samples, interval))
            .map_err(|e| FlightCtrlError::ThreadSpawn("IMU collection", e))?;

        *worker = Some(ImuWorker {
            active,
            join_handle,
        });

        info!("IMU collection started, every {} ms", interval.as_millis());

        Ok(())
    }

    /// Stop sampling and save the collected states into the session.
    ///
    /// Returns the number of states collected so far.
    pub fn stop(&self) -> Result<usize, FlightCtrlError> {
        let worker = self
            .worker
            .lock()?
            .take()
            .ok_or(FlightCtrlError::NotActive("IMU collection"))?;

        worker.active.store(false, Ordering::SeqCst);
        if worker.join_handle.join().is_err() {
            return Err(FlightCtrlError::Poisoned);
        }

        let samples = self.samples.lock()?.clone();
        let num_samples = samples.len();
        util::session::save_with_timestamp(IMU_SAVE_PATH, samples);

        info!("IMU collection stopped with {} states", num_samples);

        Ok(num_samples)
    }

    pub fn is_active(&self) -> bool {
        self.worker.lock().map(|w| w.is_some()).unwrap_or(false)
    }

    /// States collected so far, oldest first.
    pub fn collected(&self) -> Result<Vec<Option<ImuState>>, FlightCtrlError> {
        Ok(self.samples.lock()?.clone())
    }

    pub fn clear(&self) -> Result<(), FlightCtrlError> {
        self.samples.lock()?.clear();
        Ok(())
    }
}

impl Drop for ImuCollector {
    fn drop(&mut self) {
        if let Ok(mut worker) = self.worker.lock() {
            if let Some(w) = worker.take() {
                w.active.store(false, Ordering::SeqCst);
                w.join_handle.join().ok();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn sample_loop(
    fc: Arc<dyn FlightController>,
    active: Arc<AtomicBool>,
    samples: Arc<Mutex<Vec<Option<ImuState>>>>,
    interval: Duration,
) {
    let mut next = Instant::now();

    while active.load(Ordering::SeqCst) {
        let now = Instant::now();

        if now >= next {
            let sample = match fc.state() {
                Ok(s) => Some(s.imu),
                Err(e) => {
                    debug!("Could not read the IMU state: {}", e);
                    None
                }
            };

            match samples.lock() {
                Ok(mut s) => s.push(sample),
                Err(_) => break,
            }

            next += interval;
        } else {
            thread::sleep((next - now).min(STOP_POLL_PERIOD));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fc::sim::{SimFc, SimParams};

    #[test]
    fn test_collection() {
        let fc = Arc::new(SimFc::new(SimParams::default()));
        let imu = ImuCollector::default();

        imu.start(fc.clone(), Duration::from_millis(10)).unwrap();
        assert!(imu.is_active());
        assert!(matches!(
            imu.start(fc.clone(), Duration::from_millis(10)),
            Err(FlightCtrlError::AlreadyActive(_))
        ));

        thread::sleep(Duration::from_millis(55));
        let num = imu.stop().unwrap();
        assert!(!imu.is_active());

        // First sample is immediate
        assert!(num >= 2);
        let collected = imu.collected().unwrap();
        assert_eq!(collected.len(), num);
        assert!(collected.iter().all(|s| s.is_some()));

        // Nothing more is collected once stopped
        thread::sleep(Duration::from_millis(30));
        assert_eq!(imu.collected().unwrap().len(), num);

        imu.clear().unwrap();
        assert!(imu.collected().unwrap().is_empty());
    }

    #[test]
    fn test_disconnected_samples() {
        let fc = Arc::new(SimFc::new(SimParams::default()));
        fc.set_connected(false);
        let imu = ImuCollector::default();

        imu.start(fc, Duration::from_millis(5)).unwrap();
        thread::sleep(Duration::from_millis(20));
        imu.stop().unwrap();

        let collected = imu.collected().unwrap();
        assert!(!collected.is_empty());
        assert!(collected.iter().all(|s| s.is_none()));
    }

    #[test]
    fn test_invalid_use() {
        let fc = Arc::new(SimFc::new(SimParams::default()));
        let imu = ImuCollector::default();

        assert!(matches!(
            imu.stop(),
            Err(FlightCtrlError::NotActive(_))
        ));
        assert!(matches!(
            imu.start(fc, Duration::from_millis(0)),
            Err(FlightCtrlError::Validation(_))
        ));
    }
}
