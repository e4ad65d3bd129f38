use std::sync::Mutex;

/// Receiver for best-effort upload progress, in percent of bytes sent.
///
/// Delivery is not guaranteed and never gates the upload itself; a slow or
/// panicking observer must not be able to fail a transfer, so observers
/// should be cheap and infallible.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, percent: f32);
}

impl<F> ProgressObserver for F
where
    F: Fn(f32) + Send + Sync,
{
    fn on_progress(&self, percent: f32) {
        self(percent);
    }
}

/// Observer that records every reported percentage, for tests.
#[derive(Default)]
pub struct CollectingObserver {
    seen: Mutex<Vec<f32>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<f32> {
        self.seen.lock().unwrap().clone()
    }
}

impl ProgressObserver for CollectingObserver {
    fn on_progress(&self, percent: f32) {
        self.seen.lock().unwrap().push(percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_observers() {
        let observed = Mutex::new(Vec::new());
        let observer = |p: f32| observed.lock().unwrap().push(p);
        observer.on_progress(50.0);
        observer.on_progress(100.0);
        assert_eq!(*observed.lock().unwrap(), vec![50.0, 100.0]);
    }

    #[test]
    fn collecting_observer_records() {
        let observer = CollectingObserver::new();
        observer.on_progress(25.0);
        observer.on_progress(100.0);
        assert_eq!(observer.seen(), vec![25.0, 100.0]);
    }
}
