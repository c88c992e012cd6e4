// SPDX-License-Identifier: GPL-3.0-only

//! Filter selection
//!
//! Holds the single active filter and pushes every change to the surface
//! that renders it.

use super::notifications::Toasts;
use crate::constants::timing::TOAST;
use crate::filters::FilterId;
use crate::fl;
use crate::pipelines::photo::CaptureStage;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Something that renders with a filter
pub trait FilterTarget: Send + Sync {
    fn set_filter(&self, filter: FilterId);
}

impl FilterTarget for CaptureStage {
    fn set_filter(&self, filter: FilterId) {
        CaptureStage::set_filter(self, filter);
    }
}

pub struct FilterSelector {
    active: FilterId,
    target: Arc<dyn FilterTarget>,
    toasts: Toasts,
    toast_duration: Duration,
}

impl FilterSelector {
    pub fn new(target: Arc<dyn FilterTarget>, toasts: Toasts) -> Self {
        Self {
            active: FilterId::None,
            target,
            toasts,
            toast_duration: TOAST,
        }
    }

    pub fn with_toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }

    /// Make `filter` the active filter
    ///
    /// Unknown names become [`FilterId::None`]. Shows a notification naming
    /// the filter.
    pub fn select(&mut self, filter: impl Into<FilterId>) -> FilterId {
        let filter = filter.into();
        self.active = filter;
        self.target.set_filter(filter);

        let name = filter.display_name();
        self.toasts
            .push(fl!("filter-toast", name = name), self.toast_duration);
        info!(filter = %filter, "Filter selected");
        filter
    }

    pub fn reset(&mut self) {
        self.select(FilterId::None);
    }

    pub fn active(&self) -> FilterId {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<FilterId>>);

    impl FilterTarget for Recorder {
        fn set_filter(&self, filter: FilterId) {
            self.0.lock().unwrap().push(filter);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_propagates_and_notifies() {
        let target = Arc::new(Recorder::default());
        let toasts = Toasts::new();
        let mut selector = FilterSelector::new(target.clone(), toasts.clone());

        assert_eq!(selector.select("neon"), FilterId::Neon);
        assert_eq!(selector.active(), FilterId::Neon);
        assert_eq!(*target.0.lock().unwrap(), vec![FilterId::Neon]);
        assert_eq!(toasts.visible()[0].text, "Filter: Neon");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_names_select_none() {
        let target = Arc::new(Recorder::default());
        let mut selector = FilterSelector::new(target.clone(), Toasts::new());
        selector.select(FilterId::Rainbow);

        assert_eq!(selector.select("sparkle"), FilterId::None);
        assert_eq!(selector.active(), FilterId::None);
        assert_eq!(target.0.lock().unwrap().last(), Some(&FilterId::None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset() {
        let target = Arc::new(Recorder::default());
        let toasts = Toasts::new();
        let mut selector = FilterSelector::new(target, toasts.clone())
            .with_toast_duration(Duration::from_millis(100));
        selector.select(FilterId::Vintage);
        selector.reset();
        assert_eq!(selector.active(), FilterId::None);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(toasts.is_empty());
    }
}
