// SPDX-License-Identifier: GPL-3.0-only

//! Transient notifications
//!
//! Each toast removes itself when its lifetime ends. The dismissal task only
//! holds a weak reference to the list, so dropping the list ends everything.

use crate::constants::timing::TOAST_SLIDE_FRACTION;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub text: String,
    pub shown_at: Instant,
    pub duration: Duration,
}

impl Toast {
    /// Slide-in/out visibility at `now`, from 0.0 (offscreen) to 1.0
    pub fn visibility(&self, now: Instant) -> f32 {
        let total = self.duration.as_secs_f32();
        if total <= 0.0 {
            return 0.0;
        }
        let t = (now.saturating_duration_since(self.shown_at).as_secs_f32() / total).clamp(0.0, 1.0);
        if t < TOAST_SLIDE_FRACTION {
            t / TOAST_SLIDE_FRACTION
        } else if t > 1.0 - TOAST_SLIDE_FRACTION {
            (1.0 - t) / TOAST_SLIDE_FRACTION
        } else {
            1.0
        }
    }
}

#[derive(Debug, Default)]
struct ToastList {
    next_id: u64,
    items: Vec<Toast>,
}

/// Shared list of visible toasts
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    inner: Arc<Mutex<ToastList>>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(list: &Mutex<ToastList>) -> MutexGuard<'_, ToastList> {
        list.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show `text` for `duration`, then remove it
    pub fn push(&self, text: impl Into<String>, duration: Duration) -> u64 {
        let id = {
            let mut list = Self::lock(&self.inner);
            let id = list.next_id;
            list.next_id += 1;
            list.items.push(Toast {
                id,
                text: text.into(),
                shown_at: Instant::now(),
                duration,
            });
            id
        };

        let list: Weak<Mutex<ToastList>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(list) = list.upgrade() {
                Self::lock(&list).items.retain(|toast| toast.id != id);
            }
        });

        id
    }

    /// Toasts currently on screen, oldest first
    pub fn visible(&self) -> Vec<Toast> {
        Self::lock(&self.inner).items.clone()
    }

    pub fn len(&self) -> usize {
        Self::lock(&self.inner).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_toast_dismisses_itself() {
        let toasts = Toasts::new();
        toasts.push("Filter: Neon", Duration::from_millis(2000));
        assert_eq!(toasts.visible()[0].text, "Filter: Neon");

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(toasts.len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(toasts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toasts_stack_and_expire_independently() {
        let toasts = Toasts::new();
        toasts.push("a", Duration::from_millis(2000));
        tokio::time::sleep(Duration::from_millis(500)).await;
        toasts.push("b", Duration::from_millis(2000));

        tokio::time::sleep(Duration::from_millis(1600)).await;
        let texts: Vec<_> = toasts.visible().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, ["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_curve() {
        let toast = Toast {
            id: 0,
            text: String::new(),
            shown_at: Instant::now(),
            duration: Duration::from_millis(2000),
        };
        let at = |ms| toast.shown_at + Duration::from_millis(ms);
        assert_eq!(toast.visibility(at(0)), 0.0);
        assert!((toast.visibility(at(150)) - 0.5).abs() < 0.01);
        assert_eq!(toast.visibility(at(1000)), 1.0);
        assert!((toast.visibility(at(1850)) - 0.5).abs() < 0.01);
        assert_eq!(toast.visibility(at(2000)), 0.0);
    }
}
