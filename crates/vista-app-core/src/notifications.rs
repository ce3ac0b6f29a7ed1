// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Server notification queue with auto-close TTL and dedupe.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use vista_proto::NotificationMessage;

/// One notification held by the queue.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Server-assigned id.
    pub id: String,
    /// Title line.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Spinner shown.
    pub loading: bool,
    /// Close button shown.
    pub with_close_button: bool,
    /// Auto-close delay; `None` stays until removed.
    pub ttl: Option<Duration>,
    /// Creation or last update time.
    pub updated: Instant,
}

/// Rendering-friendly view of a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationView {
    /// Server-assigned id.
    pub id: String,
    /// Title line.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Spinner shown.
    pub loading: bool,
    /// 1.0 just shown, 0.0 about to close; always 1.0 without a TTL.
    pub progress: f32,
}

/// Bounded notification queue.
///
/// A message reusing a live id updates that entry in place. A message with a
/// new id but the same title and body as an entry updated within the dedupe
/// window refreshes that entry instead of stacking a duplicate.
pub struct NotificationQueue {
    queue: VecDeque<Notification>,
    max: usize,
    dedupe_window: Duration,
}

impl NotificationQueue {
    /// Queue holding at most `max` entries (oldest dropped first).
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
            dedupe_window: Duration::from_millis(500),
        }
    }

    /// Show or update a notification. Returns the id of the entry touched.
    pub fn push(&mut self, msg: &NotificationMessage, now: Instant) -> String {
        let ttl = msg.auto_close.map(Duration::from_millis);
        let window = self.dedupe_window;
        if let Some(existing) = self.queue.iter_mut().find(|n| {
            n.id == msg.id
                || (n.title == msg.title
                    && n.body == msg.body
                    && now.saturating_duration_since(n.updated) <= window)
        }) {
            existing.title.clone_from(&msg.title);
            existing.body.clone_from(&msg.body);
            existing.loading = msg.loading;
            existing.with_close_button = msg.with_close_button;
            existing.ttl = ttl;
            existing.updated = now;
            return existing.id.clone();
        }

        if self.queue.len() == self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(Notification {
            id: msg.id.clone(),
            title: msg.title.clone(),
            body: msg.body.clone(),
            loading: msg.loading,
            with_close_button: msg.with_close_button,
            ttl,
            updated: now,
        });
        msg.id.clone()
    }

    /// Dismiss by id.
    pub fn remove(&mut self, id: &str) {
        self.queue.retain(|n| n.id != id);
    }

    fn alive(n: &Notification, now: Instant) -> bool {
        n.ttl
            .map_or(true, |ttl| now.saturating_duration_since(n.updated) < ttl)
    }

    /// Drop expired entries (call once per tick).
    pub fn retain_visible(&mut self, now: Instant) {
        self.queue.retain(|n| Self::alive(n, now));
    }

    /// Number of held entries, expired or not.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Render-ready entries with progress ratios.
    pub fn visible(&self, now: Instant) -> Vec<NotificationView> {
        self.queue
            .iter()
            .filter(|n| Self::alive(n, now))
            .map(|n| NotificationView {
                id: n.id.clone(),
                title: n.title.clone(),
                body: n.body.clone(),
                loading: n.loading,
                progress: n.ttl.map_or(1.0, |ttl| {
                    1.0 - now.saturating_duration_since(n.updated).as_secs_f32() / ttl.as_secs_f32()
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_note(id: &str, title: &str, auto_close: Option<u64>) -> NotificationMessage {
        NotificationMessage {
            id: id.into(),
            title: title.into(),
            body: String::new(),
            loading: false,
            with_close_button: true,
            auto_close,
        }
    }

    #[test]
    fn same_id_updates_in_place() {
        let mut q = NotificationQueue::new(4);
        let t0 = Instant::now();
        q.push(&make_note("n", "Loading", None), t0);
        let mut done = make_note("n", "Done", Some(1000));
        done.loading = false;
        q.push(&done, t0 + Duration::from_secs(5));
        assert_eq!(q.len(), 1);
        assert_eq!(q.visible(t0 + Duration::from_secs(5))[0].title, "Done");
    }

    #[test]
    fn identical_burst_is_deduped() {
        let mut q = NotificationQueue::new(4);
        let t0 = Instant::now();
        let a = q.push(&make_note("a", "Saved", None), t0);
        let b = q.push(&make_note("b", "Saved", None), t0 + Duration::from_millis(100));
        assert_eq!(a, b);
        assert_eq!(q.len(), 1);
        q.push(&make_note("c", "Saved", None), t0 + Duration::from_secs(2));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn auto_close_expires() {
        let mut q = NotificationQueue::new(4);
        let t0 = Instant::now();
        q.push(&make_note("a", "Brief", Some(200)), t0);
        q.push(&make_note("b", "Sticky", None), t0);
        let views = q.visible(t0 + Duration::from_millis(100));
        assert_eq!(views.len(), 2);
        assert!((views[0].progress - 0.5).abs() < 1e-3);
        q.retain_visible(t0 + Duration::from_millis(300));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn remove_and_capacity() {
        let mut q = NotificationQueue::new(2);
        let t0 = Instant::now();
        for (i, title) in ["one", "two", "three"].iter().enumerate() {
            q.push(&make_note(&i.to_string(), title, None), t0);
        }
        assert_eq!(q.len(), 2);
        q.remove("1");
        let ids: Vec<String> = q.visible(t0).into_iter().map(|v| v.id).collect();
        assert_eq!(ids, ["2"]);
    }
}
