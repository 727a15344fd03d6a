use std::time::{Duration, Instant};

/// How long a toast stays on screen.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub created_at: Instant,
}

/// Transient notifications, oldest first.
#[derive(Debug)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    ttl: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            ttl,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    fn push(&mut self, kind: ToastKind, message: String) {
        self.toasts.push(Toast {
            kind,
            message,
            created_at: Instant::now(),
        });
    }

    /// Drop toasts older than the TTL.
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.toasts
            .retain(|toast| now.saturating_duration_since(toast.created_at) < ttl);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn count(&self, kind: ToastKind) -> usize {
        self.toasts.iter().filter(|t| t.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_count() {
        let mut queue = ToastQueue::default();
        queue.success("done");
        queue.error("failed");
        queue.error("failed again");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.count(ToastKind::Success), 1);
        assert_eq!(queue.count(ToastKind::Error), 2);
        assert_eq!(queue.iter().next().unwrap().message, "done");
    }

    #[test]
    fn test_expire_drops_old_toasts_only() {
        let mut queue = ToastQueue::new(Duration::from_millis(50));
        queue.success("old");
        let later = Instant::now() + Duration::from_millis(60);

        queue.expire(Instant::now());
        assert_eq!(queue.len(), 1);

        queue.expire(later);
        assert!(queue.is_empty());
    }
}
