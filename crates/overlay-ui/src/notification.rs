use crossbeam_channel::{Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

/// Message shown in the middle of the screen for a short time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub kind: NotificationKind,
}

/// Queue of pending screen notifications.
///
/// Any thread may push; the host drains it once per frame.
pub struct NotificationBus {
    tx: Sender<Notification>,
    rx: Receiver<Notification>,
}

impl NotificationBus {
    #[inline]
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    #[inline]
    pub fn send(&self, n: Notification) {
        let _ = self.tx.send(n);
    }

    #[inline]
    pub fn drain_into(&self, out: &mut Vec<Notification>) -> usize {
        let mut n = 0usize;
        while let Ok(ev) = self.rx.try_recv() {
            out.push(ev);
            n += 1;
        }
        n
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}
