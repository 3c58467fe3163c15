use std::fmt;

type Release = Box<dyn FnOnce() + Send + Sync>;

/// Scoped change-notification registration.
///
/// The callback stays registered while this value is alive. Dropping it (or
/// calling [`Subscription::unsubscribe`]) removes the callback for good.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Release>,
}

impl Subscription {
    #[inline]
    pub(crate) fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    #[inline]
    pub fn unsubscribe(mut self) {
        self.release();
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    fn release(&mut self) {
        if let Some(f) = self.release.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
