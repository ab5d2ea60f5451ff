use std::sync::Weak;

/// Receives every write to the player's error message.
pub trait ErrorObserver: Send + Sync {
    fn error_message_changed(&self, message: &str);
}

/// Receives every write to the player's readiness flag.
pub trait ReadinessObserver: Send + Sync {
    fn readiness_changed(&self, ready: bool);
}

/// Ordered list of weakly held observers.
///
/// The list never keeps an observer alive; entries whose owner has gone away
/// are pruned on the next notification.
pub struct ObserverList<T: ?Sized> {
    observers: Vec<Weak<T>>,
}

impl<T: ?Sized> ObserverList<T> {
    pub fn new() -> Self {
        Self { observers: Vec::new() }
    }

    /// Appends `observer`. Registering the same observer twice is a no-op.
    pub fn register(&mut self, observer: Weak<T>) {
        if self.observers.iter().any(|o| Weak::ptr_eq(o, &observer)) {
            return;
        }
        self.observers.push(observer);
    }

    /// Removes `observer` if present.
    #[cfg(test)]
    pub fn unregister(&mut self, observer: &Weak<T>) {
        self.observers.retain(|o| !Weak::ptr_eq(o, observer));
    }

    /// Calls `f` on every live observer in registration order.
    pub fn notify(&mut self, f: impl Fn(&T)) {
        self.observers.retain(|weak| match weak.upgrade() {
            Some(observer) => {
                f(&observer);
                true
            }
            None => false,
        });
    }

    /// Number of registered observers, including ones that may have died.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<T: ?Sized> Default for ObserverList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl ErrorObserver for Recorder {
        fn error_message_changed(&self, message: &str) {
            self.seen.lock().unwrap().push(message.to_string());
        }
    }

    fn weak(recorder: &Arc<Recorder>) -> Weak<dyn ErrorObserver> {
        Arc::downgrade(recorder) as Weak<dyn ErrorObserver>
    }

    #[test]
    fn notifies_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        struct Tagged(&'static str, Arc<Mutex<Vec<&'static str>>>);
        impl ErrorObserver for Tagged {
            fn error_message_changed(&self, _message: &str) {
                self.1.lock().unwrap().push(self.0);
            }
        }

        let first = Arc::new(Tagged("first", order.clone()));
        let second = Arc::new(Tagged("second", order.clone()));
        let mut list: ObserverList<dyn ErrorObserver> = ObserverList::new();
        let w1 = Arc::downgrade(&first) as Weak<dyn ErrorObserver>;
        let w2 = Arc::downgrade(&second) as Weak<dyn ErrorObserver>;
        list.register(w1);
        list.register(w2);

        list.notify(|o| o.error_message_changed("x"));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let recorder = Arc::new(Recorder::default());
        let mut list: ObserverList<dyn ErrorObserver> = ObserverList::new();
        list.register(weak(&recorder));
        list.register(weak(&recorder));
        assert_eq!(list.len(), 1);

        list.notify(|o| o.error_message_changed("boom"));
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["boom".to_string()]);
    }

    #[test]
    fn dropped_observers_are_pruned() {
        let recorder = Arc::new(Recorder::default());
        let mut list: ObserverList<dyn ErrorObserver> = ObserverList::new();
        list.register(weak(&recorder));
        drop(recorder);

        list.notify(|o| o.error_message_changed("nobody listens"));
        assert!(list.is_empty());
    }

    #[test]
    fn unregister_removes_observer() {
        let recorder = Arc::new(Recorder::default());
        let mut list: ObserverList<dyn ErrorObserver> = ObserverList::new();
        list.register(weak(&recorder));
        list.unregister(&weak(&recorder));

        list.notify(|o| o.error_message_changed("ignored"));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
