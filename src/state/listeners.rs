// ============================================================================
// LISTENERS - Registro de callbacks con tokens cancelables
// ============================================================================
// GESTIÓN DE MEMORY LEAKS:
// - Cada suscripción devuelve un token RAII; al soltar el token el callback
//   se elimina del registro.
// - SubscriptionSet agrupa los tokens de un mismo dueño y los libera como
//   unidad, evitando des-suscripciones parciales en el teardown.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

/// Registro de listeners para un tipo de evento
pub struct EventListeners<T> {
    inner: Rc<ListenersInner<T>>,
}

struct ListenersInner<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Callback<T>)>>,
}

impl<T> EventListeners<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ListenersInner {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Suscribirse a eventos; el token devuelto cancela la suscripción
    /// al soltarse
    pub fn add<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.entries.borrow_mut().push((id, Rc::new(callback)));

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.entries.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Notificar a todos los suscriptores.
    /// La lista se copia antes de iterar: un callback puede suscribir o
    /// cancelar suscripciones sin invalidar la iteración en curso.
    pub fn emit(&self, event: &T) {
        let callbacks: Vec<Callback<T>> = self
            .inner
            .entries
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    /// Vaciar el registro completo (los tokens pendientes quedan inertes)
    pub fn clear(&self) {
        self.inner.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for EventListeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Token RAII de una suscripción; cancela al soltarse
pub struct Subscription {
    unlisten: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new<F>(unlisten: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            unlisten: Some(Box::new(unlisten)),
        }
    }

    /// Cancelar explícitamente (equivalente a soltar el token)
    pub fn cancel(mut self) {
        if let Some(unlisten) = self.unlisten.take() {
            unlisten();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unlisten) = self.unlisten.take() {
            unlisten();
        }
    }
}

/// Conjunto de suscripciones de un mismo dueño, liberado como unidad
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Liberar todas las suscripciones en bloque
    pub fn release(&mut self) {
        self.subscriptions.clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_subscribers() {
        let listeners: EventListeners<String> = EventListeners::new();
        let received = Rc::new(RefCell::new(Vec::new()));

        let sink = received.clone();
        let _sub = listeners.add(move |event: &String| {
            sink.borrow_mut().push(event.clone());
        });

        listeners.emit(&"uno".to_string());
        listeners.emit(&"dos".to_string());

        assert_eq!(*received.borrow(), vec!["uno".to_string(), "dos".to_string()]);
    }

    #[test]
    fn test_dropped_subscription_stops_receiving() {
        let listeners: EventListeners<u32> = EventListeners::new();
        let count = Rc::new(Cell::new(0));

        let sink = count.clone();
        let sub = listeners.add(move |_| sink.set(sink.get() + 1));

        listeners.emit(&1);
        drop(sub);
        listeners.emit(&2);

        assert_eq!(count.get(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_cancel_removes_only_that_subscription() {
        let listeners: EventListeners<u32> = EventListeners::new();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let sink = first.clone();
        let sub_first = listeners.add(move |_| sink.set(sink.get() + 1));
        let sink = second.clone();
        let _sub_second = listeners.add(move |_| sink.set(sink.get() + 1));

        sub_first.cancel();
        listeners.emit(&7);

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_subscription_set_releases_as_unit() {
        let barcode: EventListeners<String> = EventListeners::new();
        let errors: EventListeners<String> = EventListeners::new();
        let count = Rc::new(Cell::new(0));

        let mut set = SubscriptionSet::new();
        let sink = count.clone();
        set.push(barcode.add(move |_| sink.set(sink.get() + 1)));
        let sink = count.clone();
        set.push(errors.add(move |_| sink.set(sink.get() + 1)));
        assert_eq!(set.len(), 2);

        set.release();

        barcode.emit(&"x".to_string());
        errors.emit(&"y".to_string());
        assert_eq!(count.get(), 0);
        assert!(barcode.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_subscriber_can_cancel_during_emit() {
        // Un callback que cancela otra suscripción no debe invalidar la
        // iteración en curso
        let listeners: Rc<EventListeners<u32>> = Rc::new(EventListeners::new());
        let count = Rc::new(Cell::new(0));

        let held: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let sink = count.clone();
        let held_clone = held.clone();
        let _canceller = listeners.add(move |_| {
            sink.set(sink.get() + 1);
            held_clone.borrow_mut().take();
        });
        let sink = count.clone();
        *held.borrow_mut() = Some(listeners.add(move |_| sink.set(sink.get() + 1)));

        listeners.emit(&1);
        // La primera emisión alcanza a ambos (lista copiada), la segunda solo
        // al que queda registrado
        assert_eq!(count.get(), 2);
        listeners.emit(&2);
        assert_eq!(count.get(), 3);
    }
}
