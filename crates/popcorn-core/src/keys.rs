use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

type KeyAction<C> = Box<dyn FnMut(&mut C)>;

struct Binding<C> {
    id: BindingId,
    key: String,
    action: KeyAction<C>,
}

/// Key → action table. Key names compare case-insensitively ("Escape",
/// "escape"). Each binding stays active until it is unbound, so an owner binds
/// when it appears and unbinds when it goes away.
pub struct KeyBindings<C> {
    next_id: u64,
    bindings: Vec<Binding<C>>,
}

impl<C> Default for KeyBindings<C> {
    fn default() -> Self {
        Self {
            next_id: 0,
            bindings: Vec::new(),
        }
    }
}

impl<C> KeyBindings<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: &str, action: impl FnMut(&mut C) + 'static) -> BindingId {
        self.next_id += 1;
        let id = BindingId(self.next_id);
        self.bindings.push(Binding {
            id,
            key: key.to_lowercase(),
            action: Box::new(action),
        });
        trace!("Bound {} ({:?})", key, id);
        id
    }

    pub fn unbind(&mut self, id: BindingId) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.id != id);
        before != self.bindings.len()
    }

    pub fn is_bound(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.bindings.iter().any(|b| b.key == key)
    }

    /// Run every action bound to `key`, in bind order. Returns how many ran.
    pub fn dispatch(&mut self, key: &str, ctx: &mut C) -> usize {
        let key = key.to_lowercase();
        let mut ran = 0;
        for binding in self.bindings.iter_mut().filter(|b| b.key == key) {
            (binding.action)(ctx);
            ran += 1;
        }
        trace!("Key {} ran {} action(s)", key, ran);
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let mut keys: KeyBindings<Vec<&'static str>> = KeyBindings::new();
        keys.bind("Escape", |log| log.push("close"));

        let mut log = Vec::new();
        assert_eq!(keys.dispatch("escape", &mut log), 1);
        assert_eq!(keys.dispatch("ESCAPE", &mut log), 1);
        assert_eq!(keys.dispatch("Enter", &mut log), 0);
        assert_eq!(log, vec!["close", "close"]);
    }

    #[test]
    fn test_unbind_ends_scope() {
        let mut keys: KeyBindings<u32> = KeyBindings::new();
        let id = keys.bind("Enter", |count| *count += 1);
        keys.bind("Enter", |count| *count += 10);

        let mut count = 0;
        keys.dispatch("Enter", &mut count);
        assert_eq!(count, 11);

        assert!(keys.unbind(id));
        assert!(!keys.unbind(id));
        keys.dispatch("Enter", &mut count);
        assert_eq!(count, 21);
        assert!(keys.is_bound("enter"));
    }
}
