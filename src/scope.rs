use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

type Link = Option<Rc<Frame>>;

struct Frame {
    values: RefCell<BTreeMap<String, Value>>,
    parent: Link,
}

impl Frame {
    fn new(parent: Link) -> Rc<Frame> {
        Rc::new(Frame {
            values: RefCell::new(BTreeMap::new()),
            parent,
        })
    }
}

/// One link of the scope chain.
///
/// Clones share the same bindings; `child` pushes a new, empty frame in
/// front of this one without affecting other holders of the chain.
#[derive(Clone)]
pub struct Scope {
    head: Rc<Frame>,
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("locals", &self.head.values.borrow().keys().collect::<Vec<_>>())
            .field("depth", &self.depth())
            .finish()
    }
}

impl Scope {
    pub fn new() -> Scope {
        Scope {
            head: Frame::new(None),
        }
    }

    pub fn child(&self) -> Scope {
        Scope {
            head: Frame::new(Some(Rc::clone(&self.head))),
        }
    }

    /// Binds `name` in this scope only; an existing local binding is an error,
    /// bindings further up the chain are not consulted.
    pub fn define_new(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        match self.head.values.borrow_mut().entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
            Entry::Occupied(_) => Err(RuntimeError::AlreadyDefined(name.to_string())),
        }
    }

    /// Binds `name` in this scope, replacing any local binding of it.
    pub fn bind(&self, name: &str, value: Value) {
        self.head
            .values
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    /// Overwrites the nearest binding of `name`, or creates one in this scope
    /// when no scope in the chain has it.
    pub fn assign(&self, name: &str, value: Value) {
        for frame in self.frames() {
            if let Some(slot) = frame.values.borrow_mut().get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.head
            .values
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        for frame in self.frames() {
            if let Some(x) = frame.values.borrow().get(name) {
                return Ok(x.clone());
            }
        }
        Err(RuntimeError::UndefinedVariable(name.to_string()))
    }

    #[cfg(test)]
    fn contains_local(&self, name: &str) -> bool {
        self.head.values.borrow().contains_key(name)
    }

    /// Number of frames above this one.
    pub fn depth(&self) -> usize {
        self.frames().count() - 1
    }

    fn frames(&self) -> Frames<'_> {
        Frames {
            next: Some(&self.head),
        }
    }
}

struct Frames<'a> {
    next: Option<&'a Frame>,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a Frame;

    fn next(&mut self) -> Option<&'a Frame> {
        self.next.map(|frame| {
            self.next = frame.parent.as_deref();
            frame
        })
    }
}
