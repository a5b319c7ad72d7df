use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/**
An immutable execution context.

A context is a chain of bindings from key types to values.
Deriving a child with `with_value` never touches the parent, so a context can be
shared between threads and derived from concurrently.
Cloning is cheap: it only bumps a reference count.
*/
#[derive(Clone, Default)]
pub struct Ctxt {
    inner: Option<Arc<Node>>,
}

struct Node {
    parent: Option<Arc<Node>>,
    key: TypeId,
    value: Arc<dyn Any + Send + Sync>,
}

impl Ctxt {
    /// An empty root context.
    pub fn background() -> Self {
        Ctxt::default()
    }

    /**
    Derive a child context that binds `value` under the key type `K`.

    If an ancestor already has a binding for `K` then the child's binding shadows it.
    Use a private type for `K` to keep a binding out of reach of other code.
    */
    pub fn with_value<K, V>(&self, value: V) -> Self
    where
        K: 'static,
        V: Any + Send + Sync,
    {
        Ctxt {
            inner: Some(Arc::new(Node {
                parent: self.inner.clone(),
                key: TypeId::of::<K>(),
                value: Arc::new(value),
            })),
        }
    }

    /// The nearest value bound under the key type `K`.
    pub fn value<K>(&self) -> Option<&(dyn Any + Send + Sync)>
    where
        K: 'static,
    {
        let key = TypeId::of::<K>();

        self.nodes()
            .find(|node| node.key == key)
            .map(|node| &*node.value)
    }

    /**
    The nearest value bound under the key type `K`, if it's a `V`.

    A binding of some other type is treated the same as no binding.
    */
    pub fn get<K, V>(&self) -> Option<&V>
    where
        K: 'static,
        V: Any,
    {
        self.value::<K>()
            .and_then(|value| value.downcast_ref::<V>())
    }

    /// Whether two contexts are the same derivation.
    pub fn ptr_eq(a: &Ctxt, b: &Ctxt) -> bool {
        match (&a.inner, &b.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn nodes(&self) -> Nodes<'_> {
        Nodes {
            next: self.inner.as_deref(),
        }
    }
}

struct Nodes<'a> {
    next: Option<&'a Node>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.parent.as_deref();

        Some(node)
    }
}

impl fmt::Debug for Ctxt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ctxt")
            .field("depth", &self.nodes().count())
            .finish()
    }
}
