//! Suite nodes and the tree they form.
//!
//! Suites own their children; parents are referenced weakly so the tree can
//! be navigated upwards without reference cycles. Children keep insertion
//! order, which is the order the executor runs them in.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::SharedContext;
use crate::test::Test;

static NEXT_SUITE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a suite.
///
/// Suite names may repeat; identities never do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteId(u64);

impl SuiteId {
    fn next() -> Self {
        Self(NEXT_SUITE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, useful in diagnostics.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Opaque handle to a remote session driver, passed through to tests.
#[derive(Clone)]
pub struct Remote(Rc<dyn Any>);

impl Remote {
    /// Wrap an arbitrary driver value.
    #[must_use]
    pub fn new<T: Any>(driver: T) -> Self {
        Self(Rc::new(driver))
    }

    /// Borrow the driver when it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote").finish_non_exhaustive()
    }
}

/// A child of a suite.
#[derive(Clone, Debug)]
pub enum Node {
    /// A nested suite.
    Suite(Rc<Suite>),
    /// A runnable leaf test.
    Test(Rc<Test>),
}

impl Node {
    /// Name of the wrapped suite or test.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Suite(suite) => suite.name(),
            Self::Test(test) => test.name(),
        }
    }

    /// Borrow the wrapped suite, if any.
    #[must_use]
    pub fn as_suite(&self) -> Option<&Rc<Suite>> {
        match self {
            Self::Suite(suite) => Some(suite),
            Self::Test(_) => None,
        }
    }

    /// Borrow the wrapped test, if any.
    #[must_use]
    pub fn as_test(&self) -> Option<&Rc<Test>> {
        match self {
            Self::Test(test) => Some(test),
            Self::Suite(_) => None,
        }
    }
}

/// A named group of suites and tests.
///
/// # Examples
///
/// ```
/// use bdd_suite_harness::{Node, Suite};
///
/// let root = Suite::root("");
/// let feature = Suite::child(&root, "Login");
/// root.push(Node::Suite(feature.clone()));
///
/// assert_eq!(root.len(), 1);
/// assert_eq!(feature.full_name(), "Login");
/// assert!(feature.parent().is_some_and(|parent| parent.id() == root.id()));
/// ```
pub struct Suite {
    id: SuiteId,
    name: String,
    parent: Weak<Suite>,
    children: RefCell<Vec<Node>>,
    context: Option<SharedContext>,
    remote: Option<Remote>,
    session_id: Option<String>,
}

impl Suite {
    /// Create a parentless root suite.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Rc<Self> {
        Self::root_with_session(name, None, None)
    }

    /// Create a root suite carrying remote and session identifiers for its
    /// descendants.
    #[must_use]
    pub fn root_with_session(
        name: impl Into<String>,
        remote: Option<Remote>,
        session_id: Option<String>,
    ) -> Rc<Self> {
        Rc::new(Self {
            id: SuiteId::next(),
            name: name.into(),
            parent: Weak::new(),
            children: RefCell::new(Vec::new()),
            context: None,
            remote,
            session_id,
        })
    }

    /// Create a suite whose parent is `parent`.
    ///
    /// The suite is not appended to the parent's children; call
    /// [`push`](Self::push) to attach it.
    #[must_use]
    pub fn child(parent: &Rc<Self>, name: impl Into<String>) -> Rc<Self> {
        Self::with_parent(parent, name.into(), None)
    }

    /// Create a child suite owning a fresh shared context.
    #[must_use]
    pub fn child_with_context(
        parent: &Rc<Self>,
        name: impl Into<String>,
        context: SharedContext,
    ) -> Rc<Self> {
        Self::with_parent(parent, name.into(), Some(context))
    }

    fn with_parent(parent: &Rc<Self>, name: String, context: Option<SharedContext>) -> Rc<Self> {
        Rc::new(Self {
            id: SuiteId::next(),
            name,
            parent: Rc::downgrade(parent),
            children: RefCell::new(Vec::new()),
            context,
            remote: None,
            session_id: None,
        })
    }

    /// Identity of this suite.
    #[must_use]
    pub const fn id(&self) -> SuiteId {
        self.id
    }

    /// Suite name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent suite, when it is still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Rc<Self>> {
        self.parent.upgrade()
    }

    /// Shared context owned by this suite, if any.
    #[must_use]
    pub fn context(&self) -> Option<&SharedContext> {
        self.context.as_ref()
    }

    /// Append a child, preserving insertion order.
    pub fn push(&self, node: Node) {
        self.children.borrow_mut().push(node);
    }

    /// Snapshot of the children in insertion order.
    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.children.borrow().clone()
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    /// Return `true` when the suite has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }

    /// Every leaf test beneath this suite, depth-first in insertion order.
    #[must_use]
    pub fn tests(&self) -> Vec<Rc<Test>> {
        let mut tests = Vec::new();
        self.collect_tests(&mut tests);
        tests
    }

    fn collect_tests(&self, tests: &mut Vec<Rc<Test>>) {
        for child in self.children.borrow().iter() {
            match child {
                Node::Suite(suite) => suite.collect_tests(tests),
                Node::Test(test) => tests.push(Rc::clone(test)),
            }
        }
    }

    /// Names of this suite and its ancestors joined with `" - "`.
    ///
    /// Unnamed ancestors (typically the root) are omitted.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut names = vec![self.name.clone()];
        let mut cursor = self.parent();
        while let Some(suite) = cursor {
            names.push(suite.name.clone());
            cursor = suite.parent();
        }
        names.retain(|name| !name.is_empty());
        names.reverse();
        names.join(" - ")
    }

    fn root_suite(&self) -> Option<Rc<Self>> {
        let mut cursor = self.parent()?;
        while let Some(parent) = cursor.parent() {
            cursor = parent;
        }
        Some(cursor)
    }

    /// Remote driver inherited from the root suite.
    #[must_use]
    pub fn remote(&self) -> Option<Remote> {
        if self.parent.upgrade().is_none() {
            return self.remote.clone();
        }
        self.root_suite().and_then(|root| root.remote.clone())
    }

    /// Session identifier inherited from the root suite.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        if self.parent.upgrade().is_none() {
            return self.session_id.clone();
        }
        self.root_suite().and_then(|root| root.session_id.clone())
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("children", &self.children.borrow().len())
            .finish_non_exhaustive()
    }
}
