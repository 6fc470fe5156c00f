//! The `Template` container and its traversal operations.

use std::collections::BTreeMap;

use crate::{Path, Step};

/// An arbitrary nesting of mappings, sequences and fixed-arity tuples whose
/// leaves carry values of type `L`.
///
/// Before resolution the leaves are symbolic holes; after resolution they are
/// engine handles; at every timestep they become plain scalars.  All three
/// stages share this one shape type — only the leaf parameter changes.
///
/// `Map` keys are ordered (`BTreeMap`), so traversal order — and therefore
/// the order in which holes are resolved and values are read — is
/// deterministic.  `Tuple` is structurally a sequence, but its arity is fixed
/// by construction and preserved by every traversal.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Template<L> {
    Map(BTreeMap<String, Template<L>>),
    List(Vec<Template<L>>),
    Tuple(Vec<Template<L>>),
    Leaf(L),
}

impl<L> Template<L> {
    /// A leaf node.
    pub fn leaf(value: L) -> Self {
        Template::Leaf(value)
    }

    /// The empty mapping — the shape of "no readings requested".
    pub fn empty() -> Self {
        Template::Map(BTreeMap::new())
    }

    /// Build a `Map` node from string-keyed entries.
    pub fn map_from<const N: usize>(entries: [(&str, Template<L>); N]) -> Self {
        Template::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            Template::Leaf(v) => Some(v),
            _ => None,
        }
    }

    /// Number of leaves in the template.
    pub fn leaf_count(&self) -> usize {
        let mut n = 0;
        self.for_each(&mut |_, _| n += 1);
        n
    }

    // ── Shape-preserving traversals ───────────────────────────────────────

    /// Replace every leaf via `f`, preserving keys, order, length and arity.
    ///
    /// Fails immediately on the first leaf error; no partial template is
    /// ever returned.
    pub fn try_map<M, E>(
        &self,
        f: &mut impl FnMut(&L) -> Result<M, E>,
    ) -> Result<Template<M>, E> {
        match self {
            Template::Map(entries) => {
                let mut out = BTreeMap::new();
                for (k, v) in entries {
                    out.insert(k.clone(), v.try_map(f)?);
                }
                Ok(Template::Map(out))
            }
            Template::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for v in items {
                    out.push(v.try_map(f)?);
                }
                Ok(Template::List(out))
            }
            Template::Tuple(items) => {
                let mut out = Vec::with_capacity(items.len());
                for v in items {
                    out.push(v.try_map(f)?);
                }
                Ok(Template::Tuple(out))
            }
            Template::Leaf(v) => Ok(Template::Leaf(f(v)?)),
        }
    }

    /// Infallible form of [`try_map`][Self::try_map].
    pub fn map<M>(&self, f: &mut impl FnMut(&L) -> M) -> Template<M> {
        match self.try_map::<M, std::convert::Infallible>(&mut |v| Ok(f(v))) {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }

    /// Selective resolution: leaves satisfying `matches` are replaced by
    /// `transform(leaf)`; every other leaf passes through unchanged.
    ///
    /// This is the primitive the simulation applies once per hole kind, in a
    /// fixed order, so that later kinds may rely on identities established by
    /// earlier passes.
    pub fn try_replace<E>(
        &self,
        matches: &impl Fn(&L) -> bool,
        transform: &mut impl FnMut(&L) -> Result<L, E>,
    ) -> Result<Template<L>, E>
    where
        L: Clone,
    {
        self.try_map(&mut |leaf| {
            if matches(leaf) {
                transform(leaf)
            } else {
                Ok(leaf.clone())
            }
        })
    }

    // ── Path-tracking traversals ──────────────────────────────────────────

    /// Visit every leaf together with its [`Path`] from the root.
    pub fn for_each(&self, f: &mut impl FnMut(&Path, &L)) {
        let mut prefix = Vec::new();
        self.walk(&mut prefix, f);
    }

    fn walk(&self, prefix: &mut Vec<Step>, f: &mut impl FnMut(&Path, &L)) {
        match self {
            Template::Map(entries) => {
                for (k, v) in entries {
                    prefix.push(Step::Key(k.clone()));
                    v.walk(prefix, f);
                    prefix.pop();
                }
            }
            Template::List(items) | Template::Tuple(items) => {
                for (i, v) in items.iter().enumerate() {
                    prefix.push(Step::Index(i));
                    v.walk(prefix, f);
                    prefix.pop();
                }
            }
            Template::Leaf(v) => {
                let path = Path(prefix.clone());
                f(&path, v);
            }
        }
    }

    /// All `(path, leaf)` pairs in deterministic traversal order.
    pub fn flatten(&self) -> Vec<(Path, &L)> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        self.flatten_into(&mut prefix, &mut out);
        out
    }

    fn flatten_into<'a>(&'a self, prefix: &mut Vec<Step>, out: &mut Vec<(Path, &'a L)>) {
        match self {
            Template::Map(entries) => {
                for (k, v) in entries {
                    prefix.push(Step::Key(k.clone()));
                    v.flatten_into(prefix, out);
                    prefix.pop();
                }
            }
            Template::List(items) | Template::Tuple(items) => {
                for (i, v) in items.iter().enumerate() {
                    prefix.push(Step::Index(i));
                    v.flatten_into(prefix, out);
                    prefix.pop();
                }
            }
            Template::Leaf(v) => out.push((Path(prefix.clone()), v)),
        }
    }

    /// Structural lookup: the sub-template at `path`, or `None` if the path
    /// does not exist in this shape.
    pub fn at(&self, path: &Path) -> Option<&Template<L>> {
        let mut node = self;
        for step in &path.0 {
            node = match (node, step) {
                (Template::Map(entries), Step::Key(k)) => entries.get(k)?,
                (Template::List(items), Step::Index(i))
                | (Template::Tuple(items), Step::Index(i)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(node)
    }
}
