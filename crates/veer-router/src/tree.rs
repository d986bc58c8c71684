//! Radix match tree
//!
//! One tree stores every pattern registered for a single HTTP method.
//! Edges are labeled with byte strings and common prefixes are merged;
//! inserting a pattern that diverges mid-segment splits the owning node in
//! place. Lookup walks literal edges first and falls back to the parameter
//! branch, then the catch-all, of the same node.

use smallvec::SmallVec;

use crate::error::RouteError;
use crate::normalize::{denormalize, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NodeKind {
    #[default]
    Static,
    Root,
    Param,
    CatchAll,
}

#[derive(Debug)]
struct Node<T> {
    /// Literal bytes this node owns. A byte string rather than `str`:
    /// splitting at the longest common prefix of two patterns can land
    /// inside a multi-byte character.
    segment: Vec<u8>,
    kind: NodeKind,
    /// Number of values reachable in this subtree. Orders the sibling
    /// scan; never decides which pattern matches.
    priority: u32,
    /// Literal children, busiest first.
    literals: Vec<Node<T>>,
    /// First byte of each literal child's segment, index-aligned with
    /// `literals`.
    indices: Vec<u8>,
    /// Parameter child (segment `:`). Holds at most one literal
    /// continuation, reached without going through `indices`.
    wild: Option<Box<Node<T>>>,
    /// Catch-all child (segment `*`); always a leaf carrying a value.
    catch_all: Option<Box<Node<T>>>,
    value: Option<T>,
    /// One name per wildcard on the path from the root; set together with
    /// `value`.
    param_names: Vec<String>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            segment: Vec::new(),
            kind: NodeKind::default(),
            priority: 0,
            literals: Vec::new(),
            indices: Vec::new(),
            wild: None,
            catch_all: None,
            value: None,
            param_names: Vec::new(),
        }
    }
}

/// Outcome of a successful lookup: the stored value, the declared wildcard
/// names and the captured tokens, both in path order and equal in count.
#[derive(Debug)]
pub struct Matched<'t, T> {
    pub value: &'t T,
    pub names: &'t [String],
    pub captures: SmallVec<[String; 4]>,
}

/// Radix match tree holding the patterns of a single HTTP method.
#[derive(Debug)]
pub struct Tree<T> {
    root: Node<T>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self {
            root: Node::default(),
        }
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pattern` with the given value.
    ///
    /// Not safe for concurrent use; all insertions must happen before
    /// lookups begin. A failed insertion leaves the tree untouched.
    pub fn insert(&mut self, pattern: &str, value: T) -> Result<(), RouteError> {
        let (normalized, names) = normalize(pattern)?;

        if self.root.segment.is_empty() && self.root.indices.is_empty() {
            self.root.kind = NodeKind::Root;
            self.root
                .insert_child(pattern, &normalized, normalized.as_bytes(), value, names)?;
        } else {
            self.root
                .add(pattern, &normalized, normalized.as_bytes(), value, names)?;
        }
        self.root.priority += 1;
        Ok(())
    }

    /// Looks up `path`, returning the stored value together with the
    /// wildcard names and captured tokens of the matched pattern.
    pub fn at<'t>(&'t self, path: &str) -> Option<Matched<'t, T>> {
        let (node, raw) = self.root.search(path.as_bytes())?;
        let value = node.value.as_ref()?;
        let captures = raw
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect();
        Some(Matched {
            value,
            names: &node.param_names,
            captures,
        })
    }
}

impl<T> Node<T> {
    /// Adds the normalized remainder `path` below this node. `raw` is the
    /// pattern as registered and `full` the whole normalized pattern, both
    /// kept for diagnostics. Priority bookkeeping for a child is applied
    /// by its parent only after the recursive insertion succeeds, so a
    /// rejected registration never changes the tree.
    fn add(
        &mut self,
        raw: &str,
        full: &str,
        path: &[u8],
        value: T,
        names: Vec<String>,
    ) -> Result<(), RouteError> {
        let i = longest_common_prefix(&self.segment, path);

        if i < self.segment.len() {
            self.split(i);
        }

        let path = &path[i..];
        if path.is_empty() {
            if self.value.is_some() {
                return Err(RouteError::RouteAlreadyRegistered(denormalize(
                    full,
                    &self.param_names,
                )));
            }
            self.value = Some(value);
            self.param_names = names;
            return Ok(());
        }

        let next = path[0];

        // on a parameter byte, keep walking the existing wild branch;
        // parameters chain by position, not by name
        if next == b':' && path.len() > 1 {
            if let Some(wild) = self.wild.as_deref_mut() {
                return wild.add(raw, full, path, value, names);
            }
        }

        // below a parameter node the only way forward is its continuation
        if self.kind == NodeKind::Param && !self.literals.is_empty() {
            self.literals[0].add(raw, full, path, value, names)?;
            self.literals[0].priority += 1;
            return Ok(());
        }

        // follow an existing literal edge
        if let Some(pos) = self.indices.iter().position(|&b| b == next) {
            self.literals[pos].add(raw, full, path, value, names)?;
            self.promote(pos);
            return Ok(());
        }

        // new literal edge
        if next != b':' && next != b'*' {
            self.indices.push(next);
            self.literals.push(Node::default());
            let pos = self.literals.len() - 1;
            self.literals[pos].insert_child(raw, full, path, value, names)?;
            self.promote(pos);
            return Ok(());
        }

        self.insert_child(raw, full, path, value, names)
    }

    /// Splits this node at byte offset `i` of its segment: the suffix,
    /// children and value move into a new child, the shared prefix stays
    /// here.
    fn split(&mut self, i: usize) {
        let child = Node {
            segment: self.segment.split_off(i),
            kind: NodeKind::Static,
            priority: self.priority,
            literals: std::mem::take(&mut self.literals),
            indices: std::mem::take(&mut self.indices),
            wild: self.wild.take(),
            catch_all: self.catch_all.take(),
            value: self.value.take(),
            param_names: std::mem::take(&mut self.param_names),
        };
        self.indices = vec![child.segment[0]];
        self.literals = vec![child];
    }

    /// Installs the remaining path below this node, creating a parameter
    /// or catch-all node for each remaining sentinel byte.
    fn insert_child(
        &mut self,
        raw: &str,
        full: &str,
        path: &[u8],
        value: T,
        names: Vec<String>,
    ) -> Result<(), RouteError> {
        match find_wildcard(path) {
            None => {
                self.segment = path.to_vec();
                self.value = Some(value);
                self.param_names = names;
                Ok(())
            }
            Some((b':', i)) => {
                if let Some(wild) = &self.wild {
                    return Err(ambiguous(raw, full, wild));
                }

                if i > 0 {
                    self.segment = path[..i].to_vec();
                }
                let path = &path[i..];

                let wild = self.wild.insert(Box::new(Node {
                    segment: b":".to_vec(),
                    kind: NodeKind::Param,
                    priority: 1,
                    ..Node::default()
                }));

                // a parameter ends at the next '/'; anything after it
                // becomes the single continuation child
                if path.len() > 1 {
                    wild.literals.push(Node {
                        priority: 1,
                        ..Node::default()
                    });
                    wild.literals[0].insert_child(raw, full, &path[1..], value, names)
                } else {
                    wild.value = Some(value);
                    wild.param_names = names;
                    Ok(())
                }
            }
            Some((_, i)) => {
                if i != path.len() - 1 {
                    return Err(RouteError::CatchAllNotTerminal(raw.to_string()));
                }
                if let Some(catch_all) = &self.catch_all {
                    return Err(ambiguous(raw, full, catch_all));
                }

                if self.segment.is_empty() {
                    self.segment = path[..i].to_vec();
                }

                self.catch_all = Some(Box::new(Node {
                    segment: b"*".to_vec(),
                    kind: NodeKind::CatchAll,
                    priority: 1,
                    value: Some(value),
                    param_names: names,
                    ..Node::default()
                }));
                Ok(())
            }
        }
    }

    /// Gives the literal child at `pos` one more point of priority and
    /// moves it ahead of lower-priority siblings, keeping `indices` and
    /// `literals` aligned.
    fn promote(&mut self, pos: usize) {
        self.literals[pos].priority += 1;
        let priority = self.literals[pos].priority;

        let mut new_pos = pos;
        while new_pos > 0 && self.literals[new_pos - 1].priority < priority {
            self.literals.swap(new_pos - 1, new_pos);
            new_pos -= 1;
        }

        if new_pos != pos {
            let index = self.indices.remove(pos);
            self.indices.insert(new_pos, index);
        }
    }

    /// Wildcard names of the first value-bearing node in this subtree.
    fn first_param_names(&self) -> Option<&[String]> {
        if self.value.is_some() {
            return Some(&self.param_names);
        }
        if let Some(found) = self.literals.iter().find_map(|c| c.first_param_names()) {
            return Some(found);
        }
        if let Some(found) = self.wild.as_ref().and_then(|w| w.first_param_names()) {
            return Some(found);
        }
        self.catch_all.as_ref().and_then(|c| c.first_param_names())
    }

    /// Recursively looks for a node matching `path`, collecting captured
    /// tokens on the way back up.
    ///
    /// A literal child that resolves, even to a value-less node, wins
    /// outright. Only when the literal scan produces nothing does the
    /// parameter branch get a try, then the catch-all, both at this node
    /// and with whatever remainder is left at this point; a segment that
    /// matched only partially is handed to them un-stripped.
    fn search<'t, 'p>(
        &'t self,
        mut path: &'p [u8],
    ) -> Option<(&'t Node<T>, SmallVec<[&'p [u8]; 4]>)> {
        if path.is_empty() {
            return Some((self, SmallVec::new()));
        }

        if let Some(rest) = path.strip_prefix(self.segment.as_slice()) {
            path = rest;

            if path.is_empty() {
                return Some((self, SmallVec::new()));
            }

            let next = path[0];
            if let Some(pos) = self.indices.iter().position(|&b| b == next) {
                if let Some(found) = self.literals[pos].search(path) {
                    return Some(found);
                }
            }
        }

        if !path.is_empty() && path[0] != b'/' {
            // no literal matched; still inside one segment, so the
            // parameter branch may consume it as a token
            if let Some(wild) = &self.wild {
                let (token, rest) = match path.iter().position(|&b| b == b'/') {
                    Some(end) => path.split_at(end),
                    None => (path, &[][..]),
                };

                if !rest.is_empty() {
                    if let Some(continuation) = wild.literals.first() {
                        if let Some((node, mut captures)) = continuation.search(rest) {
                            captures.insert(0, token);
                            return Some((node, captures));
                        }
                    }
                } else if wild.value.is_some() {
                    let mut captures = SmallVec::new();
                    captures.push(token);
                    return Some((&**wild, captures));
                }
            }

            // last resort: the catch-all swallows the whole remainder
            if let Some(catch_all) = &self.catch_all {
                let mut captures = SmallVec::new();
                captures.push(path);
                return Some((&**catch_all, captures));
            }
        }

        None
    }
}

fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// First unconsumed sentinel byte and its position.
fn find_wildcard(path: &[u8]) -> Option<(u8, usize)> {
    path.iter()
        .enumerate()
        .find_map(|(i, &b)| (b == b':' || b == b'*').then_some((b, i)))
}

fn ambiguous<T>(raw: &str, full: &str, existing_node: &Node<T>) -> RouteError {
    let existing = existing_node
        .first_param_names()
        .map_or_else(|| raw.to_string(), |names| denormalize(full, names));
    RouteError::AmbiguousRoute {
        pattern: raw.to_string(),
        existing,
    }
}
