//! Call-Graph Linker
//!
//! Turns raw call names collected from declaration bodies into typed links.
//! Matching is purely by name: no scopes, no types, no control flow. Two
//! members sharing a simple name are indistinguishable and both receive an
//! edge from any caller of that name.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::graph::{Link, LinkKind};

/// A declaration that a raw call name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub key: String,
    pub kind: LinkKind,
}

/// Maps a raw call name onto known declarations.
///
/// An empty result means the call is dropped. Stricter resolvers (scope or
/// type aware) can be swapped in without changing the graph shape.
pub trait NameResolver {
    fn resolve(&self, call: &str) -> Vec<Resolved>;
}

/// One caller and the raw call names found in its body, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerCalls {
    pub caller: String,
    pub calls: Vec<String>,
}

impl CallerCalls {
    pub fn new(caller: impl Into<String>, calls: Vec<String>) -> Self {
        Self {
            caller: caller.into(),
            calls,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub links: Vec<Link>,
    /// Every raw call name seen, resolved or not.
    pub used_names: HashSet<String>,
}

impl Resolution {
    pub fn is_used(&self, name: &str) -> bool {
        self.used_names.contains(name)
    }
}

pub struct CallGraphLinker;

impl CallGraphLinker {
    /// Resolve every call of every caller. One link per call site and target,
    /// so repeated calls produce repeated links.
    pub fn resolve<R: NameResolver + ?Sized>(callers: &[CallerCalls], resolver: &R) -> Resolution {
        let mut resolution = Resolution::default();

        for entry in callers {
            for call in &entry.calls {
                resolution.used_names.insert(call.clone());

                let targets = resolver.resolve(call);
                if targets.is_empty() {
                    debug!(caller = %entry.caller, call = %call, "dropping unresolved call");
                    continue;
                }
                resolution.links.extend(
                    targets
                        .into_iter()
                        .map(|t| Link::new(entry.caller.clone(), t.key, t.kind)),
                );
            }
        }

        resolution
    }
}

/// Name-equality resolver over one file's declarations.
///
/// Precedence: members (by simple name), then free functions, then
/// `from`-import bindings. The first category with a match wins.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    // simple name -> member keys, declaration order
    members: HashMap<String, Vec<String>>,
    functions: HashSet<String>,
    // binding -> qualified origin (`module.name`)
    imports: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&mut self, key: impl Into<String>, name: impl Into<String>) {
        self.members.entry(name.into()).or_default().push(key.into());
    }

    pub fn add_function(&mut self, name: impl Into<String>) {
        self.functions.insert(name.into());
    }

    pub fn add_import(&mut self, binding: impl Into<String>, origin: impl Into<String>) {
        self.imports.insert(binding.into(), origin.into());
    }

    pub fn import_origin(&self, binding: &str) -> Option<&str> {
        self.imports.get(binding).map(String::as_str)
    }
}

impl NameResolver for SymbolTable {
    fn resolve(&self, call: &str) -> Vec<Resolved> {
        if let Some(keys) = self.members.get(call) {
            return keys
                .iter()
                .map(|key| Resolved {
                    key: key.clone(),
                    kind: LinkKind::Call,
                })
                .collect();
        }
        if self.functions.contains(call) {
            return vec![Resolved {
                key: call.to_string(),
                kind: LinkKind::Call,
            }];
        }
        if self.imports.contains_key(call) {
            return vec![Resolved {
                key: call.to_string(),
                kind: LinkKind::ImportUse,
            }];
        }
        Vec::new()
    }
}

/// Resolver that only accepts calls spelled exactly like a declaration key.
/// Keys may be rewritten on the way out (raw key -> emitted node key).
#[derive(Debug, Clone, Default)]
pub struct ExactKeyResolver {
    keys: HashMap<String, String>,
}

impl ExactKeyResolver {
    pub fn insert(&mut self, raw: impl Into<String>, emitted: impl Into<String>) {
        self.keys.insert(raw.into(), emitted.into());
    }
}

impl NameResolver for ExactKeyResolver {
    fn resolve(&self, call: &str) -> Vec<Resolved> {
        self.keys
            .get(call)
            .map(|key| {
                vec![Resolved {
                    key: key.clone(),
                    kind: LinkKind::Call,
                }]
            })
            .unwrap_or_default()
    }
}
