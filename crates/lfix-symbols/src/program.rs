//! The program model: symbols, name table and dependency maps

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use lfix_ast::{Decl, DeclId, Forest};

/// A parsed program plus the indices the refactoring passes maintain.
///
/// Symbols are top-level functions and variables, addressed by [`DeclId`].
/// `forward[a]` holds what `a` references and `reverse[b]` who references
/// `b`; every mutation keeps the two mirror images of each other.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub(crate) forest: Forest,
    pub(crate) symlist: Vec<DeclId>,
    pub(crate) symset: HashSet<DeclId>,
    pub(crate) symtab: HashMap<String, DeclId>,
    pub(crate) forward: HashMap<DeclId, BTreeSet<DeclId>>,
    pub(crate) reverse: HashMap<DeclId, BTreeSet<DeclId>>,
    pub(crate) filetab: BTreeMap<String, BTreeSet<DeclId>>,
    pub(crate) threaded_params: BTreeSet<String>,
}

impl Program {
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Retained symbols in program order
    pub fn symbols(&self) -> &[DeclId] {
        &self.symlist
    }

    pub fn len(&self) -> usize {
        self.symlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symlist.is_empty()
    }

    pub fn contains(&self, id: DeclId) -> bool {
        self.symset.contains(&id)
    }

    /// Symbol currently bound to `name`
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.symtab.get(name).copied()
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        self.forest.decl(id)
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        self.forest.decl_mut(id)
    }

    pub fn name(&self, id: DeclId) -> &str {
        &self.forest.decl(id).name
    }

    /// Path of the file that declared `id`
    pub fn file_of(&self, id: DeclId) -> &str {
        self.forest.decl_path(id)
    }

    /// Symbols grouped by declaring file
    pub fn files(&self) -> &BTreeMap<String, BTreeSet<DeclId>> {
        &self.filetab
    }

    /// What `id` references
    pub fn callees(&self, id: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        self.forward.get(&id).into_iter().flatten().copied()
    }

    /// Who references `id`
    pub fn callers(&self, id: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        self.reverse.get(&id).into_iter().flatten().copied()
    }

    /// Record that `from` references `to`, in both directions
    pub fn add_edge(&mut self, from: DeclId, to: DeclId) {
        self.forward.entry(from).or_default().insert(to);
        self.reverse.entry(to).or_default().insert(from);
    }

    /// Drop every symbol not in `keep` from all indices, preserving order
    pub fn retain(&mut self, keep: &HashSet<DeclId>) {
        self.symlist.retain(|id| keep.contains(id));
        self.symset.retain(|id| keep.contains(id));
        self.symtab.retain(|_, id| keep.contains(id));

        for map in [&mut self.forward, &mut self.reverse] {
            map.retain(|id, _| keep.contains(id));
            for targets in map.values_mut() {
                targets.retain(|id| keep.contains(id));
            }
        }

        for ids in self.filetab.values_mut() {
            ids.retain(|id| keep.contains(id));
        }
        self.filetab.retain(|_, ids| !ids.is_empty());
    }

    /// Rename several symbols at once. Each pair applies to the symbol as it
    /// was before the call, so chained (`a→b`, `b→c`) and swapped names are
    /// renamed exactly once and the name table ends up bound to the symbols
    /// it preferred before.
    pub fn rename_symbols(&mut self, renames: &[(DeclId, String)]) {
        let mut rebind = Vec::new();
        for (id, new_name) in renames {
            let old = std::mem::replace(&mut self.forest.decl_mut(*id).name, new_name.clone());
            if self.symtab.get(&old) == Some(id) {
                self.symtab.remove(&old);
                rebind.push((new_name.clone(), *id));
            }
        }
        for (name, id) in rebind {
            self.symtab.insert(name, id);
        }
    }

    /// Remember a parameter name introduced by threading
    pub fn note_threaded_param(&mut self, name: &str) {
        self.threaded_params.insert(name.to_string());
    }

    pub fn is_threaded_param(&self, name: &str) -> bool {
        self.threaded_params.contains(name)
    }

    /// Check that forward and reverse maps mirror each other
    pub fn is_symmetric(&self) -> bool {
        let forward_ok = self.forward.iter().all(|(from, targets)| {
            targets
                .iter()
                .all(|to| self.reverse.get(to).is_some_and(|s| s.contains(from)))
        });
        let reverse_ok = self.reverse.iter().all(|(to, sources)| {
            sources
                .iter()
                .all(|from| self.forward.get(from).is_some_and(|s| s.contains(to)))
        });
        forward_ok && reverse_ok
    }

    /// Check that no index mentions a symbol outside the symbol set
    pub fn is_closed(&self) -> bool {
        let known = |id: &DeclId| self.symset.contains(id);
        self.symlist.iter().all(known)
            && self.symtab.values().all(known)
            && self
                .forward
                .iter()
                .chain(self.reverse.iter())
                .all(|(id, set)| known(id) && set.iter().all(known))
            && self.filetab.values().flatten().all(known)
    }
}
