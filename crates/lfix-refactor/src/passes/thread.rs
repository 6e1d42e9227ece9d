//! Parameter threading
//!
//! Replaces uses of trigger globals with an expression on a new parameter,
//! adds that parameter to every function that needs it (directly or through
//! a callee) and passes it at every call to such a function.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lfix_ast::visit::for_each_expr_mut;
use lfix_ast::{DeclId, Expr, ExprKind, Param};
use lfix_symbols::Program;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::passes::{PassResult, PassWarning, RefactorPass};
use crate::RefactorError;

/// The parameter to thread: `type_name *name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub type_name: String,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSpec {
    pub param: ParamSpec,
    /// Trigger global name to replacement text
    pub triggers: BTreeMap<String, String>,
    /// Functions that never receive the parameter
    #[serde(default)]
    pub exclude: BTreeSet<String>,
    /// Fail when a trigger names no symbol
    #[serde(default)]
    pub require_triggers: bool,
}

impl ThreadSpec {
    /// Triggers where each name `f` is replaced by `prefix` followed by `f`
    pub fn prefixed<I, S>(param: ParamSpec, names: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let triggers = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                let replacement = format!("{}{}", prefix, name);
                (name, replacement)
            })
            .collect();
        Self {
            param,
            triggers,
            exclude: BTreeSet::new(),
            require_triggers: false,
        }
    }
}

pub struct Thread {
    label: String,
    pub spec: ThreadSpec,
    pub scope_aware: bool,
}

impl Thread {
    pub fn new(label: impl Into<String>, spec: ThreadSpec) -> Self {
        Self {
            label: label.into(),
            spec,
            scope_aware: false,
        }
    }

    /// Match trigger uses by resolved reference only
    pub fn scope_aware(mut self, on: bool) -> Self {
        self.scope_aware = on;
        self
    }

    fn excluded(&self, program: &Program, id: DeclId) -> bool {
        self.spec.exclude.contains(program.name(id))
    }

    /// Rewrite trigger uses in every eligible function; returns the functions
    /// that used a trigger directly.
    fn rewrite_direct_uses(
        &self,
        program: &mut Program,
        by_name: &HashMap<String, String>,
        by_id: &HashMap<DeclId, String>,
    ) -> BTreeSet<DeclId> {
        let mut users = BTreeSet::new();
        let candidates: Vec<_> = program
            .symbols()
            .iter()
            .copied()
            .filter(|&id| program.decl(id).is_function_definition() && !self.excluded(program, id))
            .collect();

        for id in candidates {
            let mut used = false;
            for_each_expr_mut(program.decl_mut(id), |expr| {
                let ExprKind::Name { text, decl } = &mut expr.kind else {
                    return;
                };
                let replacement = match *decl {
                    Some(d) if by_id.contains_key(&d) => by_id.get(&d),
                    _ if !self.scope_aware => by_name.get(text.as_str()),
                    _ => None,
                };
                if let Some(replacement) = replacement {
                    *text = replacement.clone();
                    *decl = None;
                    used = true;
                }
            });
            if used {
                debug!(pass = %self.label, name = %program.name(id), "uses trigger");
                users.insert(id);
            }
        }
        users
    }

    /// Close `needs` over callers through the reverse map
    fn propagate(&self, program: &Program, needs: &mut BTreeSet<DeclId>) {
        let mut queue: Vec<_> = needs.iter().copied().collect();
        while let Some(id) = queue.pop() {
            for caller in program.callers(id) {
                if needs.contains(&caller)
                    || !program.decl(caller).is_function_definition()
                    || self.excluded(program, caller)
                {
                    continue;
                }
                needs.insert(caller);
                queue.push(caller);
            }
        }
    }

    fn rewrite_signatures(&self, program: &mut Program, needs: &BTreeSet<DeclId>) {
        let names: BTreeSet<String> = needs.iter().map(|&id| program.name(id).to_string()).collect();
        // retained prototypes of threaded functions change too
        let targets: Vec<_> = program
            .symbols()
            .iter()
            .copied()
            .filter(|&id| {
                needs.contains(&id)
                    || (program.decl(id).is_function() && names.contains(program.name(id)))
            })
            .collect();

        for id in targets {
            let param = Param::pointer_to(&self.spec.param.name, &self.spec.param.type_name);
            if let Some(func) = program.decl_mut(id).ty.as_func_mut() {
                if func.takes_no_args() {
                    func.params = vec![param];
                } else {
                    func.params.insert(0, param);
                }
            }
        }
    }

    /// Add the parameter as first argument of every call to a threaded
    /// function; returns the number of calls patched.
    fn patch_calls(
        &self,
        program: &mut Program,
        needs: &BTreeSet<DeclId>,
        warnings: &mut Vec<PassWarning>,
    ) -> usize {
        let mut total = 0;
        for id in program.symbols().to_vec() {
            let mut patched = 0;
            for_each_expr_mut(program.decl_mut(id), |expr| {
                if let ExprKind::Call { callee, args } = &mut expr.kind {
                    if callee.target().is_some_and(|t| needs.contains(&t)) {
                        args.insert(0, Expr::name(&self.spec.param.name));
                        patched += 1;
                    }
                }
            });

            if patched > 0 && !needs.contains(&id) {
                warnings.push(PassWarning {
                    code: "W-THREAD-001",
                    message: format!(
                        "'{}' passes '{}' to {} call(s) but does not receive it",
                        program.name(id),
                        self.spec.param.name,
                        patched
                    ),
                });
            }
            total += patched;
        }
        total
    }
}

impl RefactorPass for Thread {
    fn name(&self) -> &str {
        &self.label
    }

    fn run(&self, program: &mut Program) -> Result<PassResult, RefactorError> {
        let mut by_name = HashMap::new();
        let mut by_id = HashMap::new();
        for (name, replacement) in &self.spec.triggers {
            match program.lookup(name) {
                Some(id) => {
                    by_id.insert(id, replacement.clone());
                    if !program.is_threaded_param(name) {
                        by_name.insert(name.clone(), replacement.clone());
                    }
                }
                None if self.spec.require_triggers => {
                    return Err(RefactorError::MissingTrigger {
                        pass: self.label.clone(),
                        name: name.clone(),
                    });
                }
                None => {}
            }
        }

        let mut needs = self.rewrite_direct_uses(program, &by_name, &by_id);
        let direct = needs.len();
        self.propagate(program, &mut needs);
        self.rewrite_signatures(program, &needs);

        let mut warnings = Vec::new();
        let calls = self.patch_calls(program, &needs, &mut warnings);
        program.note_threaded_param(&self.spec.param.name);

        info!(
            pass = %self.label,
            direct,
            threaded = needs.len(),
            calls,
            "threaded parameter '{}'",
            self.spec.param.name
        );
        Ok(PassResult {
            modified: !needs.is_empty(),
            warnings,
        })
    }
}
