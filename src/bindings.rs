use std::collections::HashMap;
use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitWith},
};

/// Name of the CommonJS loader recognized as a require-style call.
pub const REQUIRE_FN: &str = "require";

// -----------------------------------------------------------------------------
// Binding classification
// -----------------------------------------------------------------------------

/// What the statement that introduced a name looks like.
///
/// Computed once per declaration while collecting, so lookups never have to
/// re-inspect declaring nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Default, named or namespace import; `source` is the module specifier.
    Import { source: String },
    /// `const x = require('<source>')`
    RequireAssignment { source: String },
    /// `const x = callee(...)` where `callee` is a plain identifier other
    /// than `require`.
    CallAssignment { callee: Id },
    /// Any other declarator shape (no init, non-call init, require with a
    /// non-literal argument, ...).
    Other,
}

impl Binding {
    /// Module path this binding originates from, if any.
    pub fn origin(&self) -> Option<&str> {
        match self {
            Binding::Import { source } | Binding::RequireAssignment { source } => Some(source),
            Binding::CallAssignment { .. } | Binding::Other => None,
        }
    }

    fn from_declarator_init(init: Option<&Expr>) -> Self {
        let Some(init) = init else {
            return Binding::Other;
        };
        if is_require_call(init) {
            return match require_source(init) {
                Some(source) => Binding::RequireAssignment { source },
                None => Binding::Other,
            };
        }
        match init {
            Expr::Call(CallExpr {
                callee: Callee::Expr(callee),
                ..
            }) => match &**callee {
                Expr::Ident(i) => Binding::CallAssignment { callee: i.to_id() },
                _ => Binding::Other,
            },
            _ => Binding::Other,
        }
    }
}

/// `require(...)` with a plain identifier callee, whatever the arguments.
pub(crate) fn is_require_call(expr: &Expr) -> bool {
    match expr {
        Expr::Call(CallExpr {
            callee: Callee::Expr(callee),
            ..
        }) => matches!(&**callee, Expr::Ident(i) if i.sym.as_ref() == REQUIRE_FN),
        _ => false,
    }
}

/// Literal first argument of a require-style call.
pub(crate) fn require_source(expr: &Expr) -> Option<String> {
    if !is_require_call(expr) {
        return None;
    }
    let Expr::Call(call) = expr else {
        return None;
    };
    let first = call.args.first()?;
    if first.spread.is_some() {
        return None;
    }
    match &*first.expr {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// Binding table
// -----------------------------------------------------------------------------

/// Declarations of one module, keyed by resolved identifier.
///
/// Relies on SWC's resolver having run: `(sym, ctxt)` then names exactly one
/// declaration, so the nearest enclosing binding of a reference is a single
/// map lookup.
#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: HashMap<Id, Binding>,
}

impl BindingTable {
    pub fn collect(program: &Program) -> Self {
        let mut table = BindingTable::default();
        program.visit_with(&mut BindingCollector {
            out: &mut table.bindings,
        });
        table
    }

    pub fn get(&self, id: &Id) -> Option<&Binding> {
        self.bindings.get(id)
    }

    /// Module path the identifier ultimately comes from: an import source or
    /// the literal argument of the `require` call it was initialized with.
    /// One lookup, no chasing through further assignments.
    pub fn resolve_origin(&self, id: &Id) -> Option<&str> {
        self.get(id).and_then(Binding::origin)
    }
}

struct BindingCollector<'a> {
    out: &'a mut HashMap<Id, Binding>,
}

impl<'a> Visit for BindingCollector<'a> {
    fn visit_var_declarator(&mut self, d: &VarDeclarator) {
        // Destructuring patterns never bind to a module path.
        if let Some(name) = d.name.as_ident() {
            self.out.insert(
                name.to_id(),
                Binding::from_declarator_init(d.init.as_deref()),
            );
        }
        d.visit_children_with(self);
    }

    fn visit_import_decl(&mut self, n: &ImportDecl) {
        let source = n.src.value.to_string();
        for s in &n.specifiers {
            let local = match s {
                ImportSpecifier::Named(named) => &named.local,
                ImportSpecifier::Default(def) => &def.local,
                ImportSpecifier::Namespace(ns) => &ns.local,
            };
            self.out.insert(
                local.to_id(),
                Binding::Import {
                    source: source.clone(),
                },
            );
        }
    }
}
