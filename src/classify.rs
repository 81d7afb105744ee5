use crate::bindings::{require_source, Binding, BindingTable};
use swc_core::ecma::ast::*;

/// Package whose default export creates the application instance.
pub const FRAMEWORK_PACKAGE: &str = "dva";
pub const ROUTER_METHOD: &str = "router";
pub const MODEL_METHOD: &str = "model";

// -----------------------------------------------------------------------------
// Call-site classification
// -----------------------------------------------------------------------------

/// Label of a single call expression. Computed on visit, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallSite<'a> {
    /// `dva(...)` where `dva` comes from the framework package.
    Factory,
    /// `app.router(...)` on a framework instance.
    Router { instance: &'a Ident },
    /// `app.model(...)` on a framework instance.
    Model { instance: &'a Ident },
    Unclassified,
}

pub struct Classifier<'a> {
    bindings: &'a BindingTable,
}

impl<'a> Classifier<'a> {
    pub fn new(bindings: &'a BindingTable) -> Self {
        Self { bindings }
    }

    pub fn classify<'n>(&self, call: &'n CallExpr) -> CallSite<'n> {
        let Callee::Expr(callee) = &call.callee else {
            return CallSite::Unclassified;
        };
        match &**callee {
            Expr::Ident(i) if self.is_factory_call(&i.to_id()) => CallSite::Factory,
            Expr::Member(m) => self.classify_member_call(m),
            _ => CallSite::Unclassified,
        }
    }

    /// True when `callee` is imported or required from the framework package.
    pub fn is_factory_call(&self, callee: &Id) -> bool {
        self.bindings.resolve_origin(callee) == Some(FRAMEWORK_PACKAGE)
    }

    /// True when the identifier was declared as `x = factory(...)`.
    ///
    /// Single level only: `x = wrap(factory())` or `y = x` are not instances.
    pub fn is_framework_instance(&self, id: &Id) -> bool {
        match self.bindings.get(id) {
            Some(Binding::CallAssignment { callee }) => self.is_factory_call(callee),
            _ => false,
        }
    }

    /// `instance.router` / `instance.model` with a plain identifier receiver
    /// and a non-computed property.
    pub fn classify_member_call<'n>(&self, m: &'n MemberExpr) -> CallSite<'n> {
        let (Expr::Ident(obj), MemberProp::Ident(prop)) = (&*m.obj, &m.prop) else {
            return CallSite::Unclassified;
        };
        let method = prop.sym.as_ref();
        if method != ROUTER_METHOD && method != MODEL_METHOD {
            return CallSite::Unclassified;
        }
        if !self.is_framework_instance(&obj.to_id()) {
            return CallSite::Unclassified;
        }
        if method == ROUTER_METHOD {
            CallSite::Router { instance: obj }
        } else {
            CallSite::Model { instance: obj }
        }
    }

    /// Module path passed to a registration call: an inline `require('...')`
    /// or an identifier bound to an import/require.
    pub fn require_path(&self, arg: Option<&ExprOrSpread>) -> Option<String> {
        let arg = arg?;
        if arg.spread.is_some() {
            return None;
        }
        match &*arg.expr {
            e @ Expr::Call(_) => require_source(e),
            Expr::Ident(i) => self.bindings.resolve_origin(&i.to_id()).map(str::to_string),
            _ => None,
        }
    }
}
