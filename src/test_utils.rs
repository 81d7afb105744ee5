use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use swc_core::{
    common::{
        errors::{Handler, HANDLER},
        sync::Lrc,
        FileName, Globals, Mark, SourceMap, GLOBALS,
    },
    ecma::{
        ast::*,
        parser::{parse_file_as_module, Syntax},
        transforms::base::resolver,
        visit::{Visit, VisitWith},
    },
};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a diagnostics handler installed, the way the plugin host
/// does, and return everything it emitted.
pub(crate) fn capture_diagnostics(f: impl FnOnce()) -> String {
    let buffer = SharedBuffer::default();
    let handler = Handler::with_emitter_writer(Box::new(buffer.clone()), None);
    with_globals(|| HANDLER.set(&handler, f));
    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub(crate) fn with_globals<R>(f: impl FnOnce() -> R) -> R {
    GLOBALS.set(&Globals::new(), f)
}

/// Parse a fixture as an ES module and run SWC's resolver over it, the way
/// the host does before any plugin sees the program.
pub(crate) fn parse_module(src: &str) -> Program {
    with_globals(|| {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(FileName::Anon.into(), src.to_string());
        let mut recovered = vec![];
        let module = parse_file_as_module(
            &fm,
            Syntax::Es(Default::default()),
            EsVersion::default(),
            None,
            &mut recovered,
        )
        .expect("fixture should parse");
        assert!(recovered.is_empty(), "fixture has recoverable errors");

        let unresolved_mark = Mark::new();
        let top_level_mark = Mark::new();
        let mut program = Program::Module(module);
        program.mutate(resolver(unresolved_mark, top_level_mark, false));
        program
    })
}

pub(crate) fn parse_script_src(src: &str) -> Result<Stmt, String> {
    with_globals(|| crate::parse_replacement(src))
}

/// Resolved id of the first identifier named `name`.
pub(crate) fn find_ident(program: &Program, name: &str) -> Id {
    struct Finder<'a> {
        name: &'a str,
        found: Option<Id>,
    }
    impl Visit for Finder<'_> {
        fn visit_ident(&mut self, i: &Ident) {
            if self.found.is_none() && i.sym.as_ref() == self.name {
                self.found = Some(i.to_id());
            }
        }
    }
    let mut finder = Finder { name, found: None };
    program.visit_with(&mut finder);
    finder
        .found
        .unwrap_or_else(|| panic!("no identifier named {name}"))
}

/// Resolved ids of every identifier named `name`, in visit order.
pub(crate) fn idents_named(program: &Program, name: &str) -> Vec<Id> {
    struct Collector<'a> {
        name: &'a str,
        out: Vec<Id>,
    }
    impl Visit for Collector<'_> {
        fn visit_ident(&mut self, i: &Ident) {
            if i.sym.as_ref() == self.name {
                self.out.push(i.to_id());
            }
        }
    }
    let mut c = Collector { name, out: vec![] };
    program.visit_with(&mut c);
    c.out
}

/// Every call expression, pre-order.
pub(crate) fn calls(program: &Program) -> Vec<CallExpr> {
    struct Collector {
        out: Vec<CallExpr>,
    }
    impl Visit for Collector {
        fn visit_call_expr(&mut self, n: &CallExpr) {
            self.out.push(n.clone());
            n.visit_children_with(self);
        }
    }
    let mut c = Collector { out: vec![] };
    program.visit_with(&mut c);
    c.out
}

/// Dotted callee path of a member call, e.g. `module.hot.accept`.
fn callee_path(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(i) => Some(i.sym.to_string()),
        Expr::Member(m) => {
            let MemberProp::Ident(prop) = &m.prop else {
                return None;
            };
            Some(format!("{}.{}", callee_path(&m.obj)?, prop.sym))
        }
        _ => None,
    }
}

/// First string-literal argument of every call to `path`, in source order.
pub(crate) fn literal_args_of(program: &Program, path: &str) -> Vec<Option<String>> {
    calls(program)
        .iter()
        .filter(|c| match &c.callee {
            Callee::Expr(e) => callee_path(e).as_deref() == Some(path),
            _ => false,
        })
        .map(|c| {
            c.args.first().and_then(|a| match &*a.expr {
                Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
                Expr::Call(inner) => inner.args.first().and_then(|a| match &*a.expr {
                    Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
                    _ => None,
                }),
                _ => None,
            })
        })
        .collect()
}
