use std::cell::RefCell;
use swc_core::{
    common::{errors::HANDLER, sync::Lrc, FileName, SourceMap, Span, SyntaxContext, DUMMY_SP},
    ecma::{
        ast::*,
        parser::{parse_file_as_script, Syntax},
        visit::{VisitMut, VisitMutWith},
    },
    plugin::{
        metadata::TransformPluginMetadataContextKind, plugin_transform,
        proxies::TransformPluginProgramMetadata,
    },
};

pub mod bindings;
pub mod classify;
pub mod codegen;
pub mod config;
pub mod error;
pub mod session;

#[cfg(test)]
mod test_utils;

pub use bindings::{Binding, BindingTable};
pub use classify::{CallSite, Classifier};
pub use codegen::RenderConfig;
pub use config::HmrConfig;
pub use error::HmrError;
pub use session::{FileId, FileSession, SessionStore};

// -----------------------------------------------------------------------------
// Globals
// -----------------------------------------------------------------------------

thread_local! {
    // Survives across invocations of the same plugin instance (watch rebuilds);
    // each invocation resets the entry of the file it processes.
    static SESSIONS: RefCell<SessionStore> = RefCell::new(SessionStore::new());
}

// -----------------------------------------------------------------------------
// Transform state
// -----------------------------------------------------------------------------

/// What one file session produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    pub file: FileId,
    /// Router module the unit was generated for, if a rewrite happened.
    pub router_path: Option<String>,
    /// Model paths accumulated during the session.
    pub model_paths: Vec<String>,
    pub errors: Vec<HmrError>,
}

pub struct DvaHmrTransform<'s> {
    config: HmrConfig,
    file: FileId,
    sessions: &'s mut SessionStore,
    bindings: BindingTable,

    // Depth of the innermost statement being visited, and the replacement
    // queued for the statement at a given depth.
    stmt_depth: usize,
    pending: Option<(usize, Stmt)>,
    // `stmt_depth` at entry of the innermost function being visited.
    fn_boundary: Option<usize>,

    router_path: Option<String>,
    errors: Vec<HmrError>,
}

impl<'s> DvaHmrTransform<'s> {
    pub fn new(
        config: HmrConfig,
        file: FileId,
        bindings: BindingTable,
        sessions: &'s mut SessionStore,
    ) -> Self {
        Self {
            config,
            file,
            sessions,
            bindings,
            stmt_depth: 0,
            pending: None,
            fn_boundary: None,
            router_path: None,
            errors: vec![],
        }
    }

    pub fn into_outcome(self) -> TransformOutcome {
        TransformOutcome {
            model_paths: self.sessions.model_paths(&self.file).to_vec(),
            file: self.file,
            router_path: self.router_path,
            errors: self.errors,
        }
    }

    fn on_call(&mut self, n: &CallExpr) {
        let classifier = Classifier::new(&self.bindings);
        match classifier.classify(n) {
            CallSite::Router { instance } => {
                let path = classifier.require_path(n.args.first());
                self.on_router_call(instance, path);
            }
            CallSite::Model { .. } => {
                match classifier.require_path(n.args.first()) {
                    Some(path) => self.sessions.append(&self.file, path),
                    None => tracing::debug!(
                        file = %self.file,
                        "[dva-hmr] model registration with unresolvable path skipped"
                    ),
                }
            }
            CallSite::Factory | CallSite::Unclassified => {}
        }
    }

    fn on_router_call(&mut self, instance: &Ident, path: Option<String>) {
        let Some(router_path) = path else {
            self.report(HmrError::UnresolvedPath {
                file: self.file.to_string(),
            });
            return;
        };
        if self.stmt_depth == 0 {
            tracing::debug!(
                file = %self.file,
                "[dva-hmr] router call outside of a statement left as written"
            );
            return;
        }
        if self.fn_boundary == Some(self.stmt_depth) {
            // Expression-bodied arrow: the enclosing statement belongs to
            // surrounding code and must not be swallowed by the rewrite.
            tracing::debug!(
                file = %self.file,
                "[dva-hmr] router call in an expression-bodied function left as written"
            );
            return;
        }

        let source = RenderConfig {
            app_name: instance.sym.to_string(),
            router_path: router_path.clone(),
            model_paths: self.sessions.model_paths(&self.file).to_vec(),
            container: self.config.container.clone(),
            enable_model: self.config.enable_model(),
        }
        .render();

        match parse_replacement(&source) {
            Ok(mut stmt) => {
                stmt.visit_mut_with(&mut AdoptReplacement {
                    app_name: instance.sym.as_ref(),
                    app_ctxt: instance.ctxt,
                });
                self.sessions.mark_transformed(&self.file);
                tracing::debug!(file = %self.file, "[dva-hmr] got routerPath {router_path}");
                self.pending = Some((self.stmt_depth, stmt));
                self.router_path = Some(router_path);
            }
            Err(message) => self.report(HmrError::GeneratedSource {
                file: self.file.to_string(),
                message,
            }),
        }
    }

    fn report(&mut self, err: HmrError) {
        tracing::debug!("[dva-hmr] {err}");
        self.errors.push(err);
    }
}

impl VisitMut for DvaHmrTransform<'_> {
    fn visit_mut_stmt(&mut self, s: &mut Stmt) {
        self.stmt_depth += 1;
        let depth = self.stmt_depth;
        s.visit_mut_children_with(self);
        self.stmt_depth -= 1;

        if matches!(self.pending, Some((d, _)) if d == depth) {
            if let Some((_, replacement)) = self.pending.take() {
                *s = replacement;
            }
        }
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ArrowExpr) {
        let outer = self.fn_boundary.replace(self.stmt_depth);
        n.visit_mut_children_with(self);
        self.fn_boundary = outer;
    }

    fn visit_mut_function(&mut self, n: &mut Function) {
        let outer = self.fn_boundary.replace(self.stmt_depth);
        n.visit_mut_children_with(self);
        self.fn_boundary = outer;
    }

    fn visit_mut_call_expr(&mut self, n: &mut CallExpr) {
        // Classify on enter so registrations are seen in source order.
        if !self.sessions.is_transformed(&self.file) {
            self.on_call(n);
        }
        n.visit_mut_children_with(self);
    }
}

/// Detaches parsed replacement nodes from the scratch source map and points
/// application-name references back at the original instance binding.
struct AdoptReplacement<'a> {
    app_name: &'a str,
    app_ctxt: SyntaxContext,
}

impl VisitMut for AdoptReplacement<'_> {
    fn visit_mut_span(&mut self, span: &mut Span) {
        *span = DUMMY_SP;
    }

    fn visit_mut_ident(&mut self, i: &mut Ident) {
        i.visit_mut_children_with(self);
        if i.sym.as_ref() == self.app_name && i.ctxt == SyntaxContext::empty() {
            i.ctxt = self.app_ctxt;
        }
    }
}

/// Parse generated text back into a single statement.
pub(crate) fn parse_replacement(source: &str) -> Result<Stmt, String> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Anon.into(), source.to_string());
    let mut recovered = vec![];
    let script = parse_file_as_script(
        &fm,
        Syntax::Es(Default::default()),
        EsVersion::default(),
        None,
        &mut recovered,
    )
    .map_err(|e| format!("{:?}", e.kind()))?;
    if let Some(e) = recovered.first() {
        return Err(format!("{:?}", e.kind()));
    }

    let mut body = script.body;
    if body.len() == 1 {
        Ok(body.remove(0))
    } else {
        Ok(Stmt::Block(BlockStmt {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            stmts: body,
        }))
    }
}

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

/// Run one file session: reset the file's state, collect its bindings, then
/// rewrite the first qualifying router registration.
pub fn transform_program(
    program: &mut Program,
    file: FileId,
    config: &HmrConfig,
    sessions: &mut SessionStore,
) -> TransformOutcome {
    sessions.reset_session(&file);
    let bindings = BindingTable::collect(program);
    let mut transform = DvaHmrTransform::new(config.clone(), file, bindings, sessions);
    program.visit_mut_with(&mut transform);
    transform.into_outcome()
}

#[plugin_transform]
pub fn process_transform(mut program: Program, metadata: TransformPluginProgramMetadata) -> Program {
    let config = HmrConfig::from_json(metadata.get_transform_plugin_config().as_deref())
        .unwrap_or_else(|err| {
            warn_host(&err);
            HmrConfig::default()
        });
    let file = FileId::resolve(
        metadata
            .get_context(&TransformPluginMetadataContextKind::Filename)
            .as_deref(),
        metadata
            .get_context(&TransformPluginMetadataContextKind::Cwd)
            .as_deref(),
    );

    let outcome = SESSIONS.with(|sessions| {
        transform_program(&mut program, file, &config, &mut sessions.borrow_mut())
    });
    emit_diagnostics(&outcome, &config);

    program
}

/// Report a session's result to the host through the diagnostics handler:
/// a note for the rewritten router, a warning per error. Silent when `quiet`.
///
/// Must run with `HANDLER` set, as it is inside a plugin invocation.
pub fn emit_diagnostics(outcome: &TransformOutcome, config: &HmrConfig) {
    if config.quiet {
        return;
    }
    if let Some(router_path) = &outcome.router_path {
        HANDLER.with(|handler| {
            handler.note_without_error(&format!("[dva-hmr] got routerPath {router_path}"))
        });
    }
    outcome.errors.iter().for_each(warn_host);
}

/// Must run with `HANDLER` set.
pub fn warn_host(err: &HmrError) {
    HANDLER.with(|handler| handler.struct_warn(&format!("[dva-hmr] {err}")).emit());
}
