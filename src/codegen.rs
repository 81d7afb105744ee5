// -----------------------------------------------------------------------------
// Hot-reload unit template
// -----------------------------------------------------------------------------
//
// The generated unit is a fixed template with named slots. Slot values are
// inserted verbatim: a quote inside a module path or the app name produces
// invalid (or worse, attacker-shaped) source. Callers re-parse the output and
// must treat a parse failure as "leave the call alone".

pub const DEFAULT_CONTAINER: &str = "#root";

/// Everything the generated unit is parameterized by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub app_name: String,
    pub router_path: String,
    pub model_paths: Vec<String>,
    /// CSS selector of the node the error overlay renders into.
    pub container: String,
    pub enable_model: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    AppName,
    RouterPath,
    Container,
    /// Only valid inside the per-model template.
    ModelPath,
    /// Only valid inside the unit template.
    ModelBlocks,
}

enum Piece {
    Text(&'static str),
    Slot(Slot),
}

use Piece::{Slot as S, Text as T};

const UNIT: &[Piece] = &[
    T("\n(function() {\n  // Generated by dva-hmr\n  console.log('[HMR] inited with dva-hmr');\n  "),
    S(Slot::AppName),
    T(".router(require('"),
    S(Slot::RouterPath),
    T("'));\n  "),
    S(Slot::AppName),
    T(concat!(
        ".use({\n",
        "    onHmr(render) {\n",
        "      if (module.hot) {\n",
        "        const renderNormally = render;\n",
        "        const renderException = (error) => {\n",
        "          const RedBox = require('redbox-react');\n",
        "          ReactDOM.render(React.createElement(RedBox, { error: error }), document.querySelector('",
    )),
    S(Slot::Container),
    T(concat!(
        "'));\n",
        "        };\n",
        "        const newRender = (router) => {\n",
        "          try {\n",
        "            renderNormally(router);\n",
        "          } catch (error) {\n",
        "            console.error('error', error);\n",
        "            renderException(error);\n",
        "          }\n",
        "        };\n",
        "        module.hot.accept('",
    )),
    S(Slot::RouterPath),
    T("', () => {\n          const router = require('"),
    S(Slot::RouterPath),
    T(concat!(
        "');\n",
        "          newRender(router);\n",
        "        });\n",
        "      }\n",
        "    },\n",
        "  });\n",
    )),
    S(Slot::ModelBlocks),
    T("})()\n"),
];

const MODEL_BLOCK: &[Piece] = &[
    T("  if (module.hot) {\n    const modelNamespaceMap = {};\n    modelNamespaceMap['"),
    S(Slot::ModelPath),
    T("'] = require('"),
    S(Slot::ModelPath),
    T("').namespace;\n    module.hot.accept('"),
    S(Slot::ModelPath),
    T("', () => {\n      try {\n        "),
    S(Slot::AppName),
    T(".unmodel(modelNamespaceMap['"),
    S(Slot::ModelPath),
    T("']);\n        "),
    S(Slot::AppName),
    T(".model(require('"),
    S(Slot::ModelPath),
    T("'));\n      } catch(e) { console.error(e); }\n    });\n  }\n"),
];

impl RenderConfig {
    /// Render the self-invoking hot-reload unit.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(1024 + 384 * self.model_paths.len());
        self.fill(UNIT, None, &mut out);
        out
    }

    fn fill(&self, pieces: &[Piece], model_path: Option<&str>, out: &mut String) {
        for piece in pieces {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Slot(slot) => match slot {
                    Slot::AppName => out.push_str(&self.app_name),
                    Slot::RouterPath => out.push_str(&self.router_path),
                    Slot::Container => out.push_str(&self.container),
                    Slot::ModelPath => out.push_str(model_path.unwrap_or_default()),
                    Slot::ModelBlocks => {
                        if self.enable_model {
                            for path in &self.model_paths {
                                self.fill(MODEL_BLOCK, Some(path), out);
                            }
                        }
                    }
                },
            }
        }
    }
}
