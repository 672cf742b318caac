//! Scripts that turn a raw source response into asset records.

use std::sync::Arc;

use harvest_structmap::StructMap;
use harvest_value::Value;
use tracing::{debug, warn};

use crate::{CompiledScript, Emit, HostBridge, Result, RunContext, RunOutcome, Sandbox, ScriptConfig};

/// A compiled extractor script.
///
/// The script sees the response as `response`, the recipe name as
/// `recipe_scope`, and builds records with `new_asset` and `emit`.
#[derive(Debug, Clone)]
pub struct ResponseScript {
    script: CompiledScript,
    bridge: HostBridge,
    recipe_scope: String,
}

impl ResponseScript {
    pub fn new(config: &ScriptConfig, structmap: Arc<StructMap>, recipe_scope: impl Into<String>) -> Result<Self> {
        config.validate()?;
        let script = Sandbox::new(config.source.as_str())
            .named("response_script")
            .with_limits(config.limits())
            .declare("response")
            .declare("recipe_scope")
            .declare("new_asset")
            .declare("emit")
            .declare("exit")
            .compile()?;
        Ok(ResponseScript {
            script,
            bridge: HostBridge::new(structmap),
            recipe_scope: recipe_scope.into(),
        })
    }

    /// Run the script once against `response`. Records reach `emit` as the
    /// script emits them and stay delivered even if the run later fails.
    pub fn execute(&self, ctx: &RunContext, response: &Value, emit: Emit) -> Result<RunOutcome> {
        let mut run = self.script.clone_runnable()?;
        run.set("response", response)?;
        run.set("recipe_scope", &Value::from(self.recipe_scope.as_str()))?;
        run.bind(self.bridge.new_asset())?;
        run.bind(self.bridge.emit(emit))?;
        run.bind(self.bridge.exit())?;

        match run.run(ctx) {
            Ok(outcome) => {
                debug!(recipe = %self.recipe_scope, ?outcome, "response script finished");
                Ok(outcome)
            }
            Err(err) => {
                warn!(recipe = %self.recipe_scope, error = %err, "response script failed");
                Err(err)
            }
        }
    }
}
