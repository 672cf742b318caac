//! Scripts that edit existing records in place.

use std::sync::Arc;

use harvest_assets::{Asset, Record};
use harvest_structmap::StructMap;
use tracing::{debug, warn};

use crate::{CompiledScript, HostFunction, Result, RunContext, RunOutcome, Sandbox, ScriptConfig};

/// A compiled processor script. The script edits the global `asset`; the
/// edited asset replaces the record's.
#[derive(Debug, Clone)]
pub struct ScriptProcessor {
    script: CompiledScript,
    structmap: Arc<StructMap>,
}

impl ScriptProcessor {
    pub fn new(config: &ScriptConfig, structmap: Arc<StructMap>) -> Result<Self> {
        config.validate()?;
        let script = Sandbox::new(config.source.as_str())
            .named("processor")
            .with_limits(config.limits())
            .declare("asset")
            .declare("exit")
            .compile()?;
        Ok(ScriptProcessor { script, structmap })
    }

    /// Run the script over one record.
    ///
    /// `exit()` keeps the asset as the script left it so far. The script
    /// edits a copy, so the caller's record is unchanged whatever the outcome.
    pub fn process(&self, ctx: &RunContext, record: &Record) -> Result<Record> {
        let result = self.apply(ctx, record);
        if let Err(err) = &result {
            warn!(urn = %record.data().urn, error = %err, "processor script failed");
        }
        result
    }

    fn apply(&self, ctx: &RunContext, record: &Record) -> Result<Record> {
        let mut wrapper = self.structmap.wrap(record.data().clone());
        let mut run = self.script.clone_runnable()?;
        run.set("asset", &wrapper.as_map()?)?;
        run.bind(HostFunction::exit())?;

        if run.run(ctx)? == RunOutcome::UserExited {
            debug!(urn = %wrapper.asset().urn, "processor script exited early");
        }

        let edited = run.get("asset")?;
        if wrapper.asset().data.is_some() {
            wrapper.overwrite_with(edited)?;
            Ok(Record::new(wrapper.into_asset()))
        } else {
            let asset: Asset = self.structmap.as_struct(edited)?;
            Ok(Record::new(asset))
        }
    }
}
