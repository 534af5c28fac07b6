//! Relay Command
//!
//! Runs the relay server until Ctrl-C.
//!
//! Usage:
//!   resumefit relay [--bind 0.0.0.0:8787]

use crate::cli::util::{CommandContext, cancel_on_ctrl_c};
use crate::relay;
use crate::types::Result;

pub fn run(ctx: CommandContext, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| ctx.config.relay.bind.clone());

    if ctx.config.gemini.resolve_api_key().is_none() {
        ctx.output
            .warning("No Gemini API key configured, every relay request will answer 500");
    }
    ctx.output.info(&format!(
        "Relay on http://{}{} (Ctrl-C to stop)",
        bind, ctx.config.relay.path
    ));

    let rt = ctx.runtime()?;
    rt.block_on(async {
        let shutdown = cancel_on_ctrl_c();
        relay::serve(&ctx.config, &bind, shutdown).await
    })
}
