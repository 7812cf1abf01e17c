//! `chat`: one turn with the assistant.

use homeai_core::HomeHub;

use crate::cli::{ChatArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(hub: &HomeHub, args: &ChatArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let message = args.message.join(" ");
    if message.trim().is_empty() {
        return Err(CliError::Validation {
            field: "message".into(),
            reason: "message cannot be empty".into(),
        });
    }

    let reply = hub.chat(&message).await;
    let out = output::render_single(
        &global.output,
        &reply,
        |m| m.content.clone(),
        |m| m.content.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
