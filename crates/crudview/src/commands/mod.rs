//! Command dispatch: bridges CLI args -> view facade calls -> output formatting.

pub mod config_cmd;
pub mod records;
pub mod util;
pub mod write;

use serde_json::Value;

use crudview_core::{Outcome, ViewFacade};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Dispatch an endpoint-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    view: &ViewFacade<Value>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => records::list(view, args, global).await,
        Command::Find(args) => records::find(view, args, global).await,
        Command::Select(args) => records::select(view, args, global).await,
        Command::Read(args) => records::read(view, args, global).await,
        Command::Get(args) => records::get(view, args, global).await,
        Command::Post(args) => records::post(view, args, global).await,
        Command::Create(args) => write::create(view, args, global).await,
        Command::Update(args) => write::update(view, args, global).await,
        Command::Delete(args) => write::delete(view, args, global).await,
        Command::ContextPath => {
            let path = view.context_path().await?;
            output::print_output(&path, global.quiet);
            Ok(())
        }
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need an endpoint".into(),
        )),
    }
}

/// Print an outcome and the view's status line, turning rejections into errors.
pub(crate) fn emit(
    view: &ViewFacade<Value>,
    outcome: Outcome<Value>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = view.observer().snapshot();
    let color = output::should_color(&global.color);

    match outcome.into_result()? {
        Outcome::Records { records, .. } => {
            output::print_output(
                &output::render_list(&global.output, &records)?,
                global.quiet,
            );
            output::print_status(&state.result_message, true, color, global.quiet);
            output::print_status(
                &output::navigator_line(&state.navigator),
                true,
                color,
                global.quiet,
            );
        }
        Outcome::Record(Some(record)) => {
            output::print_output(&output::render_single(&global.output, &record)?, global.quiet);
            output::print_status(&state.form_result_message, true, color, global.quiet);
        }
        Outcome::Record(None) => {
            output::print_status(&state.form_result_message, false, color, global.quiet);
        }
        Outcome::Rejected(_) => {}
    }

    // Records the constructor could not read are reported but not fatal.
    for err in &state.errors {
        let line = if err.err_field.is_empty() {
            err.err_message.clone()
        } else {
            format!("{}: {}", err.err_field, err.err_message)
        };
        output::print_status(&line, false, color, global.quiet);
    }
    Ok(())
}
