//! Write-side handlers: create, update, delete.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::debug;

use crudview_core::{
    CoreError, FileUpload, Outcome, RequestEvent, RequestInput, Verb, ViewFacade,
    messages::ALERT_SURE,
};

use crate::cli::{DeleteArgs, GlobalOpts, WriteArgs};
use crate::error::CliError;

use super::{emit, util};

pub async fn create(
    view: &ViewFacade<Value>,
    args: WriteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    save(view, Verb::Create, args, global).await
}

pub async fn update(
    view: &ViewFacade<Value>,
    args: WriteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    save(view, Verb::Update, args, global).await
}

pub async fn delete(
    view: &ViewFacade<Value>,
    args: DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let content = util::require_content(&args.data)?;
    let prompt = view.observer().messages().get(ALERT_SURE).to_owned();
    if !util::confirm(&prompt, global.yes)? {
        return Ok(());
    }
    let input = util::with_target(RequestInput::new().content(content), args.target.as_deref());
    let outcome = view.delete(input).await?;
    emit(view, outcome, global)
}

async fn save(
    view: &ViewFacade<Value>,
    verb: Verb,
    args: WriteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let content = util::require_content(&args.data)?;
    let mut input = util::with_target(RequestInput::new().content(content), args.target.as_deref());

    let Some(ref path) = args.upload else {
        let outcome = call(view, verb, input).await?;
        return emit(view, outcome, global);
    };

    input = input.file(read_upload(path).await?);
    debug!(path = %path.display(), ?verb, "uploading");

    let bar = upload_bar(global.quiet);
    let progress = bar.clone();
    let listener = view.controller().events().listen(move |event| {
        if let RequestEvent::Progress { progress: p, .. } = event {
            progress.set_length(p.bytes_total);
            progress.set_position(p.bytes_sent);
        }
    });
    let result = call(view, verb, input).await;
    view.controller().events().unlisten(listener);
    bar.finish_and_clear();

    emit(view, result?, global)
}

async fn call(
    view: &ViewFacade<Value>,
    verb: Verb,
    input: RequestInput,
) -> Result<Outcome<Value>, CoreError> {
    match verb {
        Verb::Update => view.update(input).await,
        _ => view.create(input).await,
    }
}

async fn read_upload(path: &Path) -> Result<FileUpload, CliError> {
    Ok(FileUpload::from_path(path)
        .await
        .map_err(CoreError::from)?)
}

fn upload_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} uploading [{bar:30}] {bytes}/{total_bytes}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
