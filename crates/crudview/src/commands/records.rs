//! Read-side handlers: list, find, select, read, get, post.

use serde_json::Value;
use tracing::debug;

use crudview_core::{Key, RequestInput, ViewFacade};

use crate::cli::{FindArgs, GlobalOpts, KeyArgs, ListArgs, PostArgs, SelectArgs};
use crate::error::CliError;

use super::{emit, util};

pub async fn list(
    view: &ViewFacade<Value>,
    args: ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut input = util::paged_input(&args.paging);
    if let Some(keyword) = args.keyword {
        input = input.keyword(keyword);
    }
    let outcome = if args.all {
        view.list_all(input).await?
    } else {
        view.list(input).await?
    };
    emit(view, outcome, global)
}

pub async fn find(
    view: &ViewFacade<Value>,
    args: FindArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let input = util::paged_input(&args.paging).keyword(args.keyword);
    let outcome = view.find(input).await?;
    emit(view, outcome, global)
}

pub async fn select(
    view: &ViewFacade<Value>,
    args: SelectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let input = util::paged_input(&args.paging).key(args.key);
    let outcome = if args.list {
        view.select_list(input).await?
    } else {
        view.select(input).await?
    };
    emit(view, outcome, global)
}

pub async fn read(
    view: &ViewFacade<Value>,
    args: KeyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let input = keyed(args);
    let outcome = view.read(input).await?;
    emit(view, outcome, global)
}

pub async fn get(
    view: &ViewFacade<Value>,
    args: KeyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let input = keyed(args);
    let outcome = view.get(input).await?;
    emit(view, outcome, global)
}

pub async fn post(
    view: &ViewFacade<Value>,
    args: PostArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut input = util::with_target(RequestInput::new(), args.target.as_deref());
    if let Some(content) = util::read_content(&args.data)? {
        input = input.content(content);
    }
    if let Some(key) = args.key {
        input = input.key(key);
    }
    debug!(has_content = input.content.is_some(), "posting");
    let outcome = view.post(input).await?;
    emit(view, outcome, global)
}

fn keyed(args: KeyArgs) -> RequestInput {
    util::with_target(RequestInput::new().key(Key::from(args.key)), args.target.as_deref())
}
