// ── Master/detail ──
//
// A detail view is a `select` scoped by the key of a master record. The
// master record and its key live in the observer; selecting the same master
// twice is a no-op.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::content::Entity;
use crate::controller::RequestInput;
use crate::error::CoreError;
use crate::observer::{ListState, MasterDetailState};
use crate::view::{Outcome, ViewFacade};

impl<T> ViewFacade<T>
where
    T: Entity + DeserializeOwned,
{
    /// Point this detail view at `master` and fetch `page` of its records.
    ///
    /// Returns `Ok(None)` without dispatching when `master` is already the
    /// current master, or when it has no key (the list is cleared).
    pub async fn select_detail<M: Entity + Serialize>(
        &self,
        master: &M,
        page: Option<u32>,
    ) -> Result<Option<Outcome<T>>, CoreError> {
        if !self.observer().set_master(Some(master)) {
            debug!(
                master = ?self.observer().master_key(),
                "master unchanged, skipping detail fetch"
            );
            return Ok(None);
        }
        self.observer().clear_list();
        let Some(key) = self.observer().master_key() else {
            return Ok(None);
        };
        let input = RequestInput::new().key(key).page(page.unwrap_or(1));
        self.select(input).await.map(Some)
    }

    /// Re-fetch the current master's details, e.g. after page navigation.
    pub async fn refresh_detail(&self, page: u32) -> Result<Option<Outcome<T>>, CoreError> {
        let Some(key) = self.observer().master_key() else {
            return Ok(None);
        };
        self.select(RequestInput::new().key(key).page(page))
            .await
            .map(Some)
    }

    /// Forget the master and empty the detail list.
    pub fn clear_detail(&self) {
        self.observer().set_master(None::<&Value>);
        self.observer().clear_list();
    }
}
