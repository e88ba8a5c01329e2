//! The single global "what is selected" slot.

use std::sync::Arc;

use kpanel_core::{PanelResult, SelectionPayload};
use kpanel_flux::{Action, ActionsHub, Registered, Registry, Store, StoreCore};
use tracing::debug;

pub struct SelectionActions {
    pub select_item: Action<SelectionPayload>,
}

impl Registered for SelectionActions {
    const KEY: &'static str = "selection-actions";

    fn create(_: &Registry) -> PanelResult<Self> {
        Ok(Self { select_item: Action::new("select-item") })
    }
}

impl ActionsHub for SelectionActions {
    fn action_names(&self) -> &'static [&'static str] { &["select-item"] }
}

pub struct SelectionActionsCreator {
    actions: Arc<SelectionActions>,
}

impl Registered for SelectionActionsCreator {
    const KEY: &'static str = "selection-actionscreator";

    fn create(registry: &Registry) -> PanelResult<Self> {
        Ok(Self { actions: registry.get()? })
    }
}

impl SelectionActionsCreator {
    pub fn select_item(&self, payload: SelectionPayload) {
        debug!(uid = %payload.item_uid, kind = payload.selected_item_type.key(), "select item");
        self.actions.select_item.invoke(&payload);
    }
}

/// Holds at most one selection; a new one overwrites the old.
pub struct SelectionStore {
    core: Arc<StoreCore<Option<SelectionPayload>>>,
}

impl Registered for SelectionStore {
    const KEY: &'static str = "selection-store";

    fn create(registry: &Registry) -> PanelResult<Self> {
        let actions: Arc<SelectionActions> = registry.get()?;
        let core = Arc::new(StoreCore::new("selection-store", None));
        core.on(&actions.select_item, |_, payload| Some(payload.clone()));
        Ok(Self { core })
    }
}

impl SelectionStore {
    pub fn selected(&self) -> Option<SelectionPayload> { (*self.core.state()).clone() }
}

impl Store for SelectionStore {
    type State = Option<SelectionPayload>;

    fn core(&self) -> &StoreCore<Option<SelectionPayload>> { &self.core }
}
