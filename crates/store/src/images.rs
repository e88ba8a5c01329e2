//! Image-detail availability and image selection.

use std::sync::Arc;

use kpanel_core::{PanelResult, SelectionPayload};
use kpanel_flux::{Action, ActionsHub, FetchToken, Registered, Registry, Store, StoreCore};
use kpanel_kubehub::ImageService;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::selection::SelectionActionsCreator;
use crate::FetchOutcome;

pub struct ImageDetailsActions {
    pub has_image_details: Action<FxHashMap<String, bool>>,
    pub fetch_failed: Action<String>,
}

impl Registered for ImageDetailsActions {
    const KEY: &'static str = "image-details-actions";

    fn create(_: &Registry) -> PanelResult<Self> {
        Ok(Self {
            has_image_details: Action::new("has-image-details"),
            fetch_failed: Action::new("image-details-fetch-failed"),
        })
    }
}

impl ActionsHub for ImageDetailsActions {
    fn action_names(&self) -> &'static [&'static str] { &["has-image-details", "image-details-fetch-failed"] }
}

pub struct ImageDetailsActionsCreator {
    actions: Arc<ImageDetailsActions>,
    selection: Arc<SelectionActionsCreator>,
}

impl Registered for ImageDetailsActionsCreator {
    const KEY: &'static str = "image-details-actionscreator";

    fn create(registry: &Registry) -> PanelResult<Self> {
        Ok(Self { actions: registry.get()?, selection: registry.get()? })
    }
}

impl ImageDetailsActionsCreator {
    /// Ask the image service which of `image_ids` have details.
    pub async fn set_has_image_details(
        &self,
        service: &dyn ImageService,
        image_ids: &[String],
        token: &FetchToken,
    ) -> FetchOutcome {
        if image_ids.is_empty() {
            return FetchOutcome::Applied { items: 0 };
        }
        let res = service.has_image_details(image_ids).await;
        if !token.is_current() {
            debug!(ids = image_ids.len(), "image lookup completed after consumer detached; dropped");
            return FetchOutcome::Stale;
        }
        match res {
            Ok(map) => {
                let items = map.len();
                self.actions.has_image_details.invoke(&map);
                FetchOutcome::Applied { items }
            }
            Err(e) => {
                warn!(error = %e, "image details lookup failed");
                self.actions.fetch_failed.invoke(&e.to_string());
                FetchOutcome::Failed
            }
        }
    }

    /// Select the image of row `item_uid`. Without a service, or when the
    /// service has nothing, the selection is a stub with no detail payload.
    pub async fn open_image_details(
        &self,
        service: Option<&dyn ImageService>,
        image_id: &str,
        item_uid: &str,
        token: &FetchToken,
    ) -> FetchOutcome {
        let Some(service) = service else {
            self.selection.select_item(SelectionPayload::for_image(item_uid, None));
            return FetchOutcome::Applied { items: 0 };
        };
        let res = service.get_image_details(image_id).await;
        if !token.is_current() {
            return FetchOutcome::Stale;
        }
        match res {
            Ok(details) => {
                let items = usize::from(details.is_some());
                self.selection.select_item(SelectionPayload::for_image(item_uid, details));
                FetchOutcome::Applied { items }
            }
            Err(e) => {
                warn!(image = %image_id, error = %e, "image details fetch failed");
                self.actions.fetch_failed.invoke(&e.to_string());
                self.selection.select_item(SelectionPayload::for_image(item_uid, None));
                FetchOutcome::Failed
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageDetailsState {
    /// Merged answers of every lookup so far, keyed by image id.
    pub has_details: FxHashMap<String, bool>,
    pub last_error: Option<String>,
}

impl ImageDetailsState {
    pub fn has_details(&self, image_id: &str) -> bool {
        self.has_details.get(image_id).copied().unwrap_or(false)
    }
}

pub struct ImageDetailsStore {
    core: Arc<StoreCore<ImageDetailsState>>,
}

impl Registered for ImageDetailsStore {
    const KEY: &'static str = "image-details-store";

    fn create(registry: &Registry) -> PanelResult<Self> {
        let actions: Arc<ImageDetailsActions> = registry.get()?;
        let core = Arc::new(StoreCore::new("image-details-store", ImageDetailsState::default()));
        core.on(&actions.has_image_details, |s, answers| {
            let mut has_details = s.has_details.clone();
            has_details.extend(answers.iter().map(|(k, v)| (k.clone(), *v)));
            ImageDetailsState { has_details, last_error: None }
        });
        core.on(&actions.fetch_failed, |s, message| ImageDetailsState {
            has_details: s.has_details.clone(),
            last_error: Some(message.clone()),
        });
        Ok(Self { core })
    }
}

impl Store for ImageDetailsStore {
    type State = ImageDetailsState;

    fn core(&self) -> &StoreCore<ImageDetailsState> { &self.core }
}
