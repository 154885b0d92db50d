//! Create/edit page flows that sit between a [`Designer`] and a
//! [`ScenarioStore`].

use super::Designer;
use crate::scene::store::{ScenarioStore, StoreError};
use crate::scene::ScenarioId;
use crate::ui::FormError;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("scenario form is invalid: {}", join_errors(.0))]
    InvalidForm(Vec<FormError>),
    #[error("no scenario is loaded for editing")]
    NoScenarioLoaded,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PageError>;

fn join_errors(errors: &[FormError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn ensure_valid(designer: &Designer) -> Result<()> {
    let errors = designer.form().errors();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PageError::InvalidForm(errors))
    }
}

/// Fetches scenario `id` and installs it. A record that fails validation is
/// an error; nothing is partially loaded.
pub fn load_for_edit(
    designer: &mut Designer,
    store: &dyn ScenarioStore,
    id: ScenarioId,
) -> Result<()> {
    let scenario = store.get_scenario(id)?;
    designer.set_scenario(Some(scenario));
    Ok(())
}

/// Stores the designer's scenario as a new record and switches the designer
/// over to editing it.
pub fn create_scenario(
    designer: &mut Designer,
    store: &mut dyn ScenarioStore,
) -> Result<ScenarioId> {
    ensure_valid(designer)?;
    let id = store.create_scenario(&designer.get_scenario())?;
    load_for_edit(designer, store, id)?;
    Ok(id)
}

/// Writes the loaded scenario back under its own id. Returns false when the
/// store no longer has it.
pub fn save_changes(designer: &mut Designer, store: &mut dyn ScenarioStore) -> Result<bool> {
    if !designer.has_loaded_scenario() {
        return Err(PageError::NoScenarioLoaded);
    }
    ensure_valid(designer)?;
    let scenario = designer.get_scenario();
    let updated = store.update_scenario(scenario.id, &scenario)?;
    if !updated {
        log::warn!("Scenario {} no longer exists in the store", scenario.id);
    }
    Ok(updated)
}
