use crate::settings::Settings;

pub const SAVE_PATH_REQUIRED: &str = "请选择保存地址";
pub const API_KEY_REQUIRED: &str = "请输入Api Key";

/// Inline error per form field; `None` means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub save_path: Option<&'static str>,
    pub api_key: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.save_path.is_none() && self.api_key.is_none()
    }
}

/// Settings form state: Closed -> Open(draft) -> Closed.
///
/// The save path can only change through [`SettingsDialog::set_picked_save_path`];
/// the API key is edited in place through [`SettingsDialog::api_key_mut`].
#[derive(Debug, Default)]
pub struct SettingsDialog {
    open: bool,
    draft: Settings,
    errors: FieldErrors,
    // Bumped on every open/close so late picker replies can be told apart
    session: u64,
}

impl SettingsDialog {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn draft(&self) -> &Settings {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn api_key_mut(&mut self) -> &mut String {
        &mut self.draft.api_key
    }

    /// Open the form, seeding it from the persisted settings when there are any.
    pub(crate) fn open(&mut self, persisted: Option<Settings>) {
        if let Some(settings) = persisted {
            self.draft = settings;
        }
        self.open = true;
        self.session += 1;
    }

    pub(crate) fn set_picked_save_path(&mut self, path: String) {
        self.draft.save_path = path;
        self.errors.save_path = None;
    }

    /// Re-check the API key after an edit.
    pub fn revalidate_api_key(&mut self) {
        self.errors.api_key = required(&self.draft.api_key, API_KEY_REQUIRED);
    }

    /// Validate every field; on success hand back the settings to persist.
    pub(crate) fn validate(&mut self) -> Option<Settings> {
        self.errors = FieldErrors {
            save_path: required(&self.draft.save_path, SAVE_PATH_REQUIRED),
            api_key: required(&self.draft.api_key, API_KEY_REQUIRED),
        };
        self.errors.is_empty().then(|| self.draft.clone())
    }

    pub(crate) fn close(&mut self) {
        self.open = false;
        self.session += 1;
    }

    /// Discard the draft and any errors, then close.
    pub(crate) fn reset_and_close(&mut self) {
        self.draft = Settings::default();
        self.errors = FieldErrors::default();
        self.close();
    }
}

fn required(value: &str, message: &'static str) -> Option<&'static str> {
    value.is_empty().then_some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_seeds_draft_from_persisted_settings() {
        let mut dialog = SettingsDialog::default();
        dialog.open(Some(Settings::new("/x", "y")));
        assert!(dialog.is_open());
        assert_eq!(dialog.draft(), &Settings::new("/x", "y"));
    }

    #[test]
    fn test_open_without_settings_keeps_empty_draft() {
        let mut dialog = SettingsDialog::default();
        dialog.open(None);
        assert!(dialog.is_open());
        assert_eq!(dialog.draft(), &Settings::default());
    }

    #[test]
    fn test_validate_reports_each_missing_field() {
        let mut dialog = SettingsDialog::default();
        dialog.open(None);

        assert_eq!(dialog.validate(), None);
        assert_eq!(dialog.errors().save_path, Some(SAVE_PATH_REQUIRED));
        assert_eq!(dialog.errors().api_key, Some(API_KEY_REQUIRED));

        dialog.set_picked_save_path("/out".to_string());
        assert_eq!(dialog.errors().save_path, None);
        assert_eq!(dialog.validate(), None);
        assert_eq!(dialog.errors().api_key, Some(API_KEY_REQUIRED));

        dialog.api_key_mut().push_str("k1");
        dialog.revalidate_api_key();
        assert!(dialog.errors().is_empty());
        assert_eq!(dialog.validate(), Some(Settings::new("/out", "k1")));
    }

    #[test]
    fn test_reset_and_close_discards_draft_and_errors() {
        let mut dialog = SettingsDialog::default();
        dialog.open(Some(Settings::new("/x", "y")));
        dialog.api_key_mut().clear();
        dialog.validate();

        dialog.reset_and_close();
        assert!(!dialog.is_open());
        assert_eq!(dialog.draft(), &Settings::default());
        assert!(dialog.errors().is_empty());
    }

    #[test]
    fn test_session_changes_on_open_and_close() {
        let mut dialog = SettingsDialog::default();
        let initial = dialog.session();
        dialog.open(None);
        let opened = dialog.session();
        dialog.close();
        assert_ne!(initial, opened);
        assert_ne!(opened, dialog.session());
    }
}
