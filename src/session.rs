use tracing::{error, info, warn};

use crate::api::Backend;
use crate::error::{FormError, SessionError};
use crate::models::NewActivity;
use crate::store::{Store, TOKEN_KEY, WALLET_KEY};
use crate::view::{Event, ViewState};

const SUBMIT_FALLBACK: &str = "Unknown error.";
const DELETE_FALLBACK: &str = "Delete failed.";

pub fn stored_token(store: &Store) -> Result<String, SessionError> {
    store
        .get(TOKEN_KEY)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(SessionError::NotAuthenticated)
}

pub struct Session<B> {
    backend: B,
    store: Store,
    state: ViewState,
}

impl<B: Backend> Session<B> {
    pub fn mount(backend: B, store: Store) -> Result<Self, SessionError> {
        stored_token(&store)?;

        let mut state = ViewState::new();
        if let Some(saved) = store.get(WALLET_KEY) {
            state.apply(Event::WalletEdited(saved.to_string()));
        }
        state.apply(Event::Mounted);

        Ok(Self {
            backend,
            store,
            state,
        })
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn apply(&mut self, event: Event) {
        self.state.apply(event);
    }

    pub async fn load_activities(&mut self) {
        match self.backend.list_activities().await {
            Ok(activities) => {
                info!(count = activities.len(), "loaded activities");
                self.state.apply(Event::ActivitiesLoaded(activities));
            }
            Err(err) => {
                error!(error = %err, "could not load activities");
                self.state.apply(Event::ActivitiesFailed);
            }
        }
    }

    pub async fn refresh_balance(&mut self) {
        let request = self.state.begin_balance_request();
        let balance = if self.state.wallet_address.is_empty() {
            None
        } else {
            match self.backend.balance(&self.state.wallet_address).await {
                Ok(balance) => balance,
                Err(err) => {
                    warn!(error = %err, wallet = %self.state.wallet_address, "balance lookup failed");
                    None
                }
            }
        };
        self.state.apply(Event::BalanceLoaded { request, balance });
    }

    /// Non-empty addresses are persisted.
    pub fn set_wallet(&mut self, address: &str, change: bool) -> Result<(), SessionError> {
        if self.state.wallet_address == address {
            return Ok(());
        }
        if change {
            self.enable_wallet_change();
        }
        if self.state.wallet_locked() {
            return Err(SessionError::WalletLocked(self.state.wallet_address.clone()));
        }

        self.state.apply(Event::WalletEdited(address.to_string()));
        if !address.is_empty() {
            self.store.set(WALLET_KEY, address)?;
        }
        Ok(())
    }

    pub fn enable_wallet_change(&mut self) {
        self.state.apply(Event::WalletChangeEnabled);
    }

    pub fn reset_wallet(&mut self) -> Result<(), SessionError> {
        self.state.apply(Event::WalletReset);
        self.store.remove(WALLET_KEY)?;
        Ok(())
    }

    pub async fn submit(&mut self) -> Result<bool, FormError> {
        let activity = self.state.submission()?;
        Ok(self.post_activity(&activity).await)
    }

    pub async fn post_activity(&mut self, activity: &NewActivity) -> bool {
        match self.backend.create_activity(activity).await {
            Ok(created) => {
                info!(id = %created.id, activity_type = %created.activity_type, "activity saved");
                self.state.apply(Event::Submitted(created));
                true
            }
            Err(err) => {
                warn!(error = %err, "activity rejected");
                self.state.apply(Event::SubmitFailed(err.notice(SUBMIT_FALLBACK)));
                false
            }
        }
    }

    pub async fn delete(&mut self, id: &str) -> bool {
        match self.backend.delete_activity(id).await {
            Ok(()) => {
                info!(id, "activity deleted");
                self.state.apply(Event::Deleted(id.to_string()));
                true
            }
            Err(err) => {
                error!(error = %err, id, "delete failed");
                self.state.apply(Event::DeleteFailed(err.notice(DELETE_FALLBACK)));
                false
            }
        }
    }
}

/// Forgets the token and the saved wallet address.
pub fn logout(store: &mut Store) -> Result<(), SessionError> {
    store.remove(TOKEN_KEY)?;
    store.remove(WALLET_KEY)?;
    info!("logged out");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use tempfile::TempDir;

    use super::*;
    use crate::error::ApiError;
    use crate::models::{Activity, ActivityType};
    use crate::view::{Notice, NoticeKind, DELETED_MESSAGE, SAVED_MESSAGE};

    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub activities: RefCell<Vec<Activity>>,
        pub balance: Option<f64>,
        pub fail_list: bool,
        pub reject_with: Option<String>,
        pub calls: Cell<usize>,
    }

    impl FakeBackend {
        fn rejection(&self) -> Option<ApiError> {
            self.reject_with.as_ref().map(|message| ApiError::Rejected {
                status: 400,
                message: if message.is_empty() {
                    None
                } else {
                    Some(message.clone())
                },
            })
        }
    }

    impl Backend for FakeBackend {
        async fn list_activities(&self) -> Result<Vec<Activity>, ApiError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_list {
                return Err(ApiError::Decode(
                    serde_json::from_str::<Vec<Activity>>("{").unwrap_err(),
                ));
            }
            Ok(self.activities.borrow().clone())
        }

        async fn balance(&self, _wallet_address: &str) -> Result<Option<f64>, ApiError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.balance)
        }

        async fn create_activity(&self, activity: &NewActivity) -> Result<Activity, ApiError> {
            self.calls.set(self.calls.get() + 1);
            if let Some(err) = self.rejection() {
                return Err(err);
            }
            let created = Activity {
                id: format!("new-{}", self.activities.borrow().len() + 1),
                wallet_address: activity.wallet_address.clone(),
                activity_type: activity.activity_type.clone(),
                amount: activity.amount,
                created_at: None,
            };
            self.activities.borrow_mut().insert(0, created.clone());
            Ok(created)
        }

        async fn delete_activity(&self, id: &str) -> Result<(), ApiError> {
            self.calls.set(self.calls.get() + 1);
            if let Some(err) = self.rejection() {
                return Err(err);
            }
            self.activities.borrow_mut().retain(|a| a.id != id);
            Ok(())
        }
    }

    pub(crate) fn sample_activity(id: &str, activity_type: &str, amount: f64) -> Activity {
        Activity {
            id: id.to_string(),
            wallet_address: "0xabc".to_string(),
            activity_type: activity_type.to_string(),
            amount,
            created_at: None,
        }
    }

    pub(crate) fn logged_in_store(dir: &TempDir, wallet: Option<&str>) -> Store {
        let mut store = Store::open(dir.path().join("state.json")).unwrap();
        store.set(TOKEN_KEY, "secret").unwrap();
        if let Some(wallet) = wallet {
            store.set(WALLET_KEY, wallet).unwrap();
        }
        store
    }

    #[test]
    fn mount_requires_token() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("state.json")).unwrap();
        let result = Session::mount(FakeBackend::default(), store);
        assert!(matches!(result, Err(SessionError::NotAuthenticated)));
    }

    #[test]
    fn mount_restores_saved_wallet() {
        let dir = TempDir::new().unwrap();
        let session =
            Session::mount(FakeBackend::default(), logged_in_store(&dir, Some("0xabc"))).unwrap();
        assert_eq!(session.state().wallet_address, "0xabc");
        assert!(!session.state().loading);
        assert!(session.state().wallet_locked());
    }

    #[tokio::test]
    async fn failed_list_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            fail_list: true,
            ..FakeBackend::default()
        };
        let mut session = Session::mount(backend, logged_in_store(&dir, None)).unwrap();
        session.load_activities().await;
        assert!(session.state().activities.is_empty());
    }

    #[tokio::test]
    async fn balance_is_none_without_wallet() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            balance: Some(40.0),
            ..FakeBackend::default()
        };
        let mut session = Session::mount(backend, logged_in_store(&dir, None)).unwrap();
        session.refresh_balance().await;
        assert_eq!(session.state().balance, None);
        assert_eq!(session.backend.calls.get(), 0);
    }

    #[tokio::test]
    async fn balance_loads_for_wallet() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            balance: Some(40.0),
            ..FakeBackend::default()
        };
        let mut session = Session::mount(backend, logged_in_store(&dir, Some("0xabc"))).unwrap();
        session.refresh_balance().await;
        assert_eq!(session.state().balance, Some(40.0));
    }

    #[tokio::test]
    async fn blank_wallet_is_rejected_before_network() {
        let dir = TempDir::new().unwrap();
        let mut session =
            Session::mount(FakeBackend::default(), logged_in_store(&dir, None)).unwrap();
        session.apply(Event::TypeSelected(Some(ActivityType::Cycling)));
        session.apply(Event::AmountEntered("10".to_string()));

        let result = session.submit().await;
        assert_eq!(result, Err(FormError::MissingWallet));
        assert_eq!(session.backend.calls.get(), 0);
    }

    #[tokio::test]
    async fn submit_prepends_created_activity() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            activities: RefCell::new(vec![sample_activity("1", "metro", 3.0)]),
            ..FakeBackend::default()
        };
        let mut session = Session::mount(backend, logged_in_store(&dir, Some("0xabc"))).unwrap();
        session.load_activities().await;
        session.apply(Event::TypeSelected(Some(ActivityType::Cycling)));
        session.apply(Event::AmountEntered("10".to_string()));

        assert_eq!(session.submit().await, Ok(true));
        let state = session.state();
        assert_eq!(state.activities.len(), 2);
        assert_eq!(state.activities[0].activity_type, "bisiklet");
        assert_eq!(state.total_credit(), 36.0);
        assert_eq!(state.notice, Some(Notice::success(SAVED_MESSAGE)));
        assert!(state.amount.is_empty());
    }

    #[tokio::test]
    async fn rejected_submit_surfaces_server_error() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            reject_with: Some("Invalid wallet".to_string()),
            ..FakeBackend::default()
        };
        let mut session = Session::mount(backend, logged_in_store(&dir, Some("0xabc"))).unwrap();
        session.apply(Event::TypeSelected(Some(ActivityType::Walking)));
        session.apply(Event::AmountEntered("1".to_string()));

        assert_eq!(session.submit().await, Ok(false));
        assert_eq!(
            session.state().notice,
            Some(Notice::error("ERROR: Invalid wallet"))
        );
        assert_eq!(session.state().amount, "1");
    }

    #[tokio::test]
    async fn rejected_submit_without_message_uses_fallback() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            reject_with: Some(String::new()),
            ..FakeBackend::default()
        };
        let mut session = Session::mount(backend, logged_in_store(&dir, Some("0xabc"))).unwrap();
        session.apply(Event::TypeSelected(Some(ActivityType::Walking)));
        session.apply(Event::AmountEntered("1".to_string()));

        session.submit().await.unwrap();
        assert_eq!(
            session.state().notice,
            Some(Notice::error("ERROR: Unknown error."))
        );
    }

    #[tokio::test]
    async fn delete_removes_record_and_keeps_order() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            activities: RefCell::new(vec![
                sample_activity("1", "metro", 3.0),
                sample_activity("2", "otobüs", 1.0),
                sample_activity("3", "tramvay", 2.0),
            ]),
            ..FakeBackend::default()
        };
        let mut session = Session::mount(backend, logged_in_store(&dir, None)).unwrap();
        session.load_activities().await;

        assert!(session.delete("2").await);
        let ids: Vec<&str> = session
            .state()
            .activities
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(session.state().notice, Some(Notice::success(DELETED_MESSAGE)));
    }

    #[tokio::test]
    async fn failed_delete_keeps_record() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend {
            activities: RefCell::new(vec![sample_activity("1", "metro", 3.0)]),
            reject_with: Some(String::new()),
            ..FakeBackend::default()
        };
        let mut session = Session::mount(backend, logged_in_store(&dir, None)).unwrap();
        session.load_activities().await;

        assert!(!session.delete("1").await);
        assert_eq!(session.state().activities.len(), 1);
        let notice = session.state().notice.clone().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "ERROR: Delete failed.");
    }

    #[test]
    fn saved_wallet_needs_change_flag() {
        let dir = TempDir::new().unwrap();
        let mut session =
            Session::mount(FakeBackend::default(), logged_in_store(&dir, Some("0xabc"))).unwrap();

        assert!(matches!(
            session.set_wallet("0xdef", false),
            Err(SessionError::WalletLocked(_))
        ));
        session.set_wallet("0xabc", false).unwrap();
        session.set_wallet("0xdef", true).unwrap();

        assert_eq!(session.state().wallet_address, "0xdef");
        let reopened = Store::open(dir.path().join("state.json")).unwrap();
        assert_eq!(reopened.get(WALLET_KEY), Some("0xdef"));
    }

    #[test]
    fn reset_wallet_clears_storage() {
        let dir = TempDir::new().unwrap();
        let mut session =
            Session::mount(FakeBackend::default(), logged_in_store(&dir, Some("0xabc"))).unwrap();
        session.enable_wallet_change();
        session.reset_wallet().unwrap();

        assert!(session.state().wallet_address.is_empty());
        assert!(!session.state().can_change_wallet);
        let reopened = Store::open(dir.path().join("state.json")).unwrap();
        assert!(reopened.get(WALLET_KEY).is_none());
        assert_eq!(reopened.get(TOKEN_KEY), Some("secret"));
    }

    #[test]
    fn logout_clears_token_and_wallet() {
        let dir = TempDir::new().unwrap();
        let mut store = logged_in_store(&dir, Some("0xabc"));
        logout(&mut store).unwrap();

        let reopened = Store::open(dir.path().join("state.json")).unwrap();
        assert!(reopened.get(TOKEN_KEY).is_none());
        assert!(reopened.get(WALLET_KEY).is_none());
        assert!(stored_token(&reopened).is_err());
    }
}
