use crate::credit;
use crate::error::FormError;
use crate::listing::{self, SortMode};
use crate::models::{coerce_amount, Activity, ActivityType, NewActivity};

pub const SAVED_MESSAGE: &str = "Activity saved.";
pub const DELETED_MESSAGE: &str = "Activity deleted.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Mounted,
    ActivitiesLoaded(Vec<Activity>),
    ActivitiesFailed,
    BalanceLoaded { request: u64, balance: Option<f64> },
    WalletEdited(String),
    WalletChangeEnabled,
    WalletReset,
    TypeSelected(Option<ActivityType>),
    AmountEntered(String),
    FilterChanged(Option<ActivityType>),
    SortChanged(SortMode),
    Submitted(Activity),
    SubmitFailed(String),
    Deleted(String),
    DeleteFailed(String),
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub wallet_address: String,
    pub can_change_wallet: bool,
    pub activity_type: Option<ActivityType>,
    pub amount: String,
    pub notice: Option<Notice>,
    pub activities: Vec<Activity>,
    pub balance: Option<f64>,
    pub filter: Option<ActivityType>,
    pub sort: SortMode,
    pub loading: bool,
    latest_balance_request: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            wallet_address: String::new(),
            can_change_wallet: false,
            activity_type: None,
            amount: String::new(),
            notice: None,
            activities: Vec::new(),
            balance: None,
            filter: None,
            sort: SortMode::default(),
            loading: true,
            latest_balance_request: 0,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Mounted => self.loading = false,
            Event::ActivitiesLoaded(activities) => self.activities = activities,
            Event::ActivitiesFailed => self.activities.clear(),
            Event::BalanceLoaded { request, balance } => {
                if request == self.latest_balance_request {
                    self.balance = balance;
                }
            }
            Event::WalletEdited(address) => {
                if !self.wallet_locked() {
                    self.wallet_address = address;
                }
            }
            Event::WalletChangeEnabled => self.can_change_wallet = true,
            Event::WalletReset => {
                self.wallet_address.clear();
                self.can_change_wallet = false;
            }
            Event::TypeSelected(activity_type) => self.activity_type = activity_type,
            Event::AmountEntered(amount) => self.amount = amount,
            Event::FilterChanged(filter) => self.filter = filter,
            Event::SortChanged(sort) => self.sort = sort,
            Event::Submitted(activity) => {
                self.activities.insert(0, activity);
                self.activity_type = None;
                self.amount.clear();
                self.notice = Some(Notice::success(SAVED_MESSAGE));
            }
            Event::SubmitFailed(message) | Event::DeleteFailed(message) => {
                self.notice = Some(Notice::error(message));
            }
            Event::Deleted(id) => {
                self.activities.retain(|activity| activity.id != id);
                self.notice = Some(Notice::success(DELETED_MESSAGE));
            }
        }
    }

    /// Only the response carrying the newest token is applied.
    pub fn begin_balance_request(&mut self) -> u64 {
        self.latest_balance_request += 1;
        self.latest_balance_request
    }

    pub fn wallet_locked(&self) -> bool {
        !self.wallet_address.is_empty() && !self.can_change_wallet
    }

    pub fn visible_activities(&self) -> Vec<&Activity> {
        listing::filter_and_sort(&self.activities, self.filter, self.sort)
    }

    // filtered list, not the whole list
    pub fn total_credit(&self) -> f64 {
        credit::total_credit(self.visible_activities())
    }

    pub fn submission(&self) -> Result<NewActivity, FormError> {
        validate(&self.wallet_address, self.activity_type, &self.amount)
    }
}

pub fn validate(
    wallet_address: &str,
    activity_type: Option<ActivityType>,
    amount: &str,
) -> Result<NewActivity, FormError> {
    if wallet_address.trim().is_empty() {
        return Err(FormError::MissingWallet);
    }
    let activity_type = activity_type.ok_or(FormError::MissingActivityType)?;
    if amount.trim().is_empty() {
        return Err(FormError::MissingAmount);
    }
    let value = coerce_amount(amount);
    if value.is_nan() {
        return Err(FormError::InvalidAmount(amount.to_string()));
    }

    Ok(NewActivity {
        wallet_address: wallet_address.to_string(),
        activity_type: activity_type.label().to_string(),
        amount: value,
    })
}
