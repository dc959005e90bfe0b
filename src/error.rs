use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}{}", detail(.message))]
    Rejected { status: u16, message: Option<String> },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl ApiError {
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn notice(&self, fallback: &str) -> String {
        format!("ERROR: {}", self.server_message().unwrap_or(fallback))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("wallet address is required")]
    MissingWallet,

    #[error("activity type is required")]
    MissingActivityType,

    #[error("amount is required")]
    MissingAmount,

    #[error("amount must be a number, got {0:?}")]
    InvalidAmount(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not logged in; run `carbon-credit login --token <TOKEN>` first")]
    NotAuthenticated,

    #[error("wallet address {0} is locked; pass --change to replace it")]
    WalletLocked(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown activity type: {0}")]
pub struct UnknownActivityType(pub String);
