use thiserror::Error;
use watchdog_client::{ExplorerError, ForumError};
use watchdog_crypto::CryptoError;

/// A profile binding that could not be turned into an address.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("empty binding")]
    Empty,

    #[error("invalid native address {raw}: {source}")]
    Native {
        raw: String,
        #[source]
        source: CryptoError,
    },

    #[error("cannot derive address from {raw}: {source}")]
    Derived {
        raw: String,
        #[source]
        source: CryptoError,
    },
}

/// Why a live-cell listing stopped before its natural end.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Explorer(#[from] ExplorerError),

    #[error("listing exceeded {0} pages")]
    PageCap(u32),

    #[error("deposit cell on page {0} has an unreadable capacity")]
    UnreadableDeposit(u32),
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("option {0} has no ballots")]
    OptionEmpty(u64),

    #[error("option {option_id} could not be audited: {source}")]
    Fatal {
        option_id: u64,
        #[source]
        source: ForumError,
    },

    #[error("thread {thread_id} could not be resolved: {source}")]
    ThreadUnresolvable {
        thread_id: u64,
        #[source]
        source: ForumError,
    },
}
