mod session;

pub use session::{SessionStore, WalletSession};
