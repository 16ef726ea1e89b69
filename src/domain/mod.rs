mod account;
mod booking;
mod catalog;
mod commission;
mod ledger;
mod money;
mod password;
mod payment;

pub use account::*;
pub use booking::*;
pub use catalog::*;
pub use commission::*;
pub use ledger::*;
pub use money::*;
pub use password::*;
pub use payment::*;
