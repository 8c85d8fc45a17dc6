pub mod cards;
pub mod ledger;
pub mod loans;
pub mod models;
pub mod users;

pub use cards::CardService;
pub use ledger::LedgerService;
pub use loans::LoanService;
pub use users::UserService;
