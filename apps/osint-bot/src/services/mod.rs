pub mod account_service;
pub mod history_service;
pub mod ledger;
pub mod report;
pub mod search_service;
