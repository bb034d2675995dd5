// Pure domain logic
pub mod capacity;
pub mod expiry;
pub mod reconciliation;

// Stateful services over the database
pub mod ledger;
pub mod orders;
