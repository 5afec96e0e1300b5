pub mod health;
pub mod reconcile;
