//! Application services. Each borrows the store ports it needs from [`crate::AppState`].

pub mod accounts;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod views;

pub use accounts::AccountService;
pub use cart::CartService;
pub use orders::OrderService;
