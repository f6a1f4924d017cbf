//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod user;
pub mod contact;

pub use product::Product;
pub use order::{Order, OrderError, OrderLineItem, OrderStatus};
pub use cart::{Cart, CartError, CartItem};
pub use user::{NewUser, User};
pub use contact::{ContactMessage, ContactRequest};
