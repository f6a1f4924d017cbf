//! Shop domain: aggregates, value objects, events and the order builder.
pub mod aggregates;
pub mod events;
pub mod order_builder;
pub mod value_objects;
