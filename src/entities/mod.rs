pub mod inventory_record;
pub mod location;
pub mod lot;
pub mod order;
pub mod order_line;
