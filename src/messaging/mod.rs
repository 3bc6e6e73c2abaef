mod broadcast;

pub use broadcast::{BroadcastClient, ORDER_UPDATE_TOPIC};
