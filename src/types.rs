pub mod listing;
pub mod notification;
pub mod push;
pub mod user;
pub mod wishlist;
