pub mod contact;
pub mod contract;
pub mod email;
pub mod engagement;
pub mod interaction;
pub mod notification;
pub mod product;
pub mod stats;
pub mod suggestion;
