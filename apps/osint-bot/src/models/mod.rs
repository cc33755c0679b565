pub mod lookup;
pub mod phone;
