pub mod email;
pub mod facebook;
pub mod keys;
