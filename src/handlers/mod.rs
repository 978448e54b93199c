pub mod places;
pub mod system;
