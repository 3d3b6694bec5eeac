pub mod cors;
pub mod methods;
pub mod ws;
