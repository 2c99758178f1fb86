//! Built-in dialects.

pub mod cisco_ios;
pub mod generic;
pub mod powershell;
pub mod riverbed;
pub mod vyatta;
