pub mod backend;
pub mod consts;
pub mod error;
pub mod hyperstack;
pub mod io;
pub mod layout;
pub mod output;
pub mod pipeline;
