//! Command implementations, one module per subcommand.

pub mod hash;
pub mod list;
pub mod manifest;
pub mod publish;
pub mod state;
