// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod changes;
pub mod column;
pub mod copy_down;
pub mod editor;
pub mod formatter;
pub mod host;
pub mod ids;
pub mod mode;
pub mod navigation;
pub mod rules;
pub mod status;
pub mod table;
pub mod validation;

pub use changes::*;
pub use column::*;
pub use copy_down::*;
pub use editor::*;
pub use formatter::*;
pub use host::*;
pub use ids::*;
pub use mode::ModeError;
pub use navigation::*;
pub use rules::*;
pub use status::*;
pub use table::*;
pub use validation::*;
