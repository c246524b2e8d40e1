//! Default provider set
//!
//! Every registry starts from these providers, in this order. Caller-supplied
//! providers are appended after them and never replace them.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

pub mod array;
pub mod enumeration;
pub mod inject;
pub mod string;

pub use array::ArrayIndex;
pub use enumeration::EnumDictionary;
pub use inject::{InjectCoalesce, InjectDefault, InjectGlobal, InjectRoot};
pub use string::{StringClean, StringReplace};

use crate::provider::Provider;
use std::sync::Arc;

/// Collection tag of the injection providers
pub const INJECT_COLLECTION: &str = "Inject";
/// Collection tag of the array providers
pub const ARRAY_COLLECTION: &str = "Array";
/// Collection tag of the enum providers
pub const ENUM_COLLECTION: &str = "Enum";
/// Collection tag of the string cleanup providers
pub const STRING_COLLECTION: &str = "String";

/// Fresh instances of the default providers in registration order
pub fn default_providers() -> Vec<Arc<dyn Provider>> {
    vec![
        Arc::new(InjectRoot::new()),
        Arc::new(InjectGlobal::new()),
        Arc::new(InjectCoalesce::new()),
        Arc::new(InjectDefault::new()),
        Arc::new(ArrayIndex::new()),
        Arc::new(EnumDictionary::new()),
        Arc::new(StringReplace::new()),
        Arc::new(StringClean::new()),
    ]
}
