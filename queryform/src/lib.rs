//! # queryform
//!
//! Dynamic query forms for model collections.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `queryform` to get everything, or on individual crates
//! for finer-grained control.
//!
//! ```
//! use queryform::prelude::*;
//!
//! let db = InMemoryDatabase::new();
//! let model = db
//!     .register(
//!         ModelMeta::new("shop", "order")
//!             .field(FieldDef::new("id", FieldType::AutoField).primary_key())
//!             .field(FieldDef::new("total", FieldType::IntegerField)),
//!     )
//!     .unwrap();
//! for total in [5, 40, 90] {
//!     db.insert("order", vec![("total", Value::from(total))]).unwrap();
//! }
//!
//! let mut form = QueryForm::new(QueryFormConfig::new(model).include(["total"])).unwrap();
//! form.bind(&QueryDict::parse("total_0=10&total_1=100"));
//! assert_eq!(form.process(None).unwrap().len(), 2);
//! ```

/// Error types, settings, and logging.
pub use queryform_core as core;

/// Values, field definitions, models, predicates, and querysets.
pub use queryform_db as db;

/// Query dicts, widgets, form fields, and binding.
#[cfg(feature = "forms")]
pub use queryform_forms as forms;

/// The query form engine.
#[cfg(feature = "engine")]
pub use queryform_engine as engine;

/// Test fixtures and assertions.
#[cfg(feature = "testing")]
pub use queryform_test as test;

// Third-party crates the public API is built on.
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// The types most callers need.
pub mod prelude {
    pub use queryform_core::{QueryFormError, QueryFormResult, Settings};
    pub use queryform_db::{
        FieldDef, FieldType, InMemoryDatabase, Lookup, Model, ModelMeta, ModelRef, QuerySet, Q,
        Value,
    };

    #[cfg(feature = "forms")]
    pub use queryform_forms::{Form, QueryDict, SubmittedValue};

    #[cfg(feature = "engine")]
    pub use queryform_engine::{Overrides, PrettyQuery, QueryForm, QueryFormConfig};
}
