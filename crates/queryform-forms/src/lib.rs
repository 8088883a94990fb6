//! # queryform-forms
//!
//! The binding layer for query forms. Provides [`QueryDict`] for submitted
//! data, widgets (including the three-part [`RangeWidget`]), form field
//! definitions with range and multi-choice cleaning, and [`BaseForm`], which
//! binds data and computes the set of changed fields.
//!
//! ## Modules
//!
//! - [`querydict`] - Multi-valued form data
//! - [`widgets`] - Widget trait and built-in widgets
//! - [`fields`] - Form field definitions and value cleaning
//! - [`validation`] - Field-level validation pass
//! - [`form`] - The `Form` trait and `BaseForm`

pub mod fields;
pub mod form;
pub mod querydict;
pub mod validation;
pub mod widgets;

pub use fields::{FormFieldDef, FormFieldType, RangeValue, SubmittedValue, WidgetKind};
pub use form::{BaseForm, Form};
pub use querydict::QueryDict;
pub use widgets::{RangeWidget, RawInput, Widget, WidgetType};
