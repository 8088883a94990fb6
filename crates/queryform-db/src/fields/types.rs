//! Field type definitions.
//!
//! Each [`FieldType`] variant corresponds to a model field class, and
//! [`FieldDef`] captures the metadata of a single model field.

use crate::value::Value;

/// The declared type of a model field.
///
/// Relational variants carry the name of the target model, either a bare
/// model name (`"relatedmodelfortest"`) or a label (`"tests.relatedmodelfortest"`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum FieldType {
    /// Auto-incrementing 32-bit integer primary key.
    AutoField,
    /// Auto-incrementing 64-bit integer primary key.
    BigAutoField,
    /// 32-bit signed integer.
    IntegerField,
    /// 64-bit signed integer.
    BigIntegerField,
    /// 16-bit signed integer.
    SmallIntegerField,
    /// Non-negative 32-bit integer.
    PositiveIntegerField,
    /// Non-negative 16-bit integer.
    PositiveSmallIntegerField,
    /// 64-bit floating-point number.
    FloatField,
    /// Fixed-precision decimal number.
    DecimalField {
        /// Maximum total digits.
        max_digits: u32,
        /// Digits after the decimal point.
        decimal_places: u32,
    },
    /// Boolean (true/false).
    BooleanField,
    /// Boolean that also admits NULL.
    NullBooleanField,
    /// Variable-length string.
    CharField,
    /// Unlimited-length text.
    TextField,
    /// Date without time.
    DateField,
    /// Date and time.
    DateTimeField,
    /// UUID field.
    UuidField,
    /// Many-to-one relationship.
    ForeignKey {
        /// The target model name.
        to: String,
    },
    /// One-to-one relationship.
    OneToOneField {
        /// The target model name.
        to: String,
    },
    /// Many-to-many relationship. Stored as a list of target primary keys.
    ManyToManyField {
        /// The target model name.
        to: String,
    },
}

impl FieldType {
    /// Returns the declared class name of this type, e.g. `"IntegerField"`.
    ///
    /// Lower-cased, this is the key for per-type overrides.
    pub const fn internal_type(&self) -> &'static str {
        match self {
            Self::AutoField => "AutoField",
            Self::BigAutoField => "BigAutoField",
            Self::IntegerField => "IntegerField",
            Self::BigIntegerField => "BigIntegerField",
            Self::SmallIntegerField => "SmallIntegerField",
            Self::PositiveIntegerField => "PositiveIntegerField",
            Self::PositiveSmallIntegerField => "PositiveSmallIntegerField",
            Self::FloatField => "FloatField",
            Self::DecimalField { .. } => "DecimalField",
            Self::BooleanField => "BooleanField",
            Self::NullBooleanField => "NullBooleanField",
            Self::CharField => "CharField",
            Self::TextField => "TextField",
            Self::DateField => "DateField",
            Self::DateTimeField => "DateTimeField",
            Self::UuidField => "UUIDField",
            Self::ForeignKey { .. } => "ForeignKey",
            Self::OneToOneField { .. } => "OneToOneField",
            Self::ManyToManyField { .. } => "ManyToManyField",
        }
    }

    /// Returns the target model name for relational types.
    pub fn related_model_name(&self) -> Option<&str> {
        match self {
            Self::ForeignKey { to } | Self::OneToOneField { to } | Self::ManyToManyField { to } => {
                Some(to)
            }
            _ => None,
        }
    }
}

/// Complete definition of a model field.
///
/// Immutable once registered on a [`ModelMeta`](crate::model::ModelMeta);
/// query forms derive new form fields from it and never write back.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldDef {
    /// The attribute name of this field.
    pub name: String,
    /// The type of this field.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub null: bool,
    /// Human-readable help text.
    pub help_text: String,
    /// Human-readable name for the field, used as the form label.
    pub verbose_name: String,
    /// Allowed values as (value, display_label) pairs.
    pub choices: Option<Vec<(Value, String)>>,
}

impl FieldDef {
    /// Creates a new `FieldDef` with sensible defaults.
    ///
    /// The verbose name defaults to the field name with underscores replaced
    /// by spaces.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            verbose_name: name.replace('_', " "),
            name,
            field_type,
            primary_key: false,
            null: false,
            help_text: String::new(),
            choices: None,
        }
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Sets the verbose (human-readable) name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = name.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Declares a static choice set.
    #[must_use]
    pub fn choices<V, L>(mut self, choices: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<Value>,
        L: Into<String>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
        );
        self
    }

    /// Returns `true` if this field represents a relational field.
    pub const fn is_relation(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::ForeignKey { .. }
                | FieldType::OneToOneField { .. }
                | FieldType::ManyToManyField { .. }
        )
    }

    /// Returns `true` if this field holds many related keys.
    pub const fn is_many(&self) -> bool {
        matches!(self.field_type, FieldType::ManyToManyField { .. })
    }

    /// Returns the declared class name of this field's type.
    pub const fn internal_type(&self) -> &'static str {
        self.field_type.internal_type()
    }

    /// Returns the target model name for relational fields.
    pub fn related_model_name(&self) -> Option<&str> {
        self.field_type.related_model_name()
    }
}
