//! Domain type descriptors: the explicit registry that replaces runtime
//! reflection.
//!
//! Each domain type describes itself once (identity accessor, members as
//! (name, kind, getter/setter) tuples, superclass and capability markers)
//! and the engine walks arbitrary object graphs through that description.
//! Typed closures are erased over `dyn DomainObject` here, with `Any`
//! downcasts at the boundary, so the schema builder, serializer and
//! deserializer stay fully generic.
//!
//! Descriptors are built lazily into `static` cells and handed out as
//! `&'static TypeDescriptor`; all erased functions are `Send + Sync` so a
//! descriptor can live in a `OnceLock`.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use thiserror::Error;

use crate::graph::{Literal, XsdType};
use crate::vocab::DATE_TIME_FORMAT;

/// Shared handle to a domain object. Object graphs may be cyclic, so objects
/// are reference-counted cells; one operation runs on one thread.
pub type SharedObject = Rc<RefCell<dyn DomainObject>>;

/// Implemented (usually via [`Described`]) by every mappable domain type.
pub trait DomainObject: Any {
    fn descriptor(&self) -> &'static TypeDescriptor;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Static access to a type's descriptor.
pub trait Described: DomainObject + Sized {
    fn descriptor() -> &'static TypeDescriptor;
}

/// Wraps a value into a [`SharedObject`].
pub fn shared<T: DomainObject>(value: T) -> SharedObject {
    Rc::new(RefCell::new(value))
}

/// Borrow-side downcast helper.
pub fn downcast<T: DomainObject>(object: &dyn DomainObject) -> Result<&T, FieldError> {
    object
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| FieldError::Downcast {
            expected: std::any::type_name::<T>(),
        })
}

/// Mutable downcast helper.
pub fn downcast_mut<T: DomainObject>(object: &mut dyn DomainObject) -> Result<&mut T, FieldError> {
    object
        .as_any_mut()
        .downcast_mut::<T>()
        .ok_or_else(|| FieldError::Downcast {
            expected: std::any::type_name::<T>(),
        })
}

// ============================================================================
// Scalar values
// ============================================================================

/// A scalar member value, typed by its XSD datatype.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
}

impl ScalarValue {
    #[must_use]
    pub fn xsd_type(&self) -> XsdType {
        match self {
            ScalarValue::String(_) => XsdType::String,
            ScalarValue::Integer(_) => XsdType::Integer,
            ScalarValue::Double(_) => XsdType::Double,
            ScalarValue::Boolean(_) => XsdType::Boolean,
            ScalarValue::DateTime(_) => XsdType::DateTime,
        }
    }

    /// The lexical form written into literals. Temporal values always use the
    /// one fixed [`DATE_TIME_FORMAT`].
    #[must_use]
    pub fn to_lexical(&self) -> String {
        match self {
            ScalarValue::String(s) => s.clone(),
            ScalarValue::Integer(i) => i.to_string(),
            ScalarValue::Double(d) => d.to_string(),
            ScalarValue::Boolean(b) => b.to_string(),
            ScalarValue::DateTime(t) => t.format(DATE_TIME_FORMAT).to_string(),
        }
    }

    #[must_use]
    pub fn to_literal(&self) -> Literal {
        Literal::new(self.to_lexical(), self.xsd_type())
    }

    /// Parses a lexical form against an expected datatype.
    pub fn parse(expected: XsdType, lexical: &str) -> Result<ScalarValue, FieldError> {
        let parse_err = || FieldError::Parse {
            lexical: lexical.to_string(),
            expected,
        };
        match expected {
            XsdType::String => Ok(ScalarValue::String(lexical.to_string())),
            XsdType::Integer => lexical
                .parse::<i64>()
                .map(ScalarValue::Integer)
                .map_err(|_| parse_err()),
            XsdType::Double => lexical
                .parse::<f64>()
                .map(ScalarValue::Double)
                .map_err(|_| parse_err()),
            XsdType::Boolean => lexical
                .parse::<bool>()
                .map(ScalarValue::Boolean)
                .map_err(|_| parse_err()),
            XsdType::DateTime => NaiveDateTime::parse_from_str(lexical, DATE_TIME_FORMAT)
                .map(|naive| ScalarValue::DateTime(naive.and_utc()))
                .map_err(|_| parse_err()),
        }
    }
}

// ============================================================================
// Field access errors
// ============================================================================

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("cannot parse `{lexical}` as {expected:?}")]
    Parse { lexical: String, expected: XsdType },
    #[error("object is not a `{expected}`")]
    Downcast { expected: &'static str },
    #[error("value kind does not match member `{member}`")]
    KindMismatch { member: String },
    #[error("member `{member}`: {message}")]
    Access { member: String, message: String },
}

// ============================================================================
// Erased accessor tables
// ============================================================================

type ScalarGetter =
    Box<dyn Fn(&dyn DomainObject) -> Result<Option<ScalarValue>, FieldError> + Send + Sync>;
type ScalarSetter =
    Box<dyn Fn(&mut dyn DomainObject, ScalarValue) -> Result<(), FieldError> + Send + Sync>;
type RefGetter =
    Box<dyn Fn(&dyn DomainObject) -> Result<Option<SharedObject>, FieldError> + Send + Sync>;
type RefSetter =
    Box<dyn Fn(&mut dyn DomainObject, SharedObject) -> Result<(), FieldError> + Send + Sync>;
type ListGetter =
    Box<dyn Fn(&dyn DomainObject) -> Result<Vec<SharedObject>, FieldError> + Send + Sync>;
type ListSetter =
    Box<dyn Fn(&mut dyn DomainObject, Vec<SharedObject>) -> Result<(), FieldError> + Send + Sync>;
type Factory = Box<dyn Fn() -> SharedObject + Send + Sync>;

/// Lazy pointer to another type's descriptor; a plain fn pointer so type
/// cycles (Parent ↔ Child) resolve at call time, not at construction.
pub type DescriptorRef = fn() -> &'static TypeDescriptor;

/// Accessor/mutator pair for one member.
pub enum FieldAccess {
    Scalar {
        datatype: XsdType,
        get: ScalarGetter,
        set: Option<ScalarSetter>,
    },
    Reference {
        target: DescriptorRef,
        get: RefGetter,
        set: Option<RefSetter>,
    },
    Collection {
        element: DescriptorRef,
        get: ListGetter,
        set: Option<ListSetter>,
    },
}

impl FieldAccess {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldAccess::Scalar { .. } => "scalar",
            FieldAccess::Reference { .. } => "reference",
            FieldAccess::Collection { .. } => "collection",
        }
    }
}

/// One accessor-shaped member.
pub struct FieldDescriptor {
    pub name: &'static str,
    pub access: FieldAccess,
}

/// A capability marker declared on a type (interface-like superclass).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityMarker {
    pub short_name: &'static str,
    pub full_name: &'static str,
}

/// A non-accessor member exposed only in descriptive exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: &'static str,
}

// ============================================================================
// Type descriptor
// ============================================================================

/// Everything the engine knows about one domain type.
pub struct TypeDescriptor {
    short_name: &'static str,
    full_name: &'static str,
    superclass: Option<DescriptorRef>,
    capabilities: Vec<CapabilityMarker>,
    identity_field: Option<&'static str>,
    fields: Vec<FieldDescriptor>,
    operations: Vec<OperationDescriptor>,
    factory: Option<Factory>,
}

impl TypeDescriptor {
    #[must_use]
    pub fn builder<T: DomainObject>(
        short_name: &'static str,
        full_name: &'static str,
    ) -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder {
            descriptor: TypeDescriptor {
                short_name,
                full_name,
                superclass: None,
                capabilities: Vec::new(),
                identity_field: None,
                fields: Vec::new(),
                operations: Vec::new(),
                factory: None,
            },
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.short_name
    }

    #[must_use]
    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    #[must_use]
    pub fn superclass(&self) -> Option<&'static TypeDescriptor> {
        self.superclass.map(|r| r())
    }

    #[must_use]
    pub fn capabilities(&self) -> &[CapabilityMarker] {
        &self.capabilities
    }

    /// Name of the member designated as the stable identifier, if any.
    #[must_use]
    pub fn identity_field(&self) -> Option<&'static str> {
        self.identity_field
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    /// Builds a fresh zero-valued instance; required for import.
    pub fn instantiate(&self) -> Option<SharedObject> {
        self.factory.as_ref().map(|f| f())
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("short_name", &self.short_name)
            .field("full_name", &self.full_name)
            .field("identity_field", &self.identity_field)
            .field("fields", &self.fields.len())
            .field("operations", &self.operations.len())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Typed builder; getters/setters are written against the concrete type and
/// erased here.
pub struct TypeDescriptorBuilder<T: DomainObject> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DomainObject> TypeDescriptorBuilder<T> {
    #[must_use]
    pub fn superclass(mut self, parent: DescriptorRef) -> Self {
        self.descriptor.superclass = Some(parent);
        self
    }

    #[must_use]
    pub fn capability(mut self, short_name: &'static str, full_name: &'static str) -> Self {
        self.descriptor.capabilities.push(CapabilityMarker {
            short_name,
            full_name,
        });
        self
    }

    /// Designates an already-registered scalar member as the identity.
    #[must_use]
    pub fn identity(mut self, field: &'static str) -> Self {
        self.descriptor.identity_field = Some(field);
        self
    }

    #[must_use]
    pub fn factory(mut self, build: fn() -> T) -> Self {
        self.descriptor.factory = Some(Box::new(move || {
            Rc::new(RefCell::new(build())) as SharedObject
        }));
        self
    }

    #[must_use]
    pub fn scalar(
        self,
        name: &'static str,
        datatype: XsdType,
        get: impl Fn(&T) -> Option<ScalarValue> + Send + Sync + 'static,
        set: impl Fn(&mut T, ScalarValue) + Send + Sync + 'static,
    ) -> Self {
        let setter: ScalarSetter = Box::new(move |obj, value| {
            set(downcast_mut::<T>(obj)?, value);
            Ok(())
        });
        self.scalar_access(name, datatype, get, Some(setter))
    }

    /// Read-only scalar member (no setter pair; never populated on import).
    #[must_use]
    pub fn scalar_readonly(
        self,
        name: &'static str,
        datatype: XsdType,
        get: impl Fn(&T) -> Option<ScalarValue> + Send + Sync + 'static,
    ) -> Self {
        self.scalar_access(name, datatype, get, None)
    }

    fn scalar_access(
        mut self,
        name: &'static str,
        datatype: XsdType,
        get: impl Fn(&T) -> Option<ScalarValue> + Send + Sync + 'static,
        set: Option<ScalarSetter>,
    ) -> Self {
        let getter: ScalarGetter = Box::new(move |obj| Ok(get(downcast::<T>(obj)?)));
        self.descriptor.fields.push(FieldDescriptor {
            name,
            access: FieldAccess::Scalar {
                datatype,
                get: getter,
                set,
            },
        });
        self
    }

    #[must_use]
    pub fn reference(
        mut self,
        name: &'static str,
        target: DescriptorRef,
        get: impl Fn(&T) -> Option<SharedObject> + Send + Sync + 'static,
        set: impl Fn(&mut T, SharedObject) + Send + Sync + 'static,
    ) -> Self {
        let getter: RefGetter = Box::new(move |obj| Ok(get(downcast::<T>(obj)?)));
        let setter: RefSetter = Box::new(move |obj, value| {
            set(downcast_mut::<T>(obj)?, value);
            Ok(())
        });
        self.descriptor.fields.push(FieldDescriptor {
            name,
            access: FieldAccess::Reference {
                target,
                get: getter,
                set: Some(setter),
            },
        });
        self
    }

    #[must_use]
    pub fn collection(
        mut self,
        name: &'static str,
        element: DescriptorRef,
        get: impl Fn(&T) -> Vec<SharedObject> + Send + Sync + 'static,
        set: impl Fn(&mut T, Vec<SharedObject>) + Send + Sync + 'static,
    ) -> Self {
        let getter: ListGetter = Box::new(move |obj| Ok(get(downcast::<T>(obj)?)));
        let setter: ListSetter = Box::new(move |obj, value| {
            set(downcast_mut::<T>(obj)?, value);
            Ok(())
        });
        self.descriptor.fields.push(FieldDescriptor {
            name,
            access: FieldAccess::Collection {
                element,
                get: getter,
                set: Some(setter),
            },
        });
        self
    }

    #[must_use]
    pub fn operation(mut self, name: &'static str) -> Self {
        self.descriptor
            .operations
            .push(OperationDescriptor { name });
        self
    }

    #[must_use]
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}
