//! Stable identifier extraction.
//!
//! Individuals are named `class IRI + '#' + identifier`, and the same
//! identifier keys the import-side identity cache. Types without a designated
//! identity member go through an explicit policy: either the operation is
//! rejected, or a random anonymous id is minted. There is deliberately no
//! silent empty-suffix fallback; that would make unrelated instances collide
//! on one IRI.

use thiserror::Error;
use uuid::Uuid;

use crate::descriptor::{DomainObject, FieldAccess};
use crate::iri::Iri;

/// What to do when a type has no identity member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnonymousIdPolicy {
    /// Fail the operation.
    Reject,
    /// Mint a `anon-<uuid>` identifier per visit.
    #[default]
    Random,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("type `{0}` declares no identity member and the policy rejects anonymous ids")]
    MissingIdentity(String),
    #[error("identity member `{field}` of `{type_name}` is not readable: {message}")]
    Unreadable {
        type_name: String,
        field: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver {
    policy: AnonymousIdPolicy,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(policy: AnonymousIdPolicy) -> Self {
        Self { policy }
    }

    /// Extracts the object's stable identifier, or applies the anonymous
    /// policy. An identity member holding no value (unset id) also falls back
    /// to the policy: a half-initialized object must not collide with a real
    /// one.
    pub fn identifier_of(&self, object: &dyn DomainObject) -> Result<String, IdentityError> {
        let descriptor = object.descriptor();
        let Some(field_name) = descriptor.identity_field() else {
            return self.anonymous(descriptor.short_name());
        };
        let Some(field) = descriptor.field(field_name) else {
            return self.anonymous(descriptor.short_name());
        };
        let FieldAccess::Scalar { get, .. } = &field.access else {
            return Err(IdentityError::Unreadable {
                type_name: descriptor.short_name().to_string(),
                field: field_name.to_string(),
                message: format!("identity member is a {}", field.access.kind_name()),
            });
        };
        match get(object) {
            Ok(Some(value)) => Ok(value.to_lexical()),
            Ok(None) => self.anonymous(descriptor.short_name()),
            Err(e) => Err(IdentityError::Unreadable {
                type_name: descriptor.short_name().to_string(),
                field: field_name.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// `class IRI + '#' + identifier`.
    pub fn individual_iri(
        &self,
        class_iri: &Iri,
        object: &dyn DomainObject,
    ) -> Result<Iri, IdentityError> {
        let id = self.identifier_of(object)?;
        let mut suffix = String::with_capacity(id.len() + 1);
        suffix.push('#');
        suffix.push_str(&id);
        Ok(class_iri.join(&suffix))
    }

    fn anonymous(&self, type_name: &str) -> Result<String, IdentityError> {
        match self.policy {
            AnonymousIdPolicy::Reject => {
                Err(IdentityError::MissingIdentity(type_name.to_string()))
            }
            AnonymousIdPolicy::Random => Ok(format!("anon-{}", Uuid::new_v4())),
        }
    }
}
