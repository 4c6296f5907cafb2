use std::fmt::{self, Debug};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::config::{Binder, MissingFields};
use crate::context::DecodeContext;
use crate::date::parse_date;
use crate::error::{BoxError, Segment};
use crate::format::{self, Event, TokenSource};
use crate::instance::InstantiationFailure;
use crate::metadata::EnumDef;
use crate::resolve::{container_view, resolve};
use crate::scalar::{number_value, parse_scalar, LeafError};
use crate::strategy::{DeserializerKind, ObjectDeserializer, Overrides, ValueDeserializer};
use crate::types::{DateType, RawType, ScalarType, TypeDescriptor};
use crate::value::Value;
use crate::{Error, Result};

/// Decodes one value from a token stream, driven by a [`TypeDescriptor`].
///
/// Each nested value is entered into a [`DecodeContext`] so that type
/// variables declared by enclosing generic classes can be resolved and
/// errors can report where they occurred.
pub struct Deserializer<'b, 's> {
    binder: &'b Binder,
    source: &'s mut dyn TokenSource,
    context: DecodeContext,
}

impl<'b, 's> Debug for Deserializer<'b, 's> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deserializer")
            .field("offset", &self.source.offset())
            .field("path", &self.context.path())
            .finish_non_exhaustive()
    }
}

impl<'b, 's> Deserializer<'b, 's> {
    /// Returns a deserializer reading from `source` with the caches and
    /// configuration of `binder`.
    pub fn new(binder: &'b Binder, source: &'s mut dyn TokenSource) -> Self {
        Self {
            binder,
            source,
            context: DecodeContext::new(),
        }
    }

    /// Decodes the next value in the stream as `ty`.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, ty), fields(ty = %ty)))]
    pub fn deserialize(&mut self, ty: &TypeDescriptor) -> Result<Value> {
        let first = format::expect_event(&mut *self.source)?;
        self.decode(first, ty, None, &Overrides::default())
    }

    fn decode(
        &mut self,
        first: Event,
        declared: &TypeDescriptor,
        segment: Option<Segment>,
        overrides: &Overrides,
    ) -> Result<Value> {
        if let Some(limit) = self.binder.config().recursion_limit {
            if self.context.depth() >= limit {
                return Err(Error::RecursionLimitExceeded {
                    path: self.context.path_with(segment.as_ref()),
                });
            }
        }
        let ty = resolve(declared, &self.context, self.context.current()).map_err(|unresolved| {
            Error::UnresolvedType {
                variable: unresolved.0,
                path: self.context.path_with(segment.as_ref()),
            }
        })?;
        let declaring = ty
            .raw()
            .and_then(|raw| self.binder.types().class_def(raw))
            .cloned();

        let node = self.context.enter(ty.clone(), declaring, segment);
        let result = self.decode_resolved(first, &ty, overrides);
        self.context.exit(node);
        result
    }

    fn decode_resolved(
        &mut self,
        first: Event,
        ty: &TypeDescriptor,
        overrides: &Overrides,
    ) -> Result<Value> {
        if first == Event::Null {
            return Ok(Value::Null);
        }
        let raw = match ty {
            TypeDescriptor::Type(raw, _) => raw,
            TypeDescriptor::Variable(variable) => {
                return Err(Error::UnresolvedType {
                    variable: variable.clone(),
                    path: self.context.path(),
                })
            }
        };

        let kind = match &overrides.deserializer {
            Some(custom) => DeserializerKind::Custom(custom.clone()),
            None => self
                .binder
                .strategies()
                .strategy_for(raw, self.binder.config(), self.binder.types())
                .ok_or_else(|| Error::UnknownType {
                    name: raw.to_string().into(),
                    path: self.context.path(),
                })?,
        };

        match kind {
            DeserializerKind::Custom(custom) => self.custom(&*custom, first, ty),
            DeserializerKind::Scalar(scalar) => self.scalar(scalar, first, ty),
            DeserializerKind::Date(date) => self.date(date, first, ty, overrides),
            DeserializerKind::Enum(definition) => self.enum_constant(&definition, first, ty),
            DeserializerKind::Optional => {
                let value = self.decode(first, &ty.argument_or_any(0), None, overrides)?;
                Ok(Value::Optional(Some(Box::new(value))))
            }
            DeserializerKind::Sequence(_) => self.sequence(first, ty, overrides),
            DeserializerKind::Map(_) => self.map(first, ty, overrides),
            DeserializerKind::Polymorphic => self.polymorphic(first),
            DeserializerKind::Object(object) => self.object(first, raw, &object),
        }
    }

    fn unexpected(&self, expected: &'static str, found: Event) -> Error {
        Error::UnexpectedEvent {
            expected,
            found,
            path: self.context.path(),
        }
    }

    fn malformed(&self, ty: &TypeDescriptor, pattern: Option<&str>, err: LeafError) -> Error {
        Error::MalformedValue {
            raw: self.source.text().to_string(),
            target: ty.to_string(),
            pattern: pattern.map(String::from),
            reason: err.reason,
            path: self.context.path(),
        }
    }

    fn instantiation(&self, failure: InstantiationFailure) -> Error {
        Error::Instantiation {
            type_name: failure.type_name,
            path: self.context.path(),
            source: failure.source,
        }
    }

    fn key_coercion(&self, key: &str, key_type: &TypeDescriptor, source: BoxError) -> Error {
        Error::KeyCoercion {
            key: key.to_string(),
            key_type: key_type.to_string(),
            path: self.context.path(),
            source,
        }
    }

    /// The built-in container a declared container type is backed by.
    ///
    /// A container class's supertype may name variables bound by an enclosing
    /// generic type, so the view's arguments are resolved from the current
    /// node.
    fn container(&self, ty: &TypeDescriptor) -> Result<TypeDescriptor> {
        let view = container_view(ty, self.binder.types()).ok_or_else(|| Error::UnknownType {
            name: ty.to_string().into(),
            path: self.context.path(),
        })?;
        resolve(&view, &self.context, self.context.current()).map_err(|unresolved| {
            Error::UnresolvedType {
                variable: unresolved.0,
                path: self.context.path(),
            }
        })
    }

    fn require_registered(&self, ty: &TypeDescriptor) -> Result<()> {
        match ty.raw() {
            Some(RawType::Named(name)) if self.binder.types().get(name).is_none() => {
                Err(Error::UnknownType {
                    name: name.clone(),
                    path: self.context.path(),
                })
            }
            _ => Ok(()),
        }
    }

    fn custom(
        &mut self,
        custom: &dyn ValueDeserializer,
        first: Event,
        ty: &TypeDescriptor,
    ) -> Result<Value> {
        custom
            .deserialize(first, &mut *self.source, ty)
            .map_err(|err| match err {
                Error::Message(reason) => self.malformed(ty, None, LeafError::new(reason)),
                other => other,
            })
    }

    fn scalar(&mut self, scalar: ScalarType, first: Event, ty: &TypeDescriptor) -> Result<Value> {
        match first {
            Event::String | Event::Number | Event::True | Event::False => {
                parse_scalar(scalar, first, self.source.text())
                    .map_err(|err| self.malformed(ty, None, err))
            }
            other => Err(self.unexpected("a scalar", other)),
        }
    }

    fn date(
        &mut self,
        date: DateType,
        first: Event,
        ty: &TypeDescriptor,
        overrides: &Overrides,
    ) -> Result<Value> {
        let pattern = overrides
            .date_format
            .as_deref()
            .or_else(|| self.binder.config().date_format.as_deref());
        match first {
            Event::String | Event::Number => parse_date(date, first, self.source.text(), pattern)
                .map_err(|err| self.malformed(ty, pattern, err)),
            other => Err(self.unexpected("a date", other)),
        }
    }

    fn enum_constant(
        &mut self,
        definition: &EnumDef,
        first: Event,
        ty: &TypeDescriptor,
    ) -> Result<Value> {
        match first {
            Event::String => definition
                .constant(self.source.text())
                .map(Value::Enum)
                .ok_or_else(|| {
                    self.malformed(
                        ty,
                        None,
                        LeafError::new(format!("not a constant of `{}`", definition.name())),
                    )
                }),
            other => Err(self.unexpected("an enum constant", other)),
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, ty, overrides), fields(ty = %ty)))]
    fn sequence(&mut self, first: Event, ty: &TypeDescriptor, overrides: &Overrides) -> Result<Value> {
        if first != Event::StartArray {
            return Err(self.unexpected("an array", first));
        }
        let element = self.container(ty)?.argument_or_any(0);
        let raw = ty.raw().cloned().unwrap_or(RawType::Any);
        let mut sequence = self
            .binder
            .instances()
            .create_sequence(&raw, self.binder.types())
            .map_err(|failure| self.instantiation(failure))?;

        let elements = overrides.for_elements();
        let mut index = 0;
        loop {
            let event = format::expect_event(&mut *self.source)?;
            if event == Event::EndArray {
                break;
            }
            let value = self.decode(event, &element, Some(Segment::Index(index)), &elements)?;
            sequence.push(value);
            index += 1;
        }
        Ok(Value::Sequence(sequence))
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, ty, overrides), fields(ty = %ty)))]
    fn map(&mut self, first: Event, ty: &TypeDescriptor, overrides: &Overrides) -> Result<Value> {
        if first != Event::StartObject {
            return Err(self.unexpected("an object", first));
        }
        let view = self.container(ty)?;
        // A map used without type arguments has textual keys.
        let key_type = view
            .arguments()
            .first()
            .cloned()
            .unwrap_or_else(TypeDescriptor::string);
        self.require_registered(&key_type)?;
        let value_type = view.argument_or_any(1);
        let optional_values = matches!(value_type.raw(), Some(RawType::Optional));
        let raw = ty.raw().cloned().unwrap_or(RawType::Any);
        let mut mapping = self
            .binder
            .instances()
            .create_map(&raw, &key_type, self.binder.types())
            .map_err(|failure| self.instantiation(failure))?;

        let elements = overrides.for_elements();
        loop {
            match format::expect_event(&mut *self.source)? {
                Event::EndObject => break,
                Event::Key => {
                    let key_text = self.source.text().to_string();
                    let event = format::expect_event(&mut *self.source)?;
                    let mut value = self.decode(
                        event,
                        &value_type,
                        Some(Segment::Key(key_text.clone())),
                        &elements,
                    )?;
                    if optional_values && value.is_null() {
                        value = Value::empty_optional();
                    }

                    let key = self
                        .binder
                        .key_cache()
                        .coerce(&key_text, &key_type, self.binder.types())
                        .map_err(|source| self.key_coercion(&key_text, &key_type, source))?;
                    mapping.insert(key, value).map_err(|rejected| {
                        self.key_coercion(&key_text, &key_type, Box::new(rejected))
                    })?;
                }
                other => return Err(self.unexpected("an object key", other)),
            }
        }
        Ok(Value::Mapping(mapping))
    }

    fn polymorphic(&mut self, first: Event) -> Result<Value> {
        match first {
            Event::StartObject => self.map(
                first,
                &TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::any()),
                &Overrides::default(),
            ),
            Event::StartArray => self.sequence(
                first,
                &TypeDescriptor::list(TypeDescriptor::any()),
                &Overrides::default(),
            ),
            Event::String => Ok(Value::String(self.source.text().to_string())),
            Event::Number => Ok(number_value(self.source.text())),
            Event::True => Ok(Value::Bool(true)),
            Event::False => Ok(Value::Bool(false)),
            Event::Null => Ok(Value::Null),
            other => Err(self.unexpected("a value", other)),
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, object)))]
    fn object(&mut self, first: Event, raw: &RawType, object: &ObjectDeserializer) -> Result<Value> {
        if first != Event::StartObject {
            return Err(self.unexpected("an object", first));
        }
        let mut instance = self
            .binder
            .instances()
            .create_object(raw, self.binder.types())
            .map_err(|failure| self.instantiation(failure))?;

        loop {
            match format::expect_event(&mut *self.source)? {
                Event::EndObject => break,
                Event::Key => match object.property(self.source.text()) {
                    Some(property) => {
                        let event = format::expect_event(&mut *self.source)?;
                        let value = self.decode(
                            event,
                            &property.declared,
                            Some(Segment::Field(property.name.clone())),
                            &property.overrides,
                        )?;
                        instance.fields.insert(property.name.clone(), value);
                    }
                    None if self.binder.config().fail_on_unknown_properties => {
                        return Err(Error::UnknownProperty {
                            name: self.source.text().to_string(),
                            class: object.class().name().clone(),
                            path: self.context.path(),
                        });
                    }
                    None => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(name = self.source.text(), "skipping unknown property");
                        let event = format::expect_event(&mut *self.source)?;
                        format::skip_value(&mut *self.source, event)?;
                    }
                },
                other => return Err(self.unexpected("a property name", other)),
            }
        }

        if self.binder.config().missing_fields == MissingFields::Null {
            for property in object.properties() {
                instance
                    .fields
                    .entry(property.name.clone())
                    .or_insert(Value::Null);
            }
        }
        Ok(Value::Object(instance))
    }
}
