use std::fmt::{self, Display, Write};
use std::io;
use std::sync::Arc;

use crate::format::Event;

/// A boxed error produced by user-supplied collaborators (instance creators,
/// key factories and custom deserializers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// All errors that decoding may return.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A type variable had no binding anywhere in the enclosing context.
    #[error("unresolved type variable `{variable}` at {path}")]
    UnresolvedType {
        /// The name of the type variable.
        variable: Arc<str>,
        /// Where the variable was encountered.
        path: Path,
    },
    /// No usable constructor or instance creator exists for a required type.
    #[error("cannot create an instance of `{type_name}` at {path}: {source}")]
    Instantiation {
        /// The type that could not be constructed.
        type_name: String,
        /// Where the instance was required.
        path: Path,
        /// The underlying construction failure.
        #[source]
        source: BoxError,
    },
    /// A map key's factory method rejected the key text.
    #[error("cannot convert map key {key:?} to `{key_type}` at {path}: {source}")]
    KeyCoercion {
        /// The raw key text.
        key: String,
        /// The declared key type.
        key_type: String,
        /// The path of the map holding the entry.
        path: Path,
        /// The failure raised by the factory method.
        #[source]
        source: BoxError,
    },
    /// A scalar or date value did not match the expected format.
    #[error(
        "invalid value {raw:?} for `{target}` at {path}{}: {reason}",
        pattern_suffix(.pattern)
    )]
    MalformedValue {
        /// The offending text.
        raw: String,
        /// The target type.
        target: String,
        /// The custom pattern in effect, if any.
        pattern: Option<String>,
        /// Why the value was rejected.
        reason: String,
        /// Where the value was found.
        path: Path,
    },
    /// The token stream held a different kind of value than the target type
    /// accepts.
    #[error("expected {expected}, found {found} at {path}")]
    UnexpectedEvent {
        /// A description of the accepted tokens.
        expected: &'static str,
        /// The token encountered.
        found: Event,
        /// Where the token was encountered.
        path: Path,
    },
    /// An object member has no matching property and unknown properties are
    /// configured to fail.
    #[error("unknown property `{name}` for `{class}` at {path}")]
    UnknownProperty {
        /// The member name.
        name: String,
        /// The class being decoded.
        class: Arc<str>,
        /// The path of the object.
        path: Path,
    },
    /// A named type was referenced but never registered.
    #[error("type `{name}` is not registered (at {path})")]
    UnknownType {
        /// The missing type name.
        name: Arc<str>,
        /// Where the type was required.
        path: Path,
    },
    /// Values were nested deeper than the configured recursion limit.
    #[error("recursion limit exceeded at {path}")]
    RecursionLimitExceeded {
        /// The value that would have exceeded the limit.
        path: Path,
    },
    /// The input is not valid JSON.
    #[error("invalid json at byte {offset}: {message}")]
    Syntax {
        /// The byte offset of the problem.
        offset: usize,
        /// A description of the problem.
        message: String,
    },
    /// Expected more data but encountered the end of the input.
    #[error("unexpected end of input")]
    Eof,
    /// Extra data appeared after the decoded value.
    #[error("extra data at end of input")]
    TrailingData,
    /// The configuration handed to the binder is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// An IO error occurred.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// A generic error raised by a user-registered deserializer.
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Returns a generic error carrying `message`.
    pub fn message(message: impl Display) -> Self {
        Self::Message(message.to_string())
    }

    /// Returns the path the error is attributed to, if it carries one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::UnresolvedType { path, .. }
            | Self::Instantiation { path, .. }
            | Self::KeyCoercion { path, .. }
            | Self::MalformedValue { path, .. }
            | Self::UnexpectedEvent { path, .. }
            | Self::UnknownProperty { path, .. }
            | Self::UnknownType { path, .. }
            | Self::RecursionLimitExceeded { path } => Some(path),
            Self::Syntax { .. }
            | Self::Eof
            | Self::TrailingData
            | Self::InvalidConfiguration(_)
            | Self::Io(_)
            | Self::Message(_) => None,
        }
    }
}

fn pattern_suffix(pattern: &Option<String>) -> String {
    pattern
        .as_ref()
        .map(|pattern| format!(" (pattern {pattern:?})"))
        .unwrap_or_default()
}

/// One step from a parent value into a child value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A property of a user object.
    Field(Arc<str>),
    /// The key of a map entry, as it appeared in the document.
    Key(String),
    /// The position of a sequence element.
    Index(usize),
}

/// The location of a value within the decoded document, rendered like
/// `orders[2].lines.sku`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Vec<Segment>);

impl Path {
    /// The path of the top-level value.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns true if this is the top-level value.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments leading from the root to this value.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (index, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) => {
                    if index > 0 {
                        f.write_char('.')?;
                    }
                    f.write_str(name)?;
                }
                Segment::Key(key) => {
                    if index > 0 {
                        f.write_char('.')?;
                    }
                    f.write_str(key)?;
                }
                Segment::Index(position) => write!(f, "[{position}]")?,
            }
        }
        Ok(())
    }
}

#[test]
fn path_display() {
    assert_eq!(Path::root().to_string(), "<root>");
    let path: Path = [
        Segment::Field(Arc::from("orders")),
        Segment::Index(2),
        Segment::Key(String::from("sku")),
    ]
    .into_iter()
    .collect();
    assert_eq!(path.to_string(), "orders[2].sku");
    let leading_index: Path = [Segment::Index(0), Segment::Field(Arc::from("a"))]
        .into_iter()
        .collect();
    assert_eq!(leading_index.to_string(), "[0].a");
}
