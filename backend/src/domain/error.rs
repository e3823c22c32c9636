//! Domain-level error types.
//!
//! These errors are transport agnostic. Every failure carries a kind, a
//! message, and a user-facing flag that tells inbound adapters whether the
//! message may be shown to a client. Errors wrap the failure they received
//! from the layer below so diagnostics keep the full chain.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Message rendered to clients for failures that are not user-facing.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Capability implemented by errors that know whether they are safe to show
/// to an end user.
pub trait UserFacing {
    /// Return `true` when the error message may be rendered to a client.
    fn is_user_facing(&self) -> bool;
}

/// Failure category of a domain [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Registration or login input failed structural checks.
    Validation,
    /// Credentials or tokens were rejected.
    Credential,
    /// The account being created already exists.
    Conflict,
    /// The storage collaborator failed.
    Storage,
    /// The service was constructed or used with invalid configuration.
    Configuration,
}

impl ErrorKind {
    /// Flag applied by constructors before any explicit override.
    #[must_use]
    pub const fn default_user_facing(self) -> bool {
        match self {
            Self::Validation | Self::Credential | Self::Conflict => true,
            Self::Storage | Self::Configuration => false,
        }
    }
}

trait ClassifiedCause: StdError + UserFacing + Send + Sync + 'static {
    fn as_std_error(&self) -> &(dyn StdError + 'static);
}

impl<T> ClassifiedCause for T
where
    T: StdError + UserFacing + Send + Sync + 'static,
{
    fn as_std_error(&self) -> &(dyn StdError + 'static) {
        self
    }
}

enum Cause {
    Classified(Box<dyn ClassifiedCause>),
    Opaque(Box<dyn StdError + Send + Sync + 'static>),
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified(cause) => f.debug_tuple("Classified").field(&cause.to_string()).finish(),
            Self::Opaque(cause) => f.debug_tuple("Opaque").field(cause).finish(),
        }
    }
}

/// Domain error with user-facing classification and an optional cause.
///
/// ## Invariants
/// - Without a cause, the local flag decides [`UserFacing::is_user_facing`].
/// - With a cause that implements [`UserFacing`], the cause decides, so the
///   classification is inherited from the deepest classifiable error.
/// - With an opaque cause, the local flag decides.
/// - [`Error::overriding_user_facing`] pins the answer whatever the cause.
///
/// # Examples
/// ```
/// use consumer_service::domain::{Error, ErrorKind, UserFacing};
///
/// let inner = Error::credential("invalid password");
/// let outer = Error::storage("can't authenticate user").with_cause(inner);
/// assert_eq!(outer.kind(), ErrorKind::Storage);
/// assert!(outer.is_user_facing());
/// assert_eq!(outer.to_string(), "can't authenticate user --> invalid password");
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    user_facing: bool,
    forced: Option<bool>,
    cause: Option<Cause>,
}

impl Error {
    /// Create an error of `kind` using the kind's default classification.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            user_facing: kind.default_user_facing(),
            forced: None,
            cause: None,
        }
    }

    /// Convenience constructor for [`ErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Convenience constructor for [`ErrorKind::Credential`].
    pub fn credential(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Credential, message)
    }

    /// Convenience constructor for [`ErrorKind::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Convenience constructor for [`ErrorKind::Storage`].
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Convenience constructor for [`ErrorKind::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Set the local user-facing flag.
    ///
    /// The local flag only decides when there is no cause or the cause is
    /// opaque; a classified cause still wins. Use
    /// [`Error::overriding_user_facing`] to decide regardless of the cause.
    #[must_use]
    pub fn with_user_facing(mut self, user_facing: bool) -> Self {
        self.user_facing = user_facing;
        self
    }

    /// Pin the classification of this wrapper, ignoring any cause.
    ///
    /// # Examples
    /// ```
    /// use consumer_service::domain::{Error, UserFacing};
    ///
    /// let hidden = Error::storage("can't get user")
    ///     .with_cause(Error::credential("invalid password"))
    ///     .overriding_user_facing(false);
    /// assert!(!hidden.is_user_facing());
    /// ```
    #[must_use]
    pub fn overriding_user_facing(mut self, user_facing: bool) -> Self {
        self.forced = Some(user_facing);
        self
    }

    /// Wrap an underlying failure.
    ///
    /// A domain [`Error`] passed here keeps its classification; any other
    /// error is treated as opaque and leaves the local flag authoritative.
    /// Use [`Error::with_classified_cause`] for foreign errors that implement
    /// [`UserFacing`].
    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let boxed: Box<dyn StdError + Send + Sync + 'static> = Box::new(cause);
        self.cause = Some(match boxed.downcast::<Self>() {
            Ok(domain) => Cause::Classified(domain),
            Err(opaque) => Cause::Opaque(opaque),
        });
        self
    }

    /// Wrap an underlying failure that carries its own classification.
    #[must_use]
    pub fn with_classified_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + UserFacing + Send + Sync + 'static,
    {
        self.cause = Some(Cause::Classified(Box::new(cause)));
        self
    }

    /// Failure category of this error (the outermost wrapper).
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message attached by this layer, without the cause chain.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Message a transport adapter may render to the client.
    ///
    /// User-facing errors expose their own message; everything else is
    /// replaced by [`INTERNAL_ERROR_MESSAGE`].
    ///
    /// # Examples
    /// ```
    /// use consumer_service::domain::{Error, INTERNAL_ERROR_MESSAGE};
    ///
    /// assert_eq!(Error::conflict("user is already exist").client_message(), "user is already exist");
    /// assert_eq!(Error::storage("can't get user").client_message(), INTERNAL_ERROR_MESSAGE);
    /// ```
    #[must_use]
    pub fn client_message(&self) -> &str {
        if self.is_user_facing() {
            self.message()
        } else {
            INTERNAL_ERROR_MESSAGE
        }
    }

    /// Find the first error of type `T` in the cause chain, starting with
    /// this error.
    #[must_use]
    pub fn find_cause<T>(&self) -> Option<&T>
    where
        T: StdError + 'static,
    {
        let mut current: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<T>() {
                return Some(found);
            }
            current = err.source();
        }
        None
    }

    /// Return `true` when an error equal to `target` appears in the chain.
    #[must_use]
    pub fn is_caused_by<T>(&self, target: &T) -> bool
    where
        T: StdError + PartialEq + 'static,
    {
        let mut current: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(err) = current {
            if err.downcast_ref::<T>().is_some_and(|found| found == target) {
                return true;
            }
            current = err.source();
        }
        false
    }
}

impl UserFacing for Error {
    fn is_user_facing(&self) -> bool {
        if let Some(forced) = self.forced {
            return forced;
        }
        match &self.cause {
            Some(Cause::Classified(cause)) => cause.is_user_facing(),
            Some(Cause::Opaque(_)) | None => self.user_facing,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(Cause::Classified(cause)) => write!(f, "{} --> {cause}", self.message),
            Some(Cause::Opaque(cause)) => write!(f, "{} --> {cause}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.cause {
            Some(Cause::Classified(cause)) => Some(cause.as_std_error()),
            Some(Cause::Opaque(cause)) => Some(cause.as_ref()),
            None => None,
        }
    }
}
