use std::{fmt, result};

/// Error variants that can be returned by this package's API.
///
/// Each variant carries a `(context, message)` pair. `context` is filled in
/// by the [`err_at`] macro with the `file:line` of the call site; `message`
/// carries the underlying fault or a hand-written description.
pub enum Error {
    IoError(String, String),
    NotFound(String, String),
    Duplicate(String, String),
    VersionOrder(String, String),
    CorruptMetadata(String, String),
    Full(String, String),
    Invariant(String, String),
    Fatal(String, String),
    DecodeFail(String, String),
    FailConvert(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IoError(p, msg) => write!(f, "IoError:{} {}", p, msg),
            Error::NotFound(p, msg) => write!(f, "NotFound:{} {}", p, msg),
            Error::Duplicate(p, msg) => write!(f, "Duplicate:{} {}", p, msg),
            Error::VersionOrder(p, msg) => write!(f, "VersionOrder:{} {}", p, msg),
            Error::CorruptMetadata(p, msg) => write!(f, "CorruptMetadata:{} {}", p, msg),
            Error::Full(p, msg) => write!(f, "Full:{} {}", p, msg),
            Error::Invariant(p, msg) => write!(f, "Invariant:{} {}", p, msg),
            Error::Fatal(p, msg) => write!(f, "Fatal:{} {}", p, msg),
            Error::DecodeFail(p, msg) => write!(f, "DecodeFail:{} {}", p, msg),
            Error::FailConvert(p, msg) => write!(f, "FailConvert:{} {}", p, msg),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::error::Error for Error {}

/// Result type used pervasively across this package's API.
pub type Result<T> = result::Result<T, Error>;

// used only by the `err_at!` macro, kept public so the macro expands
// identically from any module in the crate.
#[doc(hidden)]
pub fn err_at_prefix(file: &str, line: u32) -> String {
    format!("{}:{}", file, line)
}

/// Stamp an [`Error`] with its call-site location.
///
/// Three forms:
/// - `err_at!(Variant, msg: "fmt", args...)` builds an `Err(Error::Variant(..))` directly.
/// - `err_at!(Variant, result_expr)` maps `result_expr`'s `Err` side into `Error::Variant`,
///   passing `Ok` through unchanged.
/// - `err_at!(Variant, result_expr, "fmt", args...)` is the same but prefixes the
///   underlying fault with a hand-written message.
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = $crate::error::err_at_prefix(file!(), line!());
        Err($crate::Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = $crate::error::err_at_prefix(file!(), line!());
                Err($crate::Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = $crate::error::err_at_prefix(file!(), line!());
                let msg = format!($($arg),+);
                Err($crate::Error::$v(prefix, format!("{}: {}", msg, err)))
            }
        }
    }};
}
