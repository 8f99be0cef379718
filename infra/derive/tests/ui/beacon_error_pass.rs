use beacon_derive::beacon_error;
use std::borrow::Cow;

#[beacon_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Queue closed{}: {message}", format_context(.context))]
    Closed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn open() -> Result<(), DemoError> {
    let io: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
    io.context("opening stream")
}

fn main() {
    let err = open().unwrap_err();
    assert_eq!(err.to_string(), "IO error (opening stream): boom");

    let closed: Result<(), DemoError> =
        Err(DemoError::Closed { message: "hub".into(), context: None });
    let err = closed.context("publish").unwrap_err();
    assert_eq!(err.to_string(), "Queue closed (publish): hub");

    let internal: DemoError = "unexpected".into();
    assert!(matches!(internal, DemoError::Internal { .. }));
}
